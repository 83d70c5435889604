//! core::grammar::document
//!
//! Editable, lossless view of a section-grammar text.
//!
//! # Architecture
//!
//! A [`Document`] is an ordered list of lines. Each parsed line remembers its
//! exact source text; lines created or rewritten through the editing API drop
//! that text and are rendered canonically (tab indentation unless the line
//! already had an indent, canonical quoting). Section membership is implied by
//! the nearest header above a line, so several headers with the same name act
//! as one logical section, as they do when read.
//!
//! # Example
//!
//! ```
//! use projcfg::core::grammar::Document;
//!
//! let (mut doc, errors) = Document::parse("[plugin \"p\"]\n  key = a\n");
//! assert!(errors.is_empty());
//! assert_eq!(doc.get("plugin", Some("p"), "key").as_deref(), Some("a"));
//!
//! doc.set_string_list("plugin", Some("p"), "key", &["a".into(), "b".into()]);
//! assert_eq!(doc.to_text(), "[plugin \"p\"]\n  key = a\n\tkey = b\n");
//! ```

use super::escape::{escape_subsection, escape_value, parse_bool};
use super::parse::{parse_lines, SyntaxError};

/// What a line means to the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineKind {
    Header {
        section: String,
        subsection: Option<String>,
    },
    /// `value` is `None` for a bare key.
    Entry {
        key: String,
        value: Option<String>,
    },
    /// Blank line or comment.
    Other,
    /// Unparsable text, kept verbatim.
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Line {
    pub kind: LineKind,
    /// Source text, `None` once the line is synthetic.
    pub raw: Option<String>,
    pub indent: String,
    /// Trailing comment including the whitespace before it.
    pub comment: String,
    /// 1-based source line, 0 for synthetic lines.
    pub number: usize,
    /// False only for a source line that ended the text without a newline.
    pub newline: bool,
}

impl Line {
    pub(crate) fn original(
        kind: LineKind,
        raw: &str,
        indent: String,
        comment: String,
        number: usize,
    ) -> Self {
        Self {
            kind,
            raw: Some(raw.to_string()),
            indent,
            comment,
            number,
            newline: true,
        }
    }

    fn synthetic(kind: LineKind) -> Self {
        Self {
            kind,
            raw: None,
            indent: String::new(),
            comment: String::new(),
            number: 0,
            newline: true,
        }
    }

    fn is_content(&self) -> bool {
        !matches!(self.kind, LineKind::Other)
    }

    fn render(&self, out: &mut String) {
        if let Some(raw) = &self.raw {
            out.push_str(raw);
            return;
        }
        match &self.kind {
            LineKind::Header {
                section,
                subsection,
            } => {
                out.push_str(&self.indent);
                out.push('[');
                out.push_str(section);
                if let Some(sub) = subsection {
                    out.push_str(" \"");
                    out.push_str(&escape_subsection(sub));
                    out.push('"');
                }
                out.push(']');
            }
            LineKind::Entry { key, value } => {
                if self.indent.is_empty() {
                    out.push('\t');
                } else {
                    out.push_str(&self.indent);
                }
                out.push_str(key);
                if let Some(value) = value {
                    out.push_str(" =");
                    if !value.is_empty() {
                        out.push(' ');
                        out.push_str(&escape_value(value));
                    }
                }
            }
            LineKind::Other | LineKind::Invalid => out.push_str(&self.indent),
        }
        out.push_str(&self.comment);
    }
}

fn same_section(
    section: &str,
    subsection: Option<&String>,
    want: &str,
    want_sub: Option<&str>,
) -> bool {
    section.eq_ignore_ascii_case(want) && subsection.map(String::as_str) == want_sub
}

/// A parsed section-grammar document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    lines: Vec<Line>,
    order: &'static [&'static str],
}

impl Document {
    /// Parse `text`. Never fails; unparsable lines are kept and reported.
    pub fn parse(text: &str) -> (Self, Vec<SyntaxError>) {
        let parsed = parse_lines(text);
        (
            Self {
                lines: parsed.lines,
                order: &[],
            },
            parsed.errors,
        )
    }

    /// Canonical section order used when a new section must be created.
    ///
    /// A new section goes after the last existing section with the same name,
    /// otherwise before the first existing section that ranks later, otherwise
    /// at the end. Existing sections never move.
    pub fn with_section_order(mut self, order: &'static [&'static str]) -> Self {
        self.order = order;
        self
    }

    /// Render the document.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let count = self.lines.len();
        for (i, line) in self.lines.iter().enumerate() {
            line.render(&mut out);
            if line.newline || i + 1 < count {
                out.push('\n');
            }
        }
        out
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Distinct section names in first-seen order.
    pub fn sections(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for line in &self.lines {
            if let LineKind::Header { section, .. } = &line.kind {
                if !names.iter().any(|n| n.eq_ignore_ascii_case(section)) {
                    names.push(section.clone());
                }
            }
        }
        names
    }

    /// Distinct subsection names of `section` in first-seen order.
    pub fn subsections(&self, section: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for line in &self.lines {
            if let LineKind::Header {
                section: s,
                subsection: Some(sub),
            } = &line.kind
            {
                if s.eq_ignore_ascii_case(section) && !names.contains(sub) {
                    names.push(sub.clone());
                }
            }
        }
        names
    }

    pub fn has_section(&self, section: &str, subsection: Option<&str>) -> bool {
        !self.blocks(section, subsection).is_empty()
    }

    /// Distinct key names of a section in first-seen order.
    pub fn keys(&self, section: &str, subsection: Option<&str>) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for idx in self.section_entries(section, subsection) {
            if let LineKind::Entry { key, .. } = &self.lines[idx].kind {
                if !names.iter().any(|n| n.eq_ignore_ascii_case(key)) {
                    names.push(key.clone());
                }
            }
        }
        names
    }

    /// Last value of a key. A bare key reads as the empty string.
    pub fn get(&self, section: &str, subsection: Option<&str>, key: &str) -> Option<String> {
        self.raw_values(section, subsection, key)
            .pop()
            .map(Option::unwrap_or_default)
    }

    /// All values of a key in document order.
    pub fn get_list(&self, section: &str, subsection: Option<&str>, key: &str) -> Vec<String> {
        self.raw_values(section, subsection, key)
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect()
    }

    /// Boolean value of a key. A bare key is `true`, an empty value `false`.
    ///
    /// # Errors
    ///
    /// Returns the raw text when it is not a recognised boolean.
    pub fn get_bool(
        &self,
        section: &str,
        subsection: Option<&str>,
        key: &str,
    ) -> Result<Option<bool>, String> {
        match self.raw_values(section, subsection, key).pop() {
            None => Ok(None),
            Some(None) => Ok(Some(true)),
            Some(Some(v)) if v.is_empty() => Ok(Some(false)),
            Some(Some(v)) => parse_bool(&v).map(Some).ok_or(v),
        }
    }

    /// Source line number of the last occurrence of a key, if it was parsed.
    pub fn line_of(&self, section: &str, subsection: Option<&str>, key: &str) -> Option<usize> {
        self.entry_indices(section, subsection, key)
            .last()
            .map(|&idx| self.lines[idx].number)
            .filter(|&n| n > 0)
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Replace every value of `key` with `values`.
    ///
    /// Existing lines are rewritten in place (keeping their indentation and
    /// trailing comment) when their value changes, surplus lines are removed,
    /// and additional values are inserted after the last line of the key, or
    /// at the end of the section. An empty list removes the key. Setting the
    /// list it already holds leaves the document untouched.
    pub fn set_string_list(
        &mut self,
        section: &str,
        subsection: Option<&str>,
        key: &str,
        values: &[String],
    ) {
        let existing = self.entry_indices(section, subsection, key);
        let unchanged = existing.len() == values.len()
            && existing.iter().zip(values).all(|(&idx, new)| {
                matches!(&self.lines[idx].kind, LineKind::Entry { value: Some(v), .. } if v == new)
            });
        if unchanged {
            return;
        }

        let shared = existing.len().min(values.len());
        for (&idx, new) in existing.iter().zip(values) {
            let line = &mut self.lines[idx];
            if let LineKind::Entry { value, .. } = &mut line.kind {
                if value.as_deref() != Some(new.as_str()) {
                    *value = Some(new.clone());
                    line.raw = None;
                    line.newline = true;
                }
            }
        }

        for &idx in existing[shared..].iter().rev() {
            self.lines.remove(idx);
        }

        if values.len() > shared {
            let mut at = match shared {
                0 => self.append_point(section, subsection),
                n => existing[n - 1] + 1,
            };
            for value in &values[shared..] {
                self.lines.insert(
                    at,
                    Line::synthetic(LineKind::Entry {
                        key: key.to_string(),
                        value: Some(value.clone()),
                    }),
                );
                at += 1;
            }
        }
    }

    /// Set a single value, replacing any existing ones.
    pub fn set_value(&mut self, section: &str, subsection: Option<&str>, key: &str, value: &str) {
        self.set_string_list(section, subsection, key, &[value.to_string()]);
    }

    /// Set a boolean as `true`/`false`.
    pub fn set_bool(&mut self, section: &str, subsection: Option<&str>, key: &str, value: bool) {
        if self.get_bool(section, subsection, key) == Ok(Some(value)) {
            return;
        }
        self.set_value(section, subsection, key, if value { "true" } else { "false" });
    }

    /// Re-emit every line of a key with the canonical tab indent.
    pub fn reindent(&mut self, section: &str, subsection: Option<&str>, key: &str) {
        for idx in self.entry_indices(section, subsection, key) {
            let line = &mut self.lines[idx];
            line.indent.clear();
            line.raw = None;
            line.newline = true;
        }
    }

    /// Remove every value of a key.
    pub fn unset(&mut self, section: &str, subsection: Option<&str>, key: &str) {
        self.set_string_list(section, subsection, key, &[]);
    }

    /// Remove every block of a section, including its comments.
    pub fn remove_section(&mut self, section: &str, subsection: Option<&str>) {
        for (start, end) in self.blocks(section, subsection).into_iter().rev() {
            self.lines.drain(start..end);
        }
    }

    /// Make sure a header for the section exists, creating it if needed.
    pub fn ensure_section(&mut self, section: &str, subsection: Option<&str>) {
        if self.has_section(section, subsection) {
            return;
        }
        let at = self.new_section_point(section);
        self.lines.insert(
            at,
            Line::synthetic(LineKind::Header {
                section: section.to_string(),
                subsection: subsection.map(String::from),
            }),
        );
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    /// `(header, end)` index ranges for every block of a section.
    fn blocks(&self, section: &str, subsection: Option<&str>) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        let mut open: Option<usize> = None;
        for (idx, line) in self.lines.iter().enumerate() {
            if let LineKind::Header {
                section: s,
                subsection: sub,
            } = &line.kind
            {
                if let Some(start) = open.take() {
                    out.push((start, idx));
                }
                if same_section(s, sub.as_ref(), section, subsection) {
                    open = Some(idx);
                }
            }
        }
        if let Some(start) = open {
            out.push((start, self.lines.len()));
        }
        out
    }

    fn section_entries(&self, section: &str, subsection: Option<&str>) -> Vec<usize> {
        self.blocks(section, subsection)
            .into_iter()
            .flat_map(|(start, end)| start + 1..end)
            .filter(|&idx| matches!(self.lines[idx].kind, LineKind::Entry { .. }))
            .collect()
    }

    fn entry_indices(&self, section: &str, subsection: Option<&str>, key: &str) -> Vec<usize> {
        self.section_entries(section, subsection)
            .into_iter()
            .filter(|&idx| {
                matches!(&self.lines[idx].kind, LineKind::Entry { key: k, .. } if k.eq_ignore_ascii_case(key))
            })
            .collect()
    }

    fn raw_values(&self, section: &str, subsection: Option<&str>, key: &str) -> Vec<Option<String>> {
        self.entry_indices(section, subsection, key)
            .into_iter()
            .filter_map(|idx| match &self.lines[idx].kind {
                LineKind::Entry { value, .. } => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    /// Index just past the last content line of `[start, end)`.
    fn after_content(&self, start: usize, end: usize) -> usize {
        (start..end)
            .rev()
            .find(|&idx| self.lines[idx].is_content())
            .map_or(start + 1, |idx| idx + 1)
    }

    /// Where a new entry of the section goes, creating the section if needed.
    fn append_point(&mut self, section: &str, subsection: Option<&str>) -> usize {
        self.ensure_section(section, subsection);
        match self.blocks(section, subsection).last() {
            Some(&(start, end)) => self.after_content(start, end),
            None => self.lines.len(),
        }
    }

    fn rank(&self, section: &str) -> Option<usize> {
        self.order
            .iter()
            .position(|name| name.eq_ignore_ascii_case(section))
    }

    fn new_section_point(&self, section: &str) -> usize {
        let mut last_same: Option<(usize, usize)> = None;
        let mut headers: Vec<(usize, &str)> = Vec::new();
        for (idx, line) in self.lines.iter().enumerate() {
            if let LineKind::Header { section: s, .. } = &line.kind {
                headers.push((idx, s.as_str()));
            }
        }
        for (pos, &(idx, name)) in headers.iter().enumerate() {
            if name.eq_ignore_ascii_case(section) {
                let end = headers.get(pos + 1).map_or(self.lines.len(), |&(next, _)| next);
                last_same = Some((idx, end));
            }
        }
        if let Some((start, end)) = last_same {
            return self.after_content(start, end);
        }

        if let Some(rank) = self.rank(section) {
            for &(idx, name) in &headers {
                if self.rank(name).is_some_and(|other| other > rank) {
                    return idx;
                }
            }
        }
        self.lines.len()
    }
}
