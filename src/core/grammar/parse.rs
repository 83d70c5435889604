//! core::grammar::parse
//!
//! Line-oriented reader for the section grammar.
//!
//! Every physical line (or run of lines joined by a trailing backslash) becomes
//! exactly one [`Line`] that keeps its original text, so an unmodified document
//! renders back byte-for-byte. Lines that cannot be understood are kept as
//! [`LineKind::Invalid`] and reported, never dropped.

use super::document::{Line, LineKind};
use crate::core::validation::ValidationError;

/// A syntax problem at a 1-based physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: usize,
    pub reason: String,
}

impl SyntaxError {
    /// Attach the problem to a file in the snapshot.
    pub fn into_validation(self, file: &str) -> ValidationError {
        ValidationError::new(file, self.reason).at_line(self.line)
    }
}

/// Result of splitting a text into lines.
pub(crate) struct Parsed {
    pub lines: Vec<Line>,
    pub errors: Vec<SyntaxError>,
}

fn is_ws(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\r'
}

fn is_comment_start(s: &str) -> bool {
    s.starts_with('#') || s.starts_with(';')
}

pub(crate) fn parse_lines(text: &str) -> Parsed {
    let mut lines = Vec::new();
    let mut errors = Vec::new();

    if text.is_empty() {
        return Parsed { lines, errors };
    }

    let ends_with_newline = text.ends_with('\n');
    let body = text.strip_suffix('\n').unwrap_or(text);
    let physical: Vec<&str> = body.split('\n').collect();

    let mut seen_header = false;
    let mut i = 0;
    while i < physical.len() {
        let number = i + 1;
        let line = physical[i];
        let trimmed = line.trim_start_matches([' ', '\t']);
        let indent = line[..line.len() - trimmed.len()].to_string();

        if trimmed.trim_end_matches(is_ws).is_empty() || is_comment_start(trimmed) {
            lines.push(Line::original(LineKind::Other, line, indent, String::new(), number));
            i += 1;
            continue;
        }

        if trimmed.starts_with('[') {
            match parse_header(trimmed) {
                Ok((section, subsection, comment)) => {
                    seen_header = true;
                    let kind = LineKind::Header {
                        section,
                        subsection,
                    };
                    lines.push(Line::original(kind, line, indent, comment, number));
                }
                Err(reason) => {
                    errors.push(SyntaxError {
                        line: number,
                        reason,
                    });
                    lines.push(Line::original(
                        LineKind::Invalid,
                        line,
                        indent,
                        String::new(),
                        number,
                    ));
                }
            }
            i += 1;
            continue;
        }

        if !seen_header {
            errors.push(SyntaxError {
                line: number,
                reason: "key outside of any section".into(),
            });
            lines.push(Line::original(
                LineKind::Invalid,
                line,
                indent,
                String::new(),
                number,
            ));
            i += 1;
            continue;
        }

        match parse_entry(&physical, i, trimmed) {
            Ok(entry) => {
                let raw = physical[i..=entry.last].join("\n");
                let kind = LineKind::Entry {
                    key: entry.key,
                    value: entry.value,
                };
                lines.push(Line::original(kind, &raw, indent, entry.comment, number));
                i = entry.last + 1;
            }
            Err(reason) => {
                errors.push(SyntaxError {
                    line: number,
                    reason,
                });
                lines.push(Line::original(
                    LineKind::Invalid,
                    line,
                    indent,
                    String::new(),
                    number,
                ));
                i += 1;
            }
        }
    }

    if !ends_with_newline {
        if let Some(last) = lines.last_mut() {
            last.newline = false;
        }
    }

    Parsed { lines, errors }
}

/// Parse `[name]`, `[name "sub"]` or the legacy `[name.sub]`.
fn parse_header(text: &str) -> Result<(String, Option<String>, String), String> {
    let body = &text[1..];
    let name_len = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '.'))
        .unwrap_or(body.len());
    let name = &body[..name_len];
    if name.is_empty() {
        return Err("missing section name".into());
    }
    let rest = &body[name_len..];

    let (section, subsection, after) = if let Some(after) = rest.strip_prefix(']') {
        match name.split_once('.') {
            Some((section, sub)) if !section.is_empty() && !sub.is_empty() => {
                (section.to_string(), Some(sub.to_string()), after)
            }
            Some(_) => return Err(format!("invalid section name \"{name}\"")),
            None => (name.to_string(), None, after),
        }
    } else {
        if name.contains('.') {
            return Err(format!("invalid section name \"{name}\""));
        }
        let quoted = rest.trim_start_matches([' ', '\t']);
        if quoted.len() == rest.len() || !quoted.starts_with('"') {
            return Err("invalid section header".into());
        }
        let (sub, after) = parse_quoted_subsection(&quoted[1..])?;
        let after = after
            .strip_prefix(']')
            .ok_or_else(|| "missing ']' after subsection".to_string())?;
        (name.to_string(), Some(sub), after)
    };

    let tail = after.trim_start_matches(is_ws);
    if tail.is_empty() || is_comment_start(tail) {
        Ok((section, subsection, after.to_string()))
    } else {
        Err("unexpected text after section header".into())
    }
}

fn parse_quoted_subsection(text: &str) -> Result<(String, &str), String> {
    let mut sub = String::new();
    let mut chars = text.char_indices();
    while let Some((pos, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => sub.push(escaped),
                None => break,
            },
            '"' => return Ok((sub, &text[pos + 1..])),
            _ => sub.push(c),
        }
    }
    Err("unterminated subsection name".into())
}

struct EntryParse {
    key: String,
    value: Option<String>,
    comment: String,
    last: usize,
}

fn parse_entry(physical: &[&str], start: usize, text: &str) -> Result<EntryParse, String> {
    let key_len = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(text.len());
    let key = &text[..key_len];
    if key.is_empty() || !key.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err("invalid key name".into());
    }

    let rest = &text[key_len..];
    let after_ws = rest.trim_start_matches(is_ws);

    if after_ws.is_empty() || is_comment_start(after_ws) {
        return Ok(EntryParse {
            key: key.to_string(),
            value: None,
            comment: rest.to_string(),
            last: start,
        });
    }

    let Some(value_text) = after_ws.strip_prefix('=') else {
        return Err(format!("invalid key name \"{}\"", key.to_string() + rest.trim_end()));
    };

    let (value, comment, last) = parse_value(physical, start, value_text)?;
    Ok(EntryParse {
        key: key.to_string(),
        value: Some(value),
        comment,
        last,
    })
}

/// Decode a value, following backslash continuations onto later lines.
///
/// Returns the value, any trailing comment (with the whitespace that preceded
/// it) and the index of the last physical line consumed.
fn parse_value(
    physical: &[&str],
    start: usize,
    text: &str,
) -> Result<(String, String, usize), String> {
    let mut value = String::new();
    let mut pending = String::new();
    let mut quoted = false;
    let mut row = start;
    let mut text = text.trim_start_matches(is_ws);

    loop {
        let mut chars = text.char_indices();
        let mut continued = false;

        while let Some((pos, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    None => {
                        continued = true;
                        break;
                    }
                    Some((_, escaped)) => {
                        let decoded = match escaped {
                            'n' => '\n',
                            't' => '\t',
                            'b' => '\u{8}',
                            '\\' => '\\',
                            '"' => '"',
                            other => return Err(format!("bad escape '\\{other}'")),
                        };
                        value.push_str(&pending);
                        pending.clear();
                        value.push(decoded);
                    }
                },
                '"' => {
                    value.push_str(&pending);
                    pending.clear();
                    quoted = !quoted;
                }
                '#' | ';' if !quoted => {
                    let comment_start = pos.saturating_sub(pending.len());
                    return Ok((value, text[comment_start..].to_string(), row));
                }
                c if !quoted && is_ws(c) => pending.push(c),
                c => {
                    value.push_str(&pending);
                    pending.clear();
                    value.push(c);
                }
            }
        }

        if continued {
            row += 1;
            if row >= physical.len() {
                return Err("unexpected end of file after '\\'".into());
            }
            text = physical[row];
            continue;
        }

        if quoted {
            return Err("unterminated quoted value".into());
        }
        return Ok((value, String::new(), row));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<LineKind> {
        parse_lines(text).lines.into_iter().map(|l| l.kind).collect()
    }

    fn entry(key: &str, value: Option<&str>) -> LineKind {
        LineKind::Entry {
            key: key.into(),
            value: value.map(String::from),
        }
    }

    fn header(section: &str, subsection: Option<&str>) -> LineKind {
        LineKind::Header {
            section: section.into(),
            subsection: subsection.map(String::from),
        }
    }

    mod headers {
        use super::*;

        #[test]
        fn plain_and_quoted() {
            assert_eq!(
                kinds("[accounts]\n[access \"refs/heads/*\"]\n"),
                vec![header("accounts", None), header("access", Some("refs/heads/*"))]
            );
        }

        #[test]
        fn empty_subsection_is_distinct() {
            assert_eq!(kinds("[plugin \"\"]\n"), vec![header("plugin", Some(""))]);
        }

        #[test]
        fn legacy_dotted_form() {
            assert_eq!(kinds("[plugin.foo]\n"), vec![header("plugin", Some("foo"))]);
        }

        #[test]
        fn escaped_subsection() {
            assert_eq!(
                kinds("[label \"a\\\"b\"]\n"),
                vec![header("label", Some("a\"b"))]
            );
        }

        #[test]
        fn trailing_comment_kept() {
            let parsed = parse_lines("[accounts] # visibility\n");
            assert_eq!(parsed.lines[0].comment, " # visibility");
            assert!(parsed.errors.is_empty());
        }

        #[test]
        fn unterminated_header_is_invalid() {
            let parsed = parse_lines("[access \"refs/*\"\n");
            assert_eq!(parsed.lines[0].kind, LineKind::Invalid);
            assert_eq!(parsed.errors.len(), 1);
            assert_eq!(parsed.errors[0].line, 1);
        }
    }

    mod entries {
        use super::*;

        #[test]
        fn bare_key_has_no_value() {
            assert_eq!(
                kinds("[s]\n  enabled\n"),
                vec![header("s", None), entry("enabled", None)]
            );
        }

        #[test]
        fn empty_value_is_present() {
            assert_eq!(kinds("[s]\nk =\n")[1], entry("k", Some("")));
        }

        #[test]
        fn value_whitespace_trimmed() {
            assert_eq!(kinds("[s]\nk =   a  b   \n")[1], entry("k", Some("a  b")));
        }

        #[test]
        fn quoted_value_with_escapes() {
            assert_eq!(
                kinds("[s]\nmatch = \"(bug\\\\s+#?)(\\\\d+)\"\n")[1],
                entry("match", Some("(bug\\s+#?)(\\d+)"))
            );
        }

        #[test]
        fn comment_split_from_value() {
            let parsed = parse_lines("[s]\nk = v  ; note\n");
            assert_eq!(parsed.lines[1].kind, entry("k", Some("v")));
            assert_eq!(parsed.lines[1].comment, "  ; note");
        }

        #[test]
        fn continuation_joins_lines() {
            let parsed = parse_lines("[s]\nk = a\\\nb\nj = c\n");
            assert_eq!(parsed.lines.len(), 3);
            assert_eq!(parsed.lines[1].kind, entry("k", Some("ab")));
            assert_eq!(parsed.lines[1].raw.as_deref(), Some("k = a\\\nb"));
            assert_eq!(parsed.lines[2].number, 4);
        }

        #[test]
        fn indent_recorded() {
            let parsed = parse_lines("[s]\n \tk = v\n");
            assert_eq!(parsed.lines[1].indent, " \t");
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn key_before_section() {
            let parsed = parse_lines("k = v\n[s]\n");
            assert_eq!(parsed.lines[0].kind, LineKind::Invalid);
            assert_eq!(parsed.errors[0].reason, "key outside of any section");
        }

        #[test]
        fn bad_escape() {
            let parsed = parse_lines("[s]\nk = a\\qb\n");
            assert_eq!(parsed.lines[1].kind, LineKind::Invalid);
            assert_eq!(parsed.errors[0].line, 2);
        }

        #[test]
        fn unterminated_quote() {
            let parsed = parse_lines("[s]\nk = \"abc\n");
            assert_eq!(parsed.errors[0].reason, "unterminated quoted value");
        }

        #[test]
        fn syntax_error_message() {
            let parsed = parse_lines("[s]\n=v\n");
            let err = parsed.errors[0].clone().into_validation("project.config");
            assert_eq!(err.message(), "project.config:2: invalid key name");
        }
    }

    #[test]
    fn missing_final_newline_recorded() {
        let parsed = parse_lines("[s]\nk = v");
        assert!(parsed.lines[0].newline);
        assert!(!parsed.lines[1].newline);
    }
}
