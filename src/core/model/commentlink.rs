//! core::model::commentlink
//!
//! Comment-link rules: `[commentlink "<name>"]`.
//!
//! A section is one of four exclusive shapes: a pattern rewritten to a link,
//! a pattern rewritten to raw html, or a bare `enabled` marker that switches an
//! inherited rule on or off. Sections that fit none of them are reported and
//! left out of the model.

use regex::Regex;
use serde::Serialize;

use super::{ConfigSection, Entries, ReadContext, COMMENTLINK};
use crate::core::grammar::Document;

const KEY_MATCH: &str = "match";
const KEY_LINK: &str = "link";
const KEY_HTML: &str = "html";
const KEY_ENABLED: &str = "enabled";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CommentLink {
    Link {
        name: String,
        pattern: String,
        link: String,
        enabled: Option<bool>,
    },
    Html {
        name: String,
        pattern: String,
        html: String,
        enabled: Option<bool>,
    },
    Enabled {
        name: String,
    },
    Disabled {
        name: String,
    },
}

/// Why a comment link could not be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentLinkError {
    /// The pattern does not compile; carries the engine's diagnostic.
    Pattern(String),
    /// The combination of keys is not allowed.
    Invalid(String),
}

impl CommentLink {
    pub fn link(name: impl Into<String>, pattern: impl Into<String>, link: impl Into<String>) -> Self {
        CommentLink::Link {
            name: name.into(),
            pattern: pattern.into(),
            link: link.into(),
            enabled: None,
        }
    }

    pub fn html(name: impl Into<String>, pattern: impl Into<String>, html: impl Into<String>) -> Self {
        CommentLink::Html {
            name: name.into(),
            pattern: pattern.into(),
            html: html.into(),
            enabled: None,
        }
    }

    /// Build from raw keys, applying the same checks as the read pass.
    ///
    /// # Errors
    ///
    /// [`CommentLinkError::Pattern`] when `pattern` does not compile,
    /// [`CommentLinkError::Invalid`] for disallowed html or a missing
    /// link/html companion.
    ///
    /// ```
    /// use projcfg::core::model::CommentLink;
    ///
    /// let marker = CommentLink::build("bugzilla", None, None, None, Some(false), false).unwrap();
    /// assert_eq!(marker, CommentLink::Disabled { name: "bugzilla".into() });
    ///
    /// let err = CommentLink::build("x", Some("a"), None, Some("<b>"), None, false);
    /// assert!(err.is_err());
    /// ```
    pub fn build(
        name: &str,
        pattern: Option<&str>,
        link: Option<&str>,
        html: Option<&str>,
        enabled: Option<bool>,
        allow_raw_html: bool,
    ) -> Result<Self, CommentLinkError> {
        let pattern = pattern.filter(|p| !p.is_empty());
        let link = link.filter(|l| !l.is_empty());
        let html = html.filter(|h| !h.is_empty());

        if let Some(pattern) = pattern {
            Regex::new(pattern).map_err(|e| CommentLinkError::Pattern(e.to_string()))?;
        }
        if html.is_some() && !allow_raw_html {
            return Err(CommentLinkError::Invalid(
                "Raw html replacement not allowed".into(),
            ));
        }

        match (pattern, link, html, enabled) {
            (None, None, None, Some(true)) => Ok(CommentLink::Enabled { name: name.into() }),
            (None, None, None, Some(false)) => Ok(CommentLink::Disabled { name: name.into() }),
            (None, _, _, _) => Err(CommentLinkError::Invalid("invalid match".into())),
            (Some(pattern), Some(link), None, enabled) => Ok(CommentLink::Link {
                name: name.into(),
                pattern: pattern.into(),
                link: link.into(),
                enabled,
            }),
            (Some(pattern), None, Some(html), enabled) => Ok(CommentLink::Html {
                name: name.into(),
                pattern: pattern.into(),
                html: html.into(),
                enabled,
            }),
            (Some(_), _, _, _) => Err(CommentLinkError::Invalid(format!(
                "{COMMENTLINK}.{name} must have either link or html"
            ))),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CommentLink::Link { name, .. }
            | CommentLink::Html { name, .. }
            | CommentLink::Enabled { name }
            | CommentLink::Disabled { name } => name,
        }
    }

    pub fn pattern(&self) -> Option<&str> {
        match self {
            CommentLink::Link { pattern, .. } | CommentLink::Html { pattern, .. } => Some(pattern),
            _ => None,
        }
    }

    /// Whether the rule is active.
    pub fn is_enabled(&self) -> bool {
        match self {
            CommentLink::Link { enabled, .. } | CommentLink::Html { enabled, .. } => {
                enabled.unwrap_or(true)
            }
            CommentLink::Enabled { .. } => true,
            CommentLink::Disabled { .. } => false,
        }
    }

    /// Set `enabled` on a pattern rule; markers are unaffected.
    pub fn with_enabled(mut self, value: bool) -> Self {
        if let CommentLink::Link { enabled, .. } | CommentLink::Html { enabled, .. } = &mut self {
            *enabled = Some(value);
        }
        self
    }
}

impl ConfigSection for CommentLink {
    fn section(&self) -> &'static str {
        COMMENTLINK
    }

    fn subsection(&self) -> Option<&str> {
        Some(self.name())
    }

    fn entries(&self) -> Entries {
        let (pattern, html, link, enabled) = match self {
            CommentLink::Link {
                pattern,
                link,
                enabled,
                ..
            } => (vec![pattern.clone()], vec![], vec![link.clone()], *enabled),
            CommentLink::Html {
                pattern,
                html,
                enabled,
                ..
            } => (vec![pattern.clone()], vec![html.clone()], vec![], *enabled),
            CommentLink::Enabled { .. } => (vec![], vec![], vec![], None),
            CommentLink::Disabled { .. } => (vec![], vec![], vec![], Some(false)),
        };
        let enabled = match (self, enabled) {
            (CommentLink::Enabled { .. }, _) => vec!["true".to_string()],
            (_, Some(false)) => vec!["false".to_string()],
            _ => vec![],
        };
        vec![
            (KEY_MATCH.to_string(), pattern),
            (KEY_HTML.to_string(), html),
            (KEY_LINK.to_string(), link),
            (KEY_ENABLED.to_string(), enabled),
        ]
    }
}

pub(crate) fn read_all(doc: &Document, ctx: &mut ReadContext<'_>) -> Vec<CommentLink> {
    let mut links = Vec::new();
    for name in doc.subsections(COMMENTLINK) {
        let sub = Some(name.as_str());
        let pattern = doc.get(COMMENTLINK, sub, KEY_MATCH);
        let link = doc.get(COMMENTLINK, sub, KEY_LINK);
        let html = doc.get(COMMENTLINK, sub, KEY_HTML);
        let enabled = match doc.get_bool(COMMENTLINK, sub, KEY_ENABLED) {
            Ok(enabled) => enabled,
            Err(_) => Some(true),
        };

        let built = CommentLink::build(
            &name,
            pattern.as_deref(),
            link.as_deref(),
            html.as_deref(),
            enabled,
            ctx.options.allow_raw_html,
        );
        let shown = pattern.unwrap_or_default();
        match built {
            Ok(comment_link) => links.push(comment_link),
            Err(CommentLinkError::Pattern(message)) => ctx.diagnostics.error(format!(
                "Invalid pattern \"{shown}\" in {COMMENTLINK}.{name}.{KEY_MATCH}: {message}"
            )),
            Err(CommentLinkError::Invalid(message)) => ctx.diagnostics.error(format!(
                "Error in pattern \"{shown}\" in {COMMENTLINK}.{name}.{KEY_MATCH}: {message}"
            )),
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    mod build {
        use super::*;

        #[test]
        fn link_shape() {
            let link = CommentLink::build("b", Some("(bug)"), Some("http://x/$1"), None, None, false)
                .unwrap();
            assert_eq!(link, CommentLink::link("b", "(bug)", "http://x/$1"));
            assert!(link.is_enabled());
        }

        #[test]
        fn html_needs_permission() {
            let err = CommentLink::build("b", Some("a"), None, Some("<a>"), None, false).unwrap_err();
            assert_eq!(
                err,
                CommentLinkError::Invalid("Raw html replacement not allowed".into())
            );
            let ok = CommentLink::build("b", Some("a"), None, Some("<a>"), None, true).unwrap();
            assert_eq!(ok, CommentLink::html("b", "a", "<a>"));
        }

        #[test]
        fn both_link_and_html_rejected() {
            let err = CommentLink::build("b", Some("a"), Some("l"), Some("h"), None, true).unwrap_err();
            assert_eq!(
                err,
                CommentLinkError::Invalid("commentlink.b must have either link or html".into())
            );
        }

        #[test]
        fn empty_section_rejected() {
            let err = CommentLink::build("b", None, None, None, None, false).unwrap_err();
            assert_eq!(err, CommentLinkError::Invalid("invalid match".into()));
        }

        #[test]
        fn bad_pattern_checked_first() {
            let err = CommentLink::build("b", Some("(bugs{+#?)(d+)"), None, Some("h"), None, false)
                .unwrap_err();
            assert!(matches!(err, CommentLinkError::Pattern(msg) if msg.contains('^')));
        }
    }

    mod entries {
        use super::*;

        fn written(link: &CommentLink) -> Vec<(String, Vec<String>)> {
            link.entries().into_iter().filter(|(_, v)| !v.is_empty()).collect()
        }

        #[test]
        fn html_written_after_match() {
            let link = CommentLink::html("Test", "abc.*", "<a>link</a>");
            assert_eq!(
                written(&link),
                vec![
                    ("match".to_string(), vec!["abc.*".to_string()]),
                    ("html".to_string(), vec!["<a>link</a>".to_string()]),
                ]
            );
        }

        #[test]
        fn disabled_pattern_writes_enabled_false() {
            let link = CommentLink::link("T", "x", "y").with_enabled(false);
            assert_eq!(written(&link).last().unwrap().1, vec!["false".to_string()]);
            assert!(!link.is_enabled());
        }

        #[test]
        fn markers_write_enabled_only() {
            let on = CommentLink::Enabled { name: "T".into() };
            assert_eq!(written(&on), vec![("enabled".to_string(), vec!["true".to_string()])]);
            let off = CommentLink::Disabled { name: "T".into() };
            assert_eq!(written(&off), vec![("enabled".to_string(), vec!["false".to_string()])]);
        }
    }
}
