//! core::grammar::escape
//!
//! Canonical quoting for values and subsection names, plus boolean parsing.

/// Escape a value for emission on the right-hand side of `key = value`.
///
/// Quotes are added only when the value would otherwise change meaning on
/// re-read: leading or trailing spaces, or a comment character.
///
/// # Example
///
/// ```
/// use projcfg::core::grammar::escape_value;
///
/// assert_eq!(escape_value("group Developers"), "group Developers");
/// assert_eq!(escape_value(" padded"), "\" padded\"");
/// assert_eq!(escape_value("a#b"), "\"a#b\"");
/// assert_eq!(escape_value("(bug\\s+)"), "(bug\\\\s+)");
/// ```
pub fn escape_value(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    let mut need_quote = value.starts_with(' ') || value.ends_with(' ');
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '#' | ';' => {
                need_quote = true;
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    if need_quote {
        format!("\"{out}\"")
    } else {
        out
    }
}

/// Escape a subsection name for use inside `[section "..."]`.
pub fn escape_subsection(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

/// Interpret a configuration boolean.
///
/// Accepts `true/yes/on/1` and `false/no/off/0`, case-insensitively.
///
/// ```
/// use projcfg::core::grammar::parse_bool;
///
/// assert_eq!(parse_bool("Yes"), Some(true));
/// assert_eq!(parse_bool("off"), Some(false));
/// assert_eq!(parse_bool("maybe"), None);
/// ```
pub fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    for t in ["true", "yes", "on", "1"] {
        if value.eq_ignore_ascii_case(t) {
            return Some(true);
        }
    }
    for f in ["false", "no", "off", "0"] {
        if value.eq_ignore_ascii_case(f) {
            return Some(false);
        }
    }
    None
}
