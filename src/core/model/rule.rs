//! core::model::rule
//!
//! Permission rules: `[deny|block|interactive|batch] [+force] [<min>..<max>] group <Name>`.

use serde::Serialize;

use super::{ReadContext, UnparsedValues};
use crate::core::grammar::Document;
use crate::core::groups::{GroupReference, GROUP_PREFIX};

/// What a rule does for the members of its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Allow,
    Deny,
    Block,
    Interactive,
    Batch,
}

impl Action {
    fn prefix(self) -> &'static str {
        match self {
            Action::Allow => "",
            Action::Deny => "deny ",
            Action::Block => "block ",
            Action::Interactive => "interactive ",
            Action::Batch => "batch ",
        }
    }
}

/// A single rule granting (or denying) a permission to a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionRule {
    action: Action,
    force: bool,
    min: i32,
    max: i32,
    group: GroupReference,
}

impl PermissionRule {
    /// An allow rule without force or range.
    pub fn new(group: GroupReference) -> Self {
        Self {
            action: Action::Allow,
            force: false,
            min: 0,
            max: 0,
            group,
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set the score range; bounds are swapped if given in reverse.
    pub fn with_range(mut self, min: i32, max: i32) -> Self {
        self.min = min.min(max);
        self.max = min.max(max);
        self
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn force(&self) -> bool {
        self.force
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn group(&self) -> &GroupReference {
        &self.group
    }

    pub fn set_group(&mut self, group: GroupReference) {
        self.group = group;
    }

    /// Parse rule text, resolving the group name through `resolve`.
    ///
    /// # Errors
    ///
    /// Returns a reason when the range or the group part is malformed.
    ///
    /// # Example
    ///
    /// ```
    /// use projcfg::core::groups::GroupReference;
    /// use projcfg::core::model::{Action, PermissionRule};
    ///
    /// let rule = PermissionRule::parse("block +force -1..+1 group Staff", true, |name| GroupReference::unresolved(name))
    ///     .unwrap();
    /// assert_eq!(rule.action(), Action::Block);
    /// assert!(rule.force());
    /// assert_eq!((rule.min(), rule.max()), (-1, 1));
    /// assert_eq!(rule.to_config_value(true), "block +force -1..+1 group Staff");
    /// ```
    pub fn parse(
        text: &str,
        use_range: bool,
        mut resolve: impl FnMut(&str) -> GroupReference,
    ) -> Result<Self, String> {
        let mut src = text.trim();
        let mut action = Action::Allow;
        for candidate in [
            Action::Deny,
            Action::Block,
            Action::Interactive,
            Action::Batch,
        ] {
            if let Some(rest) = src.strip_prefix(candidate.prefix()) {
                action = candidate;
                src = rest.trim();
                break;
            }
        }

        let mut force = false;
        if let Some(rest) = src.strip_prefix("+force ") {
            force = true;
            src = rest.trim();
        }

        let mut range = (0, 0);
        if use_range && !src.starts_with(GROUP_PREFIX) {
            let (bounds, rest) = src
                .split_once(' ')
                .ok_or_else(|| format!("Invalid range in rule: {text}"))?;
            range = parse_range(bounds).ok_or_else(|| format!("Invalid range in rule: {text}"))?;
            src = rest.trim();
        }

        let name = GroupReference::extract_name(src)
            .ok_or_else(|| format!("Rule must include group: {text}"))?;

        Ok(Self::new(resolve(name))
            .with_action(action)
            .with_force(force)
            .with_range(range.0, range.1))
    }

    /// Render the rule; the range is written only when `use_range` and non-zero.
    pub fn to_config_value(&self, use_range: bool) -> String {
        let mut out = String::from(self.action.prefix());
        if self.force {
            out.push_str("+force ");
        }
        if use_range && (self.min != 0 || self.max != 0) {
            out.push_str(&format!(
                "{}..{} ",
                format_bound(self.min),
                format_bound(self.max)
            ));
        }
        out.push_str(&self.group.to_config_value());
        out
    }
}

fn format_bound(value: i32) -> String {
    if value >= 0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

fn parse_range(text: &str) -> Option<(i32, i32)> {
    let (min, max) = text.split_once("..")?;
    let parse = |s: &str| -> Option<i32> {
        let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        s.strip_prefix('+').unwrap_or(s).parse().ok()
    };
    Some((parse(min)?, parse(max)?))
}

/// Read every rule stored under one key, reporting the unparsable ones and
/// keeping their text.
pub(crate) fn read_rules(
    doc: &Document,
    section: &str,
    subsection: Option<&str>,
    key: &str,
    use_range: bool,
    ctx: &mut ReadContext<'_>,
) -> (Vec<PermissionRule>, UnparsedValues) {
    let mut rules = Vec::new();
    let mut unparsed = UnparsedValues::default();
    for (position, value) in doc.get_list(section, subsection, key).into_iter().enumerate() {
        let ReadContext {
            resolver,
            diagnostics,
            ..
        } = &mut *ctx;
        match PermissionRule::parse(&value, use_range, |name| {
            resolver.resolve(name, diagnostics)
        }) {
            Ok(rule) => rules.push(rule),
            Err(reason) => {
                ctx.diagnostics.error(format!(
                    "Invalid rule in {}: {reason}",
                    key_path(section, subsection, key)
                ));
                unparsed.push(position, value);
            }
        }
    }
    (rules, unparsed)
}

/// Render rules for a key, with unparsed values back at their positions.
pub(crate) fn rule_values(
    rules: &[PermissionRule],
    unparsed: &UnparsedValues,
    use_range: bool,
) -> Vec<String> {
    unparsed.merge_into(rules.iter().map(|r| r.to_config_value(use_range)).collect())
}

/// `section.sub.key` or `section.key`.
pub(crate) fn key_path(section: &str, subsection: Option<&str>, key: &str) -> String {
    match subsection {
        Some(sub) => format!("{section}.{sub}.{key}"),
        None => format!("{section}.{key}"),
    }
}
