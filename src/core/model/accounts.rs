//! core::model::accounts
//!
//! The `[accounts]` section.

use serde::Serialize;

use super::rule::{read_rules, rule_values, PermissionRule};
use super::{ConfigSection, Entries, ReadContext, UnparsedValues, ACCOUNTS};
use crate::core::grammar::Document;
use crate::core::groups::GroupReference;

const KEY_SAME_GROUP_VISIBILITY: &str = "sameGroupVisibility";

/// Account visibility settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccountsSection {
    same_group_visibility: Vec<PermissionRule>,
    #[serde(skip)]
    unparsed: UnparsedValues,
}

impl AccountsSection {
    pub(crate) fn read(doc: &Document, ctx: &mut ReadContext<'_>) -> Self {
        let (same_group_visibility, unparsed) =
            read_rules(doc, ACCOUNTS, None, KEY_SAME_GROUP_VISIBILITY, false, ctx);
        Self {
            same_group_visibility,
            unparsed,
        }
    }

    /// Rules restricting which accounts members of a group can see.
    pub fn same_group_visibility(&self) -> &[PermissionRule] {
        &self.same_group_visibility
    }

    /// Replace the rules, dropping values that failed to parse.
    pub fn set_same_group_visibility(&mut self, rules: Vec<PermissionRule>) {
        self.same_group_visibility = rules;
        self.unparsed.clear();
    }
}

impl ConfigSection for AccountsSection {
    fn section(&self) -> &'static str {
        ACCOUNTS
    }

    fn subsection(&self) -> Option<&str> {
        None
    }

    fn entries(&self) -> Entries {
        vec![(
            KEY_SAME_GROUP_VISIBILITY.to_string(),
            rule_values(&self.same_group_visibility, &self.unparsed, false),
        )]
    }

    fn referenced_groups(&self) -> Vec<&GroupReference> {
        self.same_group_visibility
            .iter()
            .map(PermissionRule::group)
            .collect()
    }
}
