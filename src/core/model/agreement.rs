//! core::model::agreement
//!
//! Contributor agreements: `[contributor-agreement "<name>"]`.

use serde::Serialize;

use super::rule::{key_path, read_rules, rule_values, Action, PermissionRule};
use super::{
    string_entry, ConfigSection, Entries, ReadContext, UnparsedValues, CONTRIBUTOR_AGREEMENT,
};
use crate::core::grammar::Document;
use crate::core::groups::GroupReference;

const KEY_DESCRIPTION: &str = "description";
const KEY_AGREEMENT_URL: &str = "agreementUrl";
const KEY_AUTO_VERIFY: &str = "autoVerify";
const KEY_ACCEPTED: &str = "accepted";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributorAgreement {
    name: String,
    description: Option<String>,
    agreement_url: Option<String>,
    accepted: Vec<PermissionRule>,
    #[serde(skip)]
    unparsed_accepted: UnparsedValues,
    auto_verify: Option<GroupReference>,
}

impl ContributorAgreement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            agreement_url: None,
            accepted: Vec::new(),
            unparsed_accepted: UnparsedValues::default(),
            auto_verify: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn agreement_url(&self) -> Option<&str> {
        self.agreement_url.as_deref()
    }

    pub fn set_agreement_url(&mut self, url: Option<String>) {
        self.agreement_url = url;
    }

    /// Groups whose members are considered to have accepted the agreement.
    pub fn accepted(&self) -> &[PermissionRule] {
        &self.accepted
    }

    pub fn set_accepted(&mut self, rules: Vec<PermissionRule>) {
        self.accepted = rules;
        self.unparsed_accepted.clear();
    }

    /// Group new signers are added to automatically.
    pub fn auto_verify(&self) -> Option<&GroupReference> {
        self.auto_verify.as_ref()
    }

    pub fn set_auto_verify(&mut self, group: Option<GroupReference>) {
        self.auto_verify = group;
    }
}

impl ConfigSection for ContributorAgreement {
    fn section(&self) -> &'static str {
        CONTRIBUTOR_AGREEMENT
    }

    fn subsection(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn entries(&self) -> Entries {
        vec![
            string_entry(KEY_DESCRIPTION, self.description.as_deref()),
            string_entry(KEY_AGREEMENT_URL, self.agreement_url.as_deref()),
            (
                KEY_AUTO_VERIFY.to_string(),
                self.auto_verify
                    .iter()
                    .map(GroupReference::to_config_value)
                    .collect(),
            ),
            (
                KEY_ACCEPTED.to_string(),
                rule_values(&self.accepted, &self.unparsed_accepted, false),
            ),
        ]
    }

    fn referenced_groups(&self) -> Vec<&GroupReference> {
        self.accepted
            .iter()
            .map(PermissionRule::group)
            .chain(self.auto_verify.iter())
            .collect()
    }
}

pub(crate) fn read_all(doc: &Document, ctx: &mut ReadContext<'_>) -> Vec<ContributorAgreement> {
    doc.subsections(CONTRIBUTOR_AGREEMENT)
        .into_iter()
        .map(|name| read_one(doc, name, ctx))
        .collect()
}

fn read_one(doc: &Document, name: String, ctx: &mut ReadContext<'_>) -> ContributorAgreement {
    let sub = Some(name.as_str());
    let mut agreement = ContributorAgreement::new(name.clone());
    agreement.description = doc.get(CONTRIBUTOR_AGREEMENT, sub, KEY_DESCRIPTION);
    agreement.agreement_url = doc.get(CONTRIBUTOR_AGREEMENT, sub, KEY_AGREEMENT_URL);
    (agreement.accepted, agreement.unparsed_accepted) =
        read_rules(doc, CONTRIBUTOR_AGREEMENT, sub, KEY_ACCEPTED, false, ctx);

    let (mut auto_verify, _) =
        read_rules(doc, CONTRIBUTOR_AGREEMENT, sub, KEY_AUTO_VERIFY, false, ctx);
    let path = key_path(CONTRIBUTOR_AGREEMENT, sub, KEY_AUTO_VERIFY);
    match auto_verify.len() {
        0 => {}
        1 if auto_verify[0].action() == Action::Allow => {
            agreement.auto_verify = auto_verify.pop().map(|r| r.group().clone());
        }
        1 => ctx
            .diagnostics
            .error(format!("Invalid rule in {path}: the group must be an allow rule")),
        _ => ctx
            .diagnostics
            .error(format!("Invalid rule in {path}: at most one group may be set")),
    }

    agreement
}
