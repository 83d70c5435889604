//! core::model::notify
//!
//! Notification subscriptions: `[notify "<name>"]`.

use serde::Serialize;

use super::{string_entry, ConfigSection, Entries, ReadContext, NOTIFY};
use crate::core::grammar::Document;
use crate::core::groups::GroupReference;

const KEY_EMAIL: &str = "email";
const KEY_TYPE: &str = "type";
const KEY_HEADER: &str = "header";
const KEY_FILTER: &str = "filter";

/// Events a subscription covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyType {
    NewChanges,
    NewPatchsets,
    AllComments,
    SubmittedChanges,
    AbandonedChanges,
    All,
}

impl NotifyType {
    pub const ALL: [NotifyType; 6] = [
        NotifyType::NewChanges,
        NotifyType::NewPatchsets,
        NotifyType::AllComments,
        NotifyType::SubmittedChanges,
        NotifyType::AbandonedChanges,
        NotifyType::All,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NotifyType::NewChanges => "new_changes",
            NotifyType::NewPatchsets => "new_patchsets",
            NotifyType::AllComments => "all_comments",
            NotifyType::SubmittedChanges => "submitted_changes",
            NotifyType::AbandonedChanges => "abandoned_changes",
            NotifyType::All => "all",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(&value))
    }
}

/// Which address header recipients are placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyHeader {
    To,
    Cc,
    Bcc,
}

impl NotifyHeader {
    pub fn name(self) -> &'static str {
        match self {
            NotifyHeader::To => "to",
            NotifyHeader::Cc => "cc",
            NotifyHeader::Bcc => "bcc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        [NotifyHeader::To, NotifyHeader::Cc, NotifyHeader::Bcc]
            .into_iter()
            .find(|h| h.name().eq_ignore_ascii_case(value.trim()))
    }
}

/// A recipient: a group or a plain address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum EmailTarget {
    Group(GroupReference),
    Address(String),
}

impl EmailTarget {
    fn to_config_value(&self) -> String {
        match self {
            EmailTarget::Group(group) => group.to_config_value(),
            EmailTarget::Address(address) => address.clone(),
        }
    }
}

/// Check an address of the form `user@host` or `Name <user@host>`.
pub fn is_valid_address(value: &str) -> bool {
    let value = value.trim();
    let address = match value.rfind('<') {
        Some(open) => match value[open + 1..].strip_suffix('>') {
            Some(inner) => inner,
            None => return false,
        },
        None => value,
    };
    match address.split_once('@') {
        Some((user, host)) => {
            !user.is_empty()
                && !host.is_empty()
                && !host.contains('@')
                && !address.chars().any(|c| c.is_whitespace() || c == '<' || c == '>')
        }
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotifyConfig {
    name: String,
    emails: Vec<EmailTarget>,
    types: Vec<NotifyType>,
    header: Option<NotifyHeader>,
    filter: Option<String>,
}

impl NotifyConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emails: Vec::new(),
            types: Vec::new(),
            header: None,
            filter: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn emails(&self) -> &[EmailTarget] {
        &self.emails
    }

    pub fn add_email(&mut self, target: EmailTarget) {
        self.emails.push(target);
    }

    pub fn set_emails(&mut self, targets: Vec<EmailTarget>) {
        self.emails = targets;
    }

    /// Event types; an empty list means every event.
    pub fn types(&self) -> &[NotifyType] {
        &self.types
    }

    pub fn is_notify(&self, kind: NotifyType) -> bool {
        self.types.is_empty() || self.types.contains(&NotifyType::All) || self.types.contains(&kind)
    }

    pub fn set_types(&mut self, mut types: Vec<NotifyType>) {
        types.sort();
        types.dedup();
        self.types = types;
    }

    pub fn header(&self) -> Option<NotifyHeader> {
        self.header
    }

    pub fn set_header(&mut self, header: Option<NotifyHeader>) {
        self.header = header;
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn set_filter(&mut self, filter: Option<String>) {
        self.filter = filter;
    }
}

impl ConfigSection for NotifyConfig {
    fn section(&self) -> &'static str {
        NOTIFY
    }

    fn subsection(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn entries(&self) -> Entries {
        let types = if self.types.is_empty() || self.types == [NotifyType::All] {
            Vec::new()
        } else {
            self.types.iter().map(|t| t.name().to_string()).collect()
        };
        vec![
            (
                KEY_EMAIL.to_string(),
                self.emails.iter().map(EmailTarget::to_config_value).collect(),
            ),
            (KEY_TYPE.to_string(), types),
            (
                KEY_HEADER.to_string(),
                self.header.iter().map(|h| h.name().to_string()).collect(),
            ),
            string_entry(KEY_FILTER, self.filter.as_deref()),
        ]
    }

    fn referenced_groups(&self) -> Vec<&GroupReference> {
        self.emails
            .iter()
            .filter_map(|e| match e {
                EmailTarget::Group(group) => Some(group),
                EmailTarget::Address(_) => None,
            })
            .collect()
    }
}

pub(crate) fn read_all(doc: &Document, ctx: &mut ReadContext<'_>) -> Vec<NotifyConfig> {
    doc.subsections(NOTIFY)
        .into_iter()
        .map(|name| read_one(doc, name, ctx))
        .collect()
}

fn read_one(doc: &Document, name: String, ctx: &mut ReadContext<'_>) -> NotifyConfig {
    let sub = Some(name.as_str());
    let mut config = NotifyConfig::new(name.clone());
    config.filter = doc.get(NOTIFY, sub, KEY_FILTER).filter(|f| !f.is_empty());

    let mut types = Vec::new();
    for raw in doc.get_list(NOTIFY, sub, KEY_TYPE) {
        match NotifyType::parse(&raw) {
            Some(kind) => types.push(kind),
            None => ctx.diagnostics.error(format!(
                "notify section \"{name}\" has invalid type \"{raw}\""
            )),
        }
    }
    config.set_types(types);

    if let Some(raw) = doc.get(NOTIFY, sub, KEY_HEADER) {
        match NotifyHeader::parse(&raw) {
            Some(header) => config.header = Some(header),
            None => ctx.diagnostics.error(format!(
                "notify section \"{name}\" has invalid header \"{raw}\""
            )),
        }
    }

    for dst in doc.get_list(NOTIFY, sub, KEY_EMAIL) {
        if let Some(group) = GroupReference::extract_name(&dst) {
            let group = ctx.resolver.resolve(group, &mut ctx.diagnostics);
            config.emails.push(EmailTarget::Group(group));
        } else if dst.starts_with("user ") {
            ctx.diagnostics.error(format!("{dst} not supported"));
        } else if is_valid_address(&dst) {
            config.emails.push(EmailTarget::Address(dst));
        } else {
            ctx.diagnostics.error(format!(
                "notify section \"{name}\" has invalid email \"{dst}\""
            ));
        }
    }

    config
}
