//! core::model
//!
//! Typed views over the section grammar.
//!
//! # Modules
//!
//! - [`rule`] - Permission rules shared by several sections
//! - [`access`] - Access sections, permissions, global capabilities, `inheritFrom`
//! - [`accounts`] - The `[accounts]` section
//! - [`agreement`] - Contributor agreements
//! - [`label`] - Label definitions
//! - [`commentlink`] - Comment-link rules
//! - [`notify`] - Notification subscriptions
//! - [`plugin`] - Per-plugin key/value bags
//! - [`options`] - Receive, submit and project options
//!
//! # Architecture
//!
//! Every entity is read by a pure builder that takes the parsed
//! [`Document`](crate::core::grammar::Document) and a [`ReadContext`] (group
//! resolution plus an error sink). For writing, every entity describes itself
//! as a [`ConfigSection`]: a section address plus the list of values each key
//! should hold. The serializer compares those lists against the entity read
//! from the same text and touches only keys that differ, which keeps untouched
//! text byte-identical.

pub mod access;
pub mod accounts;
pub mod agreement;
pub mod commentlink;
pub mod label;
pub mod notify;
pub mod options;
pub mod plugin;
pub mod rule;

pub use access::{AccessSection, Inheritance, Permission, GLOBAL_CAPABILITIES};
pub use accounts::AccountsSection;
pub use agreement::ContributorAgreement;
pub use commentlink::CommentLink;
pub use label::{LabelFunction, LabelType, LabelValue};
pub use notify::{EmailTarget, NotifyConfig, NotifyHeader, NotifyType};
pub use options::{
    InheritableBoolean, ProjectOptions, ProjectState, ReceiveFlags, ReceiveOptions, SubmitFlags,
    SubmitOptions, SubmitType,
};
pub use plugin::PluginConfig;
pub use rule::{Action, PermissionRule};

use serde::Serialize;

use crate::core::grammar::Document;
use crate::core::groups::{GroupReference, GroupResolver};
use crate::core::validation::Diagnostics;

pub const ACCESS: &str = "access";
pub const ACCOUNTS: &str = "accounts";
pub const CONTRIBUTOR_AGREEMENT: &str = "contributor-agreement";
pub const NOTIFY: &str = "notify";
pub const LABEL: &str = "label";
pub const REMOVED_LABEL: &str = "removed-label";
pub const COMMENTLINK: &str = "commentlink";
pub const PLUGIN: &str = "plugin";
pub const CAPABILITY: &str = "capability";
pub const RECEIVE: &str = "receive";
pub const SUBMIT: &str = "submit";
pub const PROJECT: &str = "project";

/// Canonical section order for newly created sections.
pub const SECTION_ORDER: &[&str] = &[
    ACCESS,
    ACCOUNTS,
    CONTRIBUTOR_AGREEMENT,
    NOTIFY,
    LABEL,
    REMOVED_LABEL,
    COMMENTLINK,
    PLUGIN,
    CAPABILITY,
    RECEIVE,
    SUBMIT,
    PROJECT,
];

/// Key and the values it should hold, in write order.
pub type Entries = Vec<(String, Vec<String>)>;

/// An entity that maps onto one section of the grammar.
pub trait ConfigSection {
    fn section(&self) -> &'static str;

    fn subsection(&self) -> Option<&str>;

    /// Every key this entity owns with its desired values. An empty list
    /// means the key should be absent.
    fn entries(&self) -> Entries;

    /// Older spellings of `key` that must be removed when `key` is rewritten.
    fn aliases(&self, _key: &str) -> Vec<&'static str> {
        Vec::new()
    }

    /// Whether every line of a changed key is re-emitted with the canonical
    /// indent instead of keeping the indent it was read with.
    fn reindents_changed_keys(&self) -> bool {
        false
    }

    /// Groups referenced by this entity.
    fn referenced_groups(&self) -> Vec<&GroupReference> {
        Vec::new()
    }
}

/// Values of one key that failed to parse, kept with their position among
/// that key's values so they are written back where they were read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnparsedValues(Vec<(usize, String)>);

impl UnparsedValues {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Raw text of every unparsed value in read order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(_, raw)| raw.as_str())
    }

    pub(crate) fn push(&mut self, position: usize, raw: String) {
        self.0.push((position, raw));
    }

    /// Append another key's unparsed values, shifting their positions past
    /// the `offset` values already held.
    pub(crate) fn extend_after(&mut self, offset: usize, other: UnparsedValues) {
        self.0
            .extend(other.0.into_iter().map(|(pos, raw)| (pos + offset, raw)));
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Splice the unparsed values into `values` at their read positions.
    pub(crate) fn merge_into(&self, mut values: Vec<String>) -> Vec<String> {
        for (pos, raw) in &self.0 {
            let at = (*pos).min(values.len());
            values.insert(at, raw.clone());
        }
        values
    }
}

/// Caller-supplied knobs for the read pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Accept comment links with an `html` replacement.
    pub allow_raw_html: bool,
}

/// State threaded through the builders during one read pass.
pub struct ReadContext<'a> {
    pub resolver: GroupResolver<'a>,
    pub diagnostics: Diagnostics,
    pub options: ReadOptions,
}

/// The typed working copy of a `project.config`.
#[derive(Debug, Clone, Serialize)]
pub struct Model {
    pub project: ProjectOptions,
    pub inheritance: Inheritance,
    pub access_sections: Vec<AccessSection>,
    pub capability: AccessSection,
    pub accounts: AccountsSection,
    pub agreements: Vec<ContributorAgreement>,
    pub notify: Vec<NotifyConfig>,
    pub labels: Vec<LabelType>,
    pub comment_links: Vec<CommentLink>,
    pub plugins: Vec<PluginConfig>,
    pub receive: ReceiveOptions,
    pub submit: SubmitOptions,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            project: ProjectOptions::default(),
            inheritance: Inheritance::default(),
            access_sections: Vec::new(),
            capability: AccessSection::new(GLOBAL_CAPABILITIES),
            accounts: AccountsSection::default(),
            agreements: Vec::new(),
            notify: Vec::new(),
            labels: Vec::new(),
            comment_links: Vec::new(),
            plugins: Vec::new(),
            receive: ReceiveOptions::default(),
            submit: SubmitOptions::default(),
        }
    }
}

impl Model {
    /// Run every builder over `doc`.
    pub(crate) fn read(doc: &Document, ctx: &mut ReadContext<'_>) -> Self {
        Self {
            project: ProjectOptions::read(doc, ctx),
            accounts: AccountsSection::read(doc, ctx),
            agreements: agreement::read_all(doc, ctx),
            inheritance: Inheritance::read(doc),
            access_sections: access::read_all(doc, ctx),
            capability: access::read_capability(doc, ctx),
            notify: notify::read_all(doc, ctx),
            labels: label::read_all(doc, ctx),
            comment_links: commentlink::read_all(doc, ctx),
            plugins: plugin::read_all(doc, ctx),
            receive: ReceiveOptions::read(doc, ctx),
            submit: SubmitOptions::read(doc, ctx),
        }
    }

    /// All entities in canonical write order.
    pub fn sections(&self) -> Vec<&dyn ConfigSection> {
        let mut out: Vec<&dyn ConfigSection> = Vec::new();
        out.push(&self.inheritance);
        out.extend(self.access_sections.iter().map(|s| s as &dyn ConfigSection));
        out.push(&self.accounts);
        out.extend(self.agreements.iter().map(|s| s as &dyn ConfigSection));
        out.extend(self.notify.iter().map(|s| s as &dyn ConfigSection));
        out.extend(self.labels.iter().map(|s| s as &dyn ConfigSection));
        out.extend(self.comment_links.iter().map(|s| s as &dyn ConfigSection));
        out.extend(self.plugins.iter().map(|s| s as &dyn ConfigSection));
        out.push(&self.capability);
        out.push(&self.receive);
        out.push(&self.submit);
        out.push(&self.project);
        out
    }

    /// Every group referenced anywhere in the model.
    pub fn referenced_groups(&self) -> Vec<&GroupReference> {
        self.sections()
            .into_iter()
            .flat_map(|s| s.referenced_groups())
            .collect()
    }
}

/// Render a label score the way values are written: `+1`, `0`, `-1`.
pub fn format_score(score: i16) -> String {
    if score > 0 {
        format!("+{score}")
    } else {
        score.to_string()
    }
}

/// Entry helper for a boolean stored only when it differs from its default.
pub(crate) fn flag_entry(key: &str, value: bool, default: bool) -> (String, Vec<String>) {
    let values = if value == default {
        Vec::new()
    } else {
        vec![value.to_string()]
    };
    (key.to_string(), values)
}

/// Entry helper for an optional string.
pub(crate) fn string_entry(key: &str, value: Option<&str>) -> (String, Vec<String>) {
    (
        key.to_string(),
        value
            .filter(|v| !v.is_empty())
            .map(|v| vec![v.to_string()])
            .unwrap_or_default(),
    )
}

/// Read a boolean, reporting unrecognised text and falling back to `default`.
pub(crate) fn read_flag(
    doc: &Document,
    section: &str,
    subsection: Option<&str>,
    key: &str,
    default: bool,
    ctx: &mut ReadContext<'_>,
) -> bool {
    match doc.get_bool(section, subsection, key) {
        Ok(value) => value.unwrap_or(default),
        Err(raw) => {
            ctx.diagnostics.error(format!(
                "Invalid value \"{raw}\" for {}",
                rule::key_path(section, subsection, key)
            ));
            default
        }
    }
}
