//! core::project
//!
//! The `project.config` working copy.
//!
//! # Architecture
//!
//! [`ProjectConfig::read`] parses the configuration text and the group table
//! once, runs every model builder, and keeps two copies of the result: the
//! baseline (what the text says) and the working copy (what the caller
//! edits). [`ProjectConfig::render`] diffs the two per entity and per key and
//! applies only the differences to a copy of the parsed document, so text the
//! caller did not touch is reproduced byte for byte.
//!
//! # Example
//!
//! ```
//! use projcfg::core::model::{LabelType, LabelValue, ReadOptions};
//! use projcfg::core::project::ProjectConfig;
//!
//! let mut config = ProjectConfig::read(None, None, ReadOptions::default());
//! config.put_label(LabelType::new(
//!     "Verified",
//!     vec![LabelValue::new(-1, "Fails"), LabelValue::new(1, "Works")],
//! ));
//! let rendered = config.render();
//! assert!(rendered.config_text.contains("function = MaxWithBlock"));
//! ```

mod read;
mod write;

pub use write::Rendered;

use crate::core::groups::{GroupList, GroupReference};
use crate::core::model::{
    AccessSection, AccountsSection, CommentLink, ContributorAgreement, LabelType, Model,
    NotifyConfig, PluginConfig, ProjectOptions, ReadOptions, ReceiveOptions, SubmitOptions,
    GLOBAL_CAPABILITIES,
};
use crate::core::grammar::Document;
use crate::core::validation::ValidationError;

/// A parsed project configuration plus its editable typed model.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    document: Document,
    groups: GroupList,
    groups_text: Option<String>,
    baseline: Model,
    working: Model,
    errors: Vec<ValidationError>,
}

impl ProjectConfig {
    /// Parse `project.config` and the group table.
    ///
    /// Never fails. Problems are collected and available from
    /// [`validation_errors`](Self::validation_errors); the model holds
    /// everything that could be read.
    pub fn read(config_text: Option<&str>, groups_text: Option<&str>, options: ReadOptions) -> Self {
        read::read(config_text, groups_text, options)
    }

    /// Errors found while reading, in document order per builder.
    pub fn validation_errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// The group table as read.
    pub fn group_list(&self) -> &GroupList {
        &self.groups
    }

    pub fn model(&self) -> &Model {
        &self.working
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.working
    }

    /// Render the working copy. See [`Rendered`].
    pub fn render(&self) -> Rendered {
        write::render(self)
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// Canonical form of `group` according to the group table.
    ///
    /// A reference whose UUID is in the table comes back with the table's
    /// name; anything else is returned unchanged.
    pub fn resolve(&self, group: &GroupReference) -> GroupReference {
        group
            .uuid()
            .and_then(|uuid| self.groups.by_uuid(uuid))
            .cloned()
            .unwrap_or_else(|| group.clone())
    }

    /// Look a group up by display name.
    pub fn group_by_name(&self, name: &str) -> Option<&GroupReference> {
        self.groups.by_name(name)
    }

    // =========================================================================
    // Access
    // =========================================================================

    pub fn inherit_from(&self) -> Option<&str> {
        self.working.inheritance.parent.as_deref()
    }

    pub fn set_inherit_from(&mut self, parent: Option<String>) {
        self.working.inheritance.parent = parent.filter(|p| !p.trim().is_empty());
    }

    pub fn access_sections(&self) -> &[AccessSection] {
        &self.working.access_sections
    }

    /// An access section by ref pattern; [`GLOBAL_CAPABILITIES`] names the
    /// `[capability]` section.
    pub fn access_section(&self, name: &str) -> Option<&AccessSection> {
        if name == GLOBAL_CAPABILITIES {
            return Some(&self.working.capability);
        }
        self.working
            .access_sections
            .iter()
            .find(|s| s.name() == name)
    }

    /// An access section, created empty when missing.
    pub fn access_section_mut(&mut self, name: &str) -> &mut AccessSection {
        if name == GLOBAL_CAPABILITIES {
            return &mut self.working.capability;
        }
        let sections = &mut self.working.access_sections;
        let idx = match sections.iter().position(|s| s.name() == name) {
            Some(idx) => idx,
            None => {
                sections.push(AccessSection::new(name));
                sections.len() - 1
            }
        };
        &mut sections[idx]
    }

    pub fn remove_access_section(&mut self, name: &str) {
        if name == GLOBAL_CAPABILITIES {
            self.working.capability = AccessSection::new(GLOBAL_CAPABILITIES);
            return;
        }
        self.working.access_sections.retain(|s| s.name() != name);
    }

    pub fn accounts(&self) -> &AccountsSection {
        &self.working.accounts
    }

    pub fn accounts_mut(&mut self) -> &mut AccountsSection {
        &mut self.working.accounts
    }

    // =========================================================================
    // Contributor agreements
    // =========================================================================

    pub fn contributor_agreements(&self) -> &[ContributorAgreement] {
        &self.working.agreements
    }

    pub fn contributor_agreement(&self, name: &str) -> Option<&ContributorAgreement> {
        self.working.agreements.iter().find(|a| a.name() == name)
    }

    /// Insert or replace an agreement by name.
    pub fn put_contributor_agreement(&mut self, agreement: ContributorAgreement) {
        upsert(&mut self.working.agreements, agreement, |a| a.name().to_string());
    }

    pub fn remove_contributor_agreement(&mut self, name: &str) {
        self.working.agreements.retain(|a| a.name() != name);
    }

    // =========================================================================
    // Notify
    // =========================================================================

    pub fn notify_configs(&self) -> &[NotifyConfig] {
        &self.working.notify
    }

    pub fn notify_config(&self, name: &str) -> Option<&NotifyConfig> {
        self.working.notify.iter().find(|n| n.name() == name)
    }

    pub fn put_notify_config(&mut self, config: NotifyConfig) {
        upsert(&mut self.working.notify, config, |n| n.name().to_string());
    }

    pub fn remove_notify_config(&mut self, name: &str) {
        self.working.notify.retain(|n| n.name() != name);
    }

    // =========================================================================
    // Labels
    // =========================================================================

    pub fn labels(&self) -> &[LabelType] {
        &self.working.labels
    }

    pub fn label(&self, name: &str) -> Option<&LabelType> {
        self.working.labels.iter().find(|l| l.name() == name)
    }

    pub fn label_mut(&mut self, name: &str) -> Option<&mut LabelType> {
        self.working.labels.iter_mut().find(|l| l.name() == name)
    }

    /// Insert or replace a label by name. Replacing keeps its position.
    pub fn put_label(&mut self, label: LabelType) {
        upsert(&mut self.working.labels, label, |l| l.name().to_string());
    }

    pub fn remove_label(&mut self, name: &str) {
        self.working.labels.retain(|l| l.name() != name);
    }

    // =========================================================================
    // Comment links
    // =========================================================================

    pub fn comment_links(&self) -> &[CommentLink] {
        &self.working.comment_links
    }

    pub fn comment_link(&self, name: &str) -> Option<&CommentLink> {
        self.working.comment_links.iter().find(|c| c.name() == name)
    }

    pub fn add_comment_link(&mut self, link: CommentLink) {
        upsert(&mut self.working.comment_links, link, |c| c.name().to_string());
    }

    pub fn remove_comment_link(&mut self, name: &str) {
        self.working.comment_links.retain(|c| c.name() != name);
    }

    // =========================================================================
    // Plugins and options
    // =========================================================================

    pub fn plugins(&self) -> &[PluginConfig] {
        &self.working.plugins
    }

    pub fn plugin(&self, name: &str) -> Option<&PluginConfig> {
        self.working.plugins.iter().find(|p| p.name() == name)
    }

    /// A plugin's settings, created empty when missing.
    pub fn plugin_mut(&mut self, name: &str) -> &mut PluginConfig {
        let plugins = &mut self.working.plugins;
        let idx = match plugins.iter().position(|p| p.name() == name) {
            Some(idx) => idx,
            None => {
                plugins.push(PluginConfig::new(name));
                plugins.len() - 1
            }
        };
        &mut plugins[idx]
    }

    pub fn project(&self) -> &ProjectOptions {
        &self.working.project
    }

    pub fn project_mut(&mut self) -> &mut ProjectOptions {
        &mut self.working.project
    }

    pub fn receive(&self) -> &ReceiveOptions {
        &self.working.receive
    }

    pub fn receive_mut(&mut self) -> &mut ReceiveOptions {
        &mut self.working.receive
    }

    pub fn submit(&self) -> &SubmitOptions {
        &self.working.submit
    }

    pub fn submit_mut(&mut self) -> &mut SubmitOptions {
        &mut self.working.submit
    }
}

fn upsert<T>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> String) {
    let name = key(&item);
    match items.iter_mut().find(|existing| key(existing) == name) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}
