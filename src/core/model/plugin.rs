//! core::model::plugin
//!
//! Per-plugin settings: `[plugin "<name>"]`.
//!
//! Keys and values are opaque. Values of the form `group <Name>` can be read
//! and written as group references and take part in the group table.

use serde::Serialize;

use super::{ConfigSection, Entries, ReadContext, PLUGIN};
use crate::core::grammar::Document;
use crate::core::groups::GroupReference;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginConfig {
    name: String,
    values: Vec<(String, Vec<String>)>,
    #[serde(skip)]
    groups: Vec<GroupReference>,
}

impl PluginConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key names in first-seen order.
    pub fn names(&self) -> Vec<&str> {
        self.values.iter().map(|(k, _)| k.as_str()).collect()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.values
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    /// Last value of a key.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.position(key)
            .and_then(|idx| self.values[idx].1.last())
            .map(String::as_str)
    }

    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.position(key)
            .map(|idx| self.values[idx].1.clone())
            .unwrap_or_default()
    }

    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.set_string_list(key, vec![value.into()]);
    }

    /// Replace all values of a key; an empty list removes it.
    pub fn set_string_list(&mut self, key: &str, values: Vec<String>) {
        match (self.position(key), values.is_empty()) {
            (Some(idx), true) => {
                self.values.remove(idx);
            }
            (Some(idx), false) => self.values[idx].1 = values,
            (None, true) => {}
            (None, false) => self.values.push((key.to_string(), values)),
        }
    }

    pub fn unset(&mut self, key: &str) {
        self.set_string_list(key, Vec::new());
    }

    /// Interpret a `group <Name>` value.
    pub fn get_group_reference(&self, key: &str) -> Option<GroupReference> {
        let name = GroupReference::extract_name(self.get_string(key)?)?;
        Some(
            self.groups
                .iter()
                .find(|g| g.name() == name)
                .cloned()
                .unwrap_or_else(|| GroupReference::unresolved(name)),
        )
    }

    /// Store a group reference as `group <Name>`.
    pub fn set_group_reference(&mut self, key: &str, group: GroupReference) {
        self.set_string(key, group.to_config_value());
        self.groups.retain(|g| g.name() != group.name());
        self.groups.push(group);
    }
}

impl ConfigSection for PluginConfig {
    fn section(&self) -> &'static str {
        PLUGIN
    }

    fn subsection(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn entries(&self) -> Entries {
        self.values.clone()
    }

    fn reindents_changed_keys(&self) -> bool {
        true
    }

    fn referenced_groups(&self) -> Vec<&GroupReference> {
        let mut out: Vec<&GroupReference> = Vec::new();
        for value in self.values.iter().flat_map(|(_, v)| v.iter()) {
            let Some(name) = GroupReference::extract_name(value) else {
                continue;
            };
            if let Some(group) = self.groups.iter().find(|g| g.name() == name) {
                if !out.iter().any(|g| g.same_binding(group)) {
                    out.push(group);
                }
            }
        }
        out
    }
}

pub(crate) fn read_all(doc: &Document, ctx: &mut ReadContext<'_>) -> Vec<PluginConfig> {
    let mut plugins = Vec::new();
    for name in doc.subsections(PLUGIN) {
        let sub = Some(name.as_str());
        let mut plugin = PluginConfig::new(name.clone());
        for key in doc.keys(PLUGIN, sub) {
            let values = doc.get_list(PLUGIN, sub, &key);
            for value in &values {
                if let Some(group) = GroupReference::extract_name(value) {
                    let group = ctx.resolver.resolve(group, &mut ctx.diagnostics);
                    if !plugin.groups.iter().any(|g| g.name() == group.name()) {
                        plugin.groups.push(group);
                    }
                }
            }
            plugin.values.push((key, values));
        }
        plugins.push(plugin);
    }
    plugins
}
