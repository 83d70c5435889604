//! core::groups
//!
//! The group table stored next to `project.config` in the `groups` file.
//!
//! # Format
//!
//! One record per line, `<UUID>\t<Display Name>`. Blank lines and lines
//! starting with `#` are ignored. When the table is regenerated it carries a
//! conventional header and pads the UUID column:
//!
//! ```text
//! # UUID	Group Name
//! #
//! X     	Developers
//! ```
//!
//! # Resolution
//!
//! Configuration text names groups as `group <Name>`. Names are resolved
//! against an immutable [`GroupList`]; a [`GroupResolver`] pools unresolved
//! names so every missing group is reported exactly once per read.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::validation::{Diagnostics, ValidationError, GROUP_LIST};

/// Prefix of a group reference in configuration values.
pub const GROUP_PREFIX: &str = "group ";

/// Stable, opaque identifier of a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupUuid(String);

impl GroupUuid {
    /// Create a group UUID.
    ///
    /// # Errors
    ///
    /// Returns a message when the identifier is empty or contains whitespace
    /// that would break the table format.
    pub fn new(uuid: impl Into<String>) -> Result<Self, String> {
        let uuid = uuid.into();
        if uuid.is_empty() {
            return Err("group UUID cannot be empty".into());
        }
        if uuid.chars().any(|c| c.is_whitespace()) {
            return Err(format!("group UUID \"{uuid}\" contains whitespace"));
        }
        Ok(Self(uuid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GroupUuid {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<GroupUuid> for String {
    fn from(uuid: GroupUuid) -> Self {
        uuid.0
    }
}

impl fmt::Display for GroupUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A group as named by configuration: a UUID (when known) and a display name.
///
/// Two references are equal when both carry a UUID and the UUIDs match. A
/// reference without a UUID only equals another reference with the same name.
/// The display name is advisory and may be stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupReference {
    uuid: Option<GroupUuid>,
    name: String,
}

impl GroupReference {
    pub fn new(uuid: GroupUuid, name: impl Into<String>) -> Self {
        Self {
            uuid: Some(uuid),
            name: name.into(),
        }
    }

    /// A reference known only by name (not present in the group table).
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            uuid: None,
            name: name.into(),
        }
    }

    pub fn uuid(&self) -> Option<&GroupUuid> {
        self.uuid.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_resolved(&self) -> bool {
        self.uuid.is_some()
    }

    /// The configuration form, `group <Name>`.
    ///
    /// ```
    /// use projcfg::core::groups::{GroupReference, GroupUuid};
    ///
    /// let staff = GroupReference::new(GroupUuid::new("Y").unwrap(), "Staff");
    /// assert_eq!(staff.to_config_value(), "group Staff");
    /// ```
    pub fn to_config_value(&self) -> String {
        format!("{GROUP_PREFIX}{}", self.name)
    }

    /// Extract the group name from a `group <Name>` value.
    pub fn extract_name(value: &str) -> Option<&str> {
        value
            .strip_prefix(GROUP_PREFIX)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Whether this reference and `other` carry identical UUID and name.
    pub fn same_binding(&self, other: &GroupReference) -> bool {
        self.uuid == other.uuid && self.name == other.name
    }
}

impl PartialEq for GroupReference {
    fn eq(&self, other: &Self) -> bool {
        match (&self.uuid, &other.uuid) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.name == other.name,
            _ => false,
        }
    }
}

impl fmt::Display for GroupReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Immutable name/UUID table read from the `groups` file.
#[derive(Debug, Clone, Default)]
pub struct GroupList {
    entries: Vec<GroupReference>,
    by_name: HashMap<String, usize>,
    by_uuid: HashMap<GroupUuid, usize>,
}

impl GroupList {
    /// Parse the table. Malformed records are reported and skipped.
    pub fn parse(text: &str) -> (Self, Vec<ValidationError>) {
        let mut list = Self::default();
        let mut errors = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let number = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((uuid, name)) = line.split_once('\t') else {
                errors.push(ValidationError::new(GROUP_LIST, "missing tab delimiter").at_line(number));
                continue;
            };
            let name = name.trim();
            match GroupUuid::new(uuid.trim()) {
                Ok(uuid) if !name.is_empty() => list.insert(GroupReference::new(uuid, name)),
                Ok(_) => errors
                    .push(ValidationError::new(GROUP_LIST, "missing group name").at_line(number)),
                Err(reason) => {
                    errors.push(ValidationError::new(GROUP_LIST, reason).at_line(number))
                }
            }
        }

        (list, errors)
    }

    /// Build a table from references; entries without a UUID are ignored.
    pub fn from_references<'a>(refs: impl IntoIterator<Item = &'a GroupReference>) -> Self {
        let mut list = Self::default();
        for reference in refs {
            if reference.is_resolved() {
                list.insert(reference.clone());
            }
        }
        list
    }

    fn insert(&mut self, reference: GroupReference) {
        let Some(uuid) = reference.uuid.clone() else {
            return;
        };
        if let Some(&idx) = self.by_uuid.get(&uuid) {
            let stale = &self.entries[idx].name;
            if self.by_name.get(stale) == Some(&idx) {
                self.by_name.remove(stale);
            }
            self.by_name.insert(reference.name.clone(), idx);
            self.entries[idx] = reference;
            return;
        }
        let idx = self.entries.len();
        self.by_name.insert(reference.name.clone(), idx);
        self.by_uuid.insert(uuid, idx);
        self.entries.push(reference);
    }

    /// Look a group up by display name.
    pub fn by_name(&self, name: &str) -> Option<&GroupReference> {
        self.by_name.get(name).map(|&idx| &self.entries[idx])
    }

    /// Look a group up by UUID.
    pub fn by_uuid(&self, uuid: &GroupUuid) -> Option<&GroupReference> {
        self.by_uuid.get(uuid).map(|&idx| &self.entries[idx])
    }

    /// Entries in table order.
    pub fn references(&self) -> impl Iterator<Item = &GroupReference> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the table sorted by UUID with the conventional header.
    ///
    /// ```
    /// use projcfg::core::groups::{GroupList, GroupReference, GroupUuid};
    ///
    /// let staff = GroupReference::new(GroupUuid::new("Y").unwrap(), "Staff");
    /// let list = GroupList::from_references([&staff]);
    /// assert_eq!(list.to_text(), "# UUID\tGroup Name\n#\nY     \tStaff\n");
    /// ```
    pub fn to_text(&self) -> String {
        const UUID_HEADER: &str = "# UUID";

        let mut sorted: Vec<(&GroupUuid, &str)> = self
            .entries
            .iter()
            .filter_map(|r| r.uuid.as_ref().map(|u| (u, r.name.as_str())))
            .collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let width = sorted
            .iter()
            .map(|(uuid, _)| uuid.as_str().chars().count())
            .chain(std::iter::once(UUID_HEADER.len()))
            .max()
            .unwrap_or(UUID_HEADER.len());

        let mut out = format!("{UUID_HEADER:<width$}\tGroup Name\n#\n");
        for (uuid, name) in sorted {
            out.push_str(&format!("{:<width$}\t{name}\n", uuid.as_str()));
        }
        out
    }
}

/// Resolves `group <Name>` references during one read pass.
///
/// Unresolved names are reported once, the first time they are seen, as
/// `group "<name>" not in groups`.
pub struct GroupResolver<'a> {
    list: &'a GroupList,
    unresolved: Vec<String>,
}

impl<'a> GroupResolver<'a> {
    pub fn new(list: &'a GroupList) -> Self {
        Self {
            list,
            unresolved: Vec::new(),
        }
    }

    /// Resolve a display name to a reference, reporting unknown names.
    pub fn resolve(&mut self, name: &str, diagnostics: &mut Diagnostics) -> GroupReference {
        if let Some(found) = self.list.by_name(name) {
            return found.clone();
        }
        if !self.unresolved.iter().any(|n| n == name) {
            self.unresolved.push(name.to_string());
            diagnostics.error(format!("group \"{name}\" not in {GROUP_LIST}"));
        }
        GroupReference::unresolved(name)
    }

    /// Names that were not found in the table, in first-seen order.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }
}
