//! core::model::access
//!
//! Access sections (`[access "<ref pattern>"]`), their permissions, the
//! global `[capability]` section and the parent pointer in `[access]`.

use regex::Regex;
use serde::Serialize;

use super::rule::{read_rules, rule_values, PermissionRule};
use super::{
    string_entry, ConfigSection, Entries, ReadContext, UnparsedValues, ACCESS, CAPABILITY,
};
use crate::core::grammar::Document;
use crate::core::groups::GroupReference;

/// Name of the access section holding global capabilities.
pub const GLOBAL_CAPABILITIES: &str = "GLOBAL_CAPABILITIES";

const KEY_GROUP_PERMISSIONS: &str = "exclusiveGroupPermissions";
const KEY_INHERIT_FROM: &str = "inheritFrom";

/// Permissions understood in access sections, besides `label-*` and `labelAs-*`.
pub const PERMISSIONS: &[&str] = &[
    "abandon",
    "addPatchSet",
    "create",
    "createSignedTag",
    "createTag",
    "delete",
    "deleteChanges",
    "deleteOwnChanges",
    "editAssignee",
    "editHashtags",
    "editTopicName",
    "forgeAuthor",
    "forgeCommitter",
    "forgeServerAsCommitter",
    "owner",
    "push",
    "pushMerge",
    "read",
    "rebase",
    "removeReviewer",
    "revert",
    "submit",
    "submitAs",
    "toggleWipState",
    "viewPrivateChanges",
];

const LABEL_PREFIX: &str = "label-";
const LABEL_AS_PREFIX: &str = "labelAs-";

/// Old permission names and what they mean today.
const LEGACY_PERMISSIONS: &[(&str, &str)] = &[
    ("pushTag", "createTag"),
    ("pushSignedTag", "createSignedTag"),
    ("forgeIdentity", "forgeAuthor"),
];

/// Capabilities whose rules carry a range.
const RANGE_CAPABILITIES: &[&str] = &["queryLimit", "batchChangesLimit"];

fn starts_with_ignore_case(name: &str, prefix: &str) -> bool {
    name.len() > prefix.len()
        && name.is_char_boundary(prefix.len())
        && name[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Map a key to its permission name, or `None` if it is not a permission.
///
/// ```
/// use projcfg::core::model::access::canonical_permission;
///
/// assert_eq!(canonical_permission("Read").as_deref(), Some("read"));
/// assert_eq!(canonical_permission("pushTag").as_deref(), Some("createTag"));
/// assert_eq!(canonical_permission("label-Code-Review").as_deref(), Some("label-Code-Review"));
/// assert_eq!(canonical_permission("upload"), None);
/// ```
pub fn canonical_permission(key: &str) -> Option<String> {
    if let Some((_, current)) = LEGACY_PERMISSIONS
        .iter()
        .find(|(old, _)| old.eq_ignore_ascii_case(key))
    {
        return Some((*current).to_string());
    }
    if let Some(known) = PERMISSIONS.iter().find(|p| p.eq_ignore_ascii_case(key)) {
        return Some((*known).to_string());
    }
    if starts_with_ignore_case(key, LABEL_AS_PREFIX) {
        return Some(format!("{LABEL_AS_PREFIX}{}", &key[LABEL_AS_PREFIX.len()..]));
    }
    if starts_with_ignore_case(key, LABEL_PREFIX) {
        return Some(format!("{LABEL_PREFIX}{}", &key[LABEL_PREFIX.len()..]));
    }
    None
}

/// Whether rules of this access permission carry a score range.
pub fn has_range(permission: &str) -> bool {
    permission.starts_with(LABEL_PREFIX) || permission.starts_with(LABEL_AS_PREFIX)
}

fn capability_has_range(capability: &str) -> bool {
    RANGE_CAPABILITIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(capability))
}

/// Replace `${param}` placeholders so the pattern can be compiled.
fn strip_parameters(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        match rest[start..].find('}') {
            Some(end) => {
                out.push('x');
                rest = &rest[start + end + 1..];
            }
            None => {
                rest = &rest[start..];
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Check an access section name.
///
/// # Errors
///
/// Returns the validation message for names outside `refs/` and for
/// `^` patterns that do not compile.
pub fn validate_ref_pattern(name: &str) -> Result<(), String> {
    if let Some(pattern) = name.strip_prefix('^') {
        if !pattern.starts_with("refs/") {
            return Err(format!("Invalid access section name \"{name}\""));
        }
        Regex::new(&strip_parameters(name))
            .map_err(|e| format!("Invalid ref pattern \"{name}\": {e}"))?;
        return Ok(());
    }
    if !name.starts_with("refs/") {
        return Err(format!("Invalid access section name \"{name}\""));
    }
    Ok(())
}

/// A named permission and the rules granting it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Permission {
    name: String,
    exclusive_group: bool,
    rules: Vec<PermissionRule>,
    #[serde(skip_serializing_if = "UnparsedValues::is_empty")]
    unparsed: UnparsedValues,
}

impl Permission {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exclusive_group: false,
            rules: Vec::new(),
            unparsed: UnparsedValues::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether rules from parent projects are ignored for this permission.
    pub fn exclusive_group(&self) -> bool {
        self.exclusive_group
    }

    pub fn set_exclusive_group(&mut self, exclusive: bool) {
        self.exclusive_group = exclusive;
    }

    pub fn rules(&self) -> &[PermissionRule] {
        &self.rules
    }

    pub fn add(&mut self, rule: PermissionRule) {
        self.rules.push(rule);
    }

    /// Replace every rule, dropping values that failed to parse.
    pub fn set_rules(&mut self, rules: Vec<PermissionRule>) {
        self.rules = rules;
        self.unparsed.clear();
    }

    /// Values that did not parse as rules. They are written back unchanged
    /// until [`Permission::discard_unparsed`] or [`Permission::set_rules`].
    pub fn unparsed(&self) -> &UnparsedValues {
        &self.unparsed
    }

    pub fn discard_unparsed(&mut self) {
        self.unparsed.clear();
    }

    fn absorb(&mut self, (rules, unparsed): (Vec<PermissionRule>, UnparsedValues)) {
        let offset = self.rules.len() + self.unparsed.len();
        self.rules.extend(rules);
        self.unparsed.extend_after(offset, unparsed);
    }

    /// Remove every rule for `group`.
    pub fn remove_group(&mut self, group: &GroupReference) {
        self.rules.retain(|r| r.group() != group);
    }
}

/// Permissions that apply to refs matching a pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessSection {
    name: String,
    permissions: Vec<Permission>,
}

impl AccessSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_capability(&self) -> bool {
        self.name == GLOBAL_CAPABILITIES
    }

    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub fn permission(&self, name: &str) -> Option<&Permission> {
        self.permissions
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Get a permission, creating an empty one if needed.
    pub fn permission_mut(&mut self, name: &str) -> &mut Permission {
        let idx = match self
            .permissions
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
        {
            Some(idx) => idx,
            None => {
                self.permissions.push(Permission::new(name));
                self.permissions.len() - 1
            }
        };
        &mut self.permissions[idx]
    }

    pub fn remove_permission(&mut self, name: &str) {
        self.permissions
            .retain(|p| !p.name.eq_ignore_ascii_case(name));
    }

    fn uses_range(&self, permission: &str) -> bool {
        if self.is_capability() {
            capability_has_range(permission)
        } else {
            has_range(permission)
        }
    }
}

impl ConfigSection for AccessSection {
    fn section(&self) -> &'static str {
        if self.is_capability() {
            CAPABILITY
        } else {
            ACCESS
        }
    }

    fn subsection(&self) -> Option<&str> {
        if self.is_capability() {
            None
        } else {
            Some(&self.name)
        }
    }

    fn entries(&self) -> Entries {
        let mut entries = Entries::new();
        if !self.is_capability() {
            let exclusive: Vec<&str> = self
                .permissions
                .iter()
                .filter(|p| p.exclusive_group)
                .map(|p| p.name.as_str())
                .collect();
            let value = if exclusive.is_empty() {
                Vec::new()
            } else {
                vec![exclusive.join(" ")]
            };
            entries.push((KEY_GROUP_PERMISSIONS.to_string(), value));
        }
        for permission in &self.permissions {
            entries.push((
                permission.name.clone(),
                rule_values(
                    &permission.rules,
                    &permission.unparsed,
                    self.uses_range(&permission.name),
                ),
            ));
        }
        entries
    }

    fn aliases(&self, key: &str) -> Vec<&'static str> {
        if self.is_capability() {
            return Vec::new();
        }
        LEGACY_PERMISSIONS
            .iter()
            .filter(|(_, current)| current.eq_ignore_ascii_case(key))
            .map(|(old, _)| *old)
            .collect()
    }

    fn referenced_groups(&self) -> Vec<&GroupReference> {
        self.permissions
            .iter()
            .flat_map(|p| p.rules.iter().map(PermissionRule::group))
            .collect()
    }
}

/// `[access] inheritFrom`: the parent project whose rights are inherited.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Inheritance {
    pub parent: Option<String>,
}

impl Inheritance {
    pub(crate) fn read(doc: &Document) -> Self {
        Self {
            parent: doc
                .get(ACCESS, None, KEY_INHERIT_FROM)
                .filter(|p| !p.trim().is_empty()),
        }
    }
}

impl ConfigSection for Inheritance {
    fn section(&self) -> &'static str {
        ACCESS
    }

    fn subsection(&self) -> Option<&str> {
        None
    }

    fn entries(&self) -> Entries {
        vec![string_entry(KEY_INHERIT_FROM, self.parent.as_deref())]
    }
}

/// Read every valid `[access "<pattern>"]` section.
pub(crate) fn read_all(doc: &Document, ctx: &mut ReadContext<'_>) -> Vec<AccessSection> {
    let mut sections = Vec::new();
    for name in doc.subsections(ACCESS) {
        if let Err(message) = validate_ref_pattern(&name) {
            ctx.diagnostics.error(message);
            continue;
        }
        let mut section = AccessSection::new(name.clone());

        for value in doc.get_list(ACCESS, Some(&name), KEY_GROUP_PERMISSIONS) {
            for listed in value.split([',', ' ', '\t']).filter(|s| !s.is_empty()) {
                if let Some(permission) = canonical_permission(listed) {
                    section.permission_mut(&permission).set_exclusive_group(true);
                }
            }
        }

        for key in doc.keys(ACCESS, Some(&name)) {
            let Some(permission) = canonical_permission(&key) else {
                continue;
            };
            let read = read_rules(doc, ACCESS, Some(&name), &key, has_range(&permission), ctx);
            section.permission_mut(&permission).absorb(read);
        }

        sections.push(section);
    }
    sections
}

/// Read `[capability]` into the global capabilities section.
pub(crate) fn read_capability(doc: &Document, ctx: &mut ReadContext<'_>) -> AccessSection {
    let mut section = AccessSection::new(GLOBAL_CAPABILITIES);
    for key in doc.keys(CAPABILITY, None) {
        let read = read_rules(doc, CAPABILITY, None, &key, capability_has_range(&key), ctx);
        section.permission_mut(&key).absorb(read);
    }
    section
}
