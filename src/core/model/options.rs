//! core::model::options
//!
//! Project-wide switches: `[receive]`, `[submit]` and `[project]`.

use serde::Serialize;

use super::rule::key_path;
use super::{string_entry, ConfigSection, Entries, ReadContext, PROJECT, RECEIVE, SUBMIT};
use crate::core::grammar::{parse_bool, Document};

/// A boolean that may defer to the parent project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InheritableBoolean {
    True,
    False,
    #[default]
    Inherit,
}

impl InheritableBoolean {
    pub fn parse(value: &str) -> Option<Self> {
        if value.trim().eq_ignore_ascii_case("inherit") {
            return Some(InheritableBoolean::Inherit);
        }
        parse_bool(value).map(|b| {
            if b {
                InheritableBoolean::True
            } else {
                InheritableBoolean::False
            }
        })
    }

    fn values(self) -> Vec<String> {
        match self {
            InheritableBoolean::True => vec!["true".into()],
            InheritableBoolean::False => vec!["false".into()],
            InheritableBoolean::Inherit => Vec::new(),
        }
    }
}

/// How changes are merged on submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmitType {
    #[default]
    MergeIfNecessary,
    FastForwardOnly,
    RebaseIfNecessary,
    RebaseAlways,
    MergeAlways,
    CherryPick,
}

impl SubmitType {
    pub const ALL: [SubmitType; 6] = [
        SubmitType::MergeIfNecessary,
        SubmitType::FastForwardOnly,
        SubmitType::RebaseIfNecessary,
        SubmitType::RebaseAlways,
        SubmitType::MergeAlways,
        SubmitType::CherryPick,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SubmitType::MergeIfNecessary => "merge if necessary",
            SubmitType::FastForwardOnly => "fast forward only",
            SubmitType::RebaseIfNecessary => "rebase if necessary",
            SubmitType::RebaseAlways => "rebase always",
            SubmitType::MergeAlways => "merge always",
            SubmitType::CherryPick => "cherry pick",
        }
    }

    /// Accepts `merge if necessary`, `MERGE_IF_NECESSARY` and similar spellings.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(&value))
    }
}

/// Lifecycle state of the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectState {
    #[default]
    Active,
    ReadOnly,
    Hidden,
}

impl ProjectState {
    pub fn name(self) -> &'static str {
        match self {
            ProjectState::Active => "active",
            ProjectState::ReadOnly => "read-only",
            ProjectState::Hidden => "hidden",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().replace(['_', ' '], "-");
        [ProjectState::Active, ProjectState::ReadOnly, ProjectState::Hidden]
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(&value))
    }
}

fn read_inheritable(
    doc: &Document,
    section: &str,
    key: &str,
    ctx: &mut ReadContext<'_>,
) -> InheritableBoolean {
    let Some(raw) = doc.get(section, None, key) else {
        return InheritableBoolean::Inherit;
    };
    InheritableBoolean::parse(&raw).unwrap_or_else(|| {
        ctx.diagnostics.error(format!(
            "Invalid value \"{raw}\" for {}",
            key_path(section, None, key)
        ));
        InheritableBoolean::Inherit
    })
}

fn read_enum<T: Default>(
    doc: &Document,
    section: &str,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
    ctx: &mut ReadContext<'_>,
) -> T {
    let Some(raw) = doc.get(section, None, key) else {
        return T::default();
    };
    parse(&raw).unwrap_or_else(|| {
        ctx.diagnostics.error(format!(
            "Invalid value \"{raw}\" for {}",
            key_path(section, None, key)
        ));
        T::default()
    })
}

macro_rules! inheritable_options {
    (
        $(#[$meta:meta])*
        $name:ident, $section:expr, { $($field:ident => $key:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize)]
        pub struct $name {
            $(pub $field: InheritableBoolean,)+
        }

        impl $name {
            fn read_flags(doc: &Document, ctx: &mut ReadContext<'_>) -> Self {
                Self {
                    $($field: read_inheritable(doc, $section, $key, ctx),)+
                }
            }

            fn flag_entries(&self) -> Entries {
                vec![$(($key.to_string(), self.$field.values()),)+]
            }
        }
    };
}

inheritable_options! {
    /// Tri-state receive flags.
    ReceiveFlags, RECEIVE, {
        require_contributor_agreement => "requireContributorAgreement",
        require_signed_off_by => "requireSignedOffBy",
        require_change_id => "requireChangeId",
        create_new_change_for_all_not_in_target => "createNewChangeForAllNotInTarget",
        enable_signed_push => "enableSignedPush",
        require_signed_push => "requireSignedPush",
        reject_implicit_merges => "rejectImplicitMerges",
        check_received_objects => "checkReceivedObjects",
    }
}

inheritable_options! {
    /// Tri-state submit flags.
    SubmitFlags, SUBMIT, {
        merge_content => "mergeContent",
        match_author_to_committer_date => "matchAuthorToCommitterDate",
        reject_empty_commit => "rejectEmptyCommit",
    }
}

const KEY_MAX_OBJECT_SIZE_LIMIT: &str = "maxObjectSizeLimit";
const KEY_ACTION: &str = "action";
const KEY_DESCRIPTION: &str = "description";
const KEY_STATE: &str = "state";

/// The `[receive]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReceiveOptions {
    pub flags: ReceiveFlags,
    pub max_object_size_limit: Option<String>,
}

impl ReceiveOptions {
    pub(crate) fn read(doc: &Document, ctx: &mut ReadContext<'_>) -> Self {
        Self {
            flags: ReceiveFlags::read_flags(doc, ctx),
            max_object_size_limit: doc
                .get(RECEIVE, None, KEY_MAX_OBJECT_SIZE_LIMIT)
                .filter(|v| !v.is_empty()),
        }
    }
}

impl ConfigSection for ReceiveOptions {
    fn section(&self) -> &'static str {
        RECEIVE
    }

    fn subsection(&self) -> Option<&str> {
        None
    }

    fn entries(&self) -> Entries {
        let mut entries = self.flags.flag_entries();
        entries.push(string_entry(
            KEY_MAX_OBJECT_SIZE_LIMIT,
            self.max_object_size_limit.as_deref(),
        ));
        entries
    }
}

/// The `[submit]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmitOptions {
    pub action: SubmitType,
    pub flags: SubmitFlags,
}

impl SubmitOptions {
    pub(crate) fn read(doc: &Document, ctx: &mut ReadContext<'_>) -> Self {
        Self {
            action: read_enum(doc, SUBMIT, KEY_ACTION, SubmitType::parse, ctx),
            flags: SubmitFlags::read_flags(doc, ctx),
        }
    }
}

impl ConfigSection for SubmitOptions {
    fn section(&self) -> &'static str {
        SUBMIT
    }

    fn subsection(&self) -> Option<&str> {
        None
    }

    fn entries(&self) -> Entries {
        let action = if self.action == SubmitType::default() {
            Vec::new()
        } else {
            vec![self.action.name().to_string()]
        };
        let mut entries = vec![(KEY_ACTION.to_string(), action)];
        entries.extend(self.flags.flag_entries());
        entries
    }
}

/// The `[project]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectOptions {
    pub description: Option<String>,
    pub state: ProjectState,
}

impl ProjectOptions {
    pub(crate) fn read(doc: &Document, ctx: &mut ReadContext<'_>) -> Self {
        Self {
            description: doc
                .get(PROJECT, None, KEY_DESCRIPTION)
                .filter(|d| !d.is_empty()),
            state: read_enum(doc, PROJECT, KEY_STATE, ProjectState::parse, ctx),
        }
    }
}

impl ConfigSection for ProjectOptions {
    fn section(&self) -> &'static str {
        PROJECT
    }

    fn subsection(&self) -> Option<&str> {
        None
    }

    fn entries(&self) -> Entries {
        let state = if self.state == ProjectState::default() {
            Vec::new()
        } else {
            vec![self.state.name().to_string()]
        };
        vec![
            string_entry(KEY_DESCRIPTION, self.description.as_deref()),
            (KEY_STATE.to_string(), state),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inheritable_parsing() {
        assert_eq!(InheritableBoolean::parse("true"), Some(InheritableBoolean::True));
        assert_eq!(InheritableBoolean::parse("no"), Some(InheritableBoolean::False));
        assert_eq!(InheritableBoolean::parse("INHERIT"), Some(InheritableBoolean::Inherit));
        assert_eq!(InheritableBoolean::parse("sometimes"), None);
        assert!(InheritableBoolean::Inherit.values().is_empty());
    }

    #[test]
    fn submit_type_spellings() {
        assert_eq!(SubmitType::parse("cherry pick"), Some(SubmitType::CherryPick));
        assert_eq!(SubmitType::parse("REBASE_IF_NECESSARY"), Some(SubmitType::RebaseIfNecessary));
        assert_eq!(SubmitType::parse("fast-forward-only"), Some(SubmitType::FastForwardOnly));
        assert_eq!(SubmitType::parse("squash"), None);
    }

    #[test]
    fn project_state_spellings() {
        assert_eq!(ProjectState::parse("READ_ONLY"), Some(ProjectState::ReadOnly));
        assert_eq!(ProjectState::parse("read-only"), Some(ProjectState::ReadOnly));
        assert_eq!(ProjectState::parse("hidden"), Some(ProjectState::Hidden));
        assert_eq!(ProjectState::parse("gone"), None);
    }

    #[test]
    fn defaults_write_nothing() {
        assert!(SubmitOptions::default().entries().iter().all(|(_, v)| v.is_empty()));
        assert!(ReceiveOptions::default().entries().iter().all(|(_, v)| v.is_empty()));
        assert!(ProjectOptions::default().entries().iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn submit_entries_order() {
        let options = SubmitOptions {
            action: SubmitType::RebaseAlways,
            flags: SubmitFlags {
                merge_content: InheritableBoolean::True,
                ..SubmitFlags::default()
            },
        };
        let entries = options.entries();
        assert_eq!(entries[0], ("action".to_string(), vec!["rebase always".to_string()]));
        assert_eq!(entries[1], ("mergeContent".to_string(), vec!["true".to_string()]));
    }
}
