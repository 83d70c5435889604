//! Write pass: working model back to text.
//!
//! Entities are matched to the baseline by section address. Matched entities
//! write only the keys whose values changed and drop keys they no longer
//! list; new entities write every key; baseline entities missing from the
//! working copy lose their section.

use serde::Serialize;

use super::ProjectConfig;
use crate::core::grammar::Document;
use crate::core::groups::GroupList;
use crate::core::model::{ConfigSection, Entries};

/// Output of [`ProjectConfig::render`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    /// New `project.config` text.
    pub config_text: String,
    /// New group table, or `None` when the file should not exist.
    pub groups_text: Option<String>,
    /// Whether either file differs from what was read.
    pub changed: bool,
}

fn same_address(a: &dyn ConfigSection, b: &dyn ConfigSection) -> bool {
    a.section() == b.section() && a.subsection() == b.subsection()
}

fn apply(doc: &mut Document, entity: &dyn ConfigSection, baseline: Option<Entries>) {
    let section = entity.section();
    let subsection = entity.subsection();
    let entries = entity.entries();
    for (key, values) in &entries {
        if let Some(before) = &baseline {
            let old = before.iter().find(|(k, _)| k == key).map(|(_, v)| v);
            if old.map_or(values.is_empty(), |old| old == values) {
                continue;
            }
        }
        if !values.is_empty() {
            doc.ensure_section(section, subsection);
        }
        doc.set_string_list(section, subsection, key, values);
        if entity.reindents_changed_keys() {
            doc.reindent(section, subsection, key);
        }
        for alias in entity.aliases(key) {
            doc.unset(section, subsection, alias);
        }
    }

    // Keys the entity no longer lists at all.
    for (key, _) in baseline.iter().flatten() {
        if entries.iter().any(|(k, _)| k.eq_ignore_ascii_case(key)) {
            continue;
        }
        doc.unset(section, subsection, key);
        for alias in entity.aliases(key) {
            doc.unset(section, subsection, alias);
        }
    }
}

pub(super) fn render(config: &ProjectConfig) -> Rendered {
    let mut doc = config.document.clone();
    let baseline = config.baseline.sections();
    let working = config.working.sections();

    for old in &baseline {
        if !working.iter().any(|w| same_address(*w, *old)) {
            doc.remove_section(old.section(), old.subsection());
        }
    }
    for entity in &working {
        let before = baseline
            .iter()
            .find(|b| same_address(**b, *entity))
            .map(|b| b.entries());
        apply(&mut doc, *entity, before);
    }

    let config_text = doc.to_text();
    let config_changed = config_text != config.document.to_text();
    let groups_text = if config_changed {
        let table = GroupList::from_references(config.working.referenced_groups());
        (!table.is_empty()).then(|| table.to_text())
    } else {
        config.groups_text.clone()
    };
    let changed = config_changed || groups_text != config.groups_text;

    Rendered {
        config_text,
        groups_text,
        changed,
    }
}

#[cfg(test)]
mod tests {
    use crate::core::groups::{GroupReference, GroupUuid};
    use crate::core::model::{
        Action, CommentLink, LabelType, LabelValue, PermissionRule, ReadOptions, SubmitType,
        GLOBAL_CAPABILITIES,
    };
    use crate::core::project::ProjectConfig;

    fn read(text: &str, groups: Option<&str>) -> ProjectConfig {
        ProjectConfig::read(Some(text), groups, ReadOptions::default())
    }

    mod fixed_point {
        use super::*;

        #[test]
        fn unmodified_document_is_identical() {
            let text = "[access \"refs/heads/*\"]\n  read = group Staff # everyone\n\tpush = +force group Staff\n[label \"Verified\"]\n\tvalue = -1 Fails\n\tvalue = 0 No score\n\tvalue = +1 Works\n";
            let groups = "# UUID\tGroup Name\n#\nY\tStaff\n";
            let rendered = read(text, Some(groups)).render();
            assert_eq!(rendered.config_text, text);
            assert_eq!(rendered.groups_text.as_deref(), Some(groups));
            assert!(!rendered.changed);
        }

        #[test]
        fn invalid_data_round_trips() {
            let text = "[label \"L\"]\n\tvalue = 0 No\n\tdefaultValue = 7\n[commentlink \"bad\"]\n\tmatch = \"(bugs{+#?)(d+)\"\n";
            let rendered = read(text, None).render();
            assert_eq!(rendered.config_text, text);
            assert!(!rendered.changed);
        }
    }

    mod edits {
        use super::*;

        #[test]
        fn changed_key_rewritten_in_place() {
            let mut config = read("[submit]\n    action = merge always\n\tmergeContent = true\n", None);
            config.submit_mut().action = SubmitType::CherryPick;
            let rendered = config.render();
            assert_eq!(
                rendered.config_text,
                "[submit]\n    action = cherry pick\n\tmergeContent = true\n"
            );
            assert!(rendered.changed);
        }

        #[test]
        fn new_label_gets_defaults() {
            let mut config = read("[project]\n\tdescription = demo\n", None);
            config.put_label(LabelType::new(
                "Code-Review",
                vec![LabelValue::new(0, "No score"), LabelValue::new(2, "Looks good")],
            ));
            assert_eq!(
                config.render().config_text,
                "[label \"Code-Review\"]\n\tfunction = MaxWithBlock\n\tdefaultValue = 0\n\tvalue = 0 No score\n\tvalue = +2 Looks good\n[project]\n\tdescription = demo\n"
            );
        }

        #[test]
        fn parsed_label_does_not_gain_defaults() {
            let text = "[label \"L\"]\n\tvalue = 0 No\n\tvalue = +1 Yes\n";
            let mut config = read(text, None);
            config.label_mut("L").unwrap().set_can_override(false);
            assert_eq!(
                config.render().config_text,
                "[label \"L\"]\n\tvalue = 0 No\n\tvalue = +1 Yes\n\tcanOverride = false\n"
            );
        }

        #[test]
        fn removed_entity_drops_section() {
            let mut config = read(
                "[commentlink \"a\"]\n\tmatch = x\n\tlink = y\n[commentlink \"b\"]\n\tmatch = x\n\tlink = z\n",
                None,
            );
            config.remove_comment_link("a");
            assert_eq!(
                config.render().config_text,
                "[commentlink \"b\"]\n\tmatch = x\n\tlink = z\n"
            );
        }

        #[test]
        fn comment_link_html_written_after_match() {
            let mut config = read("", None);
            config.add_comment_link(CommentLink::html("Test", "abc.*", "<a>link</a>"));
            assert_eq!(
                config.render().config_text,
                "[commentlink \"Test\"]\n\tmatch = abc.*\n\thtml = <a>link</a>\n"
            );
        }

        #[test]
        fn legacy_permission_name_replaced() {
            let mut config = read("[access \"refs/tags/*\"]\n\tpushTag = group Staff\n", Some("Y\tStaff\n"));
            let staff = config.group_by_name("Staff").cloned().unwrap();
            config
                .access_section_mut("refs/tags/*")
                .permission_mut("createTag")
                .add(PermissionRule::new(staff).with_action(Action::Deny));
            assert_eq!(
                config.render().config_text,
                "[access \"refs/tags/*\"]\n\tcreateTag = group Staff\n\tcreateTag = deny group Staff\n"
            );
        }
    }

    mod removals {
        use super::*;

        #[test]
        fn unset_plugin_key_removed() {
            let mut config = read("[plugin \"p\"]\n\tkey1 = v1\n\tkey2 = v2\n", None);
            config.plugin_mut("p").unset("key1");
            assert_eq!(config.render().config_text, "[plugin \"p\"]\n\tkey2 = v2\n");
        }

        #[test]
        fn emptied_plugin_list_removed() {
            let mut config = read("[plugin \"p\"]\n\tk = a\n\tk = b\n\tother = c\n", None);
            config.plugin_mut("p").set_string_list("k", Vec::new());
            assert_eq!(config.render().config_text, "[plugin \"p\"]\n\tother = c\n");
        }

        #[test]
        fn removed_permission_dropped() {
            let mut config = read(
                "[access \"refs/*\"]\n\tread = group A\n\tpush = group A\n",
                Some("a\tA\n"),
            );
            config.access_section_mut("refs/*").remove_permission("push");
            assert_eq!(
                config.render().config_text,
                "[access \"refs/*\"]\n\tread = group A\n"
            );
        }

        #[test]
        fn removed_legacy_permission_dropped() {
            let mut config = read(
                "[access \"refs/tags/*\"]\n\tpushTag = group A\n\tread = group A\n",
                Some("a\tA\n"),
            );
            config
                .access_section_mut("refs/tags/*")
                .remove_permission("createTag");
            assert_eq!(
                config.render().config_text,
                "[access \"refs/tags/*\"]\n\tread = group A\n"
            );
        }

        #[test]
        fn removed_capability_dropped() {
            let mut config = read(
                "[capability]\n\tadministrateServer = group A\n\tqueryLimit = 0..100 group A\n",
                Some("a\tA\n"),
            );
            config
                .access_section_mut(GLOBAL_CAPABILITIES)
                .remove_permission("queryLimit");
            assert_eq!(
                config.render().config_text,
                "[capability]\n\tadministrateServer = group A\n"
            );
        }
    }

    mod plugin_indent {
        use super::*;

        #[test]
        fn changed_key_reindented() {
            let mut config = read("[plugin \"p\"]\n  key1 = a\n  key2 = b\n", None);
            config.plugin_mut("p").set_string("key1", "c");
            assert_eq!(
                config.render().config_text,
                "[plugin \"p\"]\n\tkey1 = c\n  key2 = b\n"
            );
        }

        #[test]
        fn every_line_of_changed_list_reindented() {
            let mut config = read("[plugin \"p\"]\n    k = a\n    k = b\n", None);
            config
                .plugin_mut("p")
                .set_string_list("k", vec!["a".into(), "b".into(), "c".into()]);
            assert_eq!(
                config.render().config_text,
                "[plugin \"p\"]\n\tk = a\n\tk = b\n\tk = c\n"
            );
        }

        #[test]
        fn other_sections_keep_indent() {
            let mut config = read("[project]\n  description = old\n", None);
            config.project_mut().description = Some("new".into());
            assert_eq!(config.render().config_text, "[project]\n  description = new\n");
        }
    }

    mod unparsed {
        use super::*;

        const RULES: &str = "[access \"refs/*\"]\n\tread = group A\n\tread = deny A\n";
        const GROUPS: &str = "a\tA\nb\tB\n";

        #[test]
        fn bad_rule_kept_when_permission_edited() {
            let mut config = read(RULES, Some(GROUPS));
            assert!(!config.validation_errors().is_empty());
            let b = GroupReference::new(GroupUuid::new("b").unwrap(), "B");
            let read_permission = config.access_section_mut("refs/*").permission_mut("read");
            assert_eq!(read_permission.unparsed().values().collect::<Vec<_>>(), ["deny A"]);
            read_permission.add(PermissionRule::new(b));
            assert_eq!(
                config.render().config_text,
                "[access \"refs/*\"]\n\tread = group A\n\tread = deny A\n\tread = group B\n"
            );
        }

        #[test]
        fn bad_rule_keeps_its_position() {
            let mut config = read(
                "[access \"refs/*\"]\n\tread = deny A\n\tread = group A\n",
                Some(GROUPS),
            );
            let b = GroupReference::new(GroupUuid::new("b").unwrap(), "B");
            config
                .access_section_mut("refs/*")
                .permission_mut("read")
                .add(PermissionRule::new(b));
            assert_eq!(
                config.render().config_text,
                "[access \"refs/*\"]\n\tread = deny A\n\tread = group A\n\tread = group B\n"
            );
        }

        #[test]
        fn replacing_rules_drops_bad_rule() {
            let mut config = read(RULES, Some(GROUPS));
            let permission = config.access_section_mut("refs/*").permission_mut("read");
            let rules = permission.rules().to_vec();
            permission.set_rules(rules);
            assert_eq!(
                config.render().config_text,
                "[access \"refs/*\"]\n\tread = group A\n"
            );
        }

        #[test]
        fn bad_label_value_kept_when_values_edited() {
            let mut config = read(
                "[label \"L\"]\n\tvalue = 0 No\n\tvalue = bogus\n\tvalue = +1 Yes\n",
                None,
            );
            let label = config.label_mut("L").unwrap();
            assert_eq!(label.unparsed_values().values().collect::<Vec<_>>(), ["bogus"]);
            label.put_value(LabelValue::new(2, "Great"));
            assert_eq!(
                config.render().config_text,
                "[label \"L\"]\n\tvalue = 0 No\n\tvalue = bogus\n\tvalue = +1 Yes\n\tvalue = +2 Great\n"
            );
        }
    }

    mod group_table {
        use super::*;

        #[test]
        fn regenerated_from_references() {
            let mut config = read("[access \"refs/*\"]\n\tread = group Old\n", Some("A\tOld\nB\tUnused\n"));
            let fresh = GroupReference::new(GroupUuid::new("C").unwrap(), "Fresh");
            config
                .access_section_mut("refs/*")
                .permission_mut("read")
                .add(PermissionRule::new(fresh));
            let rendered = config.render();
            assert_eq!(
                rendered.groups_text.as_deref(),
                Some("# UUID\tGroup Name\n#\nA     \tOld\nC     \tFresh\n")
            );
        }

        #[test]
        fn removed_when_nothing_referenced() {
            let mut config = read("[access \"refs/*\"]\n\tread = group Old\n", Some("A\tOld\n"));
            config.remove_access_section("refs/*");
            let rendered = config.render();
            assert_eq!(rendered.config_text, "");
            assert_eq!(rendered.groups_text, None);
            assert!(rendered.changed);
        }

        #[test]
        fn unresolved_groups_not_tabled() {
            let mut config = read("", None);
            config
                .access_section_mut("refs/*")
                .permission_mut("read")
                .add(PermissionRule::new(GroupReference::unresolved("Ghost")));
            let rendered = config.render();
            assert_eq!(rendered.config_text, "[access \"refs/*\"]\n\tread = group Ghost\n");
            assert_eq!(rendered.groups_text, None);
        }
    }
}
