//! Read and edit scenarios for project configurations, driven through the
//! store against the in-memory backend.

use projcfg::core::groups::{GroupReference, GroupUuid};
use projcfg::core::model::{
    Action, CommentLink, LabelType, LabelValue, PermissionRule, SubmitType,
};
use projcfg::core::project::ProjectConfig;
use projcfg::core::types::{Identity, Oid, RefName};
use projcfg::git::{CommitData, MemoryStore, ObjectStore, TreeEntry};
use projcfg::store::{CommitOutcome, ConfigStore, EditSession};

const LABEL_SCORES_CONFIG: &str = "  copyMinScore = true\n\
                                   \x20 copyMaxScore = true\n\
                                   \x20 copyAllScoresOnMergeFirstParentUpdate = true\n\
                                   \x20 copyAllScoresOnTrivialRebase = true\n\
                                   \x20 copyAllScoresIfNoCodeChange = true\n\
                                   \x20 copyAllScoresIfNoChange = false\n";

fn developers() -> GroupReference {
    GroupReference::new(GroupUuid::new("X").unwrap(), "Developers")
}

fn staff() -> GroupReference {
    GroupReference::new(GroupUuid::new("Y").unwrap(), "Staff")
}

fn group_line(group: &GroupReference) -> String {
    format!("{}\t{}\n", group.uuid().unwrap().as_str(), group.name())
}

fn who() -> Identity {
    Identity::now("Test Author", "author@example.com").unwrap()
}

/// A store whose config ref points at a commit holding `files`.
fn seeded(files: &[(&str, &str)]) -> ConfigStore<MemoryStore> {
    let memory = MemoryStore::new();
    let entries: Vec<TreeEntry> = files
        .iter()
        .map(|(name, text)| TreeEntry::blob(*name, memory.write_blob(text.as_bytes()).unwrap()))
        .collect();
    let tree = memory.write_tree(&entries).unwrap();
    let commit = memory
        .write_commit(&CommitData {
            tree,
            parents: Vec::new(),
            author: who(),
            committer: who(),
            message: "seed\n".into(),
        })
        .unwrap();
    memory.force_ref(&RefName::config(), &commit);
    ConfigStore::new(memory, RefName::config())
}

fn empty() -> ConfigStore<MemoryStore> {
    ConfigStore::new(MemoryStore::new(), RefName::config())
}

fn read(store: &ConfigStore<MemoryStore>) -> ProjectConfig {
    store.read().unwrap()
}

fn commit(session: EditSession<'_, MemoryStore>) -> Oid {
    match session.commit("Edit\n", &who(), &who()).unwrap() {
        CommitOutcome::Committed { new, .. } => new,
        CommitOutcome::Unchanged { commit } => commit,
    }
}

/// Text of a file in the commit the ref points at.
fn text(store: &ConfigStore<MemoryStore>, name: &str) -> Option<String> {
    let snapshot = store.load().unwrap();
    match name {
        "project.config" => snapshot.config_text,
        "groups" => snapshot.groups_text,
        other => panic!("unexpected file {other}"),
    }
}

mod reading {
    use super::*;

    #[test]
    fn read_config() {
        let store = seeded(&[
            ("groups", &group_line(&developers())),
            (
                "project.config",
                "[access \"refs/heads/*\"]\n\
                 \x20 exclusiveGroupPermissions = read submit create\n\
                 \x20 submit = group Developers\n\
                 \x20 push = group Developers\n\
                 \x20 read = group Developers\n\
                 [accounts]\n\
                 \x20 sameGroupVisibility = deny group Developers\n\
                 \x20 sameGroupVisibility = block group Staff\n\
                 [contributor-agreement \"Individual\"]\n\
                 \x20 description = A simple description\n\
                 \x20 accepted = group Developers\n\
                 \x20 accepted = group Staff\n\
                 \x20 autoVerify = group Developers\n\
                 \x20 agreementUrl = http://www.example.com/agree\n",
            ),
        ]);
        let cfg = read(&store);

        let visibility = cfg.accounts().same_group_visibility();
        assert_eq!(visibility.len(), 2);
        assert_eq!(visibility[0].action(), Action::Deny);
        assert_eq!(visibility[1].action(), Action::Block);

        let ca = cfg.contributor_agreement("Individual").unwrap();
        assert_eq!(ca.name(), "Individual");
        assert_eq!(ca.description(), Some("A simple description"));
        assert_eq!(ca.agreement_url(), Some("http://www.example.com/agree"));
        assert_eq!(ca.accepted().len(), 2);
        assert_eq!(ca.accepted()[0].group(), &developers());
        assert_eq!(ca.accepted()[1].group().name(), "Staff");
        assert_eq!(ca.auto_verify().map(GroupReference::name), Some("Developers"));

        let section = cfg.access_section("refs/heads/*").unwrap();
        assert!(cfg.access_section("refs/*").is_none());
        assert!(section.permission("create").unwrap().exclusive_group());
        assert!(section.permission("submit").unwrap().exclusive_group());
        assert!(section.permission("read").unwrap().exclusive_group());
        assert!(!section.permission("push").unwrap().exclusive_group());

        assert_eq!(
            cfg.validation_errors()
                .iter()
                .map(|e| e.message())
                .collect::<Vec<_>>(),
            vec!["project.config: group \"Staff\" not in groups".to_string()]
        );
    }

    #[test]
    fn label_default_value_is_zero() {
        for zero in ["0 No Score", " 0 No Score"] {
            let config = format!(
                "[label \"CustomLabel\"]\n  value = -1 Negative\n  value = {zero}\n  value =  1 Positive\n"
            );
            let store = seeded(&[("project.config", &config)]);
            let cfg = read(&store);
            assert_eq!(cfg.labels()[0].default_value(), 0, "for {zero:?}");
            assert!(cfg.validation_errors().is_empty());
        }
    }

    #[test]
    fn label_default_value_in_range() {
        let store = seeded(&[(
            "project.config",
            "[label \"CustomLabel\"]\n  value = -1 Negative\n  value = 0 No Score\n  value =  1 Positive\n  defaultValue = -1\n",
        )]);
        assert_eq!(read(&store).labels()[0].default_value(), -1);
    }

    #[test]
    fn label_default_value_out_of_range() {
        let store = seeded(&[(
            "project.config",
            "[label \"CustomLabel\"]\n  value = -1 Negative\n  value = 0 No Score\n  value =  1 Positive\n  defaultValue = -2\n",
        )]);
        let errors = read(&store).validation_errors().to_vec();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message(),
            "project.config: Invalid defaultValue \"-2\" for label \"CustomLabel\""
        );
    }

    #[test]
    fn label_score_copying_flags() {
        let config = format!("[label \"CustomLabel\"]\n{LABEL_SCORES_CONFIG}");
        let store = seeded(&[("project.config", &config)]);
        let cfg = read(&store);
        let label = &cfg.labels()[0];
        assert!(label.is_copy_min_score());
        assert!(label.is_copy_max_score());
        assert!(label.is_copy_all_scores_on_merge_first_parent_update());
        assert!(label.is_copy_all_scores_on_trivial_rebase());
        assert!(label.is_copy_all_scores_if_no_code_change());
        assert!(!label.is_copy_all_scores_if_no_change());
    }

    #[test]
    fn existing_plugin_config() {
        let store = seeded(&[(
            "project.config",
            "[plugin \"somePlugin\"]\n  key1 = value1\n  key2 = value2a\n  key2 = value2b\n",
        )]);
        let cfg = read(&store);
        let plugin = cfg.plugin("somePlugin").unwrap();
        assert_eq!(plugin.names().len(), 2);
        assert_eq!(plugin.get_string("key1"), Some("value1"));
        assert_eq!(plugin.get_string_list("key2"), vec!["value2a", "value2b"]);
    }

    #[test]
    fn missing_plugin_config_is_empty() {
        let store = empty();
        let mut session = store.edit().unwrap();
        assert!(session.config().plugin("somePlugin").is_none());
        assert!(session.config_mut().plugin_mut("somePlugin").names().is_empty());
    }

    #[test]
    fn plugin_group_reference() {
        let store = seeded(&[
            ("groups", &group_line(&developers())),
            ("project.config", "[plugin \"somePlugin\"]\nkey1 = group Developers"),
        ]);
        let cfg = read(&store);
        let plugin = cfg.plugin("somePlugin").unwrap();
        assert_eq!(plugin.names().len(), 1);
        assert_eq!(plugin.get_group_reference("key1"), Some(developers()));
        assert!(cfg.validation_errors().is_empty());
    }

    #[test]
    fn plugin_group_reference_not_in_groups_file() {
        let store = seeded(&[
            ("groups", &group_line(&developers())),
            ("project.config", "[plugin \"somePlugin\"]\nkey1 = group Staff"),
        ]);
        let errors = read(&store).validation_errors().to_vec();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message(),
            "project.config: group \"Staff\" not in groups"
        );
    }

    #[test]
    fn submit_and_project_options() {
        let store = seeded(&[(
            "project.config",
            "[project]\n\tdescription = Demo\n\tstate = read-only\n\
             [submit]\n\taction = cherry pick\n\tmergeContent = true\n",
        )]);
        let cfg = read(&store);
        assert_eq!(cfg.project().description.as_deref(), Some("Demo"));
        assert_eq!(cfg.submit().action, SubmitType::CherryPick);
        assert!(cfg.validation_errors().is_empty());
    }
}

mod comment_links {
    use super::*;

    #[test]
    fn link_with_escaped_pattern() {
        let store = seeded(&[(
            "project.config",
            "[commentlink \"bugzilla\"]\n\
             \tmatch = \"(bug\\\\s+#?)(\\\\d+)\"\n\
             \tlink = http://bugs.example.com/show_bug.cgi?id=$2",
        )]);
        let cfg = read(&store);
        assert_eq!(
            cfg.comment_links(),
            &[CommentLink::link(
                "bugzilla",
                "(bug\\s+#?)(\\d+)",
                "http://bugs.example.com/show_bug.cgi?id=$2"
            )]
        );
    }

    #[test]
    fn enabled_and_disabled_markers() {
        let store = seeded(&[(
            "project.config",
            "[commentlink \"on\"]\n \tenabled = true\n[commentlink \"off\"]\n \tenabled = false",
        )]);
        let cfg = read(&store);
        assert_eq!(
            cfg.comment_links(),
            &[
                CommentLink::Enabled { name: "on".into() },
                CommentLink::Disabled { name: "off".into() },
            ]
        );
    }

    #[test]
    fn invalid_pattern_reported() {
        let store = seeded(&[(
            "project.config",
            "[commentlink \"bugzilla\"]\n\
             \tmatch = \"(bugs{+#?)(d+)\"\n\
             \tlink = http://bugs.example.com/show_bug.cgi?id=$2",
        )]);
        let cfg = read(&store);
        assert!(cfg.comment_links().is_empty());
        let errors = cfg.validation_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message(),
            "project.config: Invalid pattern \"(bugs{+#?)(d+)\" in commentlink.bugzilla.match: \
             regex parse error:\n    (bugs{+#?)(d+)\n          ^\n\
             error: repetition quantifier expects a valid decimal"
        );
    }

    #[test]
    fn raw_html_rejected_by_default() {
        let store = seeded(&[(
            "project.config",
            "[commentlink \"bugzilla\"]\n\
             \tmatch = \"(bugs#?)(d+)\"\n\
             \thtml = http://bugs.example.com/show_bug.cgi?id=$2",
        )]);
        let cfg = read(&store);
        assert!(cfg.comment_links().is_empty());
        assert_eq!(
            cfg.validation_errors()[0].message(),
            "project.config: Error in pattern \"(bugs#?)(d+)\" in commentlink.bugzilla.match: \
             Raw html replacement not allowed"
        );
    }

    #[test]
    fn match_without_replacement_reported() {
        let store = seeded(&[(
            "project.config",
            "[commentlink \"bugzilla\"]\n\tmatch = \"(bugs#?)(d+)\"\n",
        )]);
        let cfg = read(&store);
        assert!(cfg.comment_links().is_empty());
        assert_eq!(
            cfg.validation_errors()[0].message(),
            "project.config: Error in pattern \"(bugs#?)(d+)\" in commentlink.bugzilla.match: \
             commentlink.bugzilla must have either link or html"
        );
    }
}

mod editing {
    use super::*;

    #[test]
    fn edit_config() {
        let original = format!(
            "[access \"refs/heads/*\"]\n\
             \x20 exclusiveGroupPermissions = read submit\n\
             \x20 submit = group Developers\n\
             \x20 upload = group Developers\n\
             \x20 read = group Developers\n\
             [accounts]\n\
             \x20 sameGroupVisibility = deny group Developers\n\
             \x20 sameGroupVisibility = block group Staff\n\
             [contributor-agreement \"Individual\"]\n\
             \x20 description = A simple description\n\
             \x20 accepted = group Developers\n\
             \x20 autoVerify = group Developers\n\
             \x20 agreementUrl = http://www.example.com/agree\n\
             [label \"CustomLabel\"]\n\
             {LABEL_SCORES_CONFIG}"
        );
        let store = seeded(&[
            ("groups", &group_line(&developers())),
            ("project.config", &original),
        ]);

        let mut session = store.edit().unwrap();
        let cfg = session.config_mut();
        let staff = cfg.resolve(&staff());
        cfg.accounts_mut()
            .set_same_group_visibility(vec![PermissionRule::new(staff.clone())]);
        cfg.access_section_mut("refs/heads/*")
            .permission_mut("submit")
            .add(PermissionRule::new(staff.clone()));
        let mut ca = cfg.contributor_agreement("Individual").unwrap().clone();
        ca.set_accepted(vec![PermissionRule::new(staff)]);
        ca.set_auto_verify(None);
        ca.set_description(Some("A new description".into()));
        cfg.put_contributor_agreement(ca);
        commit(session);

        // CustomLabel was read from text, so it gains no function or
        // defaultValue lines.
        assert_eq!(
            text(&store, "project.config").unwrap(),
            format!(
                "[access \"refs/heads/*\"]\n\
                 \x20 exclusiveGroupPermissions = read submit\n\
                 \x20 submit = group Developers\n\
                 \tsubmit = group Staff\n\
                 \x20 upload = group Developers\n\
                 \x20 read = group Developers\n\
                 [accounts]\n\
                 \x20 sameGroupVisibility = group Staff\n\
                 [contributor-agreement \"Individual\"]\n\
                 \x20 description = A new description\n\
                 \x20 accepted = group Staff\n\
                 \x20 agreementUrl = http://www.example.com/agree\n\
                 [label \"CustomLabel\"]\n\
                 {LABEL_SCORES_CONFIG}"
            )
        );
        assert_eq!(
            text(&store, "groups").unwrap(),
            "# UUID\tGroup Name\n#\nX     \tDevelopers\nY     \tStaff\n"
        );
    }

    #[test]
    fn new_label_values() {
        let store = empty();
        let mut session = store.edit().unwrap();
        session.config_mut().put_label(LabelType::new(
            "My-Label",
            vec![
                LabelValue::new(-1, "Negative"),
                LabelValue::new(0, "No score"),
                LabelValue::new(1, "Positive"),
            ],
        ));
        commit(session);
        assert_eq!(
            text(&store, "project.config").unwrap(),
            "[label \"My-Label\"]\n\
             \tfunction = MaxWithBlock\n\
             \tdefaultValue = 0\n\
             \tvalue = -1 Negative\n\
             \tvalue = 0 No score\n\
             \tvalue = +1 Positive\n"
        );
        assert_eq!(text(&store, "groups"), None);
    }

    #[test]
    fn add_comment_link() {
        let store = empty();
        let mut session = store.edit().unwrap();
        session
            .config_mut()
            .add_comment_link(CommentLink::html("Test", "abc.*", "<a>link</a>").with_enabled(true));
        commit(session);
        assert_eq!(
            text(&store, "project.config").unwrap(),
            "[commentlink \"Test\"]\n\tmatch = abc.*\n\thtml = <a>link</a>\n"
        );
    }

    #[test]
    fn missing_group_table_entry() {
        let store = seeded(&[
            ("groups", &group_line(&developers())),
            (
                "project.config",
                "[access \"refs/heads/*\"]\n\
                 \x20 exclusiveGroupPermissions = read submit\n\
                 \x20 submit = group People Who Can Submit\n\
                 \x20 upload = group Developers\n\
                 \x20 read = group Developers\n",
            ),
        ]);
        let mut session = store.edit().unwrap();
        let cfg = session.config_mut();
        let staff = cfg.resolve(&staff());
        cfg.access_section_mut("refs/heads/*")
            .permission_mut("submit")
            .add(PermissionRule::new(staff));
        commit(session);
        assert_eq!(
            text(&store, "project.config").unwrap(),
            "[access \"refs/heads/*\"]\n\
             \x20 exclusiveGroupPermissions = read submit\n\
             \x20 submit = group People Who Can Submit\n\
             \tsubmit = group Staff\n\
             \x20 upload = group Developers\n\
             \x20 read = group Developers\n"
        );
        assert_eq!(
            text(&store, "groups").unwrap(),
            "# UUID\tGroup Name\n#\nX     \tDevelopers\nY     \tStaff\n"
        );
    }

    #[test]
    fn edit_plugin_config() {
        let store = seeded(&[(
            "project.config",
            "[plugin \"somePlugin\"]\n  key1 = value1\n  key2 = value2a\n  key2 = value2b\n",
        )]);
        let mut session = store.edit().unwrap();
        let plugin = session.config_mut().plugin_mut("somePlugin");
        plugin.set_string("key1", "updatedValue1");
        plugin.set_string_list(
            "key2",
            vec!["updatedValue2a".into(), "updatedValue2b".into()],
        );
        commit(session);
        assert_eq!(
            text(&store, "project.config").unwrap(),
            "[plugin \"somePlugin\"]\n\
             \tkey1 = updatedValue1\n\
             \tkey2 = updatedValue2a\n\
             \tkey2 = updatedValue2b\n"
        );
    }

    #[test]
    fn edit_plugin_group_reference() {
        let store = seeded(&[
            ("groups", &group_line(&developers())),
            ("project.config", "[plugin \"somePlugin\"]\nkey1 = group Developers"),
        ]);
        let mut session = store.edit().unwrap();
        session
            .config_mut()
            .plugin_mut("somePlugin")
            .set_group_reference("key1", staff());
        commit(session);
        assert_eq!(
            text(&store, "project.config").unwrap(),
            "[plugin \"somePlugin\"]\n\tkey1 = group Staff\n"
        );
        assert_eq!(
            text(&store, "groups").unwrap(),
            "# UUID\tGroup Name\n#\nY     \tStaff\n"
        );
    }

    #[test]
    fn unrelated_files_survive_commits() {
        let store = seeded(&[
            ("project.config", "[project]\n\tdescription = old\n"),
            ("rules.pl", "submit_rule(S) :- true.\n"),
        ]);
        let mut session = store.edit().unwrap();
        session.config_mut().project_mut().description = Some("new".into());
        let new = commit(session);

        let objects = store.object_store();
        let tree = objects.read_tree(&objects.read_commit(&new).unwrap().tree).unwrap();
        let names: Vec<&str> = tree.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["project.config", "rules.pl"]);
    }

    #[test]
    fn removing_last_group_reference_drops_table() {
        let store = seeded(&[
            ("groups", &group_line(&developers())),
            ("project.config", "[access \"refs/*\"]\n\tread = group Developers\n"),
        ]);
        let mut session = store.edit().unwrap();
        session.config_mut().remove_access_section("refs/*");
        commit(session);
        assert_eq!(text(&store, "project.config").unwrap(), "");
        assert_eq!(text(&store, "groups"), None);
    }

    #[test]
    fn removed_permission_and_plugin_key_leave_the_text() {
        let groups = format!("{}{}", group_line(&developers()), group_line(&staff()));
        let store = seeded(&[
            ("groups", &groups),
            (
                "project.config",
                "[access \"refs/*\"]\n\
                 \tread = group Developers\n\
                 \tpush = group Staff\n\
                 [plugin \"somePlugin\"]\n\
                 \tkey1 = value1\n\
                 \tkey2 = value2\n",
            ),
        ]);
        let mut session = store.edit().unwrap();
        let cfg = session.config_mut();
        cfg.access_section_mut("refs/*").remove_permission("push");
        cfg.plugin_mut("somePlugin").unset("key1");
        commit(session);

        assert_eq!(
            text(&store, "project.config").unwrap(),
            "[access \"refs/*\"]\n\
             \tread = group Developers\n\
             [plugin \"somePlugin\"]\n\
             \tkey2 = value2\n"
        );
        assert_eq!(
            text(&store, "groups").unwrap(),
            "# UUID\tGroup Name\n#\nX     \tDevelopers\n"
        );
        let cfg = read(&store);
        assert!(cfg.access_section("refs/*").unwrap().permission("push").is_none());
        assert!(cfg.plugin("somePlugin").unwrap().get_string("key1").is_none());
    }

    #[test]
    fn unparsable_rule_survives_unrelated_edit() {
        let groups = format!("{}{}", group_line(&developers()), group_line(&staff()));
        let store = seeded(&[
            ("groups", &groups),
            (
                "project.config",
                "[access \"refs/*\"]\n\
                 \tread = group Developers\n\
                 \tread = deny Developers\n",
            ),
        ]);
        let mut session = store.edit().unwrap();
        assert_eq!(session.validation_errors().len(), 1);
        let cfg = session.config_mut();
        let staff = cfg.resolve(&staff());
        cfg.access_section_mut("refs/*")
            .permission_mut("read")
            .add(PermissionRule::new(staff));
        commit(session);

        assert_eq!(
            text(&store, "project.config").unwrap(),
            "[access \"refs/*\"]\n\
             \tread = group Developers\n\
             \tread = deny Developers\n\
             \tread = group Staff\n"
        );
        assert_eq!(read(&store).validation_errors().len(), 1);
    }
}
