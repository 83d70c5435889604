//! The configuration store over a real repository.

use tempfile::TempDir;

use projcfg::core::model::{LabelType, LabelValue};
use projcfg::core::types::{Identity, RefName};
use projcfg::git::{Git, GitError, ObjectStore};
use projcfg::store::{CommitOutcome, ConfigStore, FailureKind};

fn who() -> Identity {
    Identity::now("Test Author", "author@example.com").unwrap()
}

fn repo(bare: bool) -> TempDir {
    let dir = TempDir::new().unwrap();
    Git::init(dir.path(), bare).unwrap();
    dir
}

fn store(dir: &TempDir) -> ConfigStore<Git> {
    ConfigStore::new(Git::open(dir.path()).unwrap(), RefName::config())
}

#[test]
fn commit_is_visible_to_git() {
    let dir = repo(true);
    let store = store(&dir);

    let mut session = store.edit().unwrap();
    session.config_mut().put_label(LabelType::new(
        "Verified",
        vec![LabelValue::new(-1, "Fails"), LabelValue::new(0, "No score"), LabelValue::new(1, "Works")],
    ));
    let CommitOutcome::Committed { old, new } =
        session.commit("Add Verified\n", &who(), &who()).unwrap()
    else {
        panic!("expected a commit");
    };
    assert_eq!(old, None);

    let repo = git2::Repository::open_bare(dir.path()).unwrap();
    let reference = repo.find_reference(RefName::CONFIG).unwrap();
    assert_eq!(reference.target().unwrap().to_string(), new.as_str());
    let commit = reference.peel_to_commit().unwrap();
    assert_eq!(commit.message(), Some("Add Verified\n"));
    assert_eq!(commit.author().email(), Some("author@example.com"));
    let entry = commit.tree().unwrap().get_name("project.config").unwrap().id();
    let blob = repo.find_blob(entry).unwrap();
    assert!(std::str::from_utf8(blob.content())
        .unwrap()
        .starts_with("[label \"Verified\"]\n"));
}

#[test]
fn non_bare_repository_from_subdirectory() {
    let dir = repo(false);
    let nested = dir.path().join("src/deep");
    std::fs::create_dir_all(&nested).unwrap();
    let store = ConfigStore::new(Git::open(&nested).unwrap(), RefName::config());
    assert!(store.load().unwrap().commit.is_none());
}

#[test]
fn open_outside_repository() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        Git::open(dir.path()),
        Err(GitError::NotARepo { .. })
    ));
}

#[test]
fn reload_sees_committed_text() {
    let dir = repo(true);
    let store = store(&dir);
    let mut session = store.edit().unwrap();
    session.config_mut().project_mut().description = Some("Demo project".into());
    session.commit("", &who(), &who()).unwrap();

    let reopened = ConfigStore::new(Git::open(dir.path()).unwrap(), RefName::config());
    let config = reopened.read().unwrap();
    assert_eq!(config.project().description.as_deref(), Some("Demo project"));
    assert_eq!(
        reopened.load().unwrap().config_text.as_deref(),
        Some("[project]\n\tdescription = Demo project\n")
    );
}

#[test]
fn concurrent_sessions_across_handles() {
    let dir = repo(true);
    store(&dir).edit().unwrap().commit("init\n", &who(), &who()).unwrap();

    let first = store(&dir);
    let second = store(&dir);
    let mut a = first.edit().unwrap();
    let mut b = second.edit().unwrap();
    a.config_mut().project_mut().description = Some("from a".into());
    b.config_mut().project_mut().description = Some("from b".into());

    let CommitOutcome::Committed { new: winner, .. } = a.commit("a\n", &who(), &who()).unwrap()
    else {
        panic!("expected a commit");
    };
    let err = b.commit("b\n", &who(), &who()).unwrap_err();
    assert_eq!(err.kind(), FailureKind::ConcurrentModification);
    assert!(err
        .to_string()
        .contains("configuration ref moved concurrently; reload and retry"));

    let head = first.object_store().read_ref(&RefName::config()).unwrap();
    assert_eq!(head, Some(winner));
    assert_eq!(
        first.read().unwrap().project().description.as_deref(),
        Some("from a")
    );
}

#[test]
fn unchanged_edit_writes_nothing() {
    let dir = repo(true);
    let store = store(&dir);
    let mut session = store.edit().unwrap();
    session.config_mut().project_mut().description = Some("x".into());
    let CommitOutcome::Committed { new, .. } = session.commit("", &who(), &who()).unwrap() else {
        panic!("expected a commit");
    };

    let session = store.edit().unwrap();
    assert_eq!(
        session.commit("", &who(), &who()).unwrap(),
        CommitOutcome::Unchanged { commit: new }
    );
}
