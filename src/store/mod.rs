//! store
//!
//! Loading and committing the configuration snapshot.
//!
//! # Architecture
//!
//! A snapshot is the tree of one commit on the configuration ref. Two of its
//! files are owned here: `project.config` and the `groups` table. Every other
//! entry is carried into new commits untouched.
//!
//! ```text
//! ConfigStore::load    -> Snapshot            (read only, no side effects)
//! ConfigStore::edit    -> EditSession         (snapshot + ProjectConfig)
//! EditSession::commit  -> CommitOutcome       (blobs, tree, commit, CAS)
//! ```
//!
//! # CAS Semantics
//!
//! The only publication point is the compare-and-swap of the ref from the
//! snapshot's commit to the new one. A session that loses the race gets
//! [`StoreError::ConcurrentModification`] and must start over from
//! [`ConfigStore::edit`]; nothing retries internally.
//!
//! # Example
//!
//! ```
//! use projcfg::core::types::{Identity, RefName};
//! use projcfg::git::MemoryStore;
//! use projcfg::store::{CommitOutcome, ConfigStore};
//!
//! let store = ConfigStore::new(MemoryStore::new(), RefName::config());
//! let mut session = store.edit().unwrap();
//! session.config_mut().project_mut().description = Some("demo".into());
//!
//! let who = Identity::now("Config Admin", "admin@example.com").unwrap();
//! let outcome = session.commit("Describe project\n", &who, &who).unwrap();
//! assert!(matches!(outcome, CommitOutcome::Committed { old: None, .. }));
//! ```

mod session;

pub use session::{CommitOutcome, EditSession};

use thiserror::Error;
use tracing::debug;

use crate::core::model::ReadOptions;
use crate::core::project::ProjectConfig;
use crate::core::types::{Oid, RefName};
use crate::core::validation::{GROUP_LIST, PROJECT_CONFIG};
use crate::git::{GitError, ObjectStore, TreeEntry};

/// Coarse failure categories callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    CorruptObject,
    ConcurrentModification,
    Io,
}

/// Errors from loading or committing a snapshot.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The ref moved between load and commit.
    #[error("configuration ref moved concurrently; reload and retry ({refname}: expected {expected}, found {actual})")]
    ConcurrentModification {
        refname: String,
        expected: String,
        actual: String,
    },

    /// A referenced object is missing.
    #[error("object not found: {0}")]
    NotFound(String),

    /// An object is malformed or of the wrong kind.
    #[error("corrupt object {oid}: {message}")]
    Corrupt { oid: String, message: String },

    /// Repository access failed.
    #[error("storage failure: {0}")]
    Io(String),
}

impl StoreError {
    pub fn kind(&self) -> FailureKind {
        match self {
            StoreError::ConcurrentModification { .. } => FailureKind::ConcurrentModification,
            StoreError::NotFound(_) => FailureKind::NotFound,
            StoreError::Corrupt { .. } => FailureKind::CorruptObject,
            StoreError::Io(_) => FailureKind::Io,
        }
    }
}

impl From<GitError> for StoreError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::CasFailed {
                refname,
                expected,
                actual,
            } => StoreError::ConcurrentModification {
                refname,
                expected,
                actual,
            },
            GitError::ObjectNotFound { oid } => StoreError::NotFound(oid),
            GitError::CorruptObject { oid, message } => StoreError::Corrupt { oid, message },
            GitError::InvalidOid { oid } => StoreError::Corrupt {
                message: "invalid object id".into(),
                oid,
            },
            other => StoreError::Io(other.to_string()),
        }
    }
}

/// The configuration files of one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Commit the snapshot was read from; `None` before the first commit.
    pub commit: Option<Oid>,
    /// Full tree of that commit.
    pub tree: Vec<TreeEntry>,
    pub config_text: Option<String>,
    pub groups_text: Option<String>,
}

impl Snapshot {
    /// The state of a project that has never been committed.
    pub fn empty() -> Self {
        Self {
            commit: None,
            tree: Vec::new(),
            config_text: None,
            groups_text: None,
        }
    }
}

/// Access to the configuration ref of one repository.
#[derive(Debug, Clone)]
pub struct ConfigStore<S> {
    store: S,
    ref_name: RefName,
    options: ReadOptions,
}

impl<S: ObjectStore> ConfigStore<S> {
    pub fn new(store: S, ref_name: RefName) -> Self {
        Self {
            store,
            ref_name,
            options: ReadOptions::default(),
        }
    }

    /// Options passed to every read pass.
    pub fn with_read_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn ref_name(&self) -> &RefName {
        &self.ref_name
    }

    pub fn object_store(&self) -> &S {
        &self.store
    }

    /// Read the snapshot the ref points at, or an empty one if it is absent.
    pub fn load(&self) -> Result<Snapshot, StoreError> {
        let Some(commit) = self.store.read_ref(&self.ref_name)? else {
            debug!(refname = %self.ref_name, "configuration ref absent, using empty snapshot");
            return Ok(Snapshot::empty());
        };
        let data = self.store.read_commit(&commit)?;
        let tree = self.store.read_tree(&data.tree)?;
        let config_text = self.read_text(&tree, PROJECT_CONFIG)?;
        let groups_text = self.read_text(&tree, GROUP_LIST)?;
        debug!(refname = %self.ref_name, commit = %commit, "loaded configuration snapshot");
        Ok(Snapshot {
            commit: Some(commit),
            tree,
            config_text,
            groups_text,
        })
    }

    fn read_text(&self, tree: &[TreeEntry], name: &str) -> Result<Option<String>, StoreError> {
        let Some(entry) = tree.iter().find(|e| e.name == name) else {
            return Ok(None);
        };
        if !entry.is_blob() {
            return Err(StoreError::Corrupt {
                oid: entry.oid.to_string(),
                message: format!("{name} is not a file"),
            });
        }
        let bytes = self.store.read_blob(&entry.oid)?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| StoreError::Corrupt {
                oid: entry.oid.to_string(),
                message: format!("{name} is not valid UTF-8"),
            })
    }

    /// Load and parse the current configuration without starting an edit.
    pub fn read(&self) -> Result<ProjectConfig, StoreError> {
        let snapshot = self.load()?;
        Ok(self.parse(&snapshot))
    }

    fn parse(&self, snapshot: &Snapshot) -> ProjectConfig {
        let config = ProjectConfig::read(
            snapshot.config_text.as_deref(),
            snapshot.groups_text.as_deref(),
            self.options,
        );
        debug!(
            errors = config.validation_errors().len(),
            "parsed project configuration"
        );
        config
    }

    /// Start an edit session on a freshly loaded snapshot.
    pub fn edit(&self) -> Result<EditSession<'_, S>, StoreError> {
        let snapshot = self.load()?;
        let config = self.parse(&snapshot);
        Ok(EditSession::new(self, snapshot, config))
    }
}
