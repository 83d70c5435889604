//! git::interface
//!
//! [`ObjectStore`] implementation using git2.
//!
//! This is the only place in the crate that imports `git2`. Errors are
//! normalized into [`GitError`] variants so the layers above never see
//! backend types.
//!
//! # Example
//!
//! ```no_run
//! use projcfg::core::types::RefName;
//! use projcfg::git::{Git, ObjectStore};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! if let Some(oid) = git.read_ref(&RefName::config())? {
//!     println!("config is at {}", oid.short(7));
//! }
//! # Ok::<(), projcfg::git::GitError>(())
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};

use super::traits::{describe, CommitData, GitError, ObjectStore, TreeEntry};
use crate::core::types::{Identity, Oid, RefName};

impl GitError {
    /// Map a git2 error, using `context` (a ref name or OID) in the message.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::ObjectNotFound {
                oid: context.to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ if err.class() == git2::ErrorClass::Os => GitError::AccessError {
                message: format!("{}: {}", context, err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

/// A git repository, bare or not.
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    /// Open the repository containing `path`.
    ///
    /// Uses `git2::Repository::discover`, so `path` may be any directory
    /// inside the repository. Bare repositories are accepted.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Ok(Self { repo })
    }

    /// Create a new repository at `path`.
    pub fn init(path: &Path, bare: bool) -> Result<Self, GitError> {
        let repo = (if bare {
            git2::Repository::init_bare(path)
        } else {
            git2::Repository::init(path)
        })
        .map_err(|e| GitError::from_git2(e, &path.display().to_string()))?;
        Ok(Self { repo })
    }

    /// Path of the `.git` directory (or the repository itself when bare).
    pub fn git_dir(&self) -> PathBuf {
        self.repo.path().to_path_buf()
    }

    fn git_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
        git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    fn oid(oid: git2::Oid) -> Result<Oid, GitError> {
        Oid::new(oid.to_string()).map_err(GitError::from)
    }

    fn signature(identity: &Identity) -> Result<git2::Signature<'static>, GitError> {
        let when = git2::Time::new(identity.seconds(), identity.offset_minutes());
        git2::Signature::new(identity.name(), identity.email(), &when)
            .map_err(|e| GitError::from_git2(e, "signature"))
    }

    fn identity(signature: &git2::Signature<'_>, commit: &str) -> Result<Identity, GitError> {
        let corrupt = |message: String| GitError::CorruptObject {
            oid: commit.to_string(),
            message,
        };
        let name = signature
            .name()
            .ok_or_else(|| corrupt("signature name is not UTF-8".into()))?;
        let email = signature
            .email()
            .ok_or_else(|| corrupt("signature email is not UTF-8".into()))?;
        let time = signature.when();
        let offset = FixedOffset::east_opt(time.offset_minutes() * 60)
            .ok_or_else(|| corrupt("timezone offset out of range".into()))?;
        let when = DateTime::from_timestamp(time.seconds(), 0)
            .ok_or_else(|| corrupt("timestamp out of range".into()))?
            .with_timezone(&offset);
        Identity::new(name, email, when).map_err(|e| corrupt(e.to_string()))
    }
}

impl ObjectStore for Git {
    fn read_ref(&self, name: &RefName) -> Result<Option<Oid>, GitError> {
        match self.repo.find_reference(name.as_str()) {
            Ok(reference) => {
                let resolved = reference.resolve().map_err(|e| GitError::from_git2(e, name.as_str()))?;
                let target = resolved.target().ok_or_else(|| GitError::Internal {
                    message: format!("ref {name} has no target"),
                })?;
                Ok(Some(Self::oid(target)?))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, name.as_str())),
        }
    }

    fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>, GitError> {
        let object = self
            .repo
            .find_object(Self::git_oid(oid)?, None)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        let blob = object.as_blob().ok_or_else(|| GitError::CorruptObject {
            oid: oid.to_string(),
            message: "expected a blob".into(),
        })?;
        Ok(blob.content().to_vec())
    }

    fn read_tree(&self, oid: &Oid) -> Result<Vec<TreeEntry>, GitError> {
        let object = self
            .repo
            .find_object(Self::git_oid(oid)?, None)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        let tree = object.as_tree().ok_or_else(|| GitError::CorruptObject {
            oid: oid.to_string(),
            message: "expected a tree".into(),
        })?;
        tree.iter()
            .map(|entry| {
                let name = entry.name().ok_or_else(|| GitError::CorruptObject {
                    oid: oid.to_string(),
                    message: "tree entry name is not UTF-8".into(),
                })?;
                Ok(TreeEntry {
                    name: name.to_string(),
                    oid: Self::oid(entry.id())?,
                    mode: entry.filemode(),
                })
            })
            .collect()
    }

    fn read_commit(&self, oid: &Oid) -> Result<CommitData, GitError> {
        let object = self
            .repo
            .find_object(Self::git_oid(oid)?, None)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        let commit = object.as_commit().ok_or_else(|| GitError::CorruptObject {
            oid: oid.to_string(),
            message: "expected a commit".into(),
        })?;
        let author = Self::identity(&commit.author(), oid.as_str())?;
        let committer = Self::identity(&commit.committer(), oid.as_str())?;
        let data = CommitData {
            tree: Self::oid(commit.tree_id())?,
            parents: commit
                .parent_ids()
                .map(Self::oid)
                .collect::<Result<_, _>>()?,
            author,
            committer,
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        };
        Ok(data)
    }

    fn write_blob(&self, content: &[u8]) -> Result<Oid, GitError> {
        let oid = self
            .repo
            .blob(content)
            .map_err(|e| GitError::from_git2(e, "blob"))?;
        Self::oid(oid)
    }

    fn write_tree(&self, entries: &[TreeEntry]) -> Result<Oid, GitError> {
        let mut builder = self
            .repo
            .treebuilder(None)
            .map_err(|e| GitError::from_git2(e, "tree"))?;
        for entry in entries {
            builder
                .insert(entry.name.as_str(), Self::git_oid(&entry.oid)?, entry.mode)
                .map_err(|e| GitError::from_git2(e, &entry.name))?;
        }
        let oid = builder.write().map_err(|e| GitError::from_git2(e, "tree"))?;
        Self::oid(oid)
    }

    fn write_commit(&self, commit: &CommitData) -> Result<Oid, GitError> {
        let tree = self
            .repo
            .find_tree(Self::git_oid(&commit.tree)?)
            .map_err(|e| GitError::from_git2(e, commit.tree.as_str()))?;
        let parents = commit
            .parents
            .iter()
            .map(|p| {
                self.repo
                    .find_commit(Self::git_oid(p)?)
                    .map_err(|e| GitError::from_git2(e, p.as_str()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
        let author = Self::signature(&commit.author)?;
        let committer = Self::signature(&commit.committer)?;
        let oid = self
            .repo
            .commit(None, &author, &committer, &commit.message, &tree, &parent_refs)
            .map_err(|e| GitError::from_git2(e, "commit"))?;
        Self::oid(oid)
    }

    fn compare_and_swap_ref(
        &self,
        name: &RefName,
        expected: Option<&Oid>,
        new: &Oid,
        message: &str,
    ) -> Result<(), GitError> {
        let current = self.read_ref(name)?;
        if current.as_ref() != expected {
            return Err(GitError::CasFailed {
                refname: name.to_string(),
                expected: describe(expected),
                actual: describe(current.as_ref()),
            });
        }

        let target = Self::git_oid(new)?;
        let result = match expected {
            Some(old) => self.repo.reference_matching(
                name.as_str(),
                target,
                true,
                Self::git_oid(old)?,
                message,
            ),
            None => self.repo.reference(name.as_str(), target, false, message),
        };
        match result {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.code(), git2::ErrorCode::Modified | git2::ErrorCode::Exists) => {
                let actual = self.read_ref(name)?;
                Err(GitError::CasFailed {
                    refname: name.to_string(),
                    expected: describe(expected),
                    actual: describe(actual.as_ref()),
                })
            }
            Err(e) => Err(GitError::from_git2(e, name.as_str())),
        }
    }
}
