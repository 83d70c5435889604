//! git::traits
//!
//! The object-store seam consumed by the configuration store.
//!
//! # Design
//!
//! The store needs a handful of primitives: resolve a ref, read and write
//! blobs, trees and commits, and advance a ref with compare-and-swap. Both
//! the git2-backed [`Git`](super::Git) and the in-memory
//! [`MemoryStore`](super::MemoryStore) implement [`ObjectStore`]. All calls
//! are blocking local I/O.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::types::{Identity, Oid, RefName, TypeError};

/// Tree entry mode for a regular file.
pub const MODE_BLOB: i32 = 0o100644;

/// Tree entry mode for a subdirectory.
pub const MODE_TREE: i32 = 0o040000;

/// Errors from object-store operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Compare-and-swap precondition failed.
    #[error("CAS failed for {refname}: expected {expected}, found {actual}")]
    CasFailed {
        /// The ref being updated
        refname: String,
        /// The expected old value
        expected: String,
        /// The actual current value
        actual: String,
    },

    /// Object not found in the store.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// An object exists but is not what the caller asked for, or cannot be decoded.
    #[error("corrupt object {oid}: {message}")]
    CorruptObject {
        /// The offending OID
        oid: String,
        /// What was wrong with it
        message: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal backend error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) => GitError::InvalidRefName { message: msg },
            TypeError::InvalidIdentity(msg) => GitError::Internal { message: msg },
        }
    }
}

/// One entry of a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: String,
    pub oid: Oid,
    /// Git file mode, e.g. [`MODE_BLOB`].
    pub mode: i32,
}

impl TreeEntry {
    /// A regular file entry.
    pub fn blob(name: impl Into<String>, oid: Oid) -> Self {
        Self {
            name: name.into(),
            oid,
            mode: MODE_BLOB,
        }
    }

    pub fn is_blob(&self) -> bool {
        self.mode & 0o170000 == 0o100000
    }
}

/// The parts of a commit the store reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitData {
    pub tree: Oid,
    pub parents: Vec<Oid>,
    pub author: Identity,
    pub committer: Identity,
    pub message: String,
}

/// Blocking access to a content-addressed object store with refs.
pub trait ObjectStore {
    /// Current target of a ref, or `None` if it does not exist.
    fn read_ref(&self, name: &RefName) -> Result<Option<Oid>, GitError>;

    fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>, GitError>;

    fn read_tree(&self, oid: &Oid) -> Result<Vec<TreeEntry>, GitError>;

    fn read_commit(&self, oid: &Oid) -> Result<CommitData, GitError>;

    fn write_blob(&self, content: &[u8]) -> Result<Oid, GitError>;

    fn write_tree(&self, entries: &[TreeEntry]) -> Result<Oid, GitError>;

    fn write_commit(&self, commit: &CommitData) -> Result<Oid, GitError>;

    /// Point `name` at `new` only if it currently points at `expected`
    /// (`None` meaning the ref must not exist).
    ///
    /// # Errors
    ///
    /// [`GitError::CasFailed`] when the ref holds anything else.
    fn compare_and_swap_ref(
        &self,
        name: &RefName,
        expected: Option<&Oid>,
        new: &Oid,
        message: &str,
    ) -> Result<(), GitError>;
}

/// Render an optional OID for CAS diagnostics.
pub(crate) fn describe(oid: Option<&Oid>) -> String {
    oid.map_or_else(|| "<none>".to_string(), |o| o.to_string())
}
