//! git::memory
//!
//! In-memory object store for tests and embedding.
//!
//! Objects are content-addressed with [`Oid::digest`], so writing the same
//! content twice yields the same id. Clones share state.
//!
//! # Example
//!
//! ```
//! use projcfg::core::types::RefName;
//! use projcfg::git::{MemoryStore, ObjectStore};
//!
//! let store = MemoryStore::new();
//! let blob = store.write_blob(b"hello").unwrap();
//! assert_eq!(store.read_blob(&blob).unwrap(), b"hello");
//! assert_eq!(store.read_ref(&RefName::config()).unwrap(), None);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{describe, CommitData, GitError, ObjectStore, TreeEntry};
use crate::core::types::{Oid, RefName};

#[derive(Debug, Clone)]
enum Object {
    Blob(Vec<u8>),
    Tree(Vec<TreeEntry>),
    Commit(CommitData),
}

#[derive(Debug, Default)]
struct Inner {
    objects: HashMap<Oid, Object>,
    refs: HashMap<RefName, Oid>,
}

/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn get(&self, oid: &Oid) -> Result<Object, GitError> {
        self.lock()
            .objects
            .get(oid)
            .cloned()
            .ok_or_else(|| GitError::ObjectNotFound {
                oid: oid.to_string(),
            })
    }

    fn put(&self, kind: &str, content: &[u8], object: Object) -> Oid {
        let oid = Oid::digest(kind, content);
        self.lock().objects.entry(oid.clone()).or_insert(object);
        oid
    }

    /// Number of stored objects.
    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    /// Point a ref somewhere without any precondition, as an outside writer would.
    pub fn force_ref(&self, name: &RefName, oid: &Oid) {
        self.lock().refs.insert(name.clone(), oid.clone());
    }
}

fn corrupt(oid: &Oid, expected: &str) -> GitError {
    GitError::CorruptObject {
        oid: oid.to_string(),
        message: format!("expected a {expected}"),
    }
}

impl ObjectStore for MemoryStore {
    fn read_ref(&self, name: &RefName) -> Result<Option<Oid>, GitError> {
        Ok(self.lock().refs.get(name).cloned())
    }

    fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>, GitError> {
        match self.get(oid)? {
            Object::Blob(content) => Ok(content),
            _ => Err(corrupt(oid, "blob")),
        }
    }

    fn read_tree(&self, oid: &Oid) -> Result<Vec<TreeEntry>, GitError> {
        match self.get(oid)? {
            Object::Tree(entries) => Ok(entries),
            _ => Err(corrupt(oid, "tree")),
        }
    }

    fn read_commit(&self, oid: &Oid) -> Result<CommitData, GitError> {
        match self.get(oid)? {
            Object::Commit(commit) => Ok(commit),
            _ => Err(corrupt(oid, "commit")),
        }
    }

    fn write_blob(&self, content: &[u8]) -> Result<Oid, GitError> {
        Ok(self.put("blob", content, Object::Blob(content.to_vec())))
    }

    fn write_tree(&self, entries: &[TreeEntry]) -> Result<Oid, GitError> {
        let mut sorted = entries.to_vec();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        for pair in sorted.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(GitError::Internal {
                    message: format!("duplicate tree entry: {}", pair[0].name),
                });
            }
        }
        let mut content = String::new();
        for entry in &sorted {
            content.push_str(&format!("{:o} {}\0{}\n", entry.mode, entry.name, entry.oid));
        }
        Ok(self.put("tree", content.as_bytes(), Object::Tree(sorted)))
    }

    fn write_commit(&self, commit: &CommitData) -> Result<Oid, GitError> {
        for oid in std::iter::once(&commit.tree).chain(&commit.parents) {
            self.get(oid)?;
        }
        let mut content = format!("tree {}\n", commit.tree);
        for parent in &commit.parents {
            content.push_str(&format!("parent {parent}\n"));
        }
        for (role, who) in [("author", &commit.author), ("committer", &commit.committer)] {
            content.push_str(&format!(
                "{role} {who} {} {:+05}\n",
                who.seconds(),
                who.offset_minutes()
            ));
        }
        content.push('\n');
        content.push_str(&commit.message);
        Ok(self.put("commit", content.as_bytes(), Object::Commit(commit.clone())))
    }

    fn compare_and_swap_ref(
        &self,
        name: &RefName,
        expected: Option<&Oid>,
        new: &Oid,
        _message: &str,
    ) -> Result<(), GitError> {
        let mut inner = self.lock();
        let current = inner.refs.get(name);
        if current != expected {
            return Err(GitError::CasFailed {
                refname: name.to_string(),
                expected: describe(expected),
                actual: describe(current),
            });
        }
        inner.refs.insert(name.clone(), new.clone());
        Ok(())
    }
}
