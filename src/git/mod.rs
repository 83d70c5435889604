//! git
//!
//! Single interface for all version-control operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to the object store. The
//! configuration store talks to the [`ObjectStore`] trait; [`Git`] backs it
//! with a real repository through `git2`, [`MemoryStore`] keeps everything in
//! memory. No other module imports `git2`.
//!
//! # Invariants
//!
//! - Ref updates use compare-and-swap semantics
//! - All operations return strong types (Oid, RefName, Identity)
//! - Backend errors are normalized into [`GitError`]

mod interface;
mod memory;
mod traits;

pub use interface::Git;
pub use memory::MemoryStore;
pub use traits::{CommitData, GitError, ObjectStore, TreeEntry, MODE_BLOB, MODE_TREE};
