//! store::session
//!
//! One edit cycle: a loaded snapshot, its working copy, and the commit step.

use tracing::{info, warn};

use super::{ConfigStore, Snapshot, StoreError};
use crate::core::project::ProjectConfig;
use crate::core::types::{Identity, Oid};
use crate::core::validation::{ValidationError, GROUP_LIST, PROJECT_CONFIG};
use crate::git::{CommitData, ObjectStore, TreeEntry};

/// Message used when the caller supplies none.
pub const DEFAULT_MESSAGE: &str = "Update project configuration\n";

/// Result of [`EditSession::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The ref now points at `new`.
    Committed { old: Option<Oid>, new: Oid },
    /// Nothing changed; the ref was left at `commit`.
    Unchanged { commit: Oid },
}

/// A working copy bound to the snapshot it was loaded from.
///
/// Consumed by [`commit`](Self::commit); dropping it aborts the edit.
#[derive(Debug)]
pub struct EditSession<'a, S> {
    store: &'a ConfigStore<S>,
    base: Snapshot,
    config: ProjectConfig,
}

impl<'a, S: ObjectStore> EditSession<'a, S> {
    pub(super) fn new(store: &'a ConfigStore<S>, base: Snapshot, config: ProjectConfig) -> Self {
        Self {
            store,
            base,
            config,
        }
    }

    /// Commit the snapshot was loaded from.
    pub fn base_commit(&self) -> Option<&Oid> {
        self.base.commit.as_ref()
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ProjectConfig {
        &mut self.config
    }

    pub fn validation_errors(&self) -> &[ValidationError] {
        self.config.validation_errors()
    }

    /// Write the working copy as a new commit and advance the ref.
    ///
    /// An empty `message` is replaced by [`DEFAULT_MESSAGE`]. When the
    /// rendered files equal the snapshot's, nothing is written and
    /// [`CommitOutcome::Unchanged`] is returned.
    ///
    /// # Errors
    ///
    /// [`StoreError::ConcurrentModification`] if the ref no longer points at
    /// the base commit. Objects written before the failed swap are not
    /// reachable from any ref.
    pub fn commit(
        self,
        message: &str,
        author: &Identity,
        committer: &Identity,
    ) -> Result<CommitOutcome, StoreError> {
        let rendered = self.config.render();
        if let (Some(commit), false) = (&self.base.commit, rendered.changed) {
            info!(commit = %commit, "configuration unchanged, nothing to commit");
            return Ok(CommitOutcome::Unchanged {
                commit: commit.clone(),
            });
        }

        let objects = self.store.object_store();
        let mut entries: Vec<TreeEntry> = self
            .base
            .tree
            .iter()
            .filter(|e| e.name != PROJECT_CONFIG && e.name != GROUP_LIST)
            .cloned()
            .collect();
        let config_blob = objects.write_blob(rendered.config_text.as_bytes())?;
        entries.push(TreeEntry::blob(PROJECT_CONFIG, config_blob));
        if let Some(groups) = &rendered.groups_text {
            let groups_blob = objects.write_blob(groups.as_bytes())?;
            entries.push(TreeEntry::blob(GROUP_LIST, groups_blob));
        }
        let tree = objects.write_tree(&entries)?;

        let message = if message.trim().is_empty() {
            DEFAULT_MESSAGE
        } else {
            message
        };
        let commit = objects.write_commit(&CommitData {
            tree,
            parents: self.base.commit.iter().cloned().collect(),
            author: author.clone(),
            committer: committer.clone(),
            message: message.to_string(),
        })?;

        let refname = self.store.ref_name();
        let old = self.base.commit;
        if let Err(err) = objects.compare_and_swap_ref(refname, old.as_ref(), &commit, message) {
            warn!(refname = %refname, error = %err, "configuration commit lost compare-and-swap");
            return Err(err.into());
        }
        info!(
            refname = %refname,
            old = old.as_ref().map(|o| o.short(12)).unwrap_or("<none>"),
            new = %commit,
            "committed project configuration"
        );
        Ok(CommitOutcome::Committed { old, new: commit })
    }
}
