//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Read-only handlers call [`ConfigStore::load`](crate::store::ConfigStore::load)
//! or [`ConfigStore::read`](crate::store::ConfigStore::read). Mutating handlers
//! open an edit session, change the working copy and hand it to
//! [`commit_session`], which reports the outcome uniformly.

mod init;
mod label;
mod plugin;
mod show;

pub use init::init;
pub use label::{label_add, label_remove};
pub use plugin::plugin_set;
pub use show::{groups, show, validate};

use std::process::ExitCode;

use anyhow::{bail, Context as _, Result};

use crate::cli::args::{Command, LabelCommand, PluginCommand};
use crate::cli::Context;
use crate::git::Git;
use crate::store::{CommitOutcome, EditSession, FailureKind};

/// Exit status when the configuration ref moved during a commit.
pub const EXIT_CONFLICT: u8 = 3;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<ExitCode> {
    match command {
        Command::Show { json } => show::show(ctx, json),
        Command::Validate => show::validate(ctx),
        Command::Groups => show::groups(ctx),
        Command::Init { message } => init::init(ctx, message.as_deref()),
        Command::Label(LabelCommand::Add {
            name,
            values,
            default_value,
            message,
        }) => label::label_add(ctx, &name, &values, default_value, message.as_deref()),
        Command::Label(LabelCommand::Remove { name, message }) => {
            label::label_remove(ctx, &name, message.as_deref())
        }
        Command::Plugin(PluginCommand::Set {
            plugin,
            key,
            values,
            message,
        }) => plugin::plugin_set(ctx, &plugin, &key, values, message.as_deref()),
    }
}

/// Refuse to commit on top of a configuration that does not validate.
fn ensure_valid(session: &EditSession<'_, Git>) -> Result<()> {
    let errors = session.validation_errors();
    if errors.is_empty() {
        return Ok(());
    }
    for error in errors {
        eprintln!("{error}");
    }
    bail!(
        "configuration has {} validation error(s); fix them before editing",
        errors.len()
    )
}

/// Commit a session and print what happened.
fn commit_session(ctx: &Context, session: EditSession<'_, Git>, message: &str) -> Result<ExitCode> {
    let who = ctx.identity()?;
    match session.commit(message, &who, &who) {
        Ok(CommitOutcome::Committed { new, .. }) => {
            println!("{} {}", ctx.ref_name, new.short(12));
            Ok(ExitCode::SUCCESS)
        }
        Ok(CommitOutcome::Unchanged { commit }) => {
            println!("{} unchanged at {}", ctx.ref_name, commit.short(12));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.kind() == FailureKind::ConcurrentModification => {
            eprintln!("error: {err}");
            Ok(ExitCode::from(EXIT_CONFLICT))
        }
        Err(err) => Err(err).context("committing configuration"),
    }
}
