//! init command - Create the first configuration commit

use std::process::ExitCode;

use anyhow::{Context as _, Result};

use super::commit_session;
use crate::cli::Context;

/// Commit an empty configuration if the ref does not exist yet.
pub fn init(ctx: &Context, message: Option<&str>) -> Result<ExitCode> {
    let store = ctx.open_store()?;
    let session = store.edit().context("reading configuration")?;
    if let Some(commit) = session.base_commit() {
        println!("{} already exists at {}", ctx.ref_name, commit.short(12));
        return Ok(ExitCode::SUCCESS);
    }
    commit_session(ctx, session, message.unwrap_or("Create project configuration\n"))
}
