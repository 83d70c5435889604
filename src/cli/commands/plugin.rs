//! plugin command - Set keys in a plugin section

use std::process::ExitCode;

use anyhow::{Context as _, Result};

use super::{commit_session, ensure_valid};
use crate::cli::Context;

pub fn plugin_set(
    ctx: &Context,
    plugin: &str,
    key: &str,
    values: Vec<String>,
    message: Option<&str>,
) -> Result<ExitCode> {
    let store = ctx.open_store()?;
    let mut session = store.edit().context("reading configuration")?;
    ensure_valid(&session)?;
    session
        .config_mut()
        .plugin_mut(plugin)
        .set_string_list(key, values);
    let message =
        message.map_or_else(|| format!("Configure plugin {plugin}: {key}\n"), str::to_string);
    commit_session(ctx, session, &message)
}
