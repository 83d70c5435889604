//! show, validate and groups commands - read-only views of the configuration

use std::process::ExitCode;

use anyhow::{Context as _, Result};

use crate::cli::Context;

/// Print `project.config`, or the typed model as JSON.
pub fn show(ctx: &Context, json: bool) -> Result<ExitCode> {
    let store = ctx.open_store()?;
    if json {
        let config = store.read().context("reading configuration")?;
        let out = serde_json::to_string_pretty(config.model())
            .context("serializing configuration")?;
        println!("{out}");
    } else {
        let snapshot = store.load().context("reading configuration")?;
        print!("{}", snapshot.config_text.unwrap_or_default());
    }
    Ok(ExitCode::SUCCESS)
}

/// Print every validation error; exit 1 if there are any.
pub fn validate(ctx: &Context) -> Result<ExitCode> {
    let config = ctx.open_store()?.read().context("reading configuration")?;
    let errors = config.validation_errors();
    for error in errors {
        println!("{error}");
    }
    if errors.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Print the group table.
pub fn groups(ctx: &Context) -> Result<ExitCode> {
    let config = ctx.open_store()?.read().context("reading configuration")?;
    print!("{}", config.group_list().to_text());
    Ok(ExitCode::SUCCESS)
}
