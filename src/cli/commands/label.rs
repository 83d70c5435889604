//! label command - Add, replace or remove label definitions

use std::process::ExitCode;

use anyhow::{anyhow, bail, Context as _, Result};

use super::{commit_session, ensure_valid};
use crate::cli::Context;
use crate::core::model::label::check_name;
use crate::core::model::{LabelType, LabelValue};

/// Add a label, replacing any existing label with the same name.
pub fn label_add(
    ctx: &Context,
    name: &str,
    values: &[String],
    default_value: Option<i16>,
    message: Option<&str>,
) -> Result<ExitCode> {
    check_name(name).map_err(|e| anyhow!("invalid label name \"{name}\": {e}"))?;
    let values = values
        .iter()
        .map(|raw| LabelValue::parse(raw).map_err(|e| anyhow!("invalid value \"{raw}\": {e}")))
        .collect::<Result<Vec<_>>>()?;

    let mut label = LabelType::new(name, values);
    if let Some(score) = default_value {
        if label.value(score).is_none() {
            bail!("default {score} is not one of the values of \"{name}\"");
        }
        label.set_default_value(score);
    }

    let store = ctx.open_store()?;
    let mut session = store.edit().context("reading configuration")?;
    ensure_valid(&session)?;
    session.config_mut().put_label(label);
    let message = message.map_or_else(|| format!("Add label {name}\n"), str::to_string);
    commit_session(ctx, session, &message)
}

/// Remove a label; removing an unknown label is an error.
pub fn label_remove(ctx: &Context, name: &str, message: Option<&str>) -> Result<ExitCode> {
    let store = ctx.open_store()?;
    let mut session = store.edit().context("reading configuration")?;
    ensure_valid(&session)?;
    if session.config().label(name).is_none() {
        bail!("no label named \"{name}\"");
    }
    session.config_mut().remove_label(name);
    let message = message.map_or_else(|| format!("Remove label {name}\n"), str::to_string);
    commit_session(ctx, session, &message)
}
