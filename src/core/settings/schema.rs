//! core::settings::schema
//!
//! Settings file schema.
//!
//! # Example
//!
//! ```toml
//! config_ref = "refs/meta/config"
//!
//! [identity]
//! name = "Config Bot"
//! email = "config-bot@example.com"
//!
//! [commentlinks]
//! allow_raw_html = false
//! ```

use serde::{Deserialize, Serialize};

use super::SettingsError;
use crate::core::types::{Identity, RefName};

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    /// Ref holding the configuration (default: `refs/meta/config`)
    pub config_ref: Option<String>,

    /// Author and committer for commits made by the CLI
    pub identity: Option<IdentitySettings>,

    /// Comment-link read options
    pub commentlinks: Option<CommentLinkSettings>,
}

impl SettingsFile {
    /// Validate the values.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(name) = &self.config_ref {
            RefName::new(name.as_str())
                .map_err(|e| SettingsError::InvalidValue(format!("config_ref: {e}")))?;
        }
        if let Some(identity) = &self.identity {
            identity.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IdentitySettings {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl IdentitySettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        match (&self.name, &self.email) {
            (Some(name), Some(email)) => Identity::now(name.as_str(), email.as_str())
                .map(|_| ())
                .map_err(|e| SettingsError::InvalidValue(format!("identity: {e}"))),
            (None, None) => Ok(()),
            _ => Err(SettingsError::InvalidValue(
                "identity: both name and email must be set".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CommentLinkSettings {
    /// Accept `html` replacements in comment links
    pub allow_raw_html: Option<bool>,
}
