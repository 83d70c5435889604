//! core::settings
//!
//! Tool settings and loading.
//!
//! # Locations
//!
//! Searched in order, first hit wins:
//! 1. `$PROJCFG_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/projcfg/config.toml`
//! 3. `~/.projcfg/config.toml`
//!
//! A missing file means defaults. A file that exists but does not parse or
//! validate is an error.
//!
//! # Example
//!
//! ```no_run
//! use projcfg::core::settings::Settings;
//!
//! let settings = Settings::load().unwrap();
//! println!("ref: {}", settings.config_ref());
//! ```

pub mod schema;

pub use schema::{CommentLinkSettings, IdentitySettings, SettingsFile};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::model::ReadOptions;
use crate::core::types::{Identity, RefName, TypeError};

/// Environment variable naming an explicit settings file.
pub const SETTINGS_ENV: &str = "PROJCFG_CONFIG";

/// Errors from settings operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse settings file '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Loaded settings with defaults applied by the accessors.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub file: SettingsFile,
    loaded_from: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but cannot be read,
    /// parsed or validated.
    pub fn load() -> Result<Self, SettingsError> {
        match Self::locate() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load one specific file.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file: SettingsFile = toml::from_str(&contents).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;
        Ok(Self {
            file,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(SETTINGS_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("projcfg/config.toml");
            if path.exists() {
                return Some(path);
            }
        }
        dirs::home_dir()
            .map(|home| home.join(".projcfg/config.toml"))
            .filter(|path| path.exists())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The configuration ref. Defaults to `refs/meta/config`.
    pub fn config_ref(&self) -> RefName {
        self.file
            .config_ref
            .as_deref()
            .and_then(|name| RefName::new(name).ok())
            .unwrap_or_else(RefName::config)
    }

    /// Commit identity stamped with the current time, if configured.
    pub fn identity(&self) -> Option<Result<Identity, TypeError>> {
        let identity = self.file.identity.as_ref()?;
        match (&identity.name, &identity.email) {
            (Some(name), Some(email)) => Some(Identity::now(name.as_str(), email.as_str())),
            _ => None,
        }
    }

    /// Read options for the configuration. Raw html defaults to off.
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            allow_raw_html: self
                .file
                .commentlinks
                .as_ref()
                .and_then(|c| c.allow_raw_html)
                .unwrap_or(false),
        }
    }

    /// Path of the loaded settings file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}
