//! cli
//!
//! Command-line interface for projcfg.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install logging
//! - Resolve settings, the repository and the configuration ref
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers open a [`ConfigStore`] over the repository
//! and go through [`EditSession`](crate::store::EditSession) for every change;
//! nothing here writes objects or refs directly.

pub mod args;
pub mod commands;

pub use args::Cli;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::settings::Settings;
use crate::core::types::{Identity, RefName};
use crate::git::Git;
use crate::store::ConfigStore;

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "PROJCFG_LOG";

/// Identity used for commits when settings name none.
const FALLBACK_NAME: &str = "projcfg";
const FALLBACK_EMAIL: &str = "projcfg@localhost";

/// Values shared by every command handler.
#[derive(Debug)]
pub struct Context {
    pub repo: PathBuf,
    pub ref_name: RefName,
    pub settings: Settings,
}

impl Context {
    /// Open the configuration store for this invocation.
    pub fn open_store(&self) -> Result<ConfigStore<Git>> {
        let git = Git::open(&self.repo)
            .with_context(|| format!("opening repository at {}", self.repo.display()))?;
        Ok(ConfigStore::new(git, self.ref_name.clone()).with_read_options(self.settings.read_options()))
    }

    /// Author and committer for new commits.
    pub fn identity(&self) -> Result<Identity> {
        match self.settings.identity() {
            Some(identity) => identity.context("invalid identity in settings"),
            None => Identity::now(FALLBACK_NAME, FALLBACK_EMAIL).context("building default identity"),
        }
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    init_logging(cli.debug);

    let settings = Settings::load().context("loading settings")?;
    let ref_name = match &cli.ref_name {
        Some(name) => RefName::new(name.as_str()).context("invalid --ref")?,
        None => settings.config_ref(),
    };
    let repo = match cli.repo.clone() {
        Some(path) => path,
        None => std::env::current_dir().context("reading current directory")?,
    };

    let ctx = Context {
        repo,
        ref_name,
        settings,
    };
    commands::dispatch(cli.command, &ctx)
}
