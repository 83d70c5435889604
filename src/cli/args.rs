//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--repo <path>`: Repository to operate on (default: current directory)
//! - `--ref <ref>`: Configuration ref (default from settings, else `refs/meta/config`)
//! - `--debug`: Enable debug logging

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// projcfg - Version-controlled project configuration
#[derive(Parser, Debug)]
#[command(name = "projcfg")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository to operate on
    #[arg(long, global = true, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    /// Configuration ref to read and update
    #[arg(long = "ref", global = true, value_name = "REF")]
    pub ref_name: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the project configuration
    #[command(after_help = "\
EXAMPLES:
    # Raw project.config as committed
    projcfg show

    # Typed model as JSON
    projcfg show --json")]
    Show {
        /// Print the typed model as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report validation errors; exits with status 1 if there are any
    Validate,

    /// Print the group table
    Groups,

    /// Create the initial configuration commit if none exists
    Init {
        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Manage label definitions
    #[command(subcommand)]
    Label(LabelCommand),

    /// Manage plugin settings
    #[command(subcommand)]
    Plugin(PluginCommand),
}

/// Label subcommands.
#[derive(Subcommand, Debug)]
pub enum LabelCommand {
    /// Add or replace a label
    #[command(after_help = "\
EXAMPLES:
    projcfg label add Verified --value \"-1 Fails\" --value \"0 No score\" --value \"+1 Verified\"")]
    Add {
        /// Label name
        name: String,

        /// A value as \"<score> <text>\", repeatable
        #[arg(
            long = "value",
            value_name = "VALUE",
            required = true,
            allow_hyphen_values = true
        )]
        values: Vec<String>,

        /// Default score
        #[arg(long = "default", allow_hyphen_values = true)]
        default_value: Option<i16>,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Remove a label
    Remove {
        /// Label name
        name: String,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },
}

/// Plugin subcommands.
#[derive(Subcommand, Debug)]
pub enum PluginCommand {
    /// Set a plugin key to one or more values
    Set {
        /// Plugin name
        plugin: String,

        /// Key within the plugin section
        key: String,

        /// Values; more than one writes a multi-valued key
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        values: Vec<String>,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },
}
