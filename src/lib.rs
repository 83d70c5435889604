//! projcfg - Version-controlled project configuration
//!
//! A project's access rules, labels, plugin settings and other options live
//! in two files on a dedicated ref of a git repository: `project.config`, a
//! sectioned key/value document, and `groups`, a table binding group names to
//! stable identifiers. projcfg reads them into a typed model, reports every
//! problem it finds instead of stopping at the first, and writes changes back
//! as a new commit without disturbing text nobody touched.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer
//! - [`store`] - Load a snapshot, edit it, commit it with compare-and-swap
//! - [`core`] - Grammar, typed model, validation, settings
//! - [`git`] - Single interface for all object and ref operations
//!
//! # Correctness Invariants
//!
//! 1. Parsing and re-serializing an unmodified document yields identical text
//! 2. The group table is rewritten only when the configuration text changes
//! 3. A commit either advances the ref from the loaded commit or fails
//! 4. Reading never stops at the first validation error

pub mod cli;
pub mod core;
pub mod git;
pub mod store;
