//! core
//!
//! Core domain types, grammar, and the project configuration model.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, RefName, Identity
//! - [`grammar`] - Lossless section grammar for `project.config`
//! - [`groups`] - The `groups` table and group resolution
//! - [`model`] - Typed builders for every section
//! - [`validation`] - Accumulated validation errors
//! - [`project`] - The editable working copy and its serializer
//! - [`settings`] - Tool settings for the CLI
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Reading never fails; problems become validation errors
//! - Untouched text survives a round trip byte for byte

pub mod grammar;
pub mod groups;
pub mod model;
pub mod project;
pub mod settings;
pub mod types;
pub mod validation;
