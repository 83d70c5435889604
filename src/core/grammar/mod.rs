//! core::grammar
//!
//! The section grammar underlying `project.config`.
//!
//! # Modules
//!
//! - [`document`] - Lossless, editable document model
//! - [`parse`] - Line reader and syntax errors
//! - [`escape`] - Canonical quoting and boolean parsing
//!
//! # Format
//!
//! ```text
//! # comment
//! [access "refs/heads/*"]
//!     read = group Developers     ; trailing comment
//!     exclusiveGroupPermissions = read submit
//! [label "Code-Review"]
//!     value = -1 Needs work
//!     value = "+1 Looks good"
//! ```
//!
//! Section and key names compare case-insensitively, subsection names
//! case-sensitively. Keys may repeat; the last value wins for single-valued
//! reads and all values are kept in order for list reads.

pub mod document;
pub mod escape;
pub mod parse;

pub use document::Document;
pub use escape::{escape_subsection, escape_value, parse_bool};
pub use parse::SyntaxError;
