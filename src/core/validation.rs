//! core::validation
//!
//! Recoverable problems found while reading a configuration snapshot.
//!
//! Reading never fails on bad content. Every builder pushes what it could not
//! accept into a [`Diagnostics`] sink and carries on with a degraded model.
//! Callers inspect the resulting list and decide whether to trust derived
//! values or to reject a commit.

use std::fmt;

use serde::Serialize;

/// Path of the configuration text inside a snapshot tree.
pub const PROJECT_CONFIG: &str = "project.config";

/// Path of the group table inside a snapshot tree.
pub const GROUP_LIST: &str = "groups";

/// A single non-fatal problem attached to a file in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    file: String,
    line: Option<usize>,
    message: String,
}

impl ValidationError {
    pub fn new(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            message: message.into(),
        }
    }

    /// Attach a 1-based line number.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// The bare message, without the file prefix.
    pub fn detail(&self) -> &str {
        &self.message
    }

    /// The full message: `file: detail` or `file:line: detail`.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.file, line, self.message),
            None => write!(f, "{}: {}", self.file, self.message),
        }
    }
}

/// Ordered accumulator for [`ValidationError`]s.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    errors: Vec<ValidationError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem against `project.config`.
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors
            .push(ValidationError::new(PROJECT_CONFIG, message));
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl Extend<ValidationError> for Diagnostics {
    fn extend<T: IntoIterator<Item = ValidationError>>(&mut self, iter: T) {
        self.errors.extend(iter);
    }
}
