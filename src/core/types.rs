//! core::types
//!
//! Object ids, ref names and commit identities.
//!
//! ```
//! use projcfg::core::types::{Oid, RefName};
//!
//! assert_eq!(RefName::config().as_str(), "refs/meta/config");
//! assert!(RefName::new("refs/meta/bad..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use chrono::{DateTime, FixedOffset, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
}

/// Lowercase hex address of a stored object: 40 digits for git's SHA-1,
/// 64 for [`Oid::digest`].
///
/// ```
/// use projcfg::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid(String);

impl Oid {
    /// # Errors
    ///
    /// [`TypeError::InvalidOid`] unless `oid` is 40 or 64 hex digits.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        let hex = oid.bytes().all(|b| b.is_ascii_hexdigit());
        match (oid.len(), hex) {
            (40 | 64, true) => Ok(Self(oid)),
            (40 | 64, false) => Err(TypeError::InvalidOid(format!("{oid:?} is not hexadecimal"))),
            (len, _) => Err(TypeError::InvalidOid(format!(
                "{oid:?} has {len} digits, expected 40 or 64"
            ))),
        }
    }

    /// SHA-256 over a git-style `<kind> <len>\0` header and the content.
    /// [`MemoryStore`](crate::git::MemoryStore) addresses its objects this way.
    ///
    /// ```
    /// use projcfg::core::types::Oid;
    ///
    /// assert_eq!(Oid::digest("blob", b"hello"), Oid::digest("blob", b"hello"));
    /// assert_ne!(Oid::digest("blob", b"hello"), Oid::digest("tree", b"hello"));
    /// ```
    pub fn digest(kind: &str, content: &[u8]) -> Self {
        let header = format!("{kind} {}\0", content.len());
        let hash = Sha256::new()
            .chain_update(header.as_bytes())
            .chain_update(content)
            .finalize();
        Self(hex::encode(hash))
    }

    /// At most the first `len` digits.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A ref under `refs/`, such as the configuration branch `refs/meta/config`.
///
/// ```
/// use projcfg::core::types::RefName;
///
/// assert_eq!(RefName::new("refs/meta/config").unwrap(), RefName::config());
/// assert!(RefName::new("meta/config").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RefName(String);

impl RefName {
    pub const CONFIG: &'static str = "refs/meta/config";

    /// # Errors
    ///
    /// [`TypeError::InvalidRefName`] for names outside `refs/` or names git
    /// would refuse: empty or dot-leading components, `.lock` components,
    /// `..`, `@{`, whitespace, control characters or glob characters.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        let reject = |why: &str| Err(TypeError::InvalidRefName(format!("{name:?} {why}")));
        let Some(path) = name.strip_prefix("refs/") else {
            return reject("is not under refs/");
        };
        if path
            .split('/')
            .any(|part| part.is_empty() || part.starts_with('.') || part.ends_with(".lock"))
        {
            return reject("has an empty, hidden or .lock component");
        }
        if name.contains("..") || name.contains("@{") {
            return reject("contains '..' or '@{'");
        }
        if name
            .chars()
            .any(|c| c.is_whitespace() || c.is_ascii_control() || "~^:\\?*[".contains(c))
        {
            return reject("contains a forbidden character");
        }
        Ok(Self(name))
    }

    /// `refs/meta/config`.
    pub fn config() -> Self {
        Self(Self::CONFIG.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Author or committer identity attached to a configuration commit.
///
/// # Example
///
/// ```
/// use projcfg::core::types::Identity;
///
/// let who = Identity::now("Config Admin", "admin@example.com").unwrap();
/// assert_eq!(who.to_string(), "Config Admin <admin@example.com>");
/// assert!(Identity::now("Bad <name>", "admin@example.com").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: String,
    email: String,
    when: DateTime<FixedOffset>,
}

impl Identity {
    /// Create an identity stamped with an explicit time.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidIdentity` if the name is empty or either field
    /// contains `<`, `>` or a line break.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        when: DateTime<FixedOffset>,
    ) -> Result<Self, TypeError> {
        let name = name.into();
        let email = email.into();
        if name.trim().is_empty() {
            return Err(TypeError::InvalidIdentity("name cannot be empty".into()));
        }
        for (field, value) in [("name", &name), ("email", &email)] {
            if value.contains(['<', '>', '\n', '\r']) {
                return Err(TypeError::InvalidIdentity(format!(
                    "{field} cannot contain '<', '>' or line breaks"
                )));
            }
        }
        Ok(Self { name, email, when })
    }

    /// Create an identity stamped with the current time (UTC).
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Result<Self, TypeError> {
        Self::new(name, email, Utc::now().fixed_offset())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn when(&self) -> DateTime<FixedOffset> {
        self.when
    }

    /// Seconds since the epoch.
    pub fn seconds(&self) -> i64 {
        self.when.timestamp()
    }

    /// UTC offset in minutes.
    pub fn offset_minutes(&self) -> i32 {
        self.when.offset().local_minus_utc() / 60
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}
