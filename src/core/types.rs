//! core::types
//!
//! Strong types for the identifiers the rewrite engine passes around.
//!
//! # Types
//!
//! - [`Oid`] - Object identifier of a commit or tree (hex SHA)
//! - [`BranchName`] - Validated local branch name
//! - [`RefName`] - Validated full reference name
//!
//! Values are validated once, at construction. Everything downstream can
//! assume a `BranchName` is a legal refname component and an `Oid` is full
//! length lowercase hex.
//!
//! # Examples
//!
//! ```
//! use git_rewrite::core::types::{BranchName, Oid, RefName};
//!
//! let branch = BranchName::new("feature/login").unwrap();
//! assert_eq!(RefName::for_branch(&branch).as_str(), "refs/heads/feature/login");
//!
//! let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
//! assert_eq!(oid.short(7), "abc123d");
//!
//! assert!(BranchName::new("bad..name").is_err());
//! assert!(Oid::new("abc123").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),
}

/// Characters git refuses anywhere in a refname.
const FORBIDDEN_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];

/// Check `name` against `git check-ref-format` rules shared by branch and ref names.
///
/// Returns a description of the first violated rule.
fn refname_violation(name: &str) -> Option<String> {
    if name.is_empty() {
        return Some("cannot be empty".into());
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Some("cannot start or end with '/'".into());
    }
    for bad in ["..", "@{", "//"] {
        if name.contains(bad) {
            return Some(format!("cannot contain '{bad}'"));
        }
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Some(format!("cannot contain '{c}'"));
    }
    if name.chars().any(|c| c.is_ascii_control()) {
        return Some("cannot contain control characters".into());
    }
    name.split('/')
        .find(|component| component.starts_with('.') || component.ends_with(".lock"))
        .map(|component| format!("component '{component}' cannot start with '.' or end with '.lock'"))
}

/// A validated local branch name (the part after `refs/heads/`).
///
/// # Example
///
/// ```
/// use git_rewrite::core::types::BranchName;
///
/// assert!(BranchName::new("main").is_ok());
/// assert!(BranchName::new("user@topic").is_ok());
/// assert!(BranchName::new("-flag").is_err());
/// assert!(BranchName::new("@").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name == "@" {
            return Err(TypeError::InvalidBranchName("'@' is reserved".into()));
        }
        if name.starts_with('-') {
            return Err(TypeError::InvalidBranchName("cannot start with '-'".into()));
        }
        if let Some(reason) = refname_violation(&name) {
            return Err(TypeError::InvalidBranchName(reason));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256), normalized to lowercase.
///
/// # Example
///
/// ```
/// use git_rewrite::core::types::Oid;
///
/// let oid = Oid::new("0123456789abcdef0123456789abcdef01234567").unwrap();
/// assert_eq!(oid.short(4), "0123");
/// assert!(Oid::zero().is_zero());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` unless the input is 40 or 64 hex characters.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(format!("'{oid}' is not hexadecimal")));
        }
        Ok(Self(oid))
    }

    /// The null object id (40 zeros).
    pub fn zero() -> Self {
        Self("0".repeat(40))
    }

    pub fn is_zero(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }

    /// Abbreviated form: the first `len` characters (or the whole id).
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated full reference name such as `refs/heads/main`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if let Some(reason) = refname_violation(&name) {
            return Err(TypeError::InvalidRefName(reason));
        }
        Ok(Self(name))
    }

    /// The ref a local branch lives at (`refs/heads/<branch>`).
    pub fn for_branch(branch: &BranchName) -> Self {
        Self(format!("refs/heads/{}", branch.as_str()))
    }

    /// The branch this ref names, if it is under `refs/heads/`.
    pub fn branch(&self) -> Option<BranchName> {
        self.0
            .strip_prefix("refs/heads/")
            .and_then(|name| BranchName::new(name).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
