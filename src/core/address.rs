//! Participant identities
//!
//! An [`Address`] is an opaque, comparable identifier for a party that may act
//! on a wallet or receive funds from it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The all-zero address, treated as "no participant"
pub const NULL_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Opaque participant identity
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wrap a raw identifier
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The null identity
    pub fn null() -> Self {
        Self(NULL_ADDRESS.to_string())
    }

    /// Whether this is the null identity (blank or the zero address)
    pub fn is_null(&self) -> bool {
        let trimmed = self.0.trim();
        trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NULL_ADDRESS)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
