//! Member identity
//!
//! Identities are supplied by the host per call and are opaque to the
//! engine: equality and use as a map key are all that matters.

use serde::{Deserialize, Serialize};

/// Opaque identity of a caller, beneficiary or proposer
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberId(pub String);

impl MemberId {
    /// Reserved identity naming the DAO itself (nominal beneficiary of deposits)
    pub const TREASURY: &'static str = "treasury";

    /// Create a MemberId from a known string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The DAO's own identity, used as beneficiary on contribution receipts
    pub fn treasury() -> Self {
        Self(Self::TREASURY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
