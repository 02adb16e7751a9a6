//! Domain primitives: identifiers and timestamps.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    pub fn as_ms(&self) -> i64 {
        self.0
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Candidate (player) code, e.g. `P001`.
    CandidateId
);

string_id!(
    /// Claimant (team-in-season) code, e.g. `T01_S6`.
    ClaimantId
);

string_id!(
    /// Season code, e.g. `S6`.
    SeasonCode
);

/// Opaque reference returned by a commit and required to reverse it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReversalHandle(String);

impl ReversalHandle {
    /// Mint a fresh handle. Sold and unsold records get distinct prefixes so
    /// an operator can tell them apart in logs.
    pub fn mint(is_unsold: bool) -> Self {
        let prefix = if is_unsold { "us" } else { "pt" };
        ReversalHandle(format!("{}-{}", prefix, uuid::Uuid::new_v4().simple()))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        ReversalHandle(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReversalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = ClaimantId::new("T01_S6");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"T01_S6\"");
        let back: ClaimantId = serde_json::from_str("\"T01_S6\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_minted_handles_are_unique_and_prefixed() {
        let a = ReversalHandle::mint(false);
        let b = ReversalHandle::mint(false);
        let u = ReversalHandle::mint(true);
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("pt-"));
        assert!(u.as_str().starts_with("us-"));
    }

    #[test]
    fn test_timems_ordering() {
        assert!(TimeMs::new(1000) < TimeMs::new(2000));
    }
}
