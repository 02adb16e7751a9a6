use super::{Amount, CandidateId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Immutable description of the resource being auctioned in one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDescriptor {
    pub id: CandidateId,
    pub name: String,
    /// Player level code used for grouping (e.g. `l1`).
    pub level_code: String,
    pub is_free_tier: bool,
    pub allows_random_draw: bool,
    pub base_amount: Option<Amount>,
}

/// Persisted status of a candidate; doubles as the compare-and-commit token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Available,
    Sold,
    Unsold,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Available => "available",
            CandidateStatus::Sold => "sold",
            CandidateStatus::Unsold => "unsold",
        }
    }

    /// Whether a candidate in this status may be put into play.
    pub fn is_presentable(&self) -> bool {
        !matches!(self, CandidateStatus::Sold)
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandidateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(CandidateStatus::Available),
            "sold" => Ok(CandidateStatus::Sold),
            "unsold" => Ok(CandidateStatus::Unsold),
            other => Err(format!("unknown candidate status: {}", other)),
        }
    }
}

/// A descriptor together with the status it had when it was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSnapshot {
    pub descriptor: CandidateDescriptor,
    pub status: CandidateStatus,
}
