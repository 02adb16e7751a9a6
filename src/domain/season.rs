use super::{Amount, SeasonCode, TimeMs};
use serde::{Deserialize, Serialize};

/// Per-season caps every claimant is measured against.
///
/// Immutable for the duration of a session; a season change replaces the
/// whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLimits {
    pub max_claimants: u32,
    pub max_free_quota: u32,
    pub max_rtm_quota: u32,
    pub budget_limit: Amount,
    pub min_candidate_amount: Amount,
}

/// A season row: its limits plus completion bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub code: SeasonCode,
    pub limits: SessionLimits,
    pub completed_at: Option<TimeMs>,
    pub completion_note: Option<String>,
}

impl Season {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}
