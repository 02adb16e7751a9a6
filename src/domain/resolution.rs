use super::{Amount, CandidateId, Charge, ClaimantId, ReversalHandle, TimeMs};
use serde::{Deserialize, Serialize};

/// How the operator wants the in-play candidate resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Sold,
    Unsold,
}

/// What a successful commit produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionRecord {
    pub candidate_id: CandidateId,
    pub claimant_id: Option<ClaimantId>,
    pub amount: Amount,
    pub is_unsold: bool,
    pub rtm_used: bool,
    /// Whether the candidate counted against the claimant's free quota.
    pub free_tier: bool,
    pub reversal_handle: ReversalHandle,
    pub created_at: TimeMs,
}

impl ResolutionRecord {
    /// The increments this record applied to its claimant, if any.
    pub fn charge(&self) -> Option<(ClaimantId, Charge)> {
        let claimant = self.claimant_id.clone()?;
        Some((
            claimant,
            Charge {
                amount: self.amount,
                free_tier: self.free_tier,
                rtm: self.rtm_used,
            },
        ))
    }
}
