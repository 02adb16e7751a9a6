use super::eligibility::IneligibleReason;
use thiserror::Error;

/// Every routine failure the engine can report.
///
/// None of these leave the aggregate store modified.
#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("claimant is ineligible: {0}")]
    Ineligible(IneligibleReason),
    #[error("right-to-match is not available for this claimant")]
    RtmNotAllowed,
    #[error("no eligible claimants for the draw")]
    NoEligibleClaimants,
    #[error("a candidate is already in play")]
    AlreadyInPlay,
    #[error("a draw has already been made for this candidate")]
    AlreadyDrawn,
    #[error("cannot {op} while {state}")]
    InvalidTransition { op: &'static str, state: &'static str },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("resolution has already been reverted")]
    AlreadyReverted,
    /// The backing store failed; carries its message.
    #[error("storage failure: {0}")]
    Storage(String),
}
