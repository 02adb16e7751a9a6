//! Read-model abstraction the engine uses for season limits, claimant
//! aggregates and candidate descriptors.
//!
//! Everything returned here is a snapshot and may be stale by the time the
//! caller acts on it. Settlement never trusts these values; it re-reads inside
//! its own transaction.

use crate::domain::{
    CandidateId, CandidateSnapshot, ClaimantAggregate, ClaimantId, Season, SeasonCode,
    SessionLimits,
};
use crate::engine::AuctionError;
use async_trait::async_trait;
use std::fmt;

/// Source of read-side auction data.
///
/// Missing rows are reported as `AuctionError::NotFound`.
#[async_trait]
pub trait ReadModel: Send + Sync + fmt::Debug {
    async fn season(&self, code: &SeasonCode) -> Result<Season, AuctionError>;

    async fn claimant(
        &self,
        season: &SeasonCode,
        id: &ClaimantId,
    ) -> Result<ClaimantAggregate, AuctionError>;

    async fn candidate(
        &self,
        season: &SeasonCode,
        id: &CandidateId,
    ) -> Result<CandidateSnapshot, AuctionError>;

    /// All claimants of the season in a stable order.
    async fn claimants(&self, season: &SeasonCode) -> Result<Vec<ClaimantAggregate>, AuctionError>;

    async fn session_limits(&self, code: &SeasonCode) -> Result<SessionLimits, AuctionError> {
        Ok(self.season(code).await?.limits)
    }
}
