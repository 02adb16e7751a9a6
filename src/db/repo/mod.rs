//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `seasons.rs` - Season limits and completion
//! - `claimants.rs` - Claimant aggregates
//! - `candidates.rs` - Candidate descriptors and status
//! - `resolutions.rs` - Resolution records, results and squads
//!
//! Functions taking a `&mut SqliteConnection` are meant to run inside a
//! transaction owned by the settlement coordinator.

mod candidates;
mod claimants;
mod resolutions;
mod seasons;

pub use candidates::{fetch_candidate_status, swap_candidate_status};
pub use claimants::{fetch_claimant, write_claimant_totals};
pub use resolutions::{
    find_resolution, insert_resolution, mark_reverted, supersede_unsold, ResultRow,
    StoredResolution,
};
pub use seasons::fetch_limits;

use crate::datasource::ReadModel;
use crate::domain::{
    Amount, CandidateId, CandidateSnapshot, ClaimantAggregate, ClaimantId, Season, SeasonCode,
};
use crate::engine::AuctionError;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use tracing::warn;

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Parse a stored amount, falling back to zero on corrupt rows. Read-only
/// listings only; anything feeding a write goes through `decode_amount`.
fn parse_amount(raw: &str, column: &'static str, key: &str) -> Amount {
    Amount::from_str_canonical(raw).unwrap_or_else(|e| {
        warn!(
            key = %key,
            column,
            value = %raw,
            error = %e,
            "Failed to parse stored amount, using zero"
        );
        Amount::zero()
    })
}

/// Parse a stored amount, failing the query on a corrupt value.
fn decode_amount(raw: &str, column: &'static str) -> Result<Amount, sqlx::Error> {
    Amount::from_str_canonical(raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

#[async_trait]
impl ReadModel for Repository {
    async fn season(&self, code: &SeasonCode) -> Result<Season, AuctionError> {
        self.get_season(code)
            .await?
            .ok_or_else(|| AuctionError::NotFound(format!("season {}", code)))
    }

    async fn claimant(
        &self,
        season: &SeasonCode,
        id: &ClaimantId,
    ) -> Result<ClaimantAggregate, AuctionError> {
        self.get_claimant(season, id)
            .await?
            .ok_or_else(|| AuctionError::NotFound(format!("claimant {}", id)))
    }

    async fn candidate(
        &self,
        season: &SeasonCode,
        id: &CandidateId,
    ) -> Result<CandidateSnapshot, AuctionError> {
        self.get_candidate(season, id)
            .await?
            .ok_or_else(|| AuctionError::NotFound(format!("candidate {}", id)))
    }

    async fn claimants(&self, season: &SeasonCode) -> Result<Vec<ClaimantAggregate>, AuctionError> {
        Ok(self.list_claimants(season).await?)
    }
}
