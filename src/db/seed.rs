//! Loads season master data (limits, claimants, candidates) from a JSON file.
//!
//! ```json
//! {
//!   "season": { "code": "S26", "maxClaimants": 20, "maxFreeQuota": 2,
//!               "maxRtmQuota": 2, "budgetLimit": "100", "minCandidateAmount": "1" },
//!   "claimants": [ { "id": "csk", "name": "Chennai", "rtmEligible": true } ],
//!   "candidates": [ { "id": "p1", "name": "A Player", "levelCode": "l1", "baseAmount": "2" } ]
//! }
//! ```
//!
//! Loading is an upsert, so re-running it on an existing database refreshes
//! names and flags without touching counters or statuses.

use super::Repository;
use crate::domain::{
    Amount, CandidateDescriptor, CandidateId, ClaimantAggregate, ClaimantId, SeasonCode,
    SessionLimits,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid seed: {0}")]
    Invalid(String),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSeason {
    pub code: SeasonCode,
    #[serde(flatten)]
    pub limits: SessionLimits,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedClaimant {
    pub id: ClaimantId,
    pub name: String,
    #[serde(default)]
    pub rtm_eligible: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedCandidate {
    pub id: CandidateId,
    pub name: String,
    pub level_code: String,
    #[serde(default)]
    pub is_free_tier: bool,
    #[serde(default)]
    pub allows_random_draw: bool,
    #[serde(default)]
    pub base_amount: Option<Amount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedFile {
    pub season: SeedSeason,
    #[serde(default)]
    pub claimants: Vec<SeedClaimant>,
    #[serde(default)]
    pub candidates: Vec<SeedCandidate>,
}

impl SeedFile {
    fn validate(&self) -> Result<(), SeedError> {
        let mut seen = HashSet::new();
        for c in &self.claimants {
            if !seen.insert(c.id.as_str()) {
                return Err(SeedError::Invalid(format!("duplicate claimant id {}", c.id)));
            }
        }

        let mut seen = HashSet::new();
        for c in &self.candidates {
            if !seen.insert(c.id.as_str()) {
                return Err(SeedError::Invalid(format!("duplicate candidate id {}", c.id)));
            }
            if c.base_amount.map_or(false, |a| a.is_negative()) {
                return Err(SeedError::Invalid(format!(
                    "candidate {} has a negative base amount",
                    c.id
                )));
            }
            if c.base_amount.map_or(false, |a| a.exceeds_ceiling()) {
                return Err(SeedError::Invalid(format!(
                    "candidate {} base amount exceeds {}",
                    c.id,
                    Amount::ceiling()
                )));
            }
        }
        Ok(())
    }
}

/// Read `path` and upsert its contents.
pub async fn load_seed(repo: &Repository, path: &Path) -> Result<SeasonCode, SeedError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_json::from_str(&raw)?;
    apply_seed(repo, &seed).await?;
    Ok(seed.season.code)
}

/// Upsert an already-parsed seed.
pub async fn apply_seed(repo: &Repository, seed: &SeedFile) -> Result<(), SeedError> {
    seed.validate()?;
    let code = &seed.season.code;

    repo.upsert_season(code, &seed.season.limits).await?;

    for c in &seed.claimants {
        let fresh = ClaimantAggregate {
            id: c.id.clone(),
            name: c.name.clone(),
            amount_spent: Amount::zero(),
            players_held: 0,
            free_quota_used: 0,
            rtm_used: 0,
            rtm_eligible: c.rtm_eligible,
        };
        repo.upsert_claimant(code, &fresh).await?;
    }

    for c in &seed.candidates {
        let descriptor = CandidateDescriptor {
            id: c.id.clone(),
            name: c.name.clone(),
            level_code: c.level_code.clone(),
            is_free_tier: c.is_free_tier,
            allows_random_draw: c.allows_random_draw,
            base_amount: c.base_amount,
        };
        repo.upsert_candidate(code, &descriptor).await?;
    }

    info!(
        season = %code,
        claimants = seed.claimants.len(),
        candidates = seed.candidates.len(),
        "Seed loaded"
    );
    Ok(())
}
