//! The only writer of claimant aggregates and candidate statuses.
//!
//! A commit runs in one SQLite transaction whose first write is a
//! compare-and-set on the candidate's status. Whoever flips the status first
//! wins; everyone else sees zero rows affected and gets `Conflict`. Aggregates
//! and limits are re-read inside the transaction and eligibility is checked
//! again there, so stale snapshots held by callers can never over-allocate.
//!
//! An in-process gate serialises commits and reverts from this process so
//! that they never contend on the SQLite write lock.

use crate::db::repo::{
    fetch_candidate_status, fetch_claimant, fetch_limits, find_resolution, insert_resolution,
    mark_reverted, supersede_unsold, swap_candidate_status, write_claimant_totals,
};
use crate::db::Repository;
use crate::domain::{
    Amount, CandidateStatus, Charge, ResolutionRecord, ReversalHandle, SeasonCode, TimeMs,
};
use crate::engine::{can_enable_rtm, evaluate, AuctionError, SettlementRequest};
use sqlx::sqlite::SqliteConnection;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug)]
pub struct SettlementCoordinator {
    repo: Repository,
    gate: Mutex<()>,
}

impl SettlementCoordinator {
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            gate: Mutex::new(()),
        }
    }

    /// Apply `request` atomically. On any error nothing is written.
    pub async fn commit(
        &self,
        season: &SeasonCode,
        request: &SettlementRequest,
    ) -> Result<ResolutionRecord, AuctionError> {
        check_shape(request)?;

        let _gate = self.gate.lock().await;
        let mut tx = self.repo.pool().begin().await?;

        let record = match commit_in_tx(&mut *tx, season, request).await {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    candidate = %request.candidate.id,
                    claimant = ?request.claimant.as_ref().map(|c| c.as_str()),
                    error = %e,
                    "Settlement rejected"
                );
                return Err(e);
            }
        };
        tx.commit().await?;

        info!(
            candidate = %record.candidate_id,
            claimant = ?record.claimant_id.as_ref().map(|c| c.as_str()),
            amount = %record.amount,
            rtm = record.rtm_used,
            handle = %record.reversal_handle,
            "Candidate resolved"
        );
        Ok(record)
    }

    /// Undo a committed resolution exactly. Returns the record that was undone.
    ///
    /// # Panics
    /// Panics if undoing the charge would drive a claimant counter negative.
    pub async fn revert(&self, handle: &ReversalHandle) -> Result<ResolutionRecord, AuctionError> {
        let _gate = self.gate.lock().await;
        let mut tx = self.repo.pool().begin().await?;

        let record = match revert_in_tx(&mut *tx, handle).await {
            Ok(record) => record,
            Err(e) => {
                warn!(handle = %handle, error = %e, "Reversal rejected");
                return Err(e);
            }
        };
        tx.commit().await?;

        info!(
            candidate = %record.candidate_id,
            claimant = ?record.claimant_id.as_ref().map(|c| c.as_str()),
            handle = %handle,
            "Resolution reverted"
        );
        Ok(record)
    }
}

fn check_shape(request: &SettlementRequest) -> Result<(), AuctionError> {
    if request.expected_status == CandidateStatus::Sold {
        return Err(AuctionError::Conflict(format!(
            "candidate {} is already sold",
            request.candidate.id
        )));
    }
    if request.is_unsold {
        if request.claimant.is_some() {
            return Err(AuctionError::Validation(
                "an unsold resolution cannot name a claimant".to_string(),
            ));
        }
        return Ok(());
    }

    if request.claimant.is_none() {
        return Err(AuctionError::Validation("a sale needs a claimant".to_string()));
    }
    if request.candidate.is_free_tier {
        if !request.amount.is_zero() {
            return Err(AuctionError::Validation(
                "free-tier candidates carry no amount".to_string(),
            ));
        }
    } else if request.amount.is_zero() || request.amount.is_negative() {
        return Err(AuctionError::Validation("amount must be positive".to_string()));
    } else if request.amount.exceeds_ceiling() {
        return Err(AuctionError::Validation(format!(
            "amount may not exceed {}",
            Amount::ceiling()
        )));
    }
    Ok(())
}

async fn commit_in_tx(
    conn: &mut SqliteConnection,
    season: &SeasonCode,
    request: &SettlementRequest,
) -> Result<ResolutionRecord, AuctionError> {
    let candidate = &request.candidate;
    let next_status = if request.is_unsold {
        CandidateStatus::Unsold
    } else {
        CandidateStatus::Sold
    };

    let swapped = swap_candidate_status(
        &mut *conn,
        season,
        &candidate.id,
        request.expected_status,
        next_status,
    )
    .await?;
    if !swapped {
        return Err(match fetch_candidate_status(&mut *conn, season, &candidate.id).await? {
            None => AuctionError::NotFound(format!("candidate {}", candidate.id)),
            Some(actual) => AuctionError::Conflict(format!(
                "candidate {} is {}, expected {}",
                candidate.id, actual, request.expected_status
            )),
        });
    }

    let now = TimeMs::now();
    if request.expected_status == CandidateStatus::Unsold {
        supersede_unsold(&mut *conn, season, &candidate.id, now).await?;
    }

    let mut rtm_used = false;
    if let Some(claimant_id) = &request.claimant {
        let limits = fetch_limits(&mut *conn, season)
            .await?
            .ok_or_else(|| AuctionError::NotFound(format!("season {}", season)))?;
        let claimant = fetch_claimant(&mut *conn, season, claimant_id)
            .await?
            .ok_or_else(|| AuctionError::NotFound(format!("claimant {}", claimant_id)))?;

        evaluate(candidate, &claimant, &limits).map_err(AuctionError::Ineligible)?;
        if request.rtm && !can_enable_rtm(&claimant, &limits, false) {
            return Err(AuctionError::RtmNotAllowed);
        }

        let next = claimant
            .charged(&Charge {
                amount: request.amount,
                free_tier: candidate.is_free_tier,
                rtm: request.rtm,
            })
            .ok_or_else(|| {
                AuctionError::Validation(format!(
                    "claimant {} totals would overflow",
                    claimant.id
                ))
            })?;
        write_claimant_totals(&mut *conn, season, &next).await?;
        rtm_used = request.rtm;
    }

    let record = ResolutionRecord {
        candidate_id: candidate.id.clone(),
        claimant_id: request.claimant.clone(),
        amount: request.amount,
        is_unsold: request.is_unsold,
        rtm_used,
        free_tier: candidate.is_free_tier && !request.is_unsold,
        reversal_handle: ReversalHandle::mint(request.is_unsold),
        created_at: now,
    };
    insert_resolution(&mut *conn, season, &record).await?;

    Ok(record)
}

async fn revert_in_tx(
    conn: &mut SqliteConnection,
    handle: &ReversalHandle,
) -> Result<ResolutionRecord, AuctionError> {
    let stored = find_resolution(&mut *conn, handle)
        .await?
        .ok_or_else(|| AuctionError::NotFound(format!("resolution {}", handle)))?;

    if stored.reverted_at.is_some() {
        return Err(AuctionError::AlreadyReverted);
    }
    if stored.superseded_at.is_some() {
        return Err(AuctionError::Conflict(format!(
            "resolution {} was superseded by a later sale",
            handle
        )));
    }

    let season = stored.season_code;
    let record = stored.record;
    let current = if record.is_unsold {
        CandidateStatus::Unsold
    } else {
        CandidateStatus::Sold
    };
    let swapped = swap_candidate_status(
        &mut *conn,
        &season,
        &record.candidate_id,
        current,
        CandidateStatus::Available,
    )
    .await?;
    if !swapped {
        return Err(AuctionError::Conflict(format!(
            "candidate {} is no longer {}",
            record.candidate_id, current
        )));
    }

    if let Some((claimant_id, charge)) = record.charge() {
        let claimant = fetch_claimant(&mut *conn, &season, &claimant_id)
            .await?
            .ok_or_else(|| AuctionError::NotFound(format!("claimant {}", claimant_id)))?;
        write_claimant_totals(&mut *conn, &season, &claimant.refunded(&charge)).await?;
    }

    if !mark_reverted(&mut *conn, handle, TimeMs::now()).await? {
        return Err(AuctionError::AlreadyReverted);
    }

    Ok(record)
}
