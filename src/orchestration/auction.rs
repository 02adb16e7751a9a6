//! The host-facing auction engine for one season.
//!
//! Owns the season's `SelectionState`, the draw RNG and the settlement
//! coordinator. Every operation takes the state lock for its whole duration,
//! so operator actions are applied one at a time.

use super::settlement::SettlementCoordinator;
use crate::datasource::ReadModel;
use crate::db::Repository;
use crate::domain::{
    Amount, CandidateId, ClaimantAggregate, ClaimantId, Outcome, ResolutionRecord,
    ReversalHandle, SeasonCode, TimeMs,
};
use crate::engine::{
    describe_rtm, draw, eligible_pool, AuctionError, SelectionMode, SelectionState,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Increment used by `adjust_amount`.
    pub amount_step: Amount,
    /// Fixed RNG seed for reproducible draws; entropy when `None`.
    pub draw_seed: Option<u64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            amount_step: Amount::new(rust_decimal::Decimal::new(25, 2)),
            draw_seed: None,
        }
    }
}

#[derive(Debug)]
pub struct AuctionEngine {
    season: SeasonCode,
    repo: Repository,
    read_model: Arc<dyn ReadModel>,
    settlement: Arc<SettlementCoordinator>,
    state: Arc<Mutex<SelectionState>>,
    rng: Mutex<StdRng>,
    amount_step: Amount,
}

impl AuctionEngine {
    pub fn new(repo: Repository, season: SeasonCode, options: EngineOptions) -> Self {
        let rng = match options.draw_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            season,
            read_model: Arc::new(repo.clone()),
            settlement: Arc::new(SettlementCoordinator::new(repo.clone())),
            repo,
            state: Arc::new(Mutex::new(SelectionState::Idle)),
            rng: Mutex::new(rng),
            amount_step: options.amount_step,
        }
    }

    pub fn season(&self) -> &SeasonCode {
        &self.season
    }

    pub fn read_model(&self) -> &dyn ReadModel {
        self.read_model.as_ref()
    }

    pub async fn snapshot(&self) -> SelectionState {
        self.state.lock().await.clone()
    }

    /// RTM status line for the claimant chosen in `selection`, if any.
    ///
    /// Display only: a failed read is logged and yields `None`.
    pub async fn rtm_status(&self, selection: &SelectionState) -> Option<String> {
        let slot = selection.in_play()?;
        let claimant_id = slot.claimant.as_ref()?;
        let read = async {
            let limits = self.read_model.session_limits(&self.season).await?;
            let claimant = self.read_model.claimant(&self.season, claimant_id).await?;
            Ok::<_, AuctionError>(describe_rtm(&claimant, &limits, slot.rtm_requested))
        };
        match read.await {
            Ok(line) => Some(line),
            Err(e) => {
                warn!(claimant = %claimant_id, error = %e, "Could not describe RTM status");
                None
            }
        }
    }

    /// Put a candidate into play. The season is checked under the state
    /// lock so a concurrent `complete_season` cannot slip in between.
    pub async fn present(&self, candidate: &CandidateId) -> Result<SelectionState, AuctionError> {
        let mut state = self.state.lock().await;
        let season = self.read_model.season(&self.season).await?;
        if season.is_completed() {
            return Err(AuctionError::Validation(format!(
                "season {} is complete",
                self.season
            )));
        }

        let snapshot = self.read_model.candidate(&self.season, candidate).await?;
        state.present(snapshot)?;
        info!(candidate = %candidate, "Candidate presented");
        Ok(state.clone())
    }

    pub async fn set_mode(&self, mode: SelectionMode) -> Result<SelectionState, AuctionError> {
        let mut state = self.state.lock().await;
        state.set_mode(mode)?;
        debug!(mode = ?mode, "Selection mode changed");
        Ok(state.clone())
    }

    pub async fn choose(
        &self,
        claimant: &ClaimantId,
        amount: Option<Amount>,
        rtm: bool,
    ) -> Result<SelectionState, AuctionError> {
        let mut state = self.state.lock().await;
        let limits = self.read_model.session_limits(&self.season).await?;
        let aggregate = self.read_model.claimant(&self.season, claimant).await?;
        state.choose(&aggregate, amount, rtm, &limits)?;
        Ok(state.clone())
    }

    /// Draw a winner uniformly from the claimants eligible right now.
    pub async fn draw(&self) -> Result<SelectionState, AuctionError> {
        let mut state = self.state.lock().await;
        let candidate = state.draw_target()?.clone();

        let limits = self.read_model.session_limits(&self.season).await?;
        let claimants = self.read_model.claimants(&self.season).await?;
        let pool = eligible_pool(&candidate, &claimants, &limits);

        let winner_id = {
            let mut rng = self.rng.lock().await;
            draw(&pool, &mut *rng)?
        };
        let winner = find(&claimants, &winner_id)?;
        state.record_draw(winner, &limits)?;

        debug!(
            candidate = %candidate.id,
            claimant = %winner_id,
            pool = pool.len(),
            "Random draw"
        );
        Ok(state.clone())
    }

    pub async fn reset_draw(&self) -> Result<SelectionState, AuctionError> {
        let mut state = self.state.lock().await;
        state.reset_draw()?;
        Ok(state.clone())
    }

    pub async fn toggle_rtm(&self, on: bool) -> Result<SelectionState, AuctionError> {
        let mut state = self.state.lock().await;
        let chosen = state
            .in_play()
            .and_then(|slot| slot.claimant.clone())
            .ok_or(AuctionError::InvalidTransition {
                op: "toggle RTM",
                state: state.name(),
            })?;

        let limits = self.read_model.session_limits(&self.season).await?;
        let aggregate = self.read_model.claimant(&self.season, &chosen).await?;
        state.toggle_rtm(on, &aggregate, &limits)?;
        Ok(state.clone())
    }

    pub async fn adjust_amount(&self, steps: i32) -> Result<SelectionState, AuctionError> {
        let mut state = self.state.lock().await;
        state.adjust_amount(steps, self.amount_step)?;
        Ok(state.clone())
    }

    /// Settle the in-play candidate. Once the commit has started it runs to
    /// completion even if the caller goes away.
    pub async fn resolve(&self, outcome: Outcome) -> Result<ResolutionRecord, AuctionError> {
        let state = Arc::clone(&self.state);
        let settlement = Arc::clone(&self.settlement);
        let season = self.season.clone();

        detached(async move {
            let mut state = state.lock_owned().await;
            let request = state.begin_settlement(outcome)?;
            let result = settlement.commit(&season, &request).await;
            state.finish_settlement(result)
        })
        .await
    }

    pub async fn cancel(&self) -> Result<SelectionState, AuctionError> {
        let mut state = self.state.lock().await;
        state.cancel()?;
        info!("Presentation cancelled");
        Ok(state.clone())
    }

    /// Undo a committed resolution. Not allowed while a candidate is in play.
    pub async fn revert(&self, handle: &ReversalHandle) -> Result<ResolutionRecord, AuctionError> {
        let state = Arc::clone(&self.state);
        let settlement = Arc::clone(&self.settlement);
        let handle = handle.clone();

        detached(async move {
            let mut state = state.lock_owned().await;
            state.check_revert()?;
            let record = settlement.revert(&handle).await?;
            state.finish_revert(&handle);
            Ok(record)
        })
        .await
    }

    /// Close the season. Later presentations fail.
    pub async fn complete_season(&self, note: Option<&str>) -> Result<(), AuctionError> {
        let state = self.state.lock().await;
        if state.in_play().is_some() {
            return Err(AuctionError::AlreadyInPlay);
        }
        if !self.repo.complete_season(&self.season, note, TimeMs::now()).await? {
            // distinguish a missing season from a second completion
            self.read_model.season(&self.season).await?;
            return Err(AuctionError::Conflict(format!(
                "season {} is already complete",
                self.season
            )));
        }
        info!(season = %self.season, "Season completed");
        Ok(())
    }
}

fn find<'a>(
    claimants: &'a [ClaimantAggregate],
    id: &ClaimantId,
) -> Result<&'a ClaimantAggregate, AuctionError> {
    claimants
        .iter()
        .find(|c| &c.id == id)
        .ok_or_else(|| AuctionError::NotFound(format!("claimant {}", id)))
}

/// Run `work` on its own task so dropping the caller's future cannot abort it
/// halfway through a commit.
async fn detached<T, F>(work: F) -> Result<T, AuctionError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, AuctionError>> + Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(_) => Err(AuctionError::Conflict(
            "settlement task was cancelled".to_string(),
        )),
    }
}
