//! Lifecycle of the candidate currently in play.
//!
//! `SelectionState` is a plain value owned by the host. Every transition is a
//! synchronous method that takes the snapshots it needs as arguments, so the
//! rules can be exercised without a store. Only settlement touches shared
//! state, and it is split into `begin_settlement` / `finish_settlement` so the
//! host can run the commit in between.

use super::eligibility::evaluate;
use super::rtm::can_enable_rtm;
use super::AuctionError;
use crate::domain::{
    Amount, CandidateDescriptor, CandidateSnapshot, CandidateStatus, ClaimantAggregate,
    ClaimantId, Outcome, ResolutionRecord, ReversalHandle, SessionLimits,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the claimant for the in-play candidate is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    Manual,
    Random,
}

/// The single in-play slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InPlay {
    pub candidate: CandidateDescriptor,
    /// Status the candidate had when it was presented; settlement only
    /// succeeds if it is unchanged.
    pub observed_status: CandidateStatus,
    pub claimant: Option<ClaimantId>,
    pub amount: Option<Amount>,
    pub rtm_requested: bool,
    pub mode: SelectionMode,
    pub drawn: Option<ClaimantId>,
}

impl InPlay {
    fn new(snapshot: CandidateSnapshot) -> Self {
        InPlay {
            candidate: snapshot.descriptor,
            observed_status: snapshot.status,
            claimant: None,
            amount: None,
            rtm_requested: false,
            mode: SelectionMode::Manual,
            drawn: None,
        }
    }

    fn clear_choice(&mut self) {
        self.claimant = None;
        self.amount = None;
    }

    /// Point the slot at `claimant`, re-running the RTM guard so a request
    /// made for a previous claimant never reaches settlement.
    fn assign(&mut self, claimant: &ClaimantAggregate, amount: Amount, limits: &SessionLimits) {
        self.claimant = Some(claimant.id.clone());
        self.amount = Some(amount);
        if self.rtm_requested && !can_enable_rtm(claimant, limits, false) {
            debug!(claimant=%claimant.id, "Clearing RTM request: claimant cannot use RTM");
            self.rtm_requested = false;
        }
    }
}

/// Everything the settlement coordinator needs to commit a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRequest {
    pub candidate: CandidateDescriptor,
    pub expected_status: CandidateStatus,
    pub claimant: Option<ClaimantId>,
    pub amount: Amount,
    pub rtm: bool,
    pub is_unsold: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "camelCase")]
pub enum SelectionState {
    #[default]
    Idle,
    Presented(InPlay),
    Choosing(InPlay),
    Settling(InPlay),
    Sold(ResolutionRecord),
    Unsold(ResolutionRecord),
}

impl SelectionState {
    pub fn name(&self) -> &'static str {
        match self {
            SelectionState::Idle => "idle",
            SelectionState::Presented(_) => "presented",
            SelectionState::Choosing(_) => "choosing",
            SelectionState::Settling(_) => "settling",
            SelectionState::Sold(_) => "sold",
            SelectionState::Unsold(_) => "unsold",
        }
    }

    pub fn in_play(&self) -> Option<&InPlay> {
        match self {
            SelectionState::Presented(p) | SelectionState::Choosing(p) | SelectionState::Settling(p) => {
                Some(p)
            }
            _ => None,
        }
    }

    fn invalid(&self, op: &'static str) -> AuctionError {
        AuctionError::InvalidTransition {
            op,
            state: self.name(),
        }
    }

    /// Mutable access to the slot while it is still open for edits.
    fn open_slot(&mut self, op: &'static str) -> Result<&mut InPlay, AuctionError> {
        match self {
            SelectionState::Presented(p) | SelectionState::Choosing(p) => Ok(p),
            other => Err(other.invalid(op)),
        }
    }

    /// Put a candidate into play.
    pub fn present(&mut self, snapshot: CandidateSnapshot) -> Result<(), AuctionError> {
        if self.in_play().is_some() {
            return Err(AuctionError::AlreadyInPlay);
        }
        if !snapshot.status.is_presentable() {
            return Err(AuctionError::Validation(format!(
                "candidate {} is already sold",
                snapshot.descriptor.id
            )));
        }
        *self = SelectionState::Presented(InPlay::new(snapshot));
        Ok(())
    }

    /// Switch between manual choice and random draw. Any existing choice or
    /// draw is discarded.
    pub fn set_mode(&mut self, mode: SelectionMode) -> Result<(), AuctionError> {
        let slot = self.open_slot("change selection mode")?;
        if mode == SelectionMode::Random && !slot.candidate.allows_random_draw {
            return Err(AuctionError::Validation(format!(
                "candidate {} does not allow a random draw",
                slot.candidate.id
            )));
        }
        let mut slot = slot.clone();
        slot.mode = mode;
        slot.drawn = None;
        slot.clear_choice();
        *self = SelectionState::Presented(slot);
        Ok(())
    }

    /// Manually pick the claimant. `claimant` must be a fresh read.
    pub fn choose(
        &mut self,
        claimant: &ClaimantAggregate,
        amount: Option<Amount>,
        rtm: bool,
        limits: &SessionLimits,
    ) -> Result<(), AuctionError> {
        let slot = self.open_slot("choose a claimant")?;
        if slot.mode == SelectionMode::Random {
            return Err(AuctionError::Validation(
                "claimant is assigned by draw in random mode".to_string(),
            ));
        }
        evaluate(&slot.candidate, claimant, limits).map_err(AuctionError::Ineligible)?;
        let amount = manual_amount(&slot.candidate, amount)?;

        let mut slot = slot.clone();
        slot.rtm_requested = rtm;
        slot.assign(claimant, amount, limits);
        *self = SelectionState::Choosing(slot);
        Ok(())
    }

    /// The candidate a draw would be made for, if a draw is allowed now.
    pub fn draw_target(&self) -> Result<&CandidateDescriptor, AuctionError> {
        let slot = match self {
            SelectionState::Presented(p) | SelectionState::Choosing(p) => p,
            other => return Err(other.invalid("draw")),
        };
        if slot.mode != SelectionMode::Random {
            return Err(AuctionError::Validation(
                "random draw requires random selection mode".to_string(),
            ));
        }
        if slot.drawn.is_some() {
            return Err(AuctionError::AlreadyDrawn);
        }
        Ok(&slot.candidate)
    }

    /// Record the winner produced by the sampler.
    pub fn record_draw(
        &mut self,
        winner: &ClaimantAggregate,
        limits: &SessionLimits,
    ) -> Result<(), AuctionError> {
        self.draw_target()?;
        let slot = self.open_slot("draw")?;
        let amount = default_amount(&slot.candidate, limits);

        let mut slot = slot.clone();
        slot.drawn = Some(winner.id.clone());
        slot.assign(winner, amount, limits);
        *self = SelectionState::Choosing(slot);
        Ok(())
    }

    /// Forget a previous draw so a fresh one can be made.
    pub fn reset_draw(&mut self) -> Result<(), AuctionError> {
        let slot = self.open_slot("reset the draw")?;
        let mut slot = slot.clone();
        if slot.drawn.take().is_some() {
            slot.clear_choice();
        }
        *self = if slot.claimant.is_some() {
            SelectionState::Choosing(slot)
        } else {
            SelectionState::Presented(slot)
        };
        Ok(())
    }

    /// Toggle right-to-match for the chosen claimant. `claimant` must be a
    /// fresh read of that claimant.
    pub fn toggle_rtm(
        &mut self,
        on: bool,
        claimant: &ClaimantAggregate,
        limits: &SessionLimits,
    ) -> Result<(), AuctionError> {
        let slot = match self {
            SelectionState::Choosing(p) => p,
            other => return Err(other.invalid("toggle RTM")),
        };
        if slot.claimant.as_ref() != Some(&claimant.id) {
            return Err(AuctionError::Validation(format!(
                "claimant {} is not the current choice",
                claimant.id
            )));
        }
        if on && !can_enable_rtm(claimant, limits, slot.rtm_requested) {
            return Err(AuctionError::RtmNotAllowed);
        }
        slot.rtm_requested = on;
        Ok(())
    }

    /// Nudge the amount by `steps` increments of `step`.
    pub fn adjust_amount(&mut self, steps: i32, step: Amount) -> Result<Amount, AuctionError> {
        let slot = match self {
            SelectionState::Choosing(p) => p,
            other => return Err(other.invalid("adjust the amount")),
        };
        if slot.candidate.is_free_tier {
            return Err(AuctionError::Validation(
                "free-tier candidates carry no amount".to_string(),
            ));
        }
        let next = slot
            .amount
            .unwrap_or_default()
            .stepped(step, steps)
            .filter(|a| !a.exceeds_ceiling())
            .ok_or_else(|| {
                AuctionError::Validation(format!(
                    "amount may not exceed {}",
                    Amount::ceiling()
                ))
            })?;
        slot.amount = Some(next);
        Ok(next)
    }

    /// Freeze the slot for settlement and describe the commit to perform.
    pub fn begin_settlement(&mut self, outcome: Outcome) -> Result<SettlementRequest, AuctionError> {
        let request = match (&*self, outcome) {
            (SelectionState::Choosing(slot), Outcome::Sold) => {
                let (claimant, amount) = match (&slot.claimant, slot.amount) {
                    (Some(c), Some(a)) => (c.clone(), a),
                    _ => {
                        return Err(AuctionError::Validation(
                            "a claimant and amount are required to sell".to_string(),
                        ))
                    }
                };
                SettlementRequest {
                    candidate: slot.candidate.clone(),
                    expected_status: slot.observed_status,
                    claimant: Some(claimant),
                    amount,
                    rtm: slot.rtm_requested,
                    is_unsold: false,
                }
            }
            (SelectionState::Presented(slot), Outcome::Unsold) => SettlementRequest {
                candidate: slot.candidate.clone(),
                expected_status: slot.observed_status,
                claimant: None,
                amount: Amount::zero(),
                rtm: false,
                is_unsold: true,
            },
            (state, Outcome::Sold) => return Err(state.invalid("resolve as sold")),
            (state, Outcome::Unsold) => return Err(state.invalid("resolve as unsold")),
        };

        if let SelectionState::Presented(slot) | SelectionState::Choosing(slot) = std::mem::take(self) {
            *self = SelectionState::Settling(slot);
        }
        Ok(request)
    }

    /// Apply the coordinator's verdict. Failures put the candidate back to
    /// `Presented` with the choice cleared; the error is handed back as-is.
    pub fn finish_settlement(
        &mut self,
        result: Result<ResolutionRecord, AuctionError>,
    ) -> Result<ResolutionRecord, AuctionError> {
        let slot = match std::mem::take(self) {
            SelectionState::Settling(slot) => slot,
            other => {
                let err = other.invalid("finish settlement");
                *self = other;
                return Err(err);
            }
        };

        match result {
            Ok(record) => {
                *self = if record.is_unsold {
                    SelectionState::Unsold(record.clone())
                } else {
                    SelectionState::Sold(record.clone())
                };
                Ok(record)
            }
            Err(e) => {
                let mut slot = slot;
                slot.clear_choice();
                *self = SelectionState::Presented(slot);
                Err(e)
            }
        }
    }

    /// Abandon the in-play candidate without touching the store.
    pub fn cancel(&mut self) -> Result<(), AuctionError> {
        self.open_slot("cancel the presentation")?;
        *self = SelectionState::Idle;
        Ok(())
    }

    /// Reversals may not run while a candidate is in play.
    pub fn check_revert(&self) -> Result<(), AuctionError> {
        if self.in_play().is_some() {
            return Err(AuctionError::AlreadyInPlay);
        }
        Ok(())
    }

    /// Record a successful reversal. Returns to `Idle` if it undid the
    /// resolution this state is showing.
    pub fn finish_revert(&mut self, handle: &ReversalHandle) {
        if let SelectionState::Sold(record) | SelectionState::Unsold(record) = self {
            if &record.reversal_handle == handle {
                *self = SelectionState::Idle;
            }
        }
    }
}

/// Amount a claimant is offered before the operator edits it.
pub fn default_amount(candidate: &CandidateDescriptor, limits: &SessionLimits) -> Amount {
    if candidate.is_free_tier {
        return Amount::zero();
    }
    candidate.base_amount.unwrap_or(limits.min_candidate_amount)
}

fn manual_amount(candidate: &CandidateDescriptor, amount: Option<Amount>) -> Result<Amount, AuctionError> {
    if candidate.is_free_tier {
        return match amount {
            None => Ok(Amount::zero()),
            Some(a) if a.is_zero() => Ok(a),
            Some(_) => Err(AuctionError::Validation(
                "free-tier candidates carry no amount".to_string(),
            )),
        };
    }
    match amount {
        None => Err(AuctionError::Validation("amount is required".to_string())),
        Some(a) if a.is_negative() || a.is_zero() => {
            Err(AuctionError::Validation("amount must be positive".to_string()))
        }
        Some(a) if a.exceeds_ceiling() => Err(AuctionError::Validation(format!(
            "amount may not exceed {}",
            Amount::ceiling()
        ))),
        Some(a) => Ok(a),
    }
}
