use super::{Amount, ClaimantId};
use serde::{Deserialize, Serialize};

/// Running totals for one claimant in one season.
///
/// Only the settlement coordinator writes these. Every other reader holds a
/// snapshot that may already be stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimantAggregate {
    pub id: ClaimantId,
    pub name: String,
    pub amount_spent: Amount,
    pub players_held: u32,
    pub free_quota_used: u32,
    pub rtm_used: u32,
    pub rtm_eligible: bool,
}

/// The increments a single sale applies to a claimant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charge {
    pub amount: Amount,
    pub free_tier: bool,
    pub rtm: bool,
}

impl ClaimantAggregate {
    /// Totals after applying `charge`, or `None` if a total would overflow.
    pub fn charged(&self, charge: &Charge) -> Option<ClaimantAggregate> {
        let mut next = self.clone();
        next.players_held = self.players_held.checked_add(1)?;
        if charge.free_tier {
            next.free_quota_used = self.free_quota_used.checked_add(1)?;
        }
        if charge.rtm {
            next.rtm_used = self.rtm_used.checked_add(1)?;
        }
        next.amount_spent = self.amount_spent.checked_add(charge.amount)?;
        Some(next)
    }

    /// Totals after undoing `charge`.
    ///
    /// # Panics
    /// Panics if any counter would go below zero. That can only happen if the
    /// store was written behind the coordinator's back, so it is treated as a
    /// bug rather than clamped.
    pub fn refunded(&self, charge: &Charge) -> ClaimantAggregate {
        let mut next = self.clone();
        next.players_held = decrement(&self.id, "players_held", self.players_held);
        if charge.free_tier {
            next.free_quota_used = decrement(&self.id, "free_quota_used", self.free_quota_used);
        }
        if charge.rtm {
            next.rtm_used = decrement(&self.id, "rtm_used", self.rtm_used);
        }
        next.amount_spent = match self.amount_spent.checked_sub(charge.amount) {
            Some(v) => v,
            None => panic!(
                "aggregate invariant violated: claimant {} amount_spent {} < refund {}",
                self.id, self.amount_spent, charge.amount
            ),
        };
        next
    }
}

fn decrement(id: &ClaimantId, field: &str, value: u32) -> u32 {
    match value.checked_sub(1) {
        Some(v) => v,
        None => panic!(
            "aggregate invariant violated: claimant {} {} would go negative",
            id, field
        ),
    }
}
