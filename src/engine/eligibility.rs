use crate::domain::{CandidateDescriptor, ClaimantAggregate, ClaimantId, SessionLimits};
use serde::Serialize;
use std::fmt;

/// Why a claimant may not receive the candidate in play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IneligibleReason {
    RosterFull { held: u32, max: u32 },
    FreeQuotaExhausted { used: u32, max: u32 },
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibleReason::RosterFull { held, max } => {
                write!(f, "roster full ({}/{})", held, max)
            }
            IneligibleReason::FreeQuotaExhausted { used, max } => {
                write!(f, "free quota exhausted ({}/{})", used, max)
            }
        }
    }
}

/// Decide whether `claimant` may currently receive `candidate`.
///
/// Rules are checked in order and the first failure wins. Spend against the
/// budget limit is deliberately not a gate.
pub fn evaluate(
    candidate: &CandidateDescriptor,
    claimant: &ClaimantAggregate,
    limits: &SessionLimits,
) -> Result<(), IneligibleReason> {
    if claimant.players_held >= limits.max_claimants {
        return Err(IneligibleReason::RosterFull {
            held: claimant.players_held,
            max: limits.max_claimants,
        });
    }

    if candidate.is_free_tier && claimant.free_quota_used >= limits.max_free_quota {
        return Err(IneligibleReason::FreeQuotaExhausted {
            used: claimant.free_quota_used,
            max: limits.max_free_quota,
        });
    }

    Ok(())
}

/// One row of the claimant board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    pub claimant_id: ClaimantId,
    pub eligible: bool,
    pub reason: Option<IneligibleReason>,
}

/// Evaluate every claimant against `candidate`, preserving input order.
pub fn board(
    candidate: &CandidateDescriptor,
    claimants: &[ClaimantAggregate],
    limits: &SessionLimits,
) -> Vec<Eligibility> {
    claimants
        .iter()
        .map(|c| {
            let verdict = evaluate(candidate, c, limits);
            Eligibility {
                claimant_id: c.id.clone(),
                eligible: verdict.is_ok(),
                reason: verdict.err(),
            }
        })
        .collect()
}

/// The claimants allowed into a draw for `candidate`.
pub fn eligible_pool(
    candidate: &CandidateDescriptor,
    claimants: &[ClaimantAggregate],
    limits: &SessionLimits,
) -> Vec<ClaimantId> {
    claimants
        .iter()
        .filter(|c| evaluate(candidate, c, limits).is_ok())
        .map(|c| c.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Amount, CandidateId};

    fn limits() -> SessionLimits {
        SessionLimits {
            max_claimants: 20,
            max_free_quota: 2,
            max_rtm_quota: 2,
            budget_limit: Amount::from(100),
            min_candidate_amount: Amount::from(1),
        }
    }

    fn candidate(free: bool) -> CandidateDescriptor {
        CandidateDescriptor {
            id: CandidateId::new("P1"),
            name: "Player One".to_string(),
            level_code: "l1".to_string(),
            is_free_tier: free,
            allows_random_draw: false,
            base_amount: Some(Amount::from(2)),
        }
    }

    fn claimant(id: &str, held: u32, free_used: u32) -> ClaimantAggregate {
        ClaimantAggregate {
            id: ClaimantId::new(id),
            name: id.to_string(),
            amount_spent: Amount::zero(),
            players_held: held,
            free_quota_used: free_used,
            rtm_used: 0,
            rtm_eligible: false,
        }
    }

    #[test]
    fn test_full_roster_is_ineligible() {
        let verdict = evaluate(&candidate(false), &claimant("A", 20, 0), &limits());
        assert_eq!(verdict, Err(IneligibleReason::RosterFull { held: 20, max: 20 }));
    }

    #[test]
    fn test_free_quota_only_applies_to_free_tier() {
        let b = claimant("B", 5, 2);
        assert_eq!(
            evaluate(&candidate(true), &b, &limits()),
            Err(IneligibleReason::FreeQuotaExhausted { used: 2, max: 2 })
        );
        assert_eq!(evaluate(&candidate(false), &b, &limits()), Ok(()));
    }

    #[test]
    fn test_roster_check_wins_over_free_quota() {
        let verdict = evaluate(&candidate(true), &claimant("C", 20, 2), &limits());
        assert!(matches!(verdict, Err(IneligibleReason::RosterFull { .. })));
    }

    #[test]
    fn test_budget_overrun_does_not_gate() {
        let mut rich = claimant("D", 1, 0);
        rich.amount_spent = Amount::from(1_000);
        assert_eq!(evaluate(&candidate(false), &rich, &limits()), Ok(()));
    }

    #[test]
    fn test_pool_excludes_ineligible() {
        let claimants = vec![claimant("A", 20, 0), claimant("B", 3, 0), claimant("C", 0, 2)];
        let pool = eligible_pool(&candidate(true), &claimants, &limits());
        assert_eq!(pool, vec![ClaimantId::new("B")]);

        let rows = board(&candidate(true), &claimants, &limits());
        assert_eq!(rows.len(), 3);
        assert!(!rows[0].eligible);
        assert!(rows[1].eligible && rows[1].reason.is_none());
        assert_eq!(rows[2].reason.as_ref().unwrap().to_string(), "free quota exhausted (2/2)");
    }
}
