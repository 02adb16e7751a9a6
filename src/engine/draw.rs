use super::AuctionError;
use crate::domain::ClaimantId;
use rand::seq::SliceRandom;
use rand::Rng;

/// Pick a winner uniformly from `eligible`.
///
/// Shuffles a copy of the pool (Fisher-Yates) and takes the first slot.
/// Callers must pass only claimants that passed eligibility.
pub fn draw<R: Rng + ?Sized>(eligible: &[ClaimantId], rng: &mut R) -> Result<ClaimantId, AuctionError> {
    if eligible.is_empty() {
        return Err(AuctionError::NoEligibleClaimants);
    }

    let mut pool = eligible.to_vec();
    pool.shuffle(rng);
    Ok(pool.swap_remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn ids(names: &[&str]) -> Vec<ClaimantId> {
        names.iter().map(|n| ClaimantId::new(*n)).collect()
    }

    #[test]
    fn test_empty_pool_fails() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(draw(&[], &mut rng), Err(AuctionError::NoEligibleClaimants)));
    }

    #[test]
    fn test_single_entry_always_wins() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = ids(&["ONLY"]);
        for _ in 0..20 {
            assert_eq!(draw(&pool, &mut rng).unwrap(), pool[0]);
        }
    }

    #[test]
    fn test_same_seed_same_winner() {
        let pool = ids(&["A", "B", "C", "D", "E"]);
        let a = draw(&pool, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = draw(&pool, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_winner_is_head_of_shuffled_pool() {
        let pool = ids(&["A", "B", "C", "D"]);
        for seed in 0..16 {
            let mut expected = pool.clone();
            expected.shuffle(&mut StdRng::seed_from_u64(seed));
            let winner = draw(&pool, &mut StdRng::seed_from_u64(seed)).unwrap();
            assert_eq!(winner, expected[0]);
        }
    }

    #[test]
    fn test_draw_is_uniform_over_pool() {
        let pool = ids(&["D1", "D2", "D3"]);
        let mut rng = StdRng::seed_from_u64(2024);
        let trials = 10_000;
        let mut wins: HashMap<ClaimantId, u32> = HashMap::new();
        for _ in 0..trials {
            *wins.entry(draw(&pool, &mut rng).unwrap()).or_default() += 1;
        }

        assert_eq!(wins.len(), 3);
        for id in &pool {
            let share = f64::from(wins[id]) / f64::from(trials);
            assert!(
                (share - 1.0 / 3.0).abs() < 0.03,
                "{} won {:.3} of draws",
                id,
                share
            );
        }
    }
}
