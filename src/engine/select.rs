//! Unbiased shuffle and pick-N selection
//!
//! Both operations take the RNG explicitly so a run can be replayed from its seed.

use rand::Rng;

/// Effective number of winners for a pool of `pool_len` candidates.
///
/// A count of zero is treated as one; anything above the pool size is capped
/// at the pool size. An empty pool always yields zero.
#[inline]
pub fn clamp_winner_count(count: usize, pool_len: usize) -> usize {
    count.max(1).min(pool_len)
}

/// Uniform index in `[0, bound)`, computed as `floor(r * bound)` with `r` in `[0, 1)`
#[inline]
fn draw_index<R: Rng + ?Sized>(rng: &mut R, bound: usize) -> usize {
    let r: f64 = rng.random();
    // Float rounding can land exactly on `bound` for very large bounds
    ((r * bound as f64) as usize).min(bound - 1)
}

/// Return a uniformly random permutation of `items` (Fisher-Yates).
///
/// The input slice is left untouched; the permutation is a fresh `Vec`.
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = draw_index(rng, i + 1);
        shuffled.swap(i, j);
    }
    shuffled
}

/// Pick `count` candidates from `pool`, each with probability `min(count, n) / n`.
///
/// Never fails: an empty pool yields an empty result and `count` is clamped
/// with [`clamp_winner_count`].
pub fn select_winners<T, R>(pool: &[T], count: usize, rng: &mut R) -> Vec<T>
where
    T: Clone,
    R: Rng + ?Sized,
{
    if pool.is_empty() {
        return Vec::new();
    }
    let mut winners = shuffle(pool, rng);
    winners.truncate(clamp_winner_count(count, pool.len()));
    winners
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::collections::HashSet;

    #[test]
    fn test_shuffle_trivial_inputs() {
        let mut rng = Pcg32::seed_from_u64(1);
        let empty: Vec<u32> = Vec::new();
        assert!(shuffle(&empty, &mut rng).is_empty());
        assert_eq!(shuffle(&[7u32], &mut rng), vec![7]);
    }

    #[test]
    fn test_shuffle_does_not_mutate_input() {
        let mut rng = Pcg32::seed_from_u64(99);
        let pool = vec!["A", "B", "C", "D", "E", "F"];
        let before = pool.clone();
        for _ in 0..50 {
            let _ = shuffle(&pool, &mut rng);
        }
        assert_eq!(pool, before);
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut rng = Pcg32::seed_from_u64(3);
        let pool: Vec<u32> = (0..32).collect();
        let mut shuffled = shuffle(&pool, &mut rng);
        shuffled.sort_unstable();
        assert_eq!(shuffled, pool);
    }

    #[test]
    fn test_shuffle_replays_from_seed() {
        let pool: Vec<u32> = (0..16).collect();
        let a = shuffle(&pool, &mut Pcg32::seed_from_u64(2024));
        let b = shuffle(&pool, &mut Pcg32::seed_from_u64(2024));
        assert_eq!(a, b);
    }

    #[test]
    fn test_shuffle_position_fairness_chi_square() {
        const N: usize = 5;
        const TRIALS: usize = 100_000;
        let mut rng = Pcg32::seed_from_u64(0xFACE);
        let pool: Vec<usize> = (0..N).collect();
        let mut counts = [[0u32; N]; N];

        for _ in 0..TRIALS {
            for (pos, &elem) in shuffle(&pool, &mut rng).iter().enumerate() {
                counts[pos][elem] += 1;
            }
        }

        let expected = TRIALS as f64 / N as f64;
        for (pos, row) in counts.iter().enumerate() {
            let chi2: f64 = row
                .iter()
                .map(|&c| {
                    let d = c as f64 - expected;
                    d * d / expected
                })
                .sum();
            // df = 4, p = 0.0005
            assert!(chi2 < 20.0, "position {pos} chi-square too large: {chi2:.2}");
        }
    }

    #[test]
    fn test_select_clamps_count_to_pool() {
        let mut rng = Pcg32::seed_from_u64(5);
        let pool = vec![1, 2, 3];
        let mut winners = select_winners(&pool, 10, &mut rng);
        winners.sort_unstable();
        assert_eq!(winners, pool);
    }

    #[test]
    fn test_select_empty_pool() {
        let mut rng = Pcg32::seed_from_u64(5);
        let pool: Vec<u8> = Vec::new();
        for k in 1..5 {
            assert!(select_winners(&pool, k, &mut rng).is_empty());
        }
    }

    #[test]
    fn test_select_zero_count_picks_one() {
        let mut rng = Pcg32::seed_from_u64(5);
        assert_eq!(select_winners(&[1, 2, 3], 0, &mut rng).len(), 1);
    }

    #[test]
    fn test_clamp_winner_count() {
        assert_eq!(clamp_winner_count(0, 4), 1);
        assert_eq!(clamp_winner_count(3, 4), 3);
        assert_eq!(clamp_winner_count(9, 4), 4);
        assert_eq!(clamp_winner_count(2, 0), 0);
    }

    proptest! {
        #[test]
        fn select_returns_distinct_pool_members(
            n in 1usize..40,
            k in 1usize..50,
            seed in any::<u64>(),
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let pool: Vec<usize> = (0..n).collect();
            let winners = select_winners(&pool, k, &mut rng);

            prop_assert_eq!(winners.len(), k.min(n));
            let unique: HashSet<_> = winners.iter().collect();
            prop_assert_eq!(unique.len(), winners.len());
            prop_assert!(winners.iter().all(|w| *w < n));
        }
    }
}
