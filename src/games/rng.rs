//! Outcome Generator
//!
//! Random ground truth for every round: hazard grids, weighted draws, plinko
//! paths and uniform picks. All draws come from one seedable [`StdRng`], so a
//! fixed seed replays the exact same rounds.

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::warn;

const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Seedable random source used by all games
#[derive(Debug, Clone)]
pub struct GameRng {
    inner: StdRng,
}

impl GameRng {
    /// Deterministic generator for tests and replays
    pub fn from_seed(seed: u64) -> Self {
        Self { inner: StdRng::seed_from_u64(seed) }
    }

    /// Generator seeded from operating system entropy
    pub fn from_entropy() -> Self {
        Self { inner: StdRng::from_entropy() }
    }

    /// Uniform integer in `[0, bound)`. A zero bound yields 0.
    pub fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        self.inner.gen_range(0..bound)
    }

    /// Fisher–Yates shuffle in place
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.inner.gen_range(0..=i);
            items.swap(i, j);
        }
    }

    /// Place `count` distinct hazards among `slots` positions.
    ///
    /// Partial Fisher–Yates: only the first `count` positions are drawn.
    /// Returned positions are sorted.
    pub fn place_hazards(&mut self, slots: u8, count: u8) -> Vec<u8> {
        let mut positions: Vec<u8> = (0..slots).collect();
        let count = count.min(slots) as usize;
        for i in 0..count {
            let j = self.inner.gen_range(i..positions.len());
            positions.swap(i, j);
        }
        positions.truncate(count);
        positions.sort_unstable();
        positions
    }

    /// Weighted draw over `weights`, returning the selected index.
    ///
    /// A malformed table (empty sum, negative or non-finite weights) falls
    /// back to a uniform pick over all entries.
    pub fn weighted_index(&mut self, weights: &[f64]) -> usize {
        if weights.len() <= 1 {
            return 0;
        }
        match table_total(weights) {
            Some(total) => {
                let point = self.inner.gen_range(0.0..total);
                pick_weighted(weights, point)
            }
            None => {
                warn!(entries = weights.len(), "malformed weight table, falling back to uniform draw");
                self.next_below(weights.len() as u32) as usize
            }
        }
    }

    /// Plinko path of `rows` left/right bounces landing on `target`.
    ///
    /// Exactly `target` entries are 1 (right); the order is shuffled.
    pub fn plinko_path(&mut self, rows: u8, target: u8) -> Vec<u8> {
        let target = target.min(rows) as usize;
        let mut path: Vec<u8> = (0..rows as usize).map(|i| u8::from(i < target)).collect();
        self.shuffle(&mut path);
        path
    }

    /// Uniform roulette pocket in `[0, 36]`
    pub fn spin_roulette(&mut self) -> u8 {
        self.inner.gen_range(0..=36)
    }

    /// Random hex salt for commitments
    pub fn salt_hex(&mut self) -> String {
        let mut bytes = [0u8; 16];
        self.inner.fill(&mut bytes);
        hex::encode(bytes)
    }

    /// `len` characters drawn from A-Z0-9
    pub fn alphanumeric(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| TOKEN_ALPHABET[self.inner.gen_range(0..TOKEN_ALPHABET.len())] as char)
            .collect()
    }
}

/// Sum of a weight table, or `None` when the table cannot be drawn from
pub fn table_total(weights: &[f64]) -> Option<f64> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return None;
    }
    let total: f64 = weights.iter().sum();
    (total > 0.0 && total.is_finite()).then_some(total)
}

/// Walk the table subtracting weights from `point` until it goes negative.
///
/// Zero-weight entries can never be selected. A point at or beyond the total
/// lands on the last positive-weight entry.
pub fn pick_weighted(weights: &[f64], point: f64) -> usize {
    let mut remaining = point;
    for (index, weight) in weights.iter().enumerate() {
        remaining -= weight;
        if remaining < 0.0 {
            return index;
        }
    }
    weights.iter().rposition(|w| *w > 0.0).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hazards_are_distinct_and_exact() {
        let mut rng = GameRng::from_seed(7);
        for count in 1..25u8 {
            let hazards = rng.place_hazards(25, count);
            assert_eq!(hazards.len(), count as usize);
            let mut deduped = hazards.clone();
            deduped.dedup();
            assert_eq!(deduped.len(), hazards.len());
            assert!(hazards.iter().all(|h| *h < 25));
        }
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = GameRng::from_seed(42);
        let mut b = GameRng::from_seed(42);
        assert_eq!(a.place_hazards(25, 5), b.place_hazards(25, 5));
        assert_eq!(a.spin_roulette(), b.spin_roulette());
        assert_eq!(a.weighted_index(&[1.0, 2.0, 3.0]), b.weighted_index(&[1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_pick_weighted_walk() {
        let weights = [10.0, 0.0, 30.0, 60.0];
        assert_eq!(pick_weighted(&weights, 0.0), 0);
        assert_eq!(pick_weighted(&weights, 9.99), 0);
        assert_eq!(pick_weighted(&weights, 10.0), 2);
        assert_eq!(pick_weighted(&weights, 39.99), 2);
        assert_eq!(pick_weighted(&weights, 40.0), 3);
        assert_eq!(pick_weighted(&weights, 100.0), 3);
    }

    #[test]
    fn test_zero_weight_never_selected() {
        let mut rng = GameRng::from_seed(3);
        let weights = [0.0, 5.0, 0.0, 5.0, 0.0];
        for _ in 0..2_000 {
            let index = rng.weighted_index(&weights);
            assert!(index == 1 || index == 3);
        }
    }

    #[test]
    fn test_weighted_frequencies_converge() {
        let mut rng = GameRng::from_seed(11);
        let weights = [50.0, 40.0, 30.0, 15.0, 5.0];
        let trials = 140_000;
        let mut counts = [0usize; 5];
        for _ in 0..trials {
            counts[rng.weighted_index(&weights)] += 1;
        }
        for (count, weight) in counts.iter().zip(weights.iter()) {
            let observed = *count as f64 / trials as f64;
            let expected = weight / 140.0;
            assert!((observed - expected).abs() < 0.01, "observed {observed}, expected {expected}");
        }
    }

    #[test]
    fn test_malformed_table_falls_back_to_uniform() {
        assert_eq!(table_total(&[0.0, 0.0]), None);
        assert_eq!(table_total(&[1.0, -1.0]), None);
        assert_eq!(table_total(&[f64::NAN, 1.0]), None);

        let mut rng = GameRng::from_seed(5);
        let mut seen = [false; 3];
        for _ in 0..300 {
            seen[rng.weighted_index(&[0.0, 0.0, 0.0])] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_plinko_path_lands_on_target() {
        let mut rng = GameRng::from_seed(9);
        for target in 0..=16u8 {
            let path = rng.plinko_path(16, target);
            assert_eq!(path.len(), 16);
            assert_eq!(path.iter().filter(|b| **b == 1).count(), target as usize);
        }
    }

    #[test]
    fn test_roulette_range() {
        let mut rng = GameRng::from_seed(1);
        assert!((0..1_000).all(|_| rng.spin_roulette() <= 36));
    }

    #[test]
    fn test_alphanumeric_token() {
        let mut rng = GameRng::from_seed(2);
        let token = rng.alphanumeric(6);
        assert_eq!(token.len(), 6);
        assert!(token.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
