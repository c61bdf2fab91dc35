//! Odds Calculator
//!
//! Pure functions from (outcome, configuration) to a payout multiplier. None
//! of these can fail for an outcome the generator is able to produce.

/// Multiplier of a round before its first successful step
pub const BASE_MULTIPLIER: f64 = 1.0;

/// Round to two decimal places, the precision multipliers are quoted in
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Binomial coefficient `C(n, r)` via the multiplicative formula.
///
/// Stays exact in `f64` for the board sizes used here and never builds a
/// factorial.
pub fn combination(n: u32, r: u32) -> f64 {
    if r > n {
        return 0.0;
    }
    let r = r.min(n - r);
    (0..r).fold(1.0, |acc, i| acc * f64::from(n - i) / f64::from(i + 1))
}

/// Fair multiplier for clearing `cleared` of `total` slots hiding `hazards`
/// adversarial slots, scaled by `house_edge`.
///
/// `1.0` when nothing has been cleared. `cleared` is clamped to the number of
/// safe slots.
pub fn combinatorial_multiplier(total: u32, hazards: u32, cleared: u32, house_edge: f64) -> f64 {
    if cleared == 0 || hazards >= total {
        return BASE_MULTIPLIER;
    }
    let cleared = cleared.min(total - hazards);
    let remaining = combination(total - cleared, hazards);
    if remaining <= 0.0 {
        return BASE_MULTIPLIER;
    }
    round2(house_edge * combination(total, hazards) / remaining)
}

/// Admin ladder lookup: entry `cleared - 1`, rounded to two decimals.
///
/// `None` when the ladder does not reach `cleared`.
pub fn ladder_multiplier(ladder: &[f64], cleared: usize) -> Option<f64> {
    if cleared == 0 {
        return Some(BASE_MULTIPLIER);
    }
    ladder.get(cleared - 1).copied().map(round2)
}

/// Fixed multiplier on an exact match, nothing otherwise
pub fn binary_multiplier(matched: bool, multiplier: f64) -> f64 {
    if matched {
        multiplier
    } else {
        0.0
    }
}

/// Length of the run of identical symbols starting at the first reel
pub fn leading_run<T: PartialEq>(reels: &[T]) -> usize {
    match reels.first() {
        Some(first) => reels.iter().take_while(|symbol| *symbol == first).count(),
        None => 0,
    }
}

/// Payout in minor units for `bet` at `multiplier`
pub fn payout(bet: u64, multiplier: f64) -> u64 {
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return 0;
    }
    // saturates; the ledger refuses anything past its signed range
    (bet as f64 * multiplier).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combination_values() {
        assert_eq!(combination(25, 0), 1.0);
        assert_eq!(combination(25, 1), 25.0);
        assert_eq!(combination(25, 3), 2300.0);
        assert_eq!(combination(25, 24), 25.0);
        assert_eq!(combination(22, 3), 1540.0);
        assert_eq!(combination(3, 5), 0.0);
    }

    #[test]
    fn test_multiplier_starts_at_one() {
        for total in 2..=25u32 {
            for hazards in 1..total {
                assert_eq!(combinatorial_multiplier(total, hazards, 0, 0.99), 1.0);
            }
        }
    }

    #[test]
    fn test_multiplier_strictly_increasing() {
        for total in 2..=25u32 {
            for hazards in 1..total {
                let mut previous = combinatorial_multiplier(total, hazards, 0, 0.99);
                for cleared in 1..=(total - hazards) {
                    let current = combinatorial_multiplier(total, hazards, cleared, 0.99);
                    assert!(
                        current > previous,
                        "N={total} m={hazards} k={cleared}: {current} <= {previous}"
                    );
                    previous = current;
                }
            }
        }
    }

    #[test]
    fn test_known_mines_multipliers() {
        // 3 mines, 2 safe tiles: 0.99 * 2300 / 1540
        assert_eq!(combinatorial_multiplier(25, 3, 2, 0.99), 1.48);
        assert_eq!(combinatorial_multiplier(25, 1, 1, 0.99), 1.03);
        assert_eq!(combinatorial_multiplier(25, 24, 1, 0.99), 24.75);
    }

    #[test]
    fn test_ladder_lookup() {
        let ladder = [1.08, 1.17, 1.29];
        assert_eq!(ladder_multiplier(&ladder, 0), Some(1.0));
        assert_eq!(ladder_multiplier(&ladder, 2), Some(1.17));
        assert_eq!(ladder_multiplier(&ladder, 4), None);
        assert_eq!(ladder_multiplier(&[1.234], 1), Some(1.23));
    }

    #[test]
    fn test_payout_round_trip() {
        for bet in [1u64, 10, 999, 1000, 123_456_789] {
            assert_eq!(payout(bet, 1.0), bet);
        }
        assert_eq!(payout(1000, 2.9), 2900);
        assert_eq!(payout(1000, 0.0), 0);
        assert_eq!(payout(1000, f64::NAN), 0);
    }

    #[test]
    fn test_leading_run() {
        assert_eq!(leading_run(&[1, 1, 1, 2, 1]), 3);
        assert_eq!(leading_run(&[4, 4, 4, 4, 4]), 5);
        assert_eq!(leading_run(&[1, 2, 2, 2, 2]), 1);
        assert_eq!(leading_run::<u8>(&[]), 0);
    }

    #[test]
    fn test_binary_multiplier() {
        assert_eq!(binary_multiplier(true, 2.9), 2.9);
        assert_eq!(binary_multiplier(false, 2.9), 0.0);
    }
}
