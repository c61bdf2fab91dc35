//! Lucky Spin
//!
//! Weighted wheel with a per-user daily spin allowance. The allowance resets
//! at UTC midnight; the reset is computed from the last spin timestamp rather
//! than by a scheduled job.

use super::rng::{table_total, GameRng};
use super::settings::BetLimits;
use crate::errors::{WagerError, WagerResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinSegment {
    pub label: String,
    pub multiplier: f64,
    pub weight: f64,
    #[serde(default = "visible_by_default")]
    pub visible: bool,
}

fn visible_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinSettings {
    pub limits: BetLimits,
    pub max_spins_per_day: u32,
    pub segments: Vec<SpinSegment>,
}

impl Default for SpinSettings {
    fn default() -> Self {
        let segments = [2.0, 0.0, 1.5, 0.0, 3.0, 0.0, 1.2, 0.5]
            .iter()
            .map(|multiplier| SpinSegment {
                label: format!("{}x", multiplier),
                multiplier: *multiplier,
                weight: 10.0,
                visible: true,
            })
            .collect();
        Self {
            limits: BetLimits::with_min(1_000),
            max_spins_per_day: 3,
            segments,
        }
    }
}

impl SpinSettings {
    pub fn validate(&self) -> WagerResult<()> {
        self.limits.validate("spin")?;
        if self.max_spins_per_day == 0 {
            return Err(WagerError::InvalidConfiguration("spin daily limit must be at least 1".into()));
        }
        let visible: Vec<&SpinSegment> = self.segments.iter().filter(|s| s.visible).collect();
        if visible.is_empty() {
            return Err(WagerError::InvalidConfiguration("spin wheel has no visible segments".into()));
        }
        if visible.iter().any(|s| !s.multiplier.is_finite() || s.multiplier < 0.0) {
            return Err(WagerError::InvalidConfiguration("spin multipliers must be non-negative".into()));
        }
        let weights: Vec<f64> = visible.iter().map(|s| s.weight).collect();
        if table_total(&weights).is_none() {
            return Err(WagerError::InvalidConfiguration(
                "spin weights must be non-negative and sum above zero".into(),
            ));
        }
        Ok(())
    }

    /// Snapshot of the wheel as players see it
    pub fn resolve(&self) -> SpinConfig {
        SpinConfig {
            limits: self.limits.clone(),
            max_spins_per_day: self.max_spins_per_day,
            segments: self.segments.iter().filter(|s| s.visible).cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinConfig {
    pub limits: BetLimits,
    pub max_spins_per_day: u32,
    pub segments: Vec<SpinSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinOutcome {
    pub segment_index: usize,
    pub label: String,
    pub multiplier: f64,
}

pub fn spin_wheel(config: &SpinConfig, rng: &mut GameRng) -> SpinOutcome {
    let weights: Vec<f64> = config.segments.iter().map(|s| s.weight).collect();
    let index = rng.weighted_index(&weights);
    match config.segments.get(index) {
        Some(segment) => SpinOutcome {
            segment_index: index,
            label: segment.label.clone(),
            multiplier: segment.multiplier,
        },
        None => SpinOutcome {
            segment_index: index,
            label: "0x".to_string(),
            multiplier: 0.0,
        },
    }
}

/// Spins already used on `now`'s UTC day
pub fn spins_used_today(count: u32, last_spin: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u32 {
    match last_spin {
        Some(last) if last.date_naive() == now.date_naive() => count,
        _ => 0,
    }
}

/// Time left until the allowance resets at the next UTC midnight
pub fn until_reset(now: DateTime<Utc>) -> Duration {
    let tomorrow = now.date_naive().succ_opt().and_then(|d| d.and_hms_opt(0, 0, 0));
    match tomorrow {
        Some(midnight) => midnight.and_utc() - now,
        None => Duration::zero(),
    }
}

/// Daily allowance report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinStatus {
    pub spins_used: u32,
    pub max_spins: u32,
    pub remaining_spins: u32,
    pub time_until_reset_ms: i64,
}

impl SpinStatus {
    pub fn at(count: u32, last_spin: Option<DateTime<Utc>>, max_spins: u32, now: DateTime<Utc>) -> Self {
        let spins_used = spins_used_today(count, last_spin, now);
        Self {
            spins_used,
            max_spins,
            remaining_spins: max_spins.saturating_sub(spins_used),
            time_until_reset_ms: until_reset(now).num_milliseconds(),
        }
    }
}
