//! Dragon Tower
//!
//! Climb a tower one row at a time, picking a column per row. Each row hides
//! a difficulty-dependent number of eggs that end the climb. Reaching the top
//! row wins automatically.

use super::odds;
use super::rng::GameRng;
use super::settings::{validate_ladder, BetLimits};
use super::types::StepResult;
use crate::errors::{WagerError, WagerResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_ROWS: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TowerDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
    Master,
}

impl TowerDifficulty {
    pub const ALL: [TowerDifficulty; 5] = [
        TowerDifficulty::Easy,
        TowerDifficulty::Medium,
        TowerDifficulty::Hard,
        TowerDifficulty::Expert,
        TowerDifficulty::Master,
    ];
}

impl fmt::Display for TowerDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TowerDifficulty::Easy => "easy",
            TowerDifficulty::Medium => "medium",
            TowerDifficulty::Hard => "hard",
            TowerDifficulty::Expert => "expert",
            TowerDifficulty::Master => "master",
        };
        f.write_str(name)
    }
}

impl FromStr for TowerDifficulty {
    type Err = WagerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        TowerDifficulty::ALL
            .into_iter()
            .find(|difficulty| difficulty.to_string() == wanted)
            .ok_or_else(|| WagerError::InvalidConfiguration(format!("unknown dragon tower difficulty '{}'", wanted)))
    }
}

/// Shape, stake limits and ladder of one difficulty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultySettings {
    pub columns: u8,
    pub hazards: u8,
    pub limits: BetLimits,
    pub multipliers: Vec<f64>,
}

/// Admin tunables for Dragon Tower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragonTowerSettings {
    pub rows: u8,
    pub difficulties: BTreeMap<TowerDifficulty, DifficultySettings>,
}

impl Default for DragonTowerSettings {
    fn default() -> Self {
        let level = |columns, hazards, multipliers: [f64; 9]| DifficultySettings {
            columns,
            hazards,
            limits: BetLimits::with_min(1_000),
            multipliers: multipliers.to_vec(),
        };
        let difficulties = BTreeMap::from([
            (
                TowerDifficulty::Easy,
                level(4, 1, [1.29, 1.72, 2.29, 3.06, 4.08, 5.45, 7.26, 9.69, 12.93]),
            ),
            (
                TowerDifficulty::Medium,
                level(3, 1, [1.45, 2.18, 3.27, 4.91, 7.36, 11.04, 16.56, 24.84, 37.26]),
            ),
            (
                TowerDifficulty::Hard,
                level(2, 1, [1.94, 3.88, 7.76, 15.52, 31.04, 62.08, 124.16, 248.32, 496.64]),
            ),
            (
                TowerDifficulty::Expert,
                level(3, 2, [2.91, 8.73, 26.19, 78.57, 235.71, 707.13, 2121.39, 6364.17, 19092.51]),
            ),
            (
                TowerDifficulty::Master,
                level(
                    4,
                    3,
                    [3.88, 15.52, 62.08, 248.32, 993.28, 3973.12, 15892.48, 63569.92, 254279.68],
                ),
            ),
        ]);
        Self { rows: DEFAULT_ROWS, difficulties }
    }
}

impl DragonTowerSettings {
    pub fn validate(&self) -> WagerResult<()> {
        if self.rows == 0 {
            return Err(WagerError::InvalidConfiguration("dragon tower needs at least one row".into()));
        }
        if self.difficulties.is_empty() {
            return Err(WagerError::InvalidConfiguration("dragon tower has no difficulties".into()));
        }
        for (difficulty, level) in &self.difficulties {
            level.limits.validate(&format!("dragon tower {}", difficulty))?;
            if level.columns < 2 || level.hazards == 0 || level.hazards >= level.columns {
                return Err(WagerError::InvalidConfiguration(format!(
                    "dragon tower {} needs 1..{} hazards over {} columns, got {}",
                    difficulty, level.columns, level.columns, level.hazards
                )));
            }
            validate_ladder(&format!("dragon tower {} ladder", difficulty), &level.multipliers)?;
            if level.multipliers.len() != usize::from(self.rows) {
                return Err(WagerError::InvalidConfiguration(format!(
                    "dragon tower {} ladder has {} entries for {} rows",
                    difficulty,
                    level.multipliers.len(),
                    self.rows
                )));
            }
        }
        Ok(())
    }

    pub fn resolve(&self, difficulty: TowerDifficulty) -> WagerResult<TowerConfig> {
        let level = self.difficulties.get(&difficulty).ok_or_else(|| {
            WagerError::InvalidConfiguration(format!("dragon tower difficulty {} is not offered", difficulty))
        })?;
        Ok(TowerConfig {
            difficulty,
            rows: self.rows,
            columns: level.columns,
            hazards: level.hazards,
            limits: level.limits.clone(),
            multipliers: level.multipliers.clone(),
        })
    }
}

/// Configuration snapshot carried by a Dragon Tower session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerConfig {
    pub difficulty: TowerDifficulty,
    pub rows: u8,
    pub columns: u8,
    pub hazards: u8,
    pub limits: BetLimits,
    pub multipliers: Vec<f64>,
}

impl TowerConfig {
    fn multiplier_for(&self, cleared: usize) -> f64 {
        odds::ladder_multiplier(&self.multipliers, cleared).unwrap_or_else(|| {
            // ladders are validated to cover every row
            self.multipliers.last().copied().map(odds::round2).unwrap_or(odds::BASE_MULTIPLIER)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerRound {
    pub config: TowerConfig,
    /// Hazard columns for every row, bottom row first
    pub layout: Vec<Vec<u8>>,
    /// Column picked on each cleared row
    pub picks: Vec<u8>,
    pub fallen_at: Option<(u8, u8)>,
}

impl TowerRound {
    pub fn deal(config: TowerConfig, rng: &mut GameRng) -> Self {
        let layout = (0..config.rows)
            .map(|_| rng.place_hazards(config.columns, config.hazards))
            .collect();
        Self {
            config,
            layout,
            picks: Vec::new(),
            fallen_at: None,
        }
    }

    pub fn current_row(&self) -> usize {
        self.picks.len()
    }

    pub fn climb(&mut self, column: u32) -> WagerResult<StepResult> {
        let limit = u32::from(self.config.columns);
        if column >= limit {
            return Err(WagerError::OutOfRange { position: column, limit });
        }
        let row = self.current_row();
        let hazards = self.layout.get(row).ok_or_else(|| {
            WagerError::InvalidSessionState("tower already climbed to the top".into())
        })?;
        let column = column as u8;

        if hazards.contains(&column) {
            self.fallen_at = Some((row as u8, column));
            return Ok(StepResult::Lost);
        }

        self.picks.push(column);
        let multiplier = self.config.multiplier_for(self.picks.len());
        if self.picks.len() == usize::from(self.config.rows) {
            Ok(StepResult::Won { multiplier })
        } else {
            Ok(StepResult::Continue { multiplier })
        }
    }

    pub fn cashout_multiplier(&self) -> WagerResult<f64> {
        if self.picks.is_empty() {
            return Err(WagerError::NothingToCashOut);
        }
        Ok(self.config.multiplier_for(self.picks.len()))
    }

    pub fn view(&self, disclose: bool) -> TowerView {
        // cleared rows are public, the rest of the tower only once settled
        let visible_rows = if disclose { self.layout.len() } else { self.picks.len() };
        TowerView {
            difficulty: self.config.difficulty,
            rows: self.config.rows,
            columns: self.config.columns,
            current_row: self.current_row(),
            picks: self.picks.clone(),
            cleared_rows: self.layout[..visible_rows].to_vec(),
            fallen_at: self.fallen_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerView {
    pub difficulty: TowerDifficulty,
    pub rows: u8,
    pub columns: u8,
    pub current_row: usize,
    pub picks: Vec<u8>,
    /// Hazard columns of every row the player may see
    pub cleared_rows: Vec<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallen_at: Option<(u8, u8)>,
}
