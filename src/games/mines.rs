//! Mines
//!
//! A 25-tile board hiding 1-24 mines. Each safe reveal raises the multiplier;
//! hitting a mine loses the stake; clearing every safe tile wins automatically.

use super::odds;
use super::rng::GameRng;
use super::settings::{validate_ladder, BetLimits};
use super::types::StepResult;
use crate::errors::{WagerError, WagerResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const BOARD_TILES: u8 = 25;
pub const MIN_MINES: u8 = 1;
pub const MAX_MINES: u8 = BOARD_TILES - 1;

/// Admin tunables for Mines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinesSettings {
    pub limits: BetLimits,
    pub house_edge: f64,
    /// Multiplier ladders keyed by mines count; entry `k-1` applies after `k` reveals
    #[serde(default)]
    pub ladders: BTreeMap<u8, Vec<f64>>,
}

impl Default for MinesSettings {
    fn default() -> Self {
        Self {
            limits: BetLimits::with_min(1_000),
            house_edge: 0.99,
            ladders: BTreeMap::new(),
        }
    }
}

impl MinesSettings {
    pub fn validate(&self) -> WagerResult<()> {
        self.limits.validate("mines")?;
        if !(self.house_edge > 0.0 && self.house_edge <= 1.0) {
            return Err(WagerError::InvalidConfiguration(format!(
                "mines house edge must be in (0, 1], got {}",
                self.house_edge
            )));
        }
        for (mines, ladder) in &self.ladders {
            if !(MIN_MINES..=MAX_MINES).contains(mines) {
                return Err(WagerError::InvalidConfiguration(format!(
                    "mines ladder configured for unsupported mines count {}",
                    mines
                )));
            }
            validate_ladder(&format!("mines ladder for {} mines", mines), ladder)?;
            let safe_tiles = usize::from(BOARD_TILES - mines);
            if ladder.len() > safe_tiles {
                return Err(WagerError::InvalidConfiguration(format!(
                    "mines ladder for {} mines has {} entries, board only has {} safe tiles",
                    mines,
                    ladder.len(),
                    safe_tiles
                )));
            }
        }
        Ok(())
    }

    /// Freeze the configuration for a round with `mines` mines
    pub fn resolve(&self, mines: u8) -> WagerResult<MinesConfig> {
        if !(MIN_MINES..=MAX_MINES).contains(&mines) {
            return Err(WagerError::InvalidConfiguration(format!(
                "mines count must be between {} and {}, got {}",
                MIN_MINES, MAX_MINES, mines
            )));
        }
        Ok(MinesConfig {
            limits: self.limits.clone(),
            tiles: BOARD_TILES,
            mines,
            house_edge: self.house_edge,
            ladder: self.ladders.get(&mines).cloned(),
        })
    }
}

/// Configuration snapshot carried by a Mines session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinesConfig {
    pub limits: BetLimits,
    pub tiles: u8,
    pub mines: u8,
    pub house_edge: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ladder: Option<Vec<f64>>,
}

impl MinesConfig {
    pub fn safe_tiles(&self) -> usize {
        usize::from(self.tiles - self.mines)
    }

    /// Ladder entry when configured, combinatorial formula otherwise
    pub fn multiplier_for(&self, cleared: usize) -> f64 {
        self.ladder
            .as_deref()
            .and_then(|ladder| odds::ladder_multiplier(ladder, cleared))
            .unwrap_or_else(|| {
                odds::combinatorial_multiplier(
                    u32::from(self.tiles),
                    u32::from(self.mines),
                    cleared as u32,
                    self.house_edge,
                )
            })
    }
}

/// Progress and hidden board of one Mines round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinesRound {
    pub config: MinesConfig,
    pub mine_positions: Vec<u8>,
    pub revealed: Vec<u8>,
    pub detonated: Option<u8>,
}

impl MinesRound {
    pub fn deal(config: MinesConfig, rng: &mut GameRng) -> Self {
        let mine_positions = rng.place_hazards(config.tiles, config.mines);
        Self {
            config,
            mine_positions,
            revealed: Vec::new(),
            detonated: None,
        }
    }

    pub fn reveal(&mut self, tile: u32) -> WagerResult<StepResult> {
        let limit = u32::from(self.config.tiles);
        if tile >= limit {
            return Err(WagerError::OutOfRange { position: tile, limit });
        }
        let tile = tile as u8;
        if self.revealed.contains(&tile) {
            return Err(WagerError::AlreadyRevealed(u32::from(tile)));
        }

        if self.mine_positions.contains(&tile) {
            self.detonated = Some(tile);
            return Ok(StepResult::Lost);
        }

        self.revealed.push(tile);
        let multiplier = self.config.multiplier_for(self.revealed.len());
        if self.revealed.len() == self.config.safe_tiles() {
            Ok(StepResult::Won { multiplier })
        } else {
            Ok(StepResult::Continue { multiplier })
        }
    }

    pub fn cashout_multiplier(&self) -> WagerResult<f64> {
        if self.revealed.is_empty() {
            return Err(WagerError::NothingToCashOut);
        }
        Ok(self.config.multiplier_for(self.revealed.len()))
    }

    pub fn view(&self, disclose: bool) -> MinesView {
        MinesView {
            mines_count: self.config.mines,
            tiles: self.config.tiles,
            revealed: self.revealed.clone(),
            next_multiplier: (self.revealed.len() < self.config.safe_tiles())
                .then(|| self.config.multiplier_for(self.revealed.len() + 1)),
            detonated: self.detonated,
            mines: disclose.then(|| self.mine_positions.clone()),
        }
    }
}

/// Client-facing Mines state; mine positions only once the round is over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinesView {
    pub mines_count: u8,
    pub tiles: u8,
    pub revealed: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detonated: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mines: Option<Vec<u8>>,
}
