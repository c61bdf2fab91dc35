//! Game configuration
//!
//! [`CasinoSettings`] holds every admin tunable. A round never reads it
//! directly: the configuration store resolves it into a [`GameConfiguration`]
//! snapshot for one game and variant, which the session keeps for its whole
//! life.

use super::dragon_tower::{DragonTowerSettings, TowerConfig, TowerDifficulty};
use super::lucky_draw::{LuckyDrawConfig, LuckyDrawSettings};
use super::mines::{MinesConfig, MinesSettings};
use super::plinko::{PlinkoConfig, PlinkoRisk, PlinkoSettings};
use super::roulette::{RouletteConfig, RouletteSettings};
use super::shuffle::{ShuffleConfig, ShuffleSettings};
use super::slots::{SlotsConfig, SlotsSettings};
use super::spin::{SpinConfig, SpinSettings};
use super::types::GameKind;
use crate::errors::{ConfigResult, ConfigurationError, WagerError, WagerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hard ceiling on any single stake in minor units, whatever the configured
/// maximum. Keeps stakes and the largest ladder payouts inside the ledger's
/// signed range.
pub const MAX_STAKE: u64 = 10_000_000_000;

/// Stake limits in minor units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetLimits {
    pub min_bet: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bet: Option<u64>,
}

impl BetLimits {
    pub const fn with_min(min_bet: u64) -> Self {
        Self { min_bet, max_bet: None }
    }

    /// Reject non-positive, below-minimum and above-maximum stakes
    pub fn check(&self, amount: u64) -> WagerResult<()> {
        if amount == 0 {
            return Err(WagerError::InvalidBet("bet amount must be positive".into()));
        }
        if amount < self.min_bet {
            return Err(WagerError::InvalidBet(format!(
                "bet {} is below the minimum of {}",
                amount, self.min_bet
            )));
        }
        if amount > MAX_STAKE {
            return Err(WagerError::InvalidBet(format!(
                "bet {} exceeds the stake ceiling of {}",
                amount, MAX_STAKE
            )));
        }
        if let Some(max) = self.max_bet {
            if amount > max {
                return Err(WagerError::InvalidBet(format!("bet {} exceeds the maximum of {}", amount, max)));
            }
        }
        Ok(())
    }

    pub fn validate(&self, game: &str) -> WagerResult<()> {
        if self.min_bet == 0 {
            return Err(WagerError::InvalidConfiguration(format!("{} minimum bet must be positive", game)));
        }
        if self.min_bet > MAX_STAKE || matches!(self.max_bet, Some(max) if max > MAX_STAKE) {
            return Err(WagerError::InvalidConfiguration(format!(
                "{} bet limits exceed the stake ceiling of {}",
                game, MAX_STAKE
            )));
        }
        if matches!(self.max_bet, Some(max) if max < self.min_bet) {
            return Err(WagerError::InvalidConfiguration(format!(
                "{} maximum bet is below its minimum",
                game
            )));
        }
        Ok(())
    }
}

/// Multiplier ladders must be non-empty, positive and strictly increasing
pub fn validate_ladder(name: &str, ladder: &[f64]) -> WagerResult<()> {
    if ladder.is_empty() {
        return Err(WagerError::InvalidConfiguration(format!("{} is empty", name)));
    }
    if ladder.iter().any(|m| !m.is_finite() || *m <= 0.0) {
        return Err(WagerError::InvalidConfiguration(format!("{} has non-positive entries", name)));
    }
    if ladder.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(WagerError::InvalidConfiguration(format!("{} must be strictly increasing", name)));
    }
    Ok(())
}

/// Every admin-tunable game parameter
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CasinoSettings {
    pub mines: MinesSettings,
    pub dragon_tower: DragonTowerSettings,
    pub plinko: PlinkoSettings,
    pub roulette: RouletteSettings,
    pub spin: SpinSettings,
    pub slots: SlotsSettings,
    pub shuffle: ShuffleSettings,
    pub lucky_draw: LuckyDrawSettings,
}

impl CasinoSettings {
    pub fn validate(&self) -> WagerResult<()> {
        self.mines.validate()?;
        self.dragon_tower.validate()?;
        self.plinko.validate()?;
        self.roulette.validate()?;
        self.spin.validate()?;
        self.slots.validate()?;
        self.shuffle.validate()?;
        self.lucky_draw.validate()
    }

    /// Load and validate settings from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path.display(), e)))?;
        let settings: CasinoSettings = serde_json::from_str(&content)?;
        settings
            .validate()
            .map_err(|e| ConfigurationError::ValidationFailed(e.to_string()))?;
        Ok(settings)
    }

    /// Freeze the configuration of one game variant
    pub fn resolve(&self, kind: GameKind, variant: &Variant) -> WagerResult<GameConfiguration> {
        let config = match (kind, variant) {
            (GameKind::Mines, Variant::Mines { mines }) => GameConfiguration::Mines(self.mines.resolve(*mines)?),
            (GameKind::DragonTower, Variant::DragonTower { difficulty }) => {
                GameConfiguration::DragonTower(self.dragon_tower.resolve(*difficulty)?)
            }
            (GameKind::Plinko, Variant::Plinko { rows, risk }) => {
                GameConfiguration::Plinko(self.plinko.resolve(*rows, *risk)?)
            }
            (GameKind::Roulette, Variant::Standard) => GameConfiguration::Roulette(self.roulette.resolve()),
            (GameKind::Spin, Variant::Standard) => GameConfiguration::Spin(self.spin.resolve()),
            (GameKind::Slots, Variant::Standard) => GameConfiguration::Slots(self.slots.resolve()),
            (GameKind::Shuffle, Variant::Standard) => GameConfiguration::Shuffle(self.shuffle.resolve()),
            (GameKind::LuckyDraw, Variant::Standard) => GameConfiguration::LuckyDraw(self.lucky_draw.resolve()),
            (kind, variant) => {
                return Err(WagerError::InvalidConfiguration(format!(
                    "{} does not accept variant {:?}",
                    kind, variant
                )))
            }
        };
        Ok(config)
    }
}

/// Variant parameters selecting one configuration of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Variant {
    Standard,
    Mines { mines: u8 },
    DragonTower { difficulty: TowerDifficulty },
    Plinko { rows: u8, risk: PlinkoRisk },
}

/// Frozen configuration of one game variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameConfiguration {
    Mines(MinesConfig),
    DragonTower(TowerConfig),
    Plinko(PlinkoConfig),
    Roulette(RouletteConfig),
    Spin(SpinConfig),
    Slots(SlotsConfig),
    Shuffle(ShuffleConfig),
    LuckyDraw(LuckyDrawConfig),
}

impl GameConfiguration {
    pub fn kind(&self) -> GameKind {
        match self {
            GameConfiguration::Mines(_) => GameKind::Mines,
            GameConfiguration::DragonTower(_) => GameKind::DragonTower,
            GameConfiguration::Plinko(_) => GameKind::Plinko,
            GameConfiguration::Roulette(_) => GameKind::Roulette,
            GameConfiguration::Spin(_) => GameKind::Spin,
            GameConfiguration::Slots(_) => GameKind::Slots,
            GameConfiguration::Shuffle(_) => GameKind::Shuffle,
            GameConfiguration::LuckyDraw(_) => GameKind::LuckyDraw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_settings_are_valid() {
        CasinoSettings::default().validate().unwrap();
    }

    #[test]
    fn test_bet_limits() {
        let limits = BetLimits { min_bet: 1_000, max_bet: Some(50_000) };
        assert!(limits.check(1_000).is_ok());
        assert!(matches!(limits.check(0), Err(WagerError::InvalidBet(_))));
        assert!(matches!(limits.check(999), Err(WagerError::InvalidBet(_))));
        assert!(matches!(limits.check(50_001), Err(WagerError::InvalidBet(_))));
    }

    #[test]
    fn test_stake_ceiling_applies_without_configured_max() {
        let limits = BetLimits::with_min(1);
        assert!(limits.check(MAX_STAKE).is_ok());
        assert!(matches!(limits.check(MAX_STAKE + 1), Err(WagerError::InvalidBet(_))));
        assert!(matches!(limits.check((1u64 << 63) + 1), Err(WagerError::InvalidBet(_))));
        assert!(matches!(limits.check(u64::MAX), Err(WagerError::InvalidBet(_))));

        let too_wide = BetLimits { min_bet: 1, max_bet: Some(MAX_STAKE + 1) };
        assert!(matches!(too_wide.validate("mines"), Err(WagerError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_ladder_validation() {
        assert!(validate_ladder("x", &[1.1, 1.2, 1.5]).is_ok());
        assert!(validate_ladder("x", &[]).is_err());
        assert!(validate_ladder("x", &[1.1, 1.1]).is_err());
        assert!(validate_ladder("x", &[-1.0, 1.1]).is_err());
    }

    #[test]
    fn test_variant_mismatch_rejected() {
        let settings = CasinoSettings::default();
        assert!(matches!(
            settings.resolve(GameKind::Mines, &Variant::Standard),
            Err(WagerError::InvalidConfiguration(_))
        ));
        assert_eq!(
            settings.resolve(GameKind::Mines, &Variant::Mines { mines: 3 }).unwrap().kind(),
            GameKind::Mines
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() -> ConfigResult<()> {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "shuffle": {{ "limits": {{ "min_bet": 500 }}, "cups": 3, "multiplier": 2.5 }},
                 "mines": {{ "limits": {{ "min_bet": 1000 }}, "house_edge": 0.97, "ladders": {{ "3": [1.08, 1.17, 1.29] }} }} }}"#
        )
        .unwrap();

        let settings = CasinoSettings::load_json(file.path())?;
        assert_eq!(settings.shuffle.multiplier, 2.5);
        assert_eq!(settings.mines.ladders.get(&3).map(Vec::len), Some(3));
        assert_eq!(settings.spin, SpinSettings::default());
        Ok(())
    }

    #[test]
    fn test_invalid_json_settings_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "shuffle": {{ "limits": {{ "min_bet": 500 }}, "cups": 1, "multiplier": 2.5 }} }}"#).unwrap();
        assert!(matches!(
            CasinoSettings::load_json(file.path()),
            Err(ConfigurationError::ValidationFailed(_))
        ));
    }
}
