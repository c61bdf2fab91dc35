//! Plinko
//!
//! The landing slot is drawn from a weighted table first, then a bounce path
//! ending in that slot is generated for the client animation. Both are
//! disclosed in the same response.

use super::odds;
use super::rng::{table_total, GameRng};
use super::settings::BetLimits;
use crate::errors::{WagerError, WagerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const SUPPORTED_ROWS: [u8; 3] = [8, 12, 16];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlinkoRisk {
    Low,
    Medium,
    High,
}

impl fmt::Display for PlinkoRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlinkoRisk::Low => "low",
            PlinkoRisk::Medium => "medium",
            PlinkoRisk::High => "high",
        })
    }
}

impl FromStr for PlinkoRisk {
    type Err = WagerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(PlinkoRisk::Low),
            "medium" => Ok(PlinkoRisk::Medium),
            "high" => Ok(PlinkoRisk::High),
            other => Err(WagerError::InvalidConfiguration(format!("unknown plinko risk '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlinkoSlot {
    pub index: u8,
    pub multiplier: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlinkoTable {
    pub rows: u8,
    pub risk: PlinkoRisk,
    pub slots: Vec<PlinkoSlot>,
}

impl PlinkoTable {
    /// Table weighted like an unbiased ball: slot `i` gets weight `C(rows, i)`
    pub fn binomial(rows: u8, risk: PlinkoRisk, multipliers: &[f64]) -> Self {
        let slots = multipliers
            .iter()
            .enumerate()
            .map(|(index, multiplier)| PlinkoSlot {
                index: index as u8,
                multiplier: *multiplier,
                weight: odds::combination(u32::from(rows), index as u32),
            })
            .collect();
        Self { rows, risk, slots }
    }

    fn validate(&self) -> WagerResult<()> {
        let name = format!("plinko {} rows {} risk", self.rows, self.risk);
        if !SUPPORTED_ROWS.contains(&self.rows) {
            return Err(WagerError::InvalidConfiguration(format!("{}: unsupported row count", name)));
        }
        if self.slots.len() != usize::from(self.rows) + 1 {
            return Err(WagerError::InvalidConfiguration(format!(
                "{}: expected {} slots, got {}",
                name,
                self.rows + 1,
                self.slots.len()
            )));
        }
        if self.slots.iter().enumerate().any(|(i, slot)| usize::from(slot.index) != i) {
            return Err(WagerError::InvalidConfiguration(format!("{}: slot indices out of order", name)));
        }
        if self.slots.iter().any(|slot| !slot.multiplier.is_finite() || slot.multiplier < 0.0) {
            return Err(WagerError::InvalidConfiguration(format!("{}: negative multiplier", name)));
        }
        let weights: Vec<f64> = self.slots.iter().map(|slot| slot.weight).collect();
        if table_total(&weights).is_none() {
            return Err(WagerError::InvalidConfiguration(format!(
                "{}: weights must be non-negative and sum above zero",
                name
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlinkoSettings {
    pub limits: BetLimits,
    pub tables: Vec<PlinkoTable>,
}

impl Default for PlinkoSettings {
    fn default() -> Self {
        use PlinkoRisk::*;
        let tables = vec![
            PlinkoTable::binomial(8, Low, &[5.6, 2.1, 1.1, 1.0, 0.5, 1.0, 1.1, 2.1, 5.6]),
            PlinkoTable::binomial(8, Medium, &[13.0, 3.0, 1.3, 0.7, 0.4, 0.7, 1.3, 3.0, 13.0]),
            PlinkoTable::binomial(8, High, &[29.0, 4.0, 1.5, 0.3, 0.2, 0.3, 1.5, 4.0, 29.0]),
            PlinkoTable::binomial(
                12,
                Low,
                &[10.0, 3.0, 1.6, 1.4, 1.1, 1.0, 0.5, 1.0, 1.1, 1.4, 1.6, 3.0, 10.0],
            ),
            PlinkoTable::binomial(
                12,
                Medium,
                &[33.0, 11.0, 4.0, 2.0, 1.1, 0.6, 0.3, 0.6, 1.1, 2.0, 4.0, 11.0, 33.0],
            ),
            PlinkoTable::binomial(
                12,
                High,
                &[170.0, 24.0, 8.1, 2.0, 0.7, 0.2, 0.2, 0.2, 0.7, 2.0, 8.1, 24.0, 170.0],
            ),
            PlinkoTable::binomial(
                16,
                Low,
                &[16.0, 9.0, 2.0, 1.4, 1.4, 1.2, 1.1, 1.0, 0.5, 1.0, 1.1, 1.2, 1.4, 1.4, 2.0, 9.0, 16.0],
            ),
            PlinkoTable::binomial(
                16,
                Medium,
                &[110.0, 41.0, 10.0, 5.0, 3.0, 1.5, 1.0, 0.5, 0.3, 0.5, 1.0, 1.5, 3.0, 5.0, 10.0, 41.0, 110.0],
            ),
            PlinkoTable::binomial(
                16,
                High,
                &[1000.0, 130.0, 26.0, 9.0, 4.0, 2.0, 0.2, 0.2, 0.2, 0.2, 0.2, 2.0, 4.0, 9.0, 26.0, 130.0, 1000.0],
            ),
        ];
        Self {
            limits: BetLimits::with_min(1),
            tables,
        }
    }
}

impl PlinkoSettings {
    pub fn validate(&self) -> WagerResult<()> {
        self.limits.validate("plinko")?;
        for (i, table) in self.tables.iter().enumerate() {
            table.validate()?;
            if self.tables[..i].iter().any(|t| t.rows == table.rows && t.risk == table.risk) {
                return Err(WagerError::InvalidConfiguration(format!(
                    "plinko table for {} rows {} risk configured twice",
                    table.rows, table.risk
                )));
            }
        }
        Ok(())
    }

    pub fn resolve(&self, rows: u8, risk: PlinkoRisk) -> WagerResult<PlinkoConfig> {
        if !SUPPORTED_ROWS.contains(&rows) {
            return Err(WagerError::InvalidConfiguration(format!(
                "plinko rows must be one of {:?}, got {}",
                SUPPORTED_ROWS, rows
            )));
        }
        let table = self
            .tables
            .iter()
            .find(|t| t.rows == rows && t.risk == risk)
            .ok_or_else(|| {
                WagerError::InvalidConfiguration(format!("no plinko table for {} rows {} risk", rows, risk))
            })?;
        Ok(PlinkoConfig {
            limits: self.limits.clone(),
            rows,
            risk,
            slots: table.slots.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlinkoConfig {
    pub limits: BetLimits,
    pub rows: u8,
    pub risk: PlinkoRisk,
    pub slots: Vec<PlinkoSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlinkoOutcome {
    pub rows: u8,
    pub risk: PlinkoRisk,
    pub slot_index: u8,
    pub multiplier: f64,
    /// 0 = left, 1 = right, one entry per row
    pub path: Vec<u8>,
}

/// Draw the landing slot and a path that reaches it
pub fn drop_ball(config: &PlinkoConfig, rng: &mut GameRng) -> PlinkoOutcome {
    let weights: Vec<f64> = config.slots.iter().map(|slot| slot.weight).collect();
    let index = rng.weighted_index(&weights);
    outcome_for(config, index, rng)
}

fn outcome_for(config: &PlinkoConfig, index: usize, rng: &mut GameRng) -> PlinkoOutcome {
    let multiplier = config.slots.get(index).map(|slot| slot.multiplier).unwrap_or(0.0);
    PlinkoOutcome {
        rows: config.rows,
        risk: config.risk,
        slot_index: index as u8,
        multiplier,
        path: rng.plinko_path(config.rows, index as u8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::rng::pick_weighted;

    #[test]
    fn test_risk_parsing() {
        assert_eq!("High".parse::<PlinkoRisk>().unwrap(), PlinkoRisk::High);
        assert!(matches!("extreme".parse::<PlinkoRisk>(), Err(WagerError::InvalidConfiguration(_))));
    }

    fn medium_16_weights() -> Vec<f64> {
        // sums to 1000
        vec![1.0, 2.0, 5.0, 12.0, 30.0, 60.0, 100.0, 140.0, 300.0, 140.0, 100.0, 60.0, 30.0, 12.0, 5.0, 2.0, 1.0]
    }

    #[test]
    fn test_default_tables_valid() {
        let settings = PlinkoSettings::default();
        settings.validate().unwrap();
        assert_eq!(settings.tables.len(), 9);
        for rows in SUPPORTED_ROWS {
            for risk in [PlinkoRisk::Low, PlinkoRisk::Medium, PlinkoRisk::High] {
                assert_eq!(settings.resolve(rows, risk).unwrap().slots.len(), usize::from(rows) + 1);
            }
        }
    }

    #[test]
    fn test_unknown_rows_rejected() {
        assert!(matches!(
            PlinkoSettings::default().resolve(10, PlinkoRisk::Low),
            Err(WagerError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_weighted_table_selects_slot_eight() {
        let mut settings = PlinkoSettings::default();
        let weights = medium_16_weights();
        assert_eq!(weights.iter().sum::<f64>(), 1000.0);
        let table = settings
            .tables
            .iter_mut()
            .find(|t| t.rows == 16 && t.risk == PlinkoRisk::Medium)
            .unwrap();
        for (slot, weight) in table.slots.iter_mut().zip(weights.iter()) {
            slot.weight = *weight;
        }
        settings.validate().unwrap();

        // points in [350, 650) fall in slot 8
        assert_eq!(pick_weighted(&weights, 350.0), 8);
        assert_eq!(pick_weighted(&weights, 649.99), 8);

        let config = settings.resolve(16, PlinkoRisk::Medium).unwrap();
        let mut rng = GameRng::from_seed(21);
        let outcome = outcome_for(&config, pick_weighted(&weights, 500.0), &mut rng);
        assert_eq!(outcome.slot_index, 8);
        assert_eq!(outcome.multiplier, 0.3);
        assert_eq!(outcome.path.len(), 16);
        assert_eq!(outcome.path.iter().filter(|b| **b == 1).count(), 8);
    }

    #[test]
    fn test_drop_ball_path_matches_slot() {
        let config = PlinkoSettings::default().resolve(12, PlinkoRisk::High).unwrap();
        let mut rng = GameRng::from_seed(8);
        for _ in 0..200 {
            let outcome = drop_ball(&config, &mut rng);
            assert_eq!(outcome.path.len(), 12);
            assert_eq!(
                outcome.path.iter().filter(|b| **b == 1).count(),
                usize::from(outcome.slot_index)
            );
            assert_eq!(outcome.multiplier, config.slots[usize::from(outcome.slot_index)].multiplier);
        }
    }

    #[test]
    fn test_malformed_table_rejected() {
        let mut settings = PlinkoSettings::default();
        for slot in settings.tables[0].slots.iter_mut() {
            slot.weight = 0.0;
        }
        assert!(settings.validate().is_err());
    }
}
