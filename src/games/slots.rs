//! Slots
//!
//! Five independent weighted reels. Only the run of matching symbols starting
//! at the first reel pays.

use super::odds;
use super::rng::{table_total, GameRng};
use super::settings::BetLimits;
use crate::errors::{WagerError, WagerResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const REELS: usize = 5;
pub const MIN_PAYING_RUN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotSymbol {
    Clover,
    Cherry,
    Bell,
    Diamond,
    #[serde(rename = "7")]
    Seven,
}

impl SlotSymbol {
    pub const ALL: [SlotSymbol; 5] = [
        SlotSymbol::Clover,
        SlotSymbol::Cherry,
        SlotSymbol::Bell,
        SlotSymbol::Diamond,
        SlotSymbol::Seven,
    ];
}

/// Multipliers for runs of three, four and five
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymbolPayout {
    #[serde(rename = "3")]
    pub three: f64,
    #[serde(rename = "4")]
    pub four: f64,
    #[serde(rename = "5")]
    pub five: f64,
}

impl SymbolPayout {
    pub const fn new(three: f64, four: f64, five: f64) -> Self {
        Self { three, four, five }
    }

    pub fn for_run(&self, run: usize) -> f64 {
        match run {
            3 => self.three,
            4 => self.four,
            r if r >= REELS => self.five,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotsSettings {
    pub limits: BetLimits,
    pub weights: BTreeMap<SlotSymbol, f64>,
    pub paytable: BTreeMap<SlotSymbol, SymbolPayout>,
}

impl Default for SlotsSettings {
    fn default() -> Self {
        use SlotSymbol::*;
        Self {
            limits: BetLimits::with_min(1),
            weights: BTreeMap::from([
                (Clover, 50.0),
                (Cherry, 40.0),
                (Bell, 30.0),
                (Diamond, 15.0),
                (Seven, 5.0),
            ]),
            paytable: BTreeMap::from([
                (Clover, SymbolPayout::new(2.0, 5.0, 10.0)),
                (Cherry, SymbolPayout::new(3.0, 8.0, 15.0)),
                (Bell, SymbolPayout::new(5.0, 15.0, 30.0)),
                (Diamond, SymbolPayout::new(10.0, 30.0, 60.0)),
                (Seven, SymbolPayout::new(50.0, 200.0, 1000.0)),
            ]),
        }
    }
}

impl SlotsSettings {
    pub fn validate(&self) -> WagerResult<()> {
        self.limits.validate("slots")?;
        for symbol in SlotSymbol::ALL {
            let payout = self.paytable.get(&symbol).ok_or_else(|| {
                WagerError::InvalidConfiguration(format!("slots paytable is missing {:?}", symbol))
            })?;
            let finite = [payout.three, payout.four, payout.five].iter().all(|m| m.is_finite());
            if !(finite && 0.0 <= payout.three && payout.three <= payout.four && payout.four <= payout.five) {
                return Err(WagerError::InvalidConfiguration(format!(
                    "slots payouts for {:?} must be finite, non-negative and non-decreasing",
                    symbol
                )));
            }
        }
        let weights: Vec<f64> = SlotSymbol::ALL
            .iter()
            .map(|symbol| self.weights.get(symbol).copied().unwrap_or(0.0))
            .collect();
        if table_total(&weights).is_none() {
            return Err(WagerError::InvalidConfiguration(
                "slots symbol weights must be non-negative and sum above zero".into(),
            ));
        }
        Ok(())
    }

    pub fn resolve(&self) -> SlotsConfig {
        SlotsConfig {
            limits: self.limits.clone(),
            weights: self.weights.clone(),
            paytable: self.paytable.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotsConfig {
    pub limits: BetLimits,
    pub weights: BTreeMap<SlotSymbol, f64>,
    pub paytable: BTreeMap<SlotSymbol, SymbolPayout>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WinType {
    None,
    Small,
    Big,
    Jackpot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsOutcome {
    pub reels: Vec<SlotSymbol>,
    pub matched: usize,
    pub multiplier: f64,
    pub win_type: WinType,
}

/// Draw every reel independently from the symbol weights
pub fn spin_reels(config: &SlotsConfig, rng: &mut GameRng) -> Vec<SlotSymbol> {
    let weights: Vec<f64> = SlotSymbol::ALL
        .iter()
        .map(|symbol| config.weights.get(symbol).copied().unwrap_or(0.0))
        .collect();
    (0..REELS)
        .map(|_| SlotSymbol::ALL[rng.weighted_index(&weights)])
        .collect()
}

/// Pay the leading run against the paytable
pub fn evaluate(config: &SlotsConfig, reels: Vec<SlotSymbol>) -> SlotsOutcome {
    let matched = odds::leading_run(&reels);
    let multiplier = match reels.first() {
        Some(symbol) if matched >= MIN_PAYING_RUN => config
            .paytable
            .get(symbol)
            .map(|payout| payout.for_run(matched))
            .unwrap_or(0.0),
        _ => 0.0,
    };
    let win_type = match matched {
        _ if multiplier <= 0.0 => WinType::None,
        3 => WinType::Small,
        4 => WinType::Big,
        _ => WinType::Jackpot,
    };
    SlotsOutcome {
        reels,
        matched,
        multiplier,
        win_type,
    }
}
