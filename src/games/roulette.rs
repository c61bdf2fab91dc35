//! Roulette
//!
//! Single-zero wheel. A request carries any number of bets keyed the way the
//! table layout names them; each is settled independently against one
//! uniform pocket draw and the returns are summed.

use super::settings::BetLimits;
use crate::errors::{WagerError, WagerResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const POCKETS: u8 = 37;
pub const STANDARD_RED: [u8; 18] = [1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36];

/// A bet position on the table layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouletteBet {
    Straight(u8),
    Red,
    Black,
    Even,
    Odd,
    Low,
    High,
    /// 1st12, 2nd12 or 3rd12
    Dozen(u8),
    /// col1, col2 or col3
    Column(u8),
}

impl RouletteBet {
    /// Total return per unit staked, stake included
    pub fn payout_multiplier(&self) -> u64 {
        match self {
            RouletteBet::Straight(_) => 36,
            RouletteBet::Dozen(_) | RouletteBet::Column(_) => 3,
            _ => 2,
        }
    }

    /// Whether the bet wins on `pocket`; zero loses every outside bet
    pub fn wins(&self, pocket: u8, red_numbers: &[u8]) -> bool {
        if let RouletteBet::Straight(number) = self {
            return *number == pocket;
        }
        if pocket == 0 {
            return false;
        }
        match self {
            RouletteBet::Straight(_) => false,
            RouletteBet::Red => red_numbers.contains(&pocket),
            RouletteBet::Black => !red_numbers.contains(&pocket),
            RouletteBet::Even => pocket % 2 == 0,
            RouletteBet::Odd => pocket % 2 == 1,
            RouletteBet::Low => pocket <= 18,
            RouletteBet::High => pocket >= 19,
            RouletteBet::Dozen(dozen) => (pocket - 1) / 12 + 1 == *dozen,
            RouletteBet::Column(column) => {
                let position = match pocket % 3 {
                    0 => 3,
                    rest => rest,
                };
                position == *column
            }
        }
    }
}

impl FromStr for RouletteBet {
    type Err = WagerError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let bet = match key {
            "red" => RouletteBet::Red,
            "black" => RouletteBet::Black,
            "even" => RouletteBet::Even,
            "odd" => RouletteBet::Odd,
            "low" => RouletteBet::Low,
            "high" => RouletteBet::High,
            "1st12" => RouletteBet::Dozen(1),
            "2nd12" => RouletteBet::Dozen(2),
            "3rd12" => RouletteBet::Dozen(3),
            "col1" => RouletteBet::Column(1),
            "col2" => RouletteBet::Column(2),
            "col3" => RouletteBet::Column(3),
            number => match number.parse::<u8>() {
                Ok(n) if n < POCKETS => RouletteBet::Straight(n),
                _ => return Err(WagerError::InvalidBet(format!("unknown roulette bet '{}'", key))),
            },
        };
        Ok(bet)
    }
}

impl fmt::Display for RouletteBet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouletteBet::Straight(n) => write!(f, "{}", n),
            RouletteBet::Red => f.write_str("red"),
            RouletteBet::Black => f.write_str("black"),
            RouletteBet::Even => f.write_str("even"),
            RouletteBet::Odd => f.write_str("odd"),
            RouletteBet::Low => f.write_str("low"),
            RouletteBet::High => f.write_str("high"),
            RouletteBet::Dozen(1) => f.write_str("1st12"),
            RouletteBet::Dozen(2) => f.write_str("2nd12"),
            RouletteBet::Dozen(_) => f.write_str("3rd12"),
            RouletteBet::Column(c) => write!(f, "col{}", c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouletteSettings {
    /// Applied to the total stake of a spin
    pub limits: BetLimits,
    pub red_numbers: Vec<u8>,
}

impl Default for RouletteSettings {
    fn default() -> Self {
        Self {
            limits: BetLimits::with_min(1),
            red_numbers: STANDARD_RED.to_vec(),
        }
    }
}

impl RouletteSettings {
    pub fn validate(&self) -> WagerResult<()> {
        self.limits.validate("roulette")?;
        let mut seen = [false; POCKETS as usize];
        for n in &self.red_numbers {
            if *n == 0 || *n >= POCKETS || seen[usize::from(*n)] {
                return Err(WagerError::InvalidConfiguration(format!(
                    "roulette red numbers must be distinct values in 1..=36, got {}",
                    n
                )));
            }
            seen[usize::from(*n)] = true;
        }
        Ok(())
    }

    pub fn resolve(&self) -> RouletteConfig {
        RouletteConfig {
            limits: self.limits.clone(),
            red_numbers: self.red_numbers.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouletteConfig {
    pub limits: BetLimits,
    pub red_numbers: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PocketColor {
    Green,
    Red,
    Black,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouletteWager {
    pub bet: RouletteBet,
    pub amount: u64,
}

/// Parse a `{position: amount}` map. Zero amounts are ignored.
pub fn parse_bets(bets: &BTreeMap<String, u64>) -> WagerResult<Vec<RouletteWager>> {
    let mut wagers = Vec::with_capacity(bets.len());
    for (key, amount) in bets {
        let bet = key.parse::<RouletteBet>()?;
        if *amount > 0 {
            wagers.push(RouletteWager { bet, amount: *amount });
        }
    }
    if wagers.is_empty() {
        return Err(WagerError::InvalidBet("roulette spin needs at least one positive bet".into()));
    }
    Ok(wagers)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettledBet {
    pub bet: String,
    pub amount: u64,
    pub payout: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouletteOutcome {
    pub result: u8,
    pub color: PocketColor,
    pub bets: Vec<SettledBet>,
    pub total_stake: u64,
    pub total_payout: u64,
}

pub fn pocket_color(pocket: u8, red_numbers: &[u8]) -> PocketColor {
    if pocket == 0 {
        PocketColor::Green
    } else if red_numbers.contains(&pocket) {
        PocketColor::Red
    } else {
        PocketColor::Black
    }
}

/// Sum of every stake; `InvalidBet` when the sum leaves the `u64` range
pub fn total_stake(wagers: &[RouletteWager]) -> WagerResult<u64> {
    wagers
        .iter()
        .try_fold(0u64, |total, w| total.checked_add(w.amount))
        .ok_or_else(|| WagerError::InvalidBet("roulette stakes overflow".into()))
}

/// Settle every wager against `pocket`
pub fn settle(config: &RouletteConfig, wagers: &[RouletteWager], pocket: u8) -> WagerResult<RouletteOutcome> {
    let overflow = || WagerError::InvalidBet("roulette payout overflow".into());
    let mut bets = Vec::with_capacity(wagers.len());
    let mut total_payout = 0u64;
    for wager in wagers {
        let payout = if wager.bet.wins(pocket, &config.red_numbers) {
            wager
                .amount
                .checked_mul(wager.bet.payout_multiplier())
                .ok_or_else(overflow)?
        } else {
            0
        };
        total_payout = total_payout.checked_add(payout).ok_or_else(overflow)?;
        bets.push(SettledBet {
            bet: wager.bet.to_string(),
            amount: wager.amount,
            payout,
        });
    }
    Ok(RouletteOutcome {
        result: pocket,
        color: pocket_color(pocket, &config.red_numbers),
        total_stake: total_stake(wagers)?,
        total_payout,
        bets,
    })
}
