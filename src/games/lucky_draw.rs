//! Lucky Draw
//!
//! Players buy tickets into fixed-price pools. An administrator draws one
//! winning ticket per pool; the winner receives a multiple of the ticket
//! price and every other ticket in the pool is marked lost.

use super::odds;
use super::rng::GameRng;
use super::settings::MAX_STAKE;
use crate::errors::{WagerError, WagerResult};
use crate::games::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TOKEN_PREFIX: &str = "#LD-";
pub const TOKEN_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuckyDrawSettings {
    pub ticket_prices: Vec<u64>,
    pub prize_multiplier: f64,
}

impl Default for LuckyDrawSettings {
    fn default() -> Self {
        Self {
            ticket_prices: vec![5_000, 10_000, 20_000, 50_000],
            prize_multiplier: 2.0,
        }
    }
}

impl LuckyDrawSettings {
    pub fn validate(&self) -> WagerResult<()> {
        if self.ticket_prices.is_empty() {
            return Err(WagerError::InvalidConfiguration("lucky draw has no ticket prices".into()));
        }
        for (i, price) in self.ticket_prices.iter().enumerate() {
            if *price == 0 || *price > MAX_STAKE || self.ticket_prices[..i].contains(price) {
                return Err(WagerError::InvalidConfiguration(format!(
                    "lucky draw ticket prices must be positive, distinct and within the stake ceiling, got {}",
                    price
                )));
            }
        }
        if !(self.prize_multiplier.is_finite() && self.prize_multiplier > 0.0) {
            return Err(WagerError::InvalidConfiguration("lucky draw prize multiplier must be positive".into()));
        }
        Ok(())
    }

    pub fn resolve(&self) -> LuckyDrawConfig {
        LuckyDrawConfig {
            ticket_prices: self.ticket_prices.clone(),
            prize_multiplier: self.prize_multiplier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuckyDrawConfig {
    pub ticket_prices: Vec<u64>,
    pub prize_multiplier: f64,
}

impl LuckyDrawConfig {
    pub fn ensure_price(&self, price: u64) -> WagerResult<()> {
        if self.ticket_prices.contains(&price) {
            Ok(())
        } else {
            Err(WagerError::InvalidBet(format!(
                "ticket price {} is not one of {:?}",
                price, self.ticket_prices
            )))
        }
    }

    pub fn prize_for(&self, price: u64) -> u64 {
        odds::payout(price, self.prize_multiplier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Active,
    Won,
    Lost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: UserId,
    pub token: String,
    pub price: u64,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<DateTime<Utc>>,
}

impl Ticket {
    pub fn issue(user_id: UserId, price: u64, rng: &mut GameRng, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token: generate_token(rng),
            price,
            status: TicketStatus::Active,
            created_at: now,
            settled_at: None,
        }
    }
}

/// `#LD-` followed by six characters from A-Z0-9
pub fn generate_token(rng: &mut GameRng) -> String {
    format!("{}{}", TOKEN_PREFIX, rng.alphanumeric(TOKEN_LENGTH))
}
