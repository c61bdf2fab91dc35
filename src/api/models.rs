//! API Request and Response Models
//!
//! Wire shapes of the game endpoints. Amounts are integer minor units.

use crate::errors::WagerResult;
use crate::games::dragon_tower::TowerDifficulty;
use crate::games::plinko::PlinkoRisk;
use crate::games::SessionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub user_id: u64,
    pub balance: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMinesRequest {
    pub bet_amount: u64,
    pub mines_count: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealTileRequest {
    pub game_id: SessionId,
    pub tile_index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashoutRequest {
    pub game_id: SessionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTowerRequest {
    pub bet_amount: u64,
    /// Parsed by the handler so unknown names map to `INVALID_CONFIGURATION`
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl CreateTowerRequest {
    pub fn difficulty(&self) -> WagerResult<TowerDifficulty> {
        self.difficulty
            .as_deref()
            .map_or(Ok(TowerDifficulty::default()), str::parse)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimbRequest {
    pub game_id: SessionId,
    pub column: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShuffleStartRequest {
    pub bet_amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShuffleRevealRequest {
    pub game_id: SessionId,
    pub selected_cup: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlinkoRequest {
    pub bet_amount: u64,
    pub rows: u8,
    pub risk: String,
}

impl PlinkoRequest {
    pub fn risk(&self) -> WagerResult<PlinkoRisk> {
        self.risk.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouletteRequest {
    pub bets: BTreeMap<String, u64>,
}

/// Stake-only request used by spin and slots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetRequest {
    pub bet_amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketPurchaseRequest {
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawRequest {
    pub price: u64,
}
