use super::dragon_tower::{TowerRound, TowerView};
use super::mines::{MinesRound, MinesView};
use super::plinko::PlinkoOutcome;
use super::roulette::RouletteOutcome;
use super::shuffle::{ShuffleRound, ShuffleView};
use super::slots::SlotsOutcome;
use super::spin::SpinOutcome;
use crate::errors::{WagerError, WagerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub type UserId = u64;
pub type SessionId = Uuid;

/// Supported games
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Mines,
    DragonTower,
    Plinko,
    Roulette,
    Spin,
    Slots,
    Shuffle,
    LuckyDraw,
}

impl GameKind {
    pub const ALL: [GameKind; 8] = [
        GameKind::Mines,
        GameKind::DragonTower,
        GameKind::Plinko,
        GameKind::Roulette,
        GameKind::Spin,
        GameKind::Slots,
        GameKind::Shuffle,
        GameKind::LuckyDraw,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Mines => "mines",
            GameKind::DragonTower => "dragon_tower",
            GameKind::Plinko => "plinko",
            GameKind::Roulette => "roulette",
            GameKind::Spin => "spin",
            GameKind::Slots => "slots",
            GameKind::Shuffle => "shuffle",
            GameKind::LuckyDraw => "lucky_draw",
        }
    }

    /// When the hidden outcome of a round becomes visible to the player
    pub fn disclosure(&self) -> DisclosurePolicy {
        match self {
            GameKind::Mines | GameKind::DragonTower | GameKind::Shuffle => DisclosurePolicy::WithheldUntilSettled,
            _ => DisclosurePolicy::DisclosedUpFront,
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Disclosure protocol of a game's hidden outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisclosurePolicy {
    /// Committed and returned in the same response that settles the round
    /// (Plinko path, wheel segment, reels)
    DisclosedUpFront,
    /// Committed at start but withheld until the round is terminal
    /// (mine positions, tower layout, winning cup)
    WithheldUntilSettled,
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Won,
    Lost,
    CashedOut,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

/// Player input for one step of a multi-step round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepInput {
    /// Mines: reveal a tile
    Reveal { tile: u32 },
    /// Dragon Tower: pick a column on the current row
    Climb { column: u32 },
    /// Shuffle: pick a cup
    PickCup { cup: u32 },
}

/// Result of applying one step to a round
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepResult {
    Continue { multiplier: f64 },
    Won { multiplier: f64 },
    Lost,
}

/// Game-specific progress and hidden outcome of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameState {
    Mines(MinesRound),
    DragonTower(TowerRound),
    Shuffle(ShuffleRound),
    Plinko(PlinkoOutcome),
    Roulette(RouletteOutcome),
    Spin(SpinOutcome),
    Slots(SlotsOutcome),
}

impl GameState {
    pub fn kind(&self) -> GameKind {
        match self {
            GameState::Mines(_) => GameKind::Mines,
            GameState::DragonTower(_) => GameKind::DragonTower,
            GameState::Shuffle(_) => GameKind::Shuffle,
            GameState::Plinko(_) => GameKind::Plinko,
            GameState::Roulette(_) => GameKind::Roulette,
            GameState::Spin(_) => GameKind::Spin,
            GameState::Slots(_) => GameKind::Slots,
        }
    }

    /// Multiplier before the first step
    pub fn base_multiplier(&self) -> f64 {
        match self {
            GameState::Mines(_) | GameState::DragonTower(_) => super::odds::BASE_MULTIPLIER,
            _ => 0.0,
        }
    }

    pub fn step(&mut self, input: StepInput) -> WagerResult<StepResult> {
        match (self, input) {
            (GameState::Mines(round), StepInput::Reveal { tile }) => round.reveal(tile),
            (GameState::DragonTower(round), StepInput::Climb { column }) => round.climb(column),
            (GameState::Shuffle(round), StepInput::PickCup { cup }) => round.pick(cup),
            (state, input) => Err(WagerError::InvalidSessionState(format!(
                "{} rounds do not accept {:?}",
                state.kind(),
                input
            ))),
        }
    }

    pub fn cashout_multiplier(&self) -> WagerResult<f64> {
        match self {
            GameState::Mines(round) => round.cashout_multiplier(),
            GameState::DragonTower(round) => round.cashout_multiplier(),
            state => Err(WagerError::InvalidSessionState(format!(
                "{} rounds cannot be cashed out",
                state.kind()
            ))),
        }
    }

    pub fn view(&self, disclose: bool) -> GameView {
        match self {
            GameState::Mines(round) => GameView::Mines(round.view(disclose)),
            GameState::DragonTower(round) => GameView::DragonTower(round.view(disclose)),
            GameState::Shuffle(round) => GameView::Shuffle(round.view(disclose)),
            GameState::Plinko(outcome) => GameView::Plinko(outcome.clone()),
            GameState::Roulette(outcome) => GameView::Roulette(outcome.clone()),
            GameState::Spin(outcome) => GameView::Spin(outcome.clone()),
            GameState::Slots(outcome) => GameView::Slots(outcome.clone()),
        }
    }
}

/// Client-facing game state with hidden parts removed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameView {
    Mines(MinesView),
    DragonTower(TowerView),
    Shuffle(ShuffleView),
    Plinko(PlinkoOutcome),
    Roulette(RouletteOutcome),
    Spin(SpinOutcome),
    Slots(SlotsOutcome),
}

/// One round of one game for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WagerSession {
    pub id: SessionId,
    pub user_id: UserId,
    pub game: GameKind,
    pub bet_amount: u64,
    pub status: SessionStatus,
    pub multiplier: f64,
    pub payout: u64,
    /// Bumped on every committed write; used for compare-and-swap
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub state: GameState,
}

impl WagerSession {
    pub fn open(user_id: UserId, bet_amount: u64, state: GameState, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            game: state.kind(),
            bet_amount,
            status: SessionStatus::Active,
            multiplier: state.base_multiplier(),
            payout: 0,
            version: 0,
            created_at: now,
            updated_at: now,
            state,
        }
    }

    /// Reject anyone but the owner, and any session that already settled
    pub fn ensure_active_for(&self, user_id: UserId) -> WagerResult<()> {
        if self.user_id != user_id {
            return Err(WagerError::InvalidSessionState(format!("session {} not found", self.id)));
        }
        if self.status.is_terminal() {
            return Err(WagerError::InvalidSessionState(format!(
                "session {} is already {:?}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    pub fn disclose_secret(&self) -> bool {
        self.status.is_terminal() || self.game.disclosure() == DisclosurePolicy::DisclosedUpFront
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            game: self.game,
            bet_amount: self.bet_amount,
            status: self.status,
            multiplier: self.multiplier,
            payout: self.status.is_terminal().then_some(self.payout),
            created_at: self.created_at,
            updated_at: self.updated_at,
            state: self.state.view(self.disclose_secret()),
        }
    }
}

/// What a player may see of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: SessionId,
    pub game: GameKind,
    pub bet_amount: u64,
    pub status: SessionStatus,
    pub multiplier: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub state: GameView,
}
