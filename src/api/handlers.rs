//! Request Handlers
//!
//! Thin adapters from HTTP to [`WagerEngine`] operations. All game logic and
//! every balance change happen inside the engine.

use super::{
    errors::ApiError,
    middleware::{AdminAccess, ApiJson, Caller, RequestId},
    models::*,
};
use crate::engine::{
    CashoutOutcome, DrawResult, LuckyDrawStats, PlayOutcome, RoundParams, RoundStarted, SingleShotBet, StartRound,
    StepOutcome, TicketReceipt, TowerLevel, WagerEngine,
};
use crate::games::lucky_draw::Ticket;
use crate::games::spin::SpinStatus;
use crate::games::{CasinoSettings, GameKind, SessionId, SessionView, StepInput};
use crate::ledger::LedgerTransaction;
use crate::metrics::WagerMetrics;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub engine: Arc<WagerEngine>,
    pub metrics: Arc<WagerMetrics>,
    pub admin_token: Option<String>,
    pub version: String,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn reply<T>(request_id: &RequestId, result: crate::errors::WagerResult<T>) -> ApiResult<T> {
    result.map(Json).map_err(|e| ApiError::wager(request_id.0.clone(), e))
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
    })
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.to_prometheus_format(),
    )
}

/// POST /api/game/mines/create
pub async fn create_mines_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    ApiJson(request): ApiJson<CreateMinesRequest>,
) -> ApiResult<RoundStarted> {
    let start = StartRound {
        bet_amount: request.bet_amount,
        params: RoundParams::Mines { mines: request.mines_count },
    };
    reply(&request_id, state.engine.start_round(user_id, start).await)
}

/// POST /api/game/mines/reveal
pub async fn reveal_tile_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    ApiJson(request): ApiJson<RevealTileRequest>,
) -> ApiResult<StepOutcome> {
    let input = StepInput::Reveal { tile: request.tile_index };
    reply(&request_id, state.engine.step(request.game_id, user_id, input).await)
}

/// POST /api/game/mines/cashout
pub async fn mines_cashout_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    ApiJson(request): ApiJson<CashoutRequest>,
) -> ApiResult<CashoutOutcome> {
    let outcome = state.engine.cashout_game(GameKind::Mines, request.game_id, user_id).await;
    reply(&request_id, outcome)
}

/// POST /api/game/dragon-tower/cashout
pub async fn tower_cashout_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    ApiJson(request): ApiJson<CashoutRequest>,
) -> ApiResult<CashoutOutcome> {
    let outcome = state
        .engine
        .cashout_game(GameKind::DragonTower, request.game_id, user_id)
        .await;
    reply(&request_id, outcome)
}

/// POST /api/game/dragon-tower/create
pub async fn create_tower_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    ApiJson(request): ApiJson<CreateTowerRequest>,
) -> ApiResult<RoundStarted> {
    let difficulty = request
        .difficulty()
        .map_err(|e| ApiError::wager(request_id.0.clone(), e))?;
    let start = StartRound {
        bet_amount: request.bet_amount,
        params: RoundParams::DragonTower { difficulty },
    };
    reply(&request_id, state.engine.start_round(user_id, start).await)
}

/// POST /api/game/dragon-tower/reveal
pub async fn climb_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    ApiJson(request): ApiJson<ClimbRequest>,
) -> ApiResult<StepOutcome> {
    let input = StepInput::Climb { column: request.column };
    reply(&request_id, state.engine.step(request.game_id, user_id, input).await)
}

/// GET /api/game/dragon-tower/config
pub async fn tower_config_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<TowerLevel>> {
    reply(&request_id, state.engine.tower_config().await)
}

/// POST /api/game/shuffle
pub async fn shuffle_start_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    ApiJson(request): ApiJson<ShuffleStartRequest>,
) -> ApiResult<RoundStarted> {
    let start = StartRound {
        bet_amount: request.bet_amount,
        params: RoundParams::Shuffle,
    };
    reply(&request_id, state.engine.start_round(user_id, start).await)
}

/// PUT /api/game/shuffle
pub async fn shuffle_reveal_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    ApiJson(request): ApiJson<ShuffleRevealRequest>,
) -> ApiResult<StepOutcome> {
    let input = StepInput::PickCup { cup: request.selected_cup };
    reply(&request_id, state.engine.step(request.game_id, user_id, input).await)
}

/// POST /api/game/plinko
pub async fn plinko_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    ApiJson(request): ApiJson<PlinkoRequest>,
) -> ApiResult<PlayOutcome> {
    let risk = request.risk().map_err(|e| ApiError::wager(request_id.0.clone(), e))?;
    let bet = SingleShotBet::Plinko {
        bet_amount: request.bet_amount,
        rows: request.rows,
        risk,
    };
    reply(&request_id, state.engine.play(user_id, bet).await)
}

/// POST /api/game/roulette
pub async fn roulette_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    ApiJson(request): ApiJson<RouletteRequest>,
) -> ApiResult<PlayOutcome> {
    let bet = SingleShotBet::Roulette { bets: request.bets };
    reply(&request_id, state.engine.play(user_id, bet).await)
}

/// POST /api/game/spin
pub async fn spin_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    ApiJson(request): ApiJson<BetRequest>,
) -> ApiResult<PlayOutcome> {
    let bet = SingleShotBet::Spin { bet_amount: request.bet_amount };
    reply(&request_id, state.engine.play(user_id, bet).await)
}

/// GET /api/game/spin/status
pub async fn spin_status_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
) -> ApiResult<SpinStatus> {
    reply(&request_id, state.engine.spin_status(user_id).await)
}

/// POST /api/game/slots
pub async fn slots_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    ApiJson(request): ApiJson<BetRequest>,
) -> ApiResult<PlayOutcome> {
    let bet = SingleShotBet::Slots { bet_amount: request.bet_amount };
    reply(&request_id, state.engine.play(user_id, bet).await)
}

/// POST /api/game/lucky-draw/buy
pub async fn buy_ticket_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    ApiJson(request): ApiJson<TicketPurchaseRequest>,
) -> ApiResult<TicketReceipt> {
    reply(&request_id, state.engine.purchase_ticket(user_id, request.amount).await)
}

/// GET /api/game/lucky-draw/tickets
pub async fn tickets_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
) -> ApiResult<Vec<Ticket>> {
    reply(&request_id, state.engine.tickets(user_id).await)
}

/// GET /api/game/session/:id
pub async fn session_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    Path(session_id): Path<SessionId>,
) -> ApiResult<SessionView> {
    reply(&request_id, state.engine.session(session_id, user_id).await)
}

/// GET /api/wallet/balance
pub async fn balance_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
) -> ApiResult<BalanceResponse> {
    let balance = state.engine.balance(user_id).await;
    reply(&request_id, balance.map(|balance| BalanceResponse { user_id, balance }))
}

/// GET /api/wallet/transactions
pub async fn transactions_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
) -> ApiResult<Vec<LedgerTransaction>> {
    reply(&request_id, state.engine.transactions(user_id).await)
}

/// POST /api/admin/lucky-draw/draw
pub async fn draw_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    ApiJson(request): ApiJson<DrawRequest>,
) -> ApiResult<DrawResult> {
    reply(&request_id, state.engine.draw_lucky_pool(request.price).await)
}

/// GET /api/admin/lucky-draw/stats
pub async fn lucky_draw_stats_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
) -> ApiResult<LuckyDrawStats> {
    reply(&request_id, state.engine.lucky_draw_stats().await)
}

/// GET /api/admin/settings
pub async fn get_settings_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
) -> ApiResult<CasinoSettings> {
    reply(&request_id, state.engine.settings().await)
}

/// PUT /api/admin/settings
pub async fn update_settings_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    _admin: AdminAccess,
    ApiJson(settings): ApiJson<CasinoSettings>,
) -> ApiResult<CasinoSettings> {
    state
        .engine
        .update_settings(settings)
        .await
        .map_err(|e| ApiError::wager(request_id.0.clone(), e))?;
    reply(&request_id, state.engine.settings().await)
}
