//! Route Definitions

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        // Multi-step games
        .route("/api/game/mines/create", post(create_mines_handler))
        .route("/api/game/mines/reveal", post(reveal_tile_handler))
        .route("/api/game/mines/cashout", post(mines_cashout_handler))
        .route("/api/game/dragon-tower/create", post(create_tower_handler))
        .route("/api/game/dragon-tower/reveal", post(climb_handler))
        .route("/api/game/dragon-tower/cashout", post(tower_cashout_handler))
        .route("/api/game/dragon-tower/config", get(tower_config_handler))
        .route("/api/game/shuffle", post(shuffle_start_handler).put(shuffle_reveal_handler))
        .route("/api/game/session/:id", get(session_handler))
        // Single-shot games
        .route("/api/game/plinko", post(plinko_handler))
        .route("/api/game/roulette", post(roulette_handler))
        .route("/api/game/spin", post(spin_handler))
        .route("/api/game/spin/status", get(spin_status_handler))
        .route("/api/game/slots", post(slots_handler))
        .route("/api/game/lucky-draw/buy", post(buy_ticket_handler))
        .route("/api/game/lucky-draw/tickets", get(tickets_handler))
        // Wallet
        .route("/api/wallet/balance", get(balance_handler))
        .route("/api/wallet/transactions", get(transactions_handler))
        // Admin
        .route("/api/admin/lucky-draw/draw", post(draw_handler))
        .route("/api/admin/lucky-draw/stats", get(lucky_draw_stats_handler))
        .route("/api/admin/settings", get(get_settings_handler).put(update_settings_handler))
        .with_state(state)
}
