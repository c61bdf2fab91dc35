//! HTTP surface tests driven through the full middleware stack

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wager_engine::api::{build_app, AppState};
use wager_engine::games::{CasinoSettings, GameRng, GameState};
use wager_engine::{MemoryConfigStore, MemoryLedger, ServerConfig, SessionStore, WagerEngine};

const ADMIN_TOKEN: &str = "letmein";

struct TestApp {
    router: Router,
    ledger: Arc<MemoryLedger>,
}

fn test_app(admin_token: Option<&str>) -> TestApp {
    let ledger = Arc::new(MemoryLedger::new());
    ledger.open_account(7, 100_000).unwrap();
    let engine = WagerEngine::builder(
        ledger.clone(),
        Arc::new(MemoryConfigStore::new(CasinoSettings::default()).unwrap()),
    )
    .rng(GameRng::from_seed(5))
    .build();
    let metrics = engine.metrics();
    let state = Arc::new(AppState {
        engine: Arc::new(engine),
        metrics,
        admin_token: admin_token.map(str::to_string),
        version: "test".to_string(),
    });
    TestApp {
        router: build_app(&ServerConfig::default(), state),
        ledger,
    }
}

fn request(method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health_reports_running() {
    let app = test_app(None);
    let (status, body) = send(&app.router, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Running");
    assert_eq!(body["version"], "test");
}

#[tokio::test]
async fn mines_round_over_http() {
    let app = test_app(None);
    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/api/game/mines/create",
            Some("7"),
            Some(json!({ "betAmount": 1000, "minesCount": 3 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 99_000);
    assert_eq!(body["session"]["status"], "active");
    assert!(body["session"]["state"]["mines"].is_null());

    let id: uuid::Uuid = serde_json::from_value(body["session"]["id"].clone()).unwrap();
    let tile = match app.ledger.load(id).await.unwrap().unwrap().state {
        GameState::Mines(round) => (0..25u8).find(|t| !round.mine_positions.contains(t)).unwrap(),
        other => panic!("not a mines round: {:?}", other),
    };

    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/api/game/mines/reveal",
            Some("7"),
            Some(json!({ "gameId": id, "tileIndex": tile })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["revealed"], Value::Null);
    assert_eq!(body["session"]["state"]["revealed"], json!([tile]));

    let (status, body) = send(
        &app.router,
        request(Method::POST, "/api/game/mines/cashout", Some("7"), Some(json!({ "gameId": id }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["status"], "cashed_out");
    assert_eq!(body["session"]["state"]["mines"].as_array().map(Vec::len), Some(3));

    // someone else cannot read the session
    let (status, body) = send(
        &app.router,
        request(Method::GET, &format!("/api/game/session/{}", id), Some("8"), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_SESSION_STATE");
}

#[tokio::test]
async fn missing_caller_is_unauthorized() {
    let app = test_app(None);
    let (status, body) = send(
        &app.router,
        request(Method::GET, "/api/wallet/balance", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send(
        &app.router,
        request(Method::GET, "/api/wallet/balance", Some("not-a-number"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_bet_maps_to_bad_request() {
    let app = test_app(None);
    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/api/game/mines/create",
            Some("7"),
            Some(json!({ "betAmount": 10, "minesCount": 3 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_BET");
    assert_eq!(body["error"]["retryable"], false);
    assert!(body["request_id"].is_string());

    let (status, body) = send(
        &app.router,
        request(Method::POST, "/api/game/slots", Some("99"), Some(json!({ "betAmount": 100 }))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "UNKNOWN_USER");
}

#[tokio::test]
async fn admin_routes_need_a_configured_token() {
    let closed = test_app(None);
    let (status, _) = send(
        &closed.router,
        request(Method::GET, "/api/admin/settings", Some("7"), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let open = test_app(Some(ADMIN_TOKEN));
    let missing = request(Method::GET, "/api/admin/settings", None, None);
    let (status, _) = send(&open.router, missing).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/api/admin/settings")
        .header("x-admin-token", "nope")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&open.router, wrong).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let authorized = Request::builder()
        .uri("/api/admin/settings")
        .header("x-admin-token", ADMIN_TOKEN)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&open.router, authorized).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["spin"]["max_spins_per_day"], 3);
}

#[tokio::test]
async fn metrics_count_rounds_and_rejections() {
    let app = test_app(None);
    send(
        &app.router,
        request(Method::POST, "/api/game/slots", Some("7"), Some(json!({ "betAmount": 100 }))),
    )
    .await;
    send(
        &app.router,
        request(Method::POST, "/api/game/slots", Some("7"), Some(json!({ "betAmount": 0 }))),
    )
    .await;

    let response = app
        .router
        .clone()
        .oneshot(request(Method::GET, "/metrics", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();
    assert!(text.contains("wager_rounds_by_game_total{game=\"slots\"} 1"));
    assert!(text.contains("wager_rejections_total{code=\"INVALID_BET\"} 1"));
}

#[tokio::test]
async fn unknown_variants_and_bad_bodies_use_the_error_envelope() {
    let app = test_app(None);
    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/api/game/dragon-tower/create",
            Some("7"),
            Some(json!({ "betAmount": 1000, "difficulty": "insane" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_CONFIGURATION");
    assert!(body["request_id"].is_string());

    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/api/game/plinko",
            Some("7"),
            Some(json!({ "betAmount": 100, "rows": 16, "risk": "extreme" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_CONFIGURATION");

    let (status, body) = send(
        &app.router,
        request(Method::POST, "/api/game/mines/create", Some("7"), Some(json!({ "minesCount": 3 }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["request_id"].is_string());

    // nothing was staked
    let (_, body) = send(&app.router, request(Method::GET, "/api/wallet/balance", Some("7"), None)).await;
    assert_eq!(body["balance"], 100_000);
}

#[tokio::test]
async fn tower_round_cannot_cash_out_through_mines() {
    let app = test_app(None);
    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/api/game/dragon-tower/create",
            Some("7"),
            Some(json!({ "betAmount": 1000, "difficulty": "easy" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["session"]["id"].clone();

    let (status, body) = send(
        &app.router,
        request(Method::POST, "/api/game/mines/cashout", Some("7"), Some(json!({ "gameId": id }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_SESSION_STATE");
    assert!(body["error"]["message"].as_str().unwrap().contains("not a mines round"));
}

#[tokio::test]
async fn lucky_draw_stats_are_admin_only() {
    let closed = test_app(None);
    let (status, _) = send(
        &closed.router,
        request(Method::GET, "/api/admin/lucky-draw/stats", Some("7"), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let app = test_app(Some(ADMIN_TOKEN));
    let (status, _) = send(
        &app.router,
        request(Method::POST, "/api/game/lucky-draw/buy", Some("7"), Some(json!({ "amount": 5000 }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let stats = Request::builder()
        .uri("/api/admin/lucky-draw/stats")
        .header("x-admin-token", ADMIN_TOKEN)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app.router, stats).await;
    assert_eq!(status, StatusCode::OK);
    let pools = body["pools"].as_array().unwrap();
    let pool = pools.iter().find(|pool| pool["price"] == 5000).unwrap();
    assert_eq!(pool["tickets"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["recentWinners"], json!([]));
}
