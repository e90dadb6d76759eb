// HTTP API routes (ranking, player registration, match submission).

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::LadderError;
use crate::ladder::{Ladder, LadderRules};
use crate::metrics;
use crate::store::LadderStore;

// ── Request types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterPlayerRequest {
    pub name: String,
    pub age: i64,
    pub email: String,
}

#[derive(Deserialize)]
pub struct RecordMatchRequest {
    pub player1: String,
    pub player2: String,
    pub winner: String,
    pub sets: String,
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct EligibleOpponentsRequest {
    pub player: String,
}

#[derive(Deserialize)]
pub struct ListMatchesParams {
    pub group_by: Option<String>,
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LadderStore>,
    pub rules: LadderRules,
    /// Serializes every load-mutate-save cycle. Readers skip it.
    pub write_lock: Arc<tokio::sync::Mutex<()>>,
}

// ── Error helpers ─────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> impl IntoResponse {
    (status, Json(json!({ "error": msg })))
}

fn internal_error(e: LadderError) -> impl IntoResponse {
    tracing::error!("Ladder state error: {e}");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Rebuild the ladder aggregate from the store.
async fn load_ladder(state: &AppState) -> Result<Ladder, LadderError> {
    let (players, matches) = state.store.load().await?;
    Ladder::from_parts(state.rules, players, matches)
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(store: Arc<dyn LadderStore>, rules: LadderRules) -> Router {
    let state = AppState {
        store,
        rules,
        write_lock: Arc::new(tokio::sync::Mutex::new(())),
    };

    Router::new()
        // Ranking
        .route("/api/ranking", get(get_ranking))
        // Players
        .route("/api/players", post(register_player))
        .route("/api/players/eligible", post(eligible_opponents))
        .route("/api/players/{name}", get(get_player))
        // Matches
        .route("/api/matches", get(list_matches).post(record_match))
        .with_state(state)
}

// ── Ranking handler ───────────────────────────────────────────────────

async fn get_ranking(State(state): State<AppState>) -> impl IntoResponse {
    match load_ladder(&state).await {
        Ok(ladder) => (StatusCode::OK, Json(json!(ladder.get_ranking()))).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

// ── Player handlers ──────────────────────────────────────────────────

async fn get_player(State(state): State<AppState>, Path(name): Path<String>) -> impl IntoResponse {
    let ladder = match load_ladder(&state).await {
        Ok(l) => l,
        Err(e) => return internal_error(e).into_response(),
    };
    match ladder.get_player(&name) {
        Some(player) => (StatusCode::OK, Json(json!(player))).into_response(),
        None => json_error(StatusCode::NOT_FOUND, "Player not found").into_response(),
    }
}

async fn register_player(
    State(state): State<AppState>,
    Json(req): Json<RegisterPlayerRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "name is required").into_response();
    }
    if req.email.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "email is required").into_response();
    }

    let _guard = state.write_lock.lock().await;

    let mut ladder = match load_ladder(&state).await {
        Ok(l) => l,
        Err(e) => return internal_error(e).into_response(),
    };

    let player = match ladder.register_player(&req.name, req.age, &req.email) {
        Ok(p) => p,
        // register_player only fails on a duplicate name or email
        Err(e) => return json_error(StatusCode::CONFLICT, &e.to_string()).into_response(),
    };

    if let Err(e) = state.store.save(ladder.players(), ladder.matches()).await {
        return internal_error(e).into_response();
    }

    metrics::PLAYERS_REGISTERED_TOTAL.inc();
    metrics::LADDER_PLAYERS.set(ladder.players().len() as i64);
    tracing::info!("Registered player {} at rank {}", player.name, player.rank);

    (StatusCode::CREATED, Json(json!(player))).into_response()
}

async fn eligible_opponents(
    State(state): State<AppState>,
    Json(req): Json<EligibleOpponentsRequest>,
) -> impl IntoResponse {
    let ladder = match load_ladder(&state).await {
        Ok(l) => l,
        Err(e) => return internal_error(e).into_response(),
    };
    match ladder.eligible_opponents(&req.player, state.rules.min_rank_difference) {
        Ok(opponents) => {
            let names: Vec<&str> = opponents.iter().map(|p| p.name.as_str()).collect();
            (StatusCode::OK, Json(json!({ "players": names }))).into_response()
        }
        Err(LadderError::PlayerNotFound(_)) => {
            json_error(StatusCode::BAD_REQUEST, "Player not found").into_response()
        }
        Err(e) => internal_error(e).into_response(),
    }
}

// ── Match handlers ───────────────────────────────────────────────────

async fn list_matches(
    State(state): State<AppState>,
    Query(params): Query<ListMatchesParams>,
) -> impl IntoResponse {
    let ladder = match load_ladder(&state).await {
        Ok(l) => l,
        Err(e) => return internal_error(e).into_response(),
    };
    match params.group_by.as_deref() {
        None => (
            StatusCode::OK,
            Json(json!({ "matches": ladder.recent_matches() })),
        )
            .into_response(),
        Some("month") => {
            let groups: Vec<serde_json::Value> = ladder
                .matches_by_month()
                .iter()
                .map(|(month, matches)| json!({ "month": month, "matches": matches }))
                .collect();
            (StatusCode::OK, Json(json!({ "groups": groups }))).into_response()
        }
        Some(other) => json_error(
            StatusCode::BAD_REQUEST,
            &format!("Unsupported group_by value: {other}"),
        )
        .into_response(),
    }
}

async fn record_match(
    State(state): State<AppState>,
    Json(req): Json<RecordMatchRequest>,
) -> impl IntoResponse {
    let _guard = state.write_lock.lock().await;

    let mut ladder = match load_ladder(&state).await {
        Ok(l) => l,
        Err(e) => return internal_error(e).into_response(),
    };

    // The challenge window is enforced here at the boundary; the core
    // accepts any distance once a match reaches it.
    if let Err(e) = ladder.check_challenge(&req.player1, &req.player2) {
        metrics::MATCH_REJECTIONS_TOTAL
            .with_label_values(&[e.reason()])
            .inc();
        tracing::warn!("Rejected match {} vs {}: {e}", req.player1, req.player2);
        return json_error(StatusCode::BAD_REQUEST, &e.to_string()).into_response();
    }

    let time = chrono::Utc::now().naive_utc();
    let (record, outcome) = match ladder.record_match(
        &req.player1,
        &req.player2,
        &req.winner,
        &req.sets,
        time,
        req.comment.as_deref(),
    ) {
        Ok(r) => r,
        Err(e) => {
            metrics::MATCH_REJECTIONS_TOTAL
                .with_label_values(&[e.reason()])
                .inc();
            tracing::warn!("Rejected match {} vs {}: {e}", req.player1, req.player2);
            return json_error(StatusCode::BAD_REQUEST, &e.to_string()).into_response();
        }
    };

    if let Err(e) = state.store.save(ladder.players(), ladder.matches()).await {
        return internal_error(e).into_response();
    }

    metrics::MATCHES_RECORDED_TOTAL
        .with_label_values(&[outcome.label()])
        .inc();
    tracing::info!(
        "Recorded match {} vs {}, winner {} ({})",
        record.player1,
        record.player2,
        record.winner,
        outcome.label()
    );

    (
        StatusCode::CREATED,
        Json(json!({ "match": record, "outcome": outcome })),
    )
        .into_response()
}
