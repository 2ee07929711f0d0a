use crate::state::{persist, AppState};
use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{
        sse::{Event, Sse},
        Json,
    },
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use siege_core::{Command, Difficulty, EventEnvelope, Transition};
use std::convert::Infallible;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[cfg(test)]
pub fn make_router(state: AppState) -> Router {
    make_router_with_cors(state, HeaderValue::from_static("http://localhost:5173"))
}

pub fn make_router_with_cors(state: AppState, cors_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/meta", get(meta_handler))
        .route("/api/v1/snapshot", get(snapshot_handler))
        .route("/api/v1/notifications", get(notifications_handler))
        .route("/api/v1/preview", get(preview_handler))
        .route("/api/v1/metrics", get(metrics_handler))
        .route("/api/v1/stream", get(stream_handler))
        .route("/api/v1/command", post(command_handler))
        .route("/api/v1/advance", post(advance_handler))
        .route("/api/v1/new", post(new_game_handler))
        .route("/api/v1/save", post(save_handler))
        .route("/api/v1/pause", post(pause_handler))
        .route("/api/v1/resume", post(resume_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn meta_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    let sim = app_state.sim.lock();
    let state = &sim.game_state;
    Json(serde_json::json!({
        "cycle": state.cycle,
        "difficulty": state.difficulty,
        "schema_version": state.meta.schema_version,
        "content_version": state.meta.content_version,
        "game_over": state.game_over,
        "victory": state.victory,
        "cycles_per_sec": app_state.cycles_per_sec,
        "paused": app_state.paused.load(Ordering::Relaxed),
    }))
}

pub async fn snapshot_handler(
    State(app_state): State<AppState>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let sim = app_state.sim.lock();
    match serde_json::to_string(&sim.game_state) {
        Ok(json) => {
            drop(sim);
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                json,
            )
        }
        Err(err) => {
            tracing::error!("snapshot serialization failed: {err}");
            drop(sim);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/json")],
                r#"{"error":"serialization failed"}"#.to_string(),
            )
        }
    }
}

/// Notifications raised by the cycle that just resolved.
pub async fn notifications_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    let sim = app_state.sim.lock();
    let recent = siege_core::recent_notifications(&sim.game_state);
    Json(serde_json::json!({ "notifications": recent }))
}

/// What the next cycle would yield with the current roles, techs and stance.
pub async fn preview_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    let sim = app_state.sim.lock();
    let state = &sim.game_state;
    let constants = &sim.content.constants;
    Json(serde_json::json!({
        "production": siege_core::calculate_production(state, constants),
        "defense_power": siege_core::defense_power(state, constants),
        "research_eta": siege_core::research_eta(state, constants),
        "defeat_cause": siege_core::defeat_cause(state),
    }))
}

pub async fn metrics_handler(
    State(app_state): State<AppState>,
) -> Json<siege_core::MetricsSnapshot> {
    let sim = app_state.sim.lock();
    Json(siege_core::compute_metrics(
        &sim.game_state,
        &sim.content.constants,
    ))
}

/// Broadcast events and answer with them plus the resulting cycle. Engine
/// no-ops come back as `200` with an empty event list.
fn respond(app_state: &AppState, cycle: u64, events: Vec<EventEnvelope>) -> Json<serde_json::Value> {
    let body = serde_json::json!({ "cycle": cycle, "events": &events });
    if !events.is_empty() {
        let _ = app_state.event_tx.send(events);
    }
    Json(body)
}

pub async fn command_handler(
    State(app_state): State<AppState>,
    Json(command): Json<Command>,
) -> Json<serde_json::Value> {
    let (cycle, events, pending) = {
        let mut sim = app_state.sim.lock();
        let transition = siege_core::apply_command(&sim.game_state, &command, &sim.content);
        let events = sim.commit(transition);
        (sim.game_state.cycle, events, sim.pending_save())
    };
    persist(pending).await;
    tracing::debug!(?command, events = events.len(), "command applied");
    respond(&app_state, cycle, events)
}

pub async fn advance_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    let (cycle, events, pending) = {
        let mut sim = app_state.sim.lock();
        let transition: Transition = siege_core::advance_cycle(&sim.game_state, &sim.content);
        let events = sim.commit(transition);
        (sim.game_state.cycle, events, sim.pending_save())
    };
    persist(pending).await;
    respond(&app_state, cycle, events)
}

#[derive(Debug, Deserialize)]
pub struct NewGameRequest {
    pub difficulty: Difficulty,
}

/// Replace the live game with a fresh one; the save slot is overwritten.
pub async fn new_game_handler(
    State(app_state): State<AppState>,
    Json(request): Json<NewGameRequest>,
) -> Json<serde_json::Value> {
    let (body, pending) = {
        let mut sim = app_state.sim.lock();
        let fresh = siege_world::build_initial_state(&sim.content, request.difficulty);
        sim.replace(fresh);
        let body = serde_json::json!({
            "cycle": sim.game_state.cycle,
            "difficulty": sim.game_state.difficulty,
        });
        (body, sim.pending_save())
    };
    persist(pending).await;
    Json(body)
}

pub async fn save_handler(
    State(app_state): State<AppState>,
) -> (StatusCode, Json<serde_json::Value>) {
    let (body, pending) = {
        let sim = app_state.sim.lock();
        let Some(store) = &sim.store else {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({"error": "no save directory (started without --save-dir?)"})),
            );
        };
        let body = serde_json::json!({
            "path": store.path().display().to_string(),
            "cycle": sim.game_state.cycle,
        });
        (body, sim.pending_save())
    };
    persist(pending).await;
    (StatusCode::OK, Json(body))
}

pub async fn pause_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    app_state.paused.store(true, Ordering::Relaxed);
    Json(serde_json::json!({"paused": true}))
}

pub async fn resume_handler(State(app_state): State<AppState>) -> Json<serde_json::Value> {
    app_state.paused.store(false, Ordering::Relaxed);
    Json(serde_json::json!({"paused": false}))
}

pub async fn stream_handler(
    State(app_state): State<AppState>,
) -> Sse<impl futures_core::Stream<Item = Result<Event, Infallible>>> {
    let mut rx = app_state.event_tx.subscribe();
    let sim = app_state.sim.clone();

    let stream = async_stream::stream! {
        let mut heartbeat = tokio::time::interval(Duration::from_secs(5));
        heartbeat.tick().await; // discard the immediate first tick
        loop {
            tokio::select! {
                result = rx.recv() => {
                    match result {
                        Ok(events) => {
                            let data = serde_json::to_string(&events).unwrap_or_default();
                            yield Ok(Event::default().data(data));
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "stream subscriber lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = heartbeat.tick() => {
                    let cycle = sim.lock().game_state.cycle;
                    let hb = serde_json::json!({"heartbeat": true, "cycle": cycle});
                    yield Ok(Event::default().data(hb.to_string()));
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}
