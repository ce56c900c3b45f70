use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::db::DbPing;
use crate::state::AppState;

const DB_PING_TIMEOUT: Duration = Duration::from_secs(2);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/database", get(database))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
    start_time: String,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    timestamp: String,
}

async fn root(State(state): State<AppState>) -> Response {
    let ping = state.db_proxy().ping(DB_PING_TIMEOUT).await;
    let ok = matches!(ping, DbPing::Connected { .. });

    let response = HealthResponse {
        status: if ok { "ok" } else { "degraded" },
        database: if ok { "connected" } else { "disconnected" },
        timestamp: now_iso(),
    };

    let status_code = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(response)).into_response()
}

async fn live(State(state): State<AppState>) -> Response {
    Json(LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
        start_time: system_time_iso(state.started_at_system()),
        version: env!("CARGO_PKG_VERSION"),
    })
    .into_response()
}

async fn database(State(state): State<AppState>) -> Response {
    let (status_code, status, latency_ms) = match state.db_proxy().ping(DB_PING_TIMEOUT).await {
        DbPing::Connected { latency_ms } => (StatusCode::OK, "connected", Some(latency_ms)),
        DbPing::Timeout => (StatusCode::SERVICE_UNAVAILABLE, "timeout", None),
        DbPing::Disconnected => (StatusCode::SERVICE_UNAVAILABLE, "disconnected", None),
    };

    (
        status_code,
        Json(DatabaseResponse {
            status,
            latency_ms,
            timestamp: now_iso(),
        }),
    )
        .into_response()
}

fn system_time_iso(time: std::time::SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = time.into();
    datetime.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
