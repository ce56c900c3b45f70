mod auth;
mod extract;
mod health;
mod wordbooks;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::response::{json_error, AppError};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", auth::router(state.clone()))
        .nest("/extract", extract::router(state.clone()))
        .merge(wordbooks::router(state.clone()));

    Router::new()
        .nest("/api", api)
        .nest("/health", health::router())
        .fallback(fallback_handler)
        .with_state(state)
}

/// Unwraps a JSON body, reporting malformed input as a validation error.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Not found").into_response()
}
