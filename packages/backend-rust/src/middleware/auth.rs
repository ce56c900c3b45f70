use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::AuthError;
use crate::response::json_error;
use crate::state::AppState;

/// Verifies the bearer token and stores the [`crate::auth::AuthUser`] in the
/// request extensions for the handlers behind it.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = crate::auth::extract_token(req.headers()) else {
        return json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Not authenticated")
            .into_response();
    };

    let proxy = state.db_proxy();
    match crate::auth::verify_request_token(proxy.as_ref(), state.auth_config(), &token).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(AuthError::UserNotFound) => {
            json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "User not found").into_response()
        }
        Err(AuthError::Database(err)) => {
            tracing::warn!(error = %err, "token verification failed");
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "Database unavailable",
            )
            .into_response()
        }
        Err(_err) => json_error(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Could not validate credentials",
        )
        .into_response(),
    }
}
