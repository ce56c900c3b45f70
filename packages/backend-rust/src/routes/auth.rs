use axum::body::Body;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Request};
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::{format_naive_datetime_iso_millis, AuthUser};
use crate::db::operations::user;
use crate::response::AppError;
use crate::state::AppState;

const MAX_USER_ID_CHARS: usize = 30;
const MAX_NICKNAME_CHARS: usize = 30;
const MAX_LOGIN_BODY_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(me))
        .route_layer(from_fn_with_state(state, crate::middleware::auth::require_auth));

    Router::new()
        .route("/signup", post(signup))
        .route("/check-userid", get(check_user_id))
        .route("/login", post(login))
        .merge(protected)
}

#[derive(Debug, Deserialize)]
struct SignupRequest {
    user_id: String,
    nickname: String,
    password: String,
    password_confirm: String,
}

#[derive(Debug, Serialize)]
struct UserResponse {
    system_id: String,
    user_id: String,
    nickname: String,
    created_at: String,
}

impl From<user::UserRecord> for UserResponse {
    fn from(record: user::UserRecord) -> Self {
        Self {
            system_id: record.system_id,
            user_id: record.user_id,
            nickname: record.nickname,
            created_at: format_naive_datetime_iso_millis(record.created_at),
        }
    }
}

impl From<AuthUser> for UserResponse {
    fn from(user: AuthUser) -> Self {
        Self {
            system_id: user.system_id,
            user_id: user.user_id,
            nickname: user.nickname,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CheckUserIdQuery {
    user_id: String,
}

#[derive(Debug, Serialize)]
struct CheckUserIdResponse {
    available: bool,
    message: &'static str,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    user_id: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: &'static str,
}

async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let payload = super::json_body(payload)?;
    let user_id = payload.user_id.trim();
    let nickname = payload.nickname.trim();

    if user_id.is_empty() || user_id.chars().count() > MAX_USER_ID_CHARS {
        return Err(AppError::validation("user_id must be 1 to 30 characters"));
    }
    if nickname.is_empty() || nickname.chars().count() > MAX_NICKNAME_CHARS {
        return Err(AppError::validation("nickname must be 1 to 30 characters"));
    }
    if payload.password.is_empty() {
        return Err(AppError::validation("password must not be empty"));
    }
    if payload.password != payload.password_confirm {
        return Err(AppError::validation("Passwords do not match"));
    }

    let proxy = state.db_proxy();
    if user::user_id_exists(proxy.as_ref(), user_id).await? {
        return Err(AppError::conflict("User already exists"));
    }

    let hashed = crate::auth::hash_password(&payload.password).map_err(|err| {
        tracing::error!(error = %err, "password hashing failed");
        AppError::internal("password hashing failed")
    })?;

    let record = match user::create_user(proxy.as_ref(), user_id, &hashed, nickname).await {
        Ok(record) => record,
        Err(err) if crate::db::is_unique_violation(&err) => {
            return Err(AppError::conflict("User already exists"));
        }
        Err(err) => return Err(err.into()),
    };

    Ok(Json(UserResponse::from(record)))
}

async fn check_user_id(
    State(state): State<AppState>,
    query: Result<Query<CheckUserIdQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let query = super::query_params(query)?;
    let exists = user::user_id_exists(state.db_proxy().as_ref(), query.user_id.trim()).await?;
    let response = if exists {
        CheckUserIdResponse {
            available: false,
            message: "This user_id is already taken",
        }
    } else {
        CheckUserIdResponse {
            available: true,
            message: "This user_id is available",
        }
    };
    Ok(Json(response))
}

/// Accepts a JSON body or an OAuth2 password form (`username`, `password`).
async fn login(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Result<impl IntoResponse, AppError> {
    let (parts, body) = req.into_parts();
    let body = axum::body::to_bytes(body, MAX_LOGIN_BODY_BYTES)
        .await
        .map_err(|_| AppError::bad_request("Invalid request body"))?;

    let credentials = if is_form(&parts.headers) {
        parse_login_form(&body)
    } else {
        serde_json::from_slice::<LoginRequest>(&body).ok()
    }
    .ok_or_else(|| AppError::validation("user_id and password are required"))?;

    let proxy = state.db_proxy();
    let record = user::find_by_user_id(proxy.as_ref(), credentials.user_id.trim())
        .await?
        .filter(|record| crate::auth::verify_password(&credentials.password, &record.hashed_password))
        .ok_or_else(|| AppError::unauthorized("Incorrect user_id or password"))?;

    let (access_token, _expires_at) = crate::auth::sign_jwt_for_user(state.auth_config(), &record.system_id)
        .map_err(|err| {
            tracing::error!(error = %err, "token signing failed");
            AppError::internal("token signing failed")
        })?;

    tracing::info!(system_id = %record.system_id, "user logged in");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

async fn me(Extension(user): Extension<AuthUser>) -> impl IntoResponse {
    Json(UserResponse::from(user))
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

fn parse_login_form(body: &[u8]) -> Option<LoginRequest> {
    let body = std::str::from_utf8(body).ok()?;
    let mut user_id = None;
    let mut password = None;

    for pair in body.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = urlencoding::decode(&value.replace('+', " ")).ok()?.into_owned();
        match key {
            "username" | "user_id" => user_id = Some(value),
            "password" => password = Some(value),
            _ => {}
        }
    }

    Some(LoginRequest {
        user_id: user_id?,
        password: password?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_oauth2_password_form() {
        let form = parse_login_form(b"grant_type=password&username=alice%40home&password=p+w%26d").unwrap();
        assert_eq!(form.user_id, "alice@home");
        assert_eq!(form.password, "p w&d");
    }

    #[test]
    fn form_without_password_is_rejected() {
        assert!(parse_login_form(b"username=alice").is_none());
    }
}
