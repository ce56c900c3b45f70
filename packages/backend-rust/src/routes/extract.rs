use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::QueryRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Extension, Json, Router};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::wordbooks::WordResponse;
use crate::auth::AuthUser;
use crate::response::AppError;
use crate::services::extraction::WordMeaning;
use crate::services::upload::{ImageUpload, UploadError};
use crate::state::AppState;

// Room for the multipart framing around the image itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router<AppState> {
    let body_limit = state.pipeline().config().max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    let protected = Router::new()
        .route("/save-to-wordbook", post(save_to_wordbook))
        .route_layer(from_fn_with_state(state, crate::middleware::auth::require_auth));

    Router::new()
        .route("/preview", post(preview))
        .route("/filtered-preview", post(preview))
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit))
}

#[derive(Debug, Serialize)]
struct PreviewResponse {
    filtered_words: Vec<WordMeaning>,
}

#[derive(Debug, Default, Deserialize)]
struct SaveQuery {
    title: Option<String>,
}

#[derive(Debug, Serialize)]
struct SaveResponse {
    wordbook_id: i64,
    saved_count: usize,
    words: Vec<WordResponse>,
}

#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(String, Bytes)>,
    title: Option<String>,
}

impl UploadForm {
    fn into_image(self) -> Result<(ImageUpload, Option<String>), AppError> {
        let (file_name, bytes) = self
            .file
            .ok_or_else(|| AppError::validation(UploadError::Missing.to_string()))?;
        let image = ImageUpload::new(file_name, bytes).map_err(|err| AppError::validation(err.to_string()))?;
        Ok((image, self.title))
    }
}

async fn preview(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let form = read_upload_form(multipart, state.pipeline().config().max_upload_bytes).await?;
    let (image, _) = form.into_image()?;

    let filtered_words = state.pipeline().preview(&image).await?;

    Ok(Json(PreviewResponse { filtered_words }))
}

async fn save_to_wordbook(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<SaveQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let query = super::query_params(query)?;
    let form = read_upload_form(multipart, state.pipeline().config().max_upload_bytes).await?;
    let (image, form_title) = form.into_image()?;

    let title = form_title
        .or(query.title)
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .ok_or_else(|| AppError::validation("title is required"))?;

    let proxy = state.db_proxy();
    let saved = state
        .pipeline()
        .save(proxy.as_ref(), &user.system_id, &title, &image)
        .await?;

    Ok(Json(SaveResponse {
        wordbook_id: saved.wordbook_id,
        saved_count: saved.words.len(),
        words: saved.words.into_iter().map(WordResponse::from).collect(),
    }))
}

async fn read_upload_form(
    multipart: Result<Multipart, MultipartRejection>,
    max_upload_bytes: usize,
) -> Result<UploadForm, AppError> {
    let mut multipart =
        multipart.map_err(|rejection| AppError::validation(rejection.body_text()))?;
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if bytes.len() > max_upload_bytes {
                    return Err(AppError::payload_too_large("Uploaded image is too large"));
                }
                form.file = Some((file_name, bytes));
            }
            "title" => {
                form.title = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    Ok(form)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::payload_too_large("Uploaded image is too large");
    }
    tracing::warn!(error = %err, "failed to read multipart field");
    AppError::validation(err.body_text())
}
