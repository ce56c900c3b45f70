use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{format_naive_datetime_iso_millis, AuthUser};
use crate::db::operations::word::{self, NewWord, WordRecord, DEFAULT_IMPORTANCE};
use crate::db::operations::wordbook::{self, WordbookRecord};
use crate::response::AppError;
use crate::state::AppState;

const MAX_TITLE_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 255;
const MAX_WORD_CHARS: usize = 100;
const MAX_MEANING_CHARS: usize = 255;
const MAX_NOTE_CHARS: usize = 255;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/wordbooks", get(list_wordbooks).post(create_wordbook))
        .route("/wordbooks/", get(list_wordbooks).post(create_wordbook))
        .route("/wordbooks/full-create", post(full_create))
        .route("/wordbooks/add-words-by-title", post(add_words_by_title))
        .route("/wordbooks/move-words", post(move_words))
        .route(
            "/wordbooks/:id",
            get(get_wordbook).put(update_wordbook).delete(delete_wordbook),
        )
        .route("/wordbooks/:id/words", get(list_words).post(add_words))
        .route("/wordbooks/:id/words/:word_id", put(update_word).delete(delete_word))
        .route_layer(from_fn_with_state(state, crate::middleware::auth::require_auth))
}

#[derive(Debug, Deserialize)]
struct WordbookCreate {
    title: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WordbookFullCreate {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    words: Vec<WordCreate>,
}

#[derive(Debug, Deserialize)]
struct WordCreate {
    word: String,
    meaning: String,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    importance: Option<i64>,
}

/// Absent fields keep their stored value.
#[derive(Debug, Deserialize)]
struct WordbookUpdate {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WordUpdate {
    #[serde(default)]
    word: Option<String>,
    #[serde(default)]
    meaning: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    importance: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct MoveWordsRequest {
    source_wordbook_id: i64,
    destination_wordbook_id: i64,
    word_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
struct MoveWordsResponse {
    message: String,
    moved_count: u64,
}

#[derive(Debug, Deserialize)]
struct TitleQuery {
    title: String,
}

#[derive(Debug, Serialize)]
struct WordbookResponse {
    id: i64,
    title: String,
    description: Option<String>,
    owner_id: String,
    created_at: String,
    word_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    words: Option<Vec<WordResponse>>,
}

impl From<WordbookRecord> for WordbookResponse {
    fn from(record: WordbookRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            owner_id: record.owner_id,
            created_at: format_naive_datetime_iso_millis(record.created_at),
            word_count: record.word_count,
            words: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct WordResponse {
    id: i64,
    word: String,
    meaning: String,
    note: Option<String>,
    importance: i64,
    wordbook_id: i64,
    created_at: String,
}

impl From<WordRecord> for WordResponse {
    fn from(record: WordRecord) -> Self {
        Self {
            id: record.id,
            word: record.word,
            meaning: record.meaning,
            note: record.note,
            importance: record.importance,
            wordbook_id: record.wordbook_id,
            created_at: format_naive_datetime_iso_millis(record.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
struct AddWordsResponse {
    message: String,
    saved_count: usize,
    words: Vec<WordResponse>,
}

async fn create_wordbook(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<WordbookCreate>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let payload = super::json_body(payload)?;
    let (title, description) = validate_wordbook(&payload.title, payload.description.as_deref())?;

    let proxy = state.db_proxy();
    let mut conn = proxy.pool().acquire().await?;
    let record = wordbook::insert_wordbook(
        &mut *conn,
        &user.system_id,
        &title,
        description.as_deref(),
        Utc::now().naive_utc(),
    )
    .await
    .map_err(duplicate_title)?;

    tracing::info!(owner_id = %user.system_id, wordbook_id = record.id, "wordbook created");

    Ok((StatusCode::CREATED, Json(WordbookResponse::from(record))))
}

/// Creates a wordbook together with its words in one transaction.
async fn full_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<WordbookFullCreate>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let payload = super::json_body(payload)?;
    let (title, description) = validate_wordbook(&payload.title, payload.description.as_deref())?;
    let words = validate_words(payload.words)?;

    let now = Utc::now().naive_utc();
    let proxy = state.db_proxy();
    let mut tx = proxy.begin().await?;

    let mut record = wordbook::insert_wordbook(&mut *tx, &user.system_id, &title, description.as_deref(), now)
        .await
        .map_err(duplicate_title)?;
    let inserted = word::insert_words(&mut *tx, record.id, &words, now).await?;
    tx.commit().await?;

    record.word_count = inserted.len() as i64;
    let mut response = WordbookResponse::from(record);
    response.words = Some(inserted.into_iter().map(WordResponse::from).collect());

    Ok((StatusCode::CREATED, Json(response)))
}

async fn add_words_by_title(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    query: Result<Query<TitleQuery>, QueryRejection>,
    payload: Result<Json<Vec<WordCreate>>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let query = super::query_params(query)?;
    let words = validate_words(super::json_body(payload)?)?;

    let proxy = state.db_proxy();
    let mut tx = proxy.begin().await?;
    let record = wordbook::find_by_owner_and_title(&mut *tx, &user.system_id, query.title.trim())
        .await?
        .ok_or_else(|| AppError::not_found("Wordbook not found"))?;
    let inserted = word::insert_words(&mut *tx, record.id, &words, Utc::now().naive_utc()).await?;
    tx.commit().await?;

    Ok(Json(added_response(record.id, inserted)))
}

async fn list_wordbooks(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, AppError> {
    let records = wordbook::list_by_owner(state.db_proxy().as_ref(), &user.system_id).await?;
    let response: Vec<WordbookResponse> = records.into_iter().map(WordbookResponse::from).collect();
    Ok(Json(response))
}

async fn list_words(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let wordbook_id = path_params(id)?;

    let proxy = state.db_proxy();
    let mut conn = proxy.pool().acquire().await?;
    if wordbook::find_owned(&mut *conn, &user.system_id, wordbook_id).await?.is_none() {
        return Err(AppError::not_found("Wordbook not found"));
    }
    let words = word::list_by_wordbook(&mut *conn, wordbook_id).await?;

    let response: Vec<WordResponse> = words.into_iter().map(WordResponse::from).collect();
    Ok(Json(response))
}

async fn add_words(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Vec<WordCreate>>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let wordbook_id = path_params(id)?;
    let words = validate_words(super::json_body(payload)?)?;

    let proxy = state.db_proxy();
    let mut tx = proxy.begin().await?;
    if wordbook::find_owned(&mut *tx, &user.system_id, wordbook_id).await?.is_none() {
        return Err(AppError::not_found("Wordbook not found"));
    }
    let inserted = word::insert_words(&mut *tx, wordbook_id, &words, Utc::now().naive_utc()).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(added_response(wordbook_id, inserted))))
}

async fn get_wordbook(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let wordbook_id = path_params(id)?;

    let proxy = state.db_proxy();
    let mut conn = proxy.pool().acquire().await?;
    let record = wordbook::find_owned(&mut *conn, &user.system_id, wordbook_id)
        .await?
        .ok_or_else(|| AppError::not_found("Wordbook not found"))?;
    let words = word::list_by_wordbook(&mut *conn, wordbook_id).await?;

    let mut response = WordbookResponse::from(record);
    response.words = Some(words.into_iter().map(WordResponse::from).collect());
    Ok(Json(response))
}

async fn update_wordbook(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<WordbookUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let wordbook_id = path_params(id)?;
    let payload = super::json_body(payload)?;

    let proxy = state.db_proxy();
    let mut tx = proxy.begin().await?;
    let existing = wordbook::find_owned(&mut *tx, &user.system_id, wordbook_id)
        .await?
        .ok_or_else(|| AppError::not_found("Wordbook not found"))?;

    let title = payload.title.unwrap_or(existing.title);
    let description = payload.description.or(existing.description);
    let (title, description) = validate_wordbook(&title, description.as_deref())?;

    let record = wordbook::update_wordbook(
        &mut *tx,
        &user.system_id,
        wordbook_id,
        &title,
        description.as_deref(),
    )
    .await
    .map_err(duplicate_title)?
    .ok_or_else(|| AppError::not_found("Wordbook not found"))?;
    tx.commit().await?;

    Ok(Json(WordbookResponse::from(record)))
}

async fn delete_wordbook(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let wordbook_id = path_params(id)?;

    let proxy = state.db_proxy();
    let mut conn = proxy.pool().acquire().await?;
    if !wordbook::delete_wordbook(&mut *conn, &user.system_id, wordbook_id).await? {
        return Err(AppError::not_found("Wordbook not found"));
    }

    tracing::info!(owner_id = %user.system_id, wordbook_id, "wordbook deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn update_word(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
    payload: Result<Json<WordUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let (wordbook_id, word_id) = path_params(ids)?;
    let payload = super::json_body(payload)?;

    let proxy = state.db_proxy();
    let mut tx = proxy.begin().await?;
    if wordbook::find_owned(&mut *tx, &user.system_id, wordbook_id).await?.is_none() {
        return Err(AppError::not_found("Wordbook not found"));
    }
    let existing = word::find_in_wordbook(&mut *tx, wordbook_id, word_id)
        .await?
        .ok_or_else(|| AppError::not_found("Word not found"))?;

    let merged = validate_word(WordCreate {
        word: payload.word.unwrap_or(existing.word),
        meaning: payload.meaning.unwrap_or(existing.meaning),
        note: payload.note.or(existing.note),
        importance: Some(payload.importance.unwrap_or(existing.importance)),
    })
    .map_err(AppError::validation)?;

    let record = word::update_word(&mut *tx, wordbook_id, word_id, &merged)
        .await?
        .ok_or_else(|| AppError::not_found("Word not found"))?;
    tx.commit().await?;

    Ok(Json(WordResponse::from(record)))
}

async fn delete_word(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let (wordbook_id, word_id) = path_params(ids)?;

    let proxy = state.db_proxy();
    let mut conn = proxy.pool().acquire().await?;
    if wordbook::find_owned(&mut *conn, &user.system_id, wordbook_id).await?.is_none() {
        return Err(AppError::not_found("Wordbook not found"));
    }
    if !word::delete_word(&mut *conn, wordbook_id, word_id).await? {
        return Err(AppError::not_found("Word not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Moves words between two wordbooks of the caller in one transaction.
async fn move_words(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<MoveWordsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let payload = super::json_body(payload)?;
    if payload.word_ids.is_empty() {
        return Err(AppError::validation("word_ids must not be empty"));
    }
    if payload.source_wordbook_id == payload.destination_wordbook_id {
        return Err(AppError::validation("source and destination must differ"));
    }

    let proxy = state.db_proxy();
    let mut tx = proxy.begin().await?;
    for (id, label) in [
        (payload.source_wordbook_id, "Source wordbook not found"),
        (payload.destination_wordbook_id, "Destination wordbook not found"),
    ] {
        if wordbook::find_owned(&mut *tx, &user.system_id, id).await?.is_none() {
            return Err(AppError::not_found(label));
        }
    }
    let moved = word::move_words(
        &mut *tx,
        payload.source_wordbook_id,
        payload.destination_wordbook_id,
        &payload.word_ids,
    )
    .await?;
    tx.commit().await?;

    Ok(Json(MoveWordsResponse {
        message: format!(
            "{moved} words moved to wordbook {}",
            payload.destination_wordbook_id
        ),
        moved_count: moved,
    }))
}

fn added_response(wordbook_id: i64, inserted: Vec<WordRecord>) -> AddWordsResponse {
    AddWordsResponse {
        message: format!("{} words added to wordbook {}", inserted.len(), wordbook_id),
        saved_count: inserted.len(),
        words: inserted.into_iter().map(WordResponse::from).collect(),
    }
}

fn path_params<T>(params: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    params
        .map(|Path(value)| value)
        .map_err(|_| AppError::validation("ids in the path must be integers"))
}

fn duplicate_title(err: sqlx::Error) -> AppError {
    if crate::db::is_unique_violation(&err) {
        return AppError::conflict("A wordbook with this title already exists");
    }
    err.into()
}

fn validate_wordbook(
    title: &str,
    description: Option<&str>,
) -> Result<(String, Option<String>), AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation("title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::validation("title must be at most 100 characters"));
    }

    let description = description.map(str::trim).filter(|value| !value.is_empty());
    if description.is_some_and(|value| value.chars().count() > MAX_DESCRIPTION_CHARS) {
        return Err(AppError::validation("description must be at most 255 characters"));
    }

    Ok((title.to_string(), description.map(str::to_string)))
}

fn validate_words(words: Vec<WordCreate>) -> Result<Vec<NewWord>, AppError> {
    words
        .into_iter()
        .enumerate()
        .map(|(index, entry)| validate_word(entry).map_err(|message| {
            AppError::validation(format!("words[{index}]: {message}"))
        }))
        .collect()
}

fn validate_word(entry: WordCreate) -> Result<NewWord, &'static str> {
    let word = entry.word.trim();
    if word.is_empty() || word.chars().count() > MAX_WORD_CHARS {
        return Err("word must be 1 to 100 characters");
    }

    let meaning = entry.meaning.trim();
    if meaning.is_empty() || meaning.chars().count() > MAX_MEANING_CHARS {
        return Err("meaning must be 1 to 255 characters");
    }

    let note = entry.note.unwrap_or_default();
    if note.chars().count() > MAX_NOTE_CHARS {
        return Err("note must be at most 255 characters");
    }

    let importance = entry.importance.unwrap_or(DEFAULT_IMPORTANCE);
    if !(1..=5).contains(&importance) {
        return Err("importance must be between 1 and 5");
    }

    Ok(NewWord {
        word: word.to_string(),
        meaning: meaning.to_string(),
        note: Some(note),
        importance,
    })
}
