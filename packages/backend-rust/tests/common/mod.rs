#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use snapvoca_backend::config::{AuthConfig, DatabaseConfig, ExtractConfig};
use snapvoca_backend::db::DatabaseProxy;
use snapvoca_backend::services::extraction::ExtractionPipeline;
use snapvoca_backend::services::ocr::{OcrError, RecognizedText, TextRecognizer};
use snapvoca_backend::services::translator::{MeaningLookup, MeaningResolver};
use snapvoca_backend::services::upload::ImageUpload;
use snapvoca_backend::state::AppState;

pub const PNG_BYTES: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D', b'R',
];

pub const TEST_PASSWORD: &str = "correct horse battery";

/// Returns the same text for every image, or fails like a crashed engine.
pub struct StubRecognizer {
    text: Option<String>,
}

impl StubRecognizer {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { text: None }
    }
}

#[async_trait]
impl TextRecognizer for StubRecognizer {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn recognize(&self, _image: &ImageUpload) -> Result<RecognizedText, OcrError> {
        match &self.text {
            Some(text) => Ok(RecognizedText::from_raw(text)),
            None => Err(OcrError::EngineFailed {
                status: "exit status: 1".to_string(),
                stderr: "cannot read image".to_string(),
            }),
        }
    }
}

/// Dictionary lookups; unknown words have no meaning.
pub struct StubResolver {
    meanings: HashMap<String, String>,
}

impl StubResolver {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            meanings: entries
                .iter()
                .map(|(word, meaning)| (word.to_string(), meaning.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl MeaningResolver for StubResolver {
    async fn lookup(&self, word: &str) -> MeaningLookup {
        match self.meanings.get(word) {
            Some(meaning) => MeaningLookup::Found(meaning.clone()),
            None => MeaningLookup::NotFound,
        }
    }
}

pub fn fox_dictionary() -> StubResolver {
    StubResolver::new(&[("quick", "빠른"), ("brown", "갈색의")])
}

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseProxy,
}

pub async fn create_test_app(recognizer: StubRecognizer, resolver: StubResolver) -> TestApp {
    let db = DatabaseProxy::connect(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        busy_timeout: Duration::from_secs(5),
    })
    .await
    .expect("in-memory database");

    let pipeline = ExtractionPipeline::new(
        Arc::new(recognizer),
        Arc::new(resolver),
        ExtractConfig::default(),
    );
    let auth = AuthConfig {
        jwt_secret: "integration-test-secret".to_string(),
        expires_in: "1h".to_string(),
    };
    let state = AppState::new(db.clone(), auth, pipeline);

    TestApp {
        router: snapvoca_backend::create_app(state),
        db,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("request");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn signup(&self, user_id: &str) -> (StatusCode, Value) {
        self.send(json_request(
            "POST",
            "/api/auth/signup",
            None,
            serde_json::json!({
                "user_id": user_id,
                "nickname": format!("{user_id} nick"),
                "password": TEST_PASSWORD,
                "password_confirm": TEST_PASSWORD,
            }),
        ))
        .await
    }

    /// Signs up `user_id` and returns a bearer token for it.
    pub async fn login_new_user(&self, user_id: &str) -> String {
        let (status, _) = self.signup(user_id).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self
            .send(json_request(
                "POST",
                "/api/auth/login",
                None,
                serde_json::json!({ "user_id": user_id, "password": TEST_PASSWORD }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["access_token"].as_str().expect("token").to_string()
    }

    pub async fn create_wordbook(&self, token: &str, title: &str) -> (StatusCode, Value) {
        self.send(json_request(
            "POST",
            "/api/wordbooks/",
            Some(token),
            serde_json::json!({ "title": title, "description": "from tests" }),
        ))
        .await
    }

    /// Creates a wordbook holding `words` (with placeholder meanings) and
    /// returns the response body.
    pub async fn create_wordbook_with_words(&self, token: &str, title: &str, words: &[&str]) -> Value {
        let words: Vec<Value> = words
            .iter()
            .map(|word| serde_json::json!({ "word": word, "meaning": format!("{word} 뜻") }))
            .collect();
        let (status, body) = self
            .send(json_request(
                "POST",
                "/api/wordbooks/full-create",
                Some(token),
                serde_json::json!({ "title": title, "words": words }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    pub async fn word_count(&self) -> i64 {
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM "words""#)
            .fetch_one(self.db.pool())
            .await
            .expect("count words")
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    empty_request("GET", uri, token)
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

const BOUNDARY: &str = "snapvoca-test-boundary";

#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
        self
    }

    pub fn into_request(mut self, uri: &str, token: Option<&str>) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(self.body)).expect("request")
    }
}

pub fn png_upload() -> MultipartBody {
    MultipartBody::new().file("page.png", "image/png", PNG_BYTES)
}
