//! Text recognition backends.
//!
//! A recognizer turns one in-memory image into ordered lines of text. Backends
//! are built once from [`OcrConfig`] and shared through the application state.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use thiserror::Error;
use tokio::process::Command;

use super::upload::ImageUpload;
use crate::config::{OcrBackend, OcrConfig};

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("OCR engine could not be started: {0}")]
    Spawn(String),
    #[error("OCR engine exited with {status}: {stderr}")]
    EngineFailed { status: String, stderr: String },
    #[error("OCR timed out after {0:?}")]
    Timeout(Duration),
    #[error("OCR request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("OCR service returned {status}: {body}")]
    HttpStatus { status: u16, body: String },
}

/// Ordered lines of recognized text; blank lines are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizedText {
    pub lines: Vec<String>,
}

impl RecognizedText {
    pub fn from_raw(raw: &str) -> Self {
        Self {
            lines: raw
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[async_trait]
pub trait TextRecognizer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn recognize(&self, image: &ImageUpload) -> Result<RecognizedText, OcrError>;
}

pub fn build_recognizer(config: &OcrConfig) -> Result<Arc<dyn TextRecognizer>, OcrError> {
    let recognizer: Arc<dyn TextRecognizer> = match config.backend {
        OcrBackend::Tesseract => Arc::new(TesseractRecognizer::new(
            &config.tesseract_bin,
            &config.language,
            config.timeout,
        )),
        OcrBackend::Ollama => Arc::new(OllamaRecognizer::new(
            &config.ollama_url,
            &config.ollama_model,
            config.timeout,
        )?),
    };
    tracing::info!(backend = recognizer.name(), "OCR backend configured");
    Ok(recognizer)
}

/// Runs the `tesseract` command line tool.
pub struct TesseractRecognizer {
    binary: String,
    language: String,
    timeout: Duration,
}

impl TesseractRecognizer {
    pub fn new(binary: &str, language: &str, timeout: Duration) -> Self {
        Self {
            binary: binary.to_string(),
            language: language.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    async fn recognize(&self, image: &ImageUpload) -> Result<RecognizedText, OcrError> {
        // Removed when dropped, on every return path.
        let staged = tempfile::Builder::new()
            .prefix("snapvoca-ocr-")
            .suffix(&format!(".{}", image.kind().extension()))
            .tempfile()?;
        tokio::fs::write(staged.path(), image.bytes()).await?;

        let child = Command::new(&self.binary)
            .arg(staged.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| OcrError::Spawn(format!("{}: {err}", self.binary)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| OcrError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(OcrError::EngineFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = RecognizedText::from_raw(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(lines = text.lines.len(), file = image.file_name(), "tesseract finished");
        Ok(text)
    }
}

/// Asks an Ollama vision model to transcribe the image.
pub struct OllamaRecognizer {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaRecognizer {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl TextRecognizer for OllamaRecognizer {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn recognize(&self, image: &ImageUpload) -> Result<RecognizedText, OcrError> {
        let url = format!("{}/api/generate", self.base_url);
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(image.bytes());

        let request = serde_json::json!({
            "model": self.model,
            "prompt": "Extract all text from this image exactly as written, one line per line of text. Return only the extracted text.",
            "images": [image_base64],
            "stream": false,
        });

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let value: serde_json::Value = response.json().await?;
        let raw = value
            .get("response")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        Ok(RecognizedText::from_raw(raw))
    }
}
