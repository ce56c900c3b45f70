use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::TranslateConfig;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("translation request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("translation service returned {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("unexpected translation response: {0}")]
    Malformed(String),
}

/// Outcome of looking up one word. Failures are values, not errors, so a
/// single bad lookup never sinks a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeaningLookup {
    Found(String),
    NotFound,
    Unavailable(String),
}

impl MeaningLookup {
    pub fn into_meaning(self) -> Option<String> {
        match self {
            Self::Found(meaning) => Some(meaning),
            Self::NotFound | Self::Unavailable(_) => None,
        }
    }
}

#[async_trait]
pub trait MeaningResolver: Send + Sync {
    async fn lookup(&self, word: &str) -> MeaningLookup;
}

/// The public `translate_a/single` endpoint.
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
    source_lang: String,
    target_lang: String,
}

impl GoogleTranslator {
    pub fn new(config: &TranslateConfig) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
        })
    }

    pub fn shared(config: &TranslateConfig) -> Result<Arc<dyn MeaningResolver>, TranslateError> {
        Ok(Arc::new(Self::new(config)?))
    }

    async fn translate(&self, word: &str) -> Result<Option<String>, TranslateError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source_lang.as_str()),
                ("tl", self.target_lang.as_str()),
                ("dt", "t"),
                ("q", word),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranslateError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let value: serde_json::Value = response.json().await?;
        parse_translation(&value, word)
    }
}

#[async_trait]
impl MeaningResolver for GoogleTranslator {
    async fn lookup(&self, word: &str) -> MeaningLookup {
        match self.translate(word).await {
            Ok(Some(meaning)) => MeaningLookup::Found(meaning),
            Ok(None) => MeaningLookup::NotFound,
            Err(err) => {
                tracing::warn!(word = %word, error = %err, "translation unavailable");
                MeaningLookup::Unavailable(err.to_string())
            }
        }
    }
}

/// Joins the translated segments of `value[0][*][0]`. A gloss that is empty
/// or merely echoes the source word counts as no meaning.
pub fn parse_translation(
    value: &serde_json::Value,
    source: &str,
) -> Result<Option<String>, TranslateError> {
    let segments = value
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| TranslateError::Malformed("missing sentence list".to_string()))?;

    let meaning: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(|v| v.as_str()))
        .collect();
    let meaning = meaning.trim();

    if meaning.is_empty() || meaning.eq_ignore_ascii_case(source.trim()) {
        return Ok(None);
    }
    Ok(Some(meaning.to_string()))
}
