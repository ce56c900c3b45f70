//! Image to vocabulary pipeline: OCR, tokenize, filter, translate, persist.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;

use super::ocr::{OcrError, TextRecognizer};
use super::tokenizer::{dedup_preserving_order, tokenize};
use super::translator::MeaningResolver;
use super::upload::{ImageUpload, UploadError};
use super::word_filter::filter_important_words;
use crate::config::ExtractConfig;
use crate::db::operations::word::{insert_words, NewWord, WordRecord};
use crate::db::operations::wordbook::{find_by_owner_and_title, find_owned};
use crate::db::DatabaseProxy;
use crate::response::AppError;

pub const MAX_WORD_CHARS: usize = 100;
pub const MAX_MEANING_CHARS: usize = 255;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("text recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("wordbook not found: {0}")]
    WordbookNotFound(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::Upload(err) => AppError::validation(err.to_string()),
            ExtractionError::Ocr(err) => {
                tracing::warn!(error = %err, "OCR failed");
                AppError::bad_gateway("Text recognition failed")
            }
            ExtractionError::WordbookNotFound(_) => AppError::not_found("Wordbook not found"),
            ExtractionError::Database(err) => err.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordMeaning {
    pub word: String,
    pub meaning: Option<String>,
}

#[derive(Debug)]
pub struct SavedWords {
    pub wordbook_id: i64,
    pub words: Vec<WordRecord>,
}

pub struct ExtractionPipeline {
    recognizer: Arc<dyn TextRecognizer>,
    resolver: Arc<dyn MeaningResolver>,
    config: ExtractConfig,
}

impl ExtractionPipeline {
    pub fn new(
        recognizer: Arc<dyn TextRecognizer>,
        resolver: Arc<dyn MeaningResolver>,
        config: ExtractConfig,
    ) -> Self {
        Self {
            recognizer,
            resolver,
            config,
        }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Filtered words of the image, each with its meaning when one was found.
    pub async fn preview(&self, image: &ImageUpload) -> Result<Vec<WordMeaning>, ExtractionError> {
        let words = self.candidate_words(image).await?;
        Ok(self.resolve(words).await)
    }

    /// Appends the resolved words of the image to the owner's wordbook named
    /// `title`. The wordbook is located before OCR runs and checked again in
    /// the inserting transaction.
    pub async fn save(
        &self,
        proxy: &DatabaseProxy,
        owner_id: &str,
        title: &str,
        image: &ImageUpload,
    ) -> Result<SavedWords, ExtractionError> {
        let wordbook_id = {
            let mut conn = proxy.pool().acquire().await?;
            find_by_owner_and_title(&mut *conn, owner_id, title)
                .await?
                .ok_or_else(|| ExtractionError::WordbookNotFound(title.to_string()))?
                .id
        };

        let new_words: Vec<NewWord> = self
            .preview(image)
            .await?
            .into_iter()
            .filter_map(|entry| {
                let meaning = truncate_chars(&entry.meaning?, MAX_MEANING_CHARS);
                Some(NewWord::extracted(entry.word, meaning))
            })
            .collect();

        let mut tx = proxy.begin().await?;
        if find_owned(&mut *tx, owner_id, wordbook_id).await?.is_none() {
            return Err(ExtractionError::WordbookNotFound(title.to_string()));
        }
        let words = insert_words(&mut *tx, wordbook_id, &new_words, Utc::now().naive_utc()).await?;
        tx.commit().await?;

        tracing::info!(
            owner_id = %owner_id,
            wordbook_id,
            saved = words.len(),
            "extracted words saved"
        );

        Ok(SavedWords { wordbook_id, words })
    }

    async fn candidate_words(&self, image: &ImageUpload) -> Result<Vec<String>, ExtractionError> {
        let text = self.recognizer.recognize(image).await?;
        let tokens = tokenize(&text.lines);
        let mut words = filter_important_words(&tokens);
        words.retain(|word| word.len() <= MAX_WORD_CHARS);

        tracing::debug!(
            backend = self.recognizer.name(),
            lines = text.lines.len(),
            tokens = tokens.len(),
            kept = words.len(),
            "words extracted"
        );

        Ok(if self.config.deduplicate {
            dedup_preserving_order(words)
        } else {
            words
        })
    }

    async fn resolve(&self, words: Vec<String>) -> Vec<WordMeaning> {
        let resolver = &self.resolver;
        stream::iter(words)
            .map(|word| async move {
                let meaning = resolver.lookup(&word).await.into_meaning();
                WordMeaning { word, meaning }
            })
            .buffered(self.config.lookup_concurrency.max(1))
            .collect()
            .await
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ocr::RecognizedText;
    use crate::services::translator::MeaningLookup;
    use async_trait::async_trait;
    use bytes::Bytes;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    struct FixedText(&'static str);

    #[async_trait]
    impl TextRecognizer for FixedText {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn recognize(&self, _image: &ImageUpload) -> Result<RecognizedText, OcrError> {
            Ok(RecognizedText::from_raw(self.0))
        }
    }

    struct Uppercase;

    #[async_trait]
    impl MeaningResolver for Uppercase {
        async fn lookup(&self, word: &str) -> MeaningLookup {
            if word == "jumps" {
                MeaningLookup::Unavailable("offline".to_string())
            } else {
                MeaningLookup::Found(word.to_uppercase())
            }
        }
    }

    fn pipeline(text: &'static str, deduplicate: bool) -> ExtractionPipeline {
        ExtractionPipeline::new(
            Arc::new(FixedText(text)),
            Arc::new(Uppercase),
            ExtractConfig {
                deduplicate,
                ..ExtractConfig::default()
            },
        )
    }

    fn image() -> ImageUpload {
        ImageUpload::new("page.png", Bytes::from_static(PNG_MAGIC)).unwrap()
    }

    #[tokio::test]
    async fn preview_keeps_unresolved_words_without_meaning() {
        let words = pipeline("The quick brown FOX jumps", true)
            .preview(&image())
            .await
            .unwrap();
        assert_eq!(
            words,
            vec![
                WordMeaning { word: "quick".into(), meaning: Some("QUICK".into()) },
                WordMeaning { word: "brown".into(), meaning: Some("BROWN".into()) },
                WordMeaning { word: "jumps".into(), meaning: None },
            ]
        );
    }

    #[tokio::test]
    async fn duplicates_follow_configuration() {
        let text = "cats chase mice\ncats chase birds";

        let deduped: Vec<_> = pipeline(text, true)
            .preview(&image())
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.word)
            .collect();
        assert_eq!(deduped, vec!["cats", "chase", "mice", "birds"]);

        let all = pipeline(text, false).preview(&image()).await.unwrap();
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("사과나무", 2), "사과");
        assert_eq!(truncate_chars("ok", 10), "ok");
    }
}
