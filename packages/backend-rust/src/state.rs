use std::sync::Arc;
use std::time::{Instant, SystemTime};

use thiserror::Error;

use crate::config::{AuthConfig, Config};
use crate::db::DatabaseProxy;
use crate::services::extraction::ExtractionPipeline;
use crate::services::ocr::{build_recognizer, OcrError};
use crate::services::translator::{GoogleTranslator, TranslateError};

#[derive(Debug, Error)]
pub enum StateInitError {
    #[error("OCR backend: {0}")]
    Ocr(#[from] OcrError),
    #[error("translator: {0}")]
    Translate(#[from] TranslateError),
}

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    db_proxy: Arc<DatabaseProxy>,
    auth: Arc<AuthConfig>,
    pipeline: Arc<ExtractionPipeline>,
}

impl AppState {
    pub fn new(db_proxy: DatabaseProxy, auth: AuthConfig, pipeline: ExtractionPipeline) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            db_proxy: Arc::new(db_proxy),
            auth: Arc::new(auth),
            pipeline: Arc::new(pipeline),
        }
    }

    /// Builds the OCR and translation handles once for the whole process.
    pub fn from_config(config: &Config, db_proxy: DatabaseProxy) -> Result<Self, StateInitError> {
        let recognizer = build_recognizer(&config.ocr)?;
        let resolver = GoogleTranslator::shared(&config.translate)?;
        let pipeline = ExtractionPipeline::new(recognizer, resolver, config.extract.clone());
        Ok(Self::new(db_proxy, config.auth.clone(), pipeline))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn db_proxy(&self) -> Arc<DatabaseProxy> {
        Arc::clone(&self.db_proxy)
    }

    pub fn auth_config(&self) -> &AuthConfig {
        &self.auth
    }

    pub fn pipeline(&self) -> Arc<ExtractionPipeline> {
        Arc::clone(&self.pipeline)
    }
}
