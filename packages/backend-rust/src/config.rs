use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "llava";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env {key}")]
    Missing { key: &'static str },
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub ocr: OcrConfig,
    pub translate: TranslateConfig,
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub busy_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub expires_in: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrBackend {
    Tesseract,
    Ollama,
}

impl OcrBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tesseract" => Some(Self::Tesseract),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub backend: OcrBackend,
    pub tesseract_bin: String,
    pub language: String,
    pub timeout: Duration,
    pub ollama_url: String,
    pub ollama_model: String,
}

#[derive(Debug, Clone)]
pub struct TranslateConfig {
    pub endpoint: String,
    pub source_lang: String,
    pub target_lang: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub deduplicate: bool,
    pub lookup_concurrency: usize,
    pub max_upload_bytes: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            deduplicate: true,
            lookup_concurrency: 4,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env_parse("PORT")?.unwrap_or(DEFAULT_PORT);

        let host = env_parse("HOST")?.unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = env_string("JWT_SECRET").ok_or(ConfigError::Missing { key: "JWT_SECRET" })?;
        let expires_in = env_string("JWT_EXPIRES_IN").unwrap_or_else(|| "24h".to_string());
        crate::auth::parse_expires_in_ms(&expires_in).map_err(|_| ConfigError::Invalid {
            key: "JWT_EXPIRES_IN",
            value: expires_in.clone(),
        })?;

        let backend = match env_string("OCR_PROVIDER") {
            Some(raw) => OcrBackend::parse(&raw).ok_or(ConfigError::Invalid {
                key: "OCR_PROVIDER",
                value: raw,
            })?,
            None => OcrBackend::Tesseract,
        };

        Ok(Self {
            host,
            port,
            log_level,
            database: DatabaseConfig {
                url: env_string("DATABASE_URL").unwrap_or_else(default_database_url),
                max_connections: env_parse("DB_MAX_CONNECTIONS")?.unwrap_or(5),
                busy_timeout: Duration::from_millis(env_parse("DB_BUSY_TIMEOUT_MS")?.unwrap_or(5000)),
            },
            auth: AuthConfig { jwt_secret, expires_in },
            ocr: OcrConfig {
                backend,
                tesseract_bin: env_string("TESSERACT_BIN").unwrap_or_else(|| "tesseract".to_string()),
                language: env_string("OCR_LANGUAGE").unwrap_or_else(|| "eng".to_string()),
                timeout: Duration::from_millis(env_parse("OCR_TIMEOUT_MS")?.unwrap_or(30_000)),
                ollama_url: env_string("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
                ollama_model: env_string("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            },
            translate: TranslateConfig {
                endpoint: env_string("TRANSLATE_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_TRANSLATE_ENDPOINT.to_string()),
                source_lang: env_string("TRANSLATE_SOURCE_LANG").unwrap_or_else(|| "en".to_string()),
                target_lang: env_string("TRANSLATE_TARGET_LANG").unwrap_or_else(|| "ko".to_string()),
                timeout: Duration::from_millis(env_parse("TRANSLATE_TIMEOUT_MS")?.unwrap_or(5000)),
            },
            extract: ExtractConfig {
                deduplicate: env_bool("EXTRACT_DEDUPLICATE").unwrap_or(true),
                lookup_concurrency: env_parse::<usize>("EXTRACT_LOOKUP_CONCURRENCY")?
                    .unwrap_or(4)
                    .max(1),
                max_upload_bytes: env_parse("MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            },
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("snapvoca")
        .join("snapvoca.db")
}

fn default_database_url() -> String {
    format!("sqlite:{}?mode=rwc", default_database_path().display())
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env_string(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(None),
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    parse_bool(&value)
}

fn parse_bool(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
