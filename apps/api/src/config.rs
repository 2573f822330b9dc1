use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::engine::validation::ValidationConfig;
use crate::llm_client::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub anthropic_api_url: String,
    pub render_service_url: String,
    pub port: u16,
    pub rust_log: String,
    pub llm_timeout_secs: u64,
    /// Opaque logo asset handed to the renderer, if any.
    pub logo_path: Option<PathBuf>,
    pub max_upload_bytes: usize,
    /// Sessions untouched for this long are evicted.
    pub session_ttl_secs: u64,
    pub validation: ValidationConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = ValidationConfig::default();
        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            anthropic_api_url: std::env::var("ANTHROPIC_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            render_service_url: require_env("RENDER_SERVICE_URL")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            logo_path: std::env::var("LOGO_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            session_ttl_secs: parse_env("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?,
            validation: ValidationConfig {
                min_bullet_chars: parse_env("MIN_BULLET_CHARS", defaults.min_bullet_chars)?,
                duplicate_min_matches: parse_env(
                    "DUPLICATE_MIN_MATCHES",
                    defaults.duplicate_min_matches,
                )?,
                ..defaults
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'"))
}
