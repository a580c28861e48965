use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::analysis::RecommendationMode;

const DEFAULT_MODEL: &str = "gpt-4.1-mini-2025-04-14";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// 20 MiB. Phone photos routinely exceed axum's 2 MiB default body limit.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Fails at startup if a required variable is missing or a value does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    /// Root directory for uploaded images and their analysis sidecars.
    pub upload_path: PathBuf,
    /// Directory of furniture catalog JSON files, re-read on every upload.
    pub catalog_dir: PathBuf,
    /// Static files (catalog images) served as the router fallback.
    pub public_dir: PathBuf,
    pub recommendation_mode: RecommendationMode,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_model: env_or("OPENAI_MODEL", DEFAULT_MODEL),
            openai_base_url: env_or("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            upload_path: PathBuf::from(env_or("UPLOAD_PATH", "uploads")),
            catalog_dir: PathBuf::from(env_or("CATALOG_DIR", "furniture")),
            public_dir: PathBuf::from(env_or("PUBLIC_DIR", "public")),
            recommendation_mode: env_or("RECOMMENDATION_MODE", "ranked")
                .parse::<RecommendationMode>()
                .context("RECOMMENDATION_MODE must be 'ranked' or 'simple'")?,
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("MAX_UPLOAD_BYTES must be a byte count")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
