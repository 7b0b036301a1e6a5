use std::env;

use anyhow::{Context, Result};
use tracing::warn;

pub const DEFAULT_ANALYSIS_BASE_URL: &str = "http://localhost:8000";

// Used whenever JWT_SECRET is unset. Tokens signed with it are worthless
// as a security boundary.
const FALLBACK_JWT_SECRET: &str = "your-secret-key";

/// Runtime configuration, resolved once at startup and carried in state.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub analysis_base_url: String,
    pub jwt_secret: String,
    pub cookie_secure: bool,
    pub port: u16,
}

impl AppConfig {
    /// Build a configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL env var is missing")?;

        let analysis_base_url = normalize_base_url(
            &env::var("ANALYSIS_BASE_URL").unwrap_or_else(|_| DEFAULT_ANALYSIS_BASE_URL.to_string()),
        );

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                warn!("JWT_SECRET is not set; using the built-in fallback secret");
                FALLBACK_JWT_SECRET.to_string()
            }
        };

        let cookie_secure = env::var("APP_ENV")
            .map(|value| value == "production")
            .unwrap_or(false);

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {raw}"))?,
            Err(_) => 8080,
        };

        Ok(Self {
            database_url,
            analysis_base_url,
            jwt_secret,
            cookie_secure,
            port,
        })
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim_end_matches('/').to_string()
}
