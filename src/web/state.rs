use anyhow::{Context, Result};
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::config::AppConfig;
use crate::upstream::AnalysisClient;

#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    analysis: AnalysisClient,
    config: AppConfig,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("failed to connect to Postgres")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        let analysis = AnalysisClient::new(&config.analysis_base_url);

        Ok(Self {
            pool,
            analysis,
            config,
        })
    }

    pub fn pool_ref(&self) -> &PgPool {
        &self.pool
    }

    pub fn analysis(&self) -> &AnalysisClient {
        &self.analysis
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }

    pub fn cookie_secure(&self) -> bool {
        self.config.cookie_secure
    }
}
