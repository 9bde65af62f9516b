use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::{AppConfig, SessionConfig};
use crate::users::{memory::InMemoryUserRepository, repo::PgUserRepository, repo::UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env().context("load config")?);

        let users = match &config.database_url {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                tracing::info!("using postgres user store");
                Arc::new(PgUserRepository::new(db)) as Arc<dyn UserRepository>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; accounts live in memory only");
                Arc::new(InMemoryUserRepository::new()) as Arc<dyn UserRepository>
            }
        };

        Ok(Self { users, config })
    }

    pub fn from_parts(users: Arc<dyn UserRepository>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    /// In-memory store and fixed session settings, for tests.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            session: SessionConfig {
                secret: "test-secret".into(),
                cookie_name: "session".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60,
                remember_ttl_days: 365,
                secure_cookies: false,
            },
        });
        Self::from_parts(Arc::new(InMemoryUserRepository::new()), config)
    }
}
