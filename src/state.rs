use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::{
    repo::{MemoryUserStore, PgUserStore, UserStore},
    services::AuthService,
};
use crate::config::{AppConfig, SessionConfig};

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Connects to Postgres and wires the auth service to it.
    pub async fn init() -> anyhow::Result<(Self, PgPool)> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let store = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
        Ok((Self::from_parts(store, config), db))
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self {
            auth: AuthService::new(store),
            config,
        }
    }

    /// In-memory state, no database required.
    pub fn fake() -> Self {
        let store = Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>;
        Self::from_parts(store, Arc::new(AppConfig::for_tests()))
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for SessionConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.session.clone()
    }
}
