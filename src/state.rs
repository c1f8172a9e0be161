use std::sync::Arc;

use tracing::info;

use crate::auth::{jwt::JwtKeys, throttle::Throttle};
use crate::config::AppConfig;
use crate::db;
use crate::todos::{
    repo::{PgTodoStore, TodoStore},
    summarizer::{HttpSummarizer, KeywordSummarizer, Summarizer},
};
use crate::users::repo::{PgUserStore, UserStore};

/// Shared, read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub throttle: Throttle,
    pub users: Arc<dyn UserStore>,
    pub todos: Arc<dyn TodoStore>,
    pub summarizer: Arc<dyn Summarizer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let pool = db::connect(&config).await?;
        db::migrate(&pool).await;

        let summarizer: Arc<dyn Summarizer> = match &config.summarizer_url {
            Some(url) => {
                info!(%url, "using external summarizer");
                Arc::new(HttpSummarizer::new(url.clone())?)
            }
            None => Arc::new(KeywordSummarizer),
        };

        Ok(Self::from_parts(
            config,
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgTodoStore::new(pool)),
            summarizer,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        todos: Arc<dyn TodoStore>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            jwt: JwtKeys::new(&config.jwt),
            throttle: Throttle::new(&config.rate_limit),
            config,
            users,
            todos,
            summarizer,
        }
    }
}
