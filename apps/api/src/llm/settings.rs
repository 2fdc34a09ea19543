#![allow(dead_code)]

//! Model configuration — persisted provider settings with a TTL cache.
//!
//! The newest `model_config` row is the active configuration. It changes
//! rarely, so reads go through a 60-second cache: the read path clones the
//! cached value; the reader that finds it expired refetches and stores the
//! fresh copy under a brief write lock. Concurrent refreshers are benign —
//! both store equally fresh data.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;
use tracing::debug;

use crate::llm::LlmError;

/// How long a fetched configuration stays valid before a re-read.
pub const MODEL_CONFIG_TTL: Duration = Duration::from_secs(60);

/// A `model_config` row as persisted.
#[derive(Debug, Clone, FromRow)]
pub struct ModelConfigRow {
    pub id: i32,
    pub provider: String,
    pub model_name: String,
    pub api_key: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: i32,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The resolved settings handed to the chat client.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub provider: String,
    pub model_name: String,
    pub api_key: String,
    pub base_url: String,
    pub default_temperature: f32,
    pub timeout: Duration,
}

impl From<ModelConfigRow> for ModelSettings {
    fn from(row: ModelConfigRow) -> Self {
        ModelSettings {
            provider: row.provider,
            model_name: row.model_name,
            api_key: row.api_key,
            base_url: row.base_url,
            default_temperature: row.temperature,
            timeout: Duration::from_secs(row.timeout_secs.max(1) as u64),
        }
    }
}

struct CachedSettings {
    settings: ModelSettings,
    fetched_at: Instant,
}

/// TTL-cached reader over the newest `model_config` row.
pub struct ModelConfigProvider {
    pool: PgPool,
    ttl: Duration,
    cached: RwLock<Option<CachedSettings>>,
}

impl ModelConfigProvider {
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        Self {
            pool,
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// Returns the active model settings, refetching if the cache expired.
    pub async fn get(&self) -> Result<ModelSettings, LlmError> {
        {
            let guard = self.cached.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    return Ok(cached.settings.clone());
                }
            }
        }

        // Expired or never fetched — this caller refreshes. The fetch runs
        // without any lock held so other readers keep serving the old value.
        let settings = self.fetch_latest().await?;
        debug!(
            "model config refreshed: provider={} model={}",
            settings.provider, settings.model_name
        );

        *self.cached.write().await = Some(CachedSettings {
            settings: settings.clone(),
            fetched_at: Instant::now(),
        });

        Ok(settings)
    }

    async fn fetch_latest(&self) -> Result<ModelSettings, LlmError> {
        let row = sqlx::query_as::<_, ModelConfigRow>(
            "SELECT * FROM model_config ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LlmError::Config(format!("failed to load model config: {e}")))?
        .ok_or_else(|| LlmError::Config("no model config registered".to_string()))?;

        Ok(row.into())
    }
}
