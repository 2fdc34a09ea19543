use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::llm::ChatModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// The chat-model seam. Production: `OpenAiChatModel`; tests swap in stubs.
    pub model: Arc<dyn ChatModel>,
    pub config: Config,
}
