pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview;
use crate::llm;
use crate::skills;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview generation pipeline
        .route(
            "/api/v1/interview/generate",
            post(interview::handlers::handle_generate),
        )
        .route(
            "/api/v1/interview/generate_stream",
            post(interview::handlers::handle_generate_stream),
        )
        // Skill tree persistence + render
        .route("/api/v1/skills/tree", get(skills::handlers::handle_get_tree))
        .route(
            "/api/v1/skills/create",
            post(skills::handlers::handle_create_skill),
        )
        // Model configuration admin
        .route(
            "/api/v1/models/create",
            post(llm::handlers::handle_create_model),
        )
        .route("/api/v1/models/list", get(llm::handlers::handle_list_models))
        .with_state(state)
}
