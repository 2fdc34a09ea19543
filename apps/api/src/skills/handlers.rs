//! Axum route handlers for the Skills API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::skill::SkillNodeRow;
use crate::skills::normalize::{build_render_tree, RenderNode};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSkillRequest {
    pub parent_id: Option<i32>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub level: i32,
    #[serde(default = "default_sort_order")]
    pub sort_order: i32,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_sort_order() -> i32 {
    1
}

/// GET /api/v1/skills/tree
///
/// Reads all persisted skill nodes ordered by level then sort key, and
/// returns the normalized render forest.
pub async fn handle_get_tree(
    State(state): State<AppState>,
) -> Result<Json<Vec<RenderNode>>, AppError> {
    let rows = sqlx::query_as::<_, SkillNodeRow>(
        "SELECT * FROM skill_node ORDER BY level, sort_order",
    )
    .fetch_all(&state.db)
    .await?;

    let forest = build_render_tree(&rows)?;
    Ok(Json(forest))
}

/// POST /api/v1/skills/create
///
/// Creates one skill node by hand. Duplicate (parent_id, name, level) is
/// rejected; pipeline-written rows use the same table with
/// `auto_generated = true`.
pub async fn handle_create_skill(
    State(state): State<AppState>,
    Json(request): Json<CreateSkillRequest>,
) -> Result<Json<SkillNodeRow>, AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if !(1..=4).contains(&request.level) {
        return Err(AppError::Validation(
            "level must be between 1 (domain) and 4 (knowledge point)".to_string(),
        ));
    }

    let existing: Option<(i32,)> = sqlx::query_as(
        "SELECT id FROM skill_node \
         WHERE parent_id IS NOT DISTINCT FROM $1 AND name = $2 AND level = $3",
    )
    .bind(request.parent_id)
    .bind(&request.name)
    .bind(request.level)
    .fetch_optional(&state.db)
    .await?;

    if existing.is_some() {
        return Err(AppError::Duplicate(format!(
            "skill node '{}' already exists at level {} under this parent",
            request.name, request.level
        )));
    }

    let row = sqlx::query_as::<_, SkillNodeRow>(
        r#"
        INSERT INTO skill_node
            (parent_id, name, description, level, sort_order, tags, auto_generated, created_by, updated_by)
        VALUES ($1, $2, $3, $4, $5, $6, false, 'api', '')
        RETURNING *
        "#,
    )
    .bind(request.parent_id)
    .bind(&request.name)
    .bind(&request.description)
    .bind(request.level)
    .bind(request.sort_order)
    .bind(&request.tags)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row))
}
