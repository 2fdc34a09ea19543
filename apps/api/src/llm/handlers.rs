//! Axum route handlers for model configuration administration.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm::settings::ModelConfigRow;
use crate::state::AppState;

const DEFAULT_TEMPERATURE: f32 = 0.4;
const DEFAULT_TIMEOUT_SECS: i32 = 60;

#[derive(Debug, Deserialize)]
pub struct CreateModelRequest {
    pub provider: String,
    pub model_name: String,
    pub api_key: String,
    pub base_url: String,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<i32>,
}

/// A model config as returned to callers — the api_key is never echoed back.
#[derive(Debug, Serialize)]
pub struct ModelSummary {
    pub id: i32,
    pub provider: String,
    pub model_name: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: i32,
    pub created_at: DateTime<Utc>,
}

impl From<ModelConfigRow> for ModelSummary {
    fn from(row: ModelConfigRow) -> Self {
        ModelSummary {
            id: row.id,
            provider: row.provider,
            model_name: row.model_name,
            base_url: row.base_url,
            temperature: row.temperature,
            timeout_secs: row.timeout_secs,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListModelsQuery {
    pub provider: Option<String>,
    pub model_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModelListResponse {
    pub list: Vec<ModelSummary>,
}

/// POST /api/v1/models/create
pub async fn handle_create_model(
    State(state): State<AppState>,
    Json(request): Json<CreateModelRequest>,
) -> Result<Json<ModelSummary>, AppError> {
    for (field, value) in [
        ("provider", &request.provider),
        ("model_name", &request.model_name),
        ("api_key", &request.api_key),
        ("base_url", &request.base_url),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} cannot be empty")));
        }
    }

    let existing: Option<(i32,)> =
        sqlx::query_as("SELECT id FROM model_config WHERE provider = $1 AND model_name = $2")
            .bind(&request.provider)
            .bind(&request.model_name)
            .fetch_optional(&state.db)
            .await?;

    if existing.is_some() {
        return Err(AppError::Duplicate(format!(
            "model config already exists: provider={} model_name={}",
            request.provider, request.model_name
        )));
    }

    let row = sqlx::query_as::<_, ModelConfigRow>(
        r#"
        INSERT INTO model_config
            (provider, model_name, api_key, base_url, temperature, timeout_secs, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, 'api')
        RETURNING *
        "#,
    )
    .bind(&request.provider)
    .bind(&request.model_name)
    .bind(&request.api_key)
    .bind(&request.base_url)
    .bind(request.temperature.unwrap_or(DEFAULT_TEMPERATURE))
    .bind(request.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row.into()))
}

/// GET /api/v1/models/list
pub async fn handle_list_models(
    State(state): State<AppState>,
    Query(query): Query<ListModelsQuery>,
) -> Result<Json<ModelListResponse>, AppError> {
    let rows = sqlx::query_as::<_, ModelConfigRow>(
        r#"
        SELECT * FROM model_config
        WHERE ($1::text IS NULL OR provider = $1)
          AND ($2::text IS NULL OR model_name = $2)
        ORDER BY id DESC
        "#,
    )
    .bind(query.provider.as_deref().map(str::trim).filter(|s| !s.is_empty()))
    .bind(query.model_name.as_deref().map(str::trim).filter(|s| !s.is_empty()))
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ModelListResponse {
        list: rows.into_iter().map(ModelSummary::from).collect(),
    }))
}
