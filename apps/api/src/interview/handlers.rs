//! Axum route handlers for the Interview Generation API.
//!
//! Streaming contract (SSE, one connection per request, strictly ordered):
//! `status` → "processing", `skill_tree` → JSON SkillTree, `question` → one
//! JSON Question per event in derivation order, `done` → "ok". On a stage
//! failure the stream ends with a single terminal `error` event carrying
//! `{"stage": ..., "message": ...}` — never a silent close, never a `done`.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipeline::question_gen::QuestionSet;
use crate::pipeline::skill_extract::SkillTree;
use crate::pipeline::{self, PipelineEvent};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct JdRequest {
    pub jd: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub skill_tree: SkillTree,
    pub questions: QuestionSet,
}

/// POST /api/v1/interview/generate
///
/// Blocking mode: runs the whole pipeline and returns both artifacts at once.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<JdRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    validate_jd(&request.jd)?;

    let result = pipeline::generate(state.model.as_ref(), &request.jd).await?;

    Ok(Json(GenerateResponse {
        skill_tree: result.skill_tree,
        questions: result.questions,
    }))
}

/// POST /api/v1/interview/generate_stream
///
/// Progressive mode: same pipeline, delivered as an SSE event sequence.
/// Validation happens before the stream opens — a blank JD is a plain 400.
pub async fn handle_generate_stream(
    State(state): State<AppState>,
    Json(request): Json<JdRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    validate_jd(&request.jd)?;

    let request_id = Uuid::new_v4();
    info!(%request_id, "starting streamed generation");

    let events = pipeline::generate_stream(state.model.clone(), request.jd)
        .map(|event| Ok(to_sse_event(event)));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn validate_jd(jd: &str) -> Result<(), AppError> {
    if jd.trim().is_empty() {
        return Err(AppError::Validation("jd cannot be empty".to_string()));
    }
    Ok(())
}

fn to_sse_event(event: PipelineEvent) -> Event {
    match event {
        PipelineEvent::Status(status) => Event::default().event("status").data(status),
        PipelineEvent::SkillTree(tree) => Event::default().event("skill_tree").data(
            serde_json::to_string(&tree).expect("SkillTree serializes to JSON"),
        ),
        PipelineEvent::Question(question) => Event::default().event("question").data(
            serde_json::to_string(&question).expect("Question serializes to JSON"),
        ),
        PipelineEvent::Error(err) => Event::default().event("error").data(
            json!({
                "stage": err.stage().to_string(),
                "message": err.to_string(),
            })
            .to_string(),
        ),
        PipelineEvent::Done => Event::default().event("done").data("ok"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jd_request_deserializes() {
        let request: JdRequest =
            serde_json::from_str(r#"{"jd": "Backend engineer, Go, PostgreSQL"}"#).unwrap();
        assert_eq!(request.jd, "Backend engineer, Go, PostgreSQL");
    }

    #[test]
    fn test_blank_jd_fails_validation() {
        assert!(validate_jd("   ").is_err());
        assert!(validate_jd("").is_err());
        assert!(validate_jd("Backend engineer").is_ok());
    }

    #[test]
    fn test_generate_response_nests_structured_data() {
        let response = GenerateResponse {
            skill_tree: serde_json::from_str(r#"{"domains":[{"name":"Go"}]}"#).unwrap(),
            questions: serde_json::from_str(r#"{"questions":[]}"#).unwrap(),
        };
        let value = serde_json::to_value(&response).unwrap();
        // Both halves are objects, not opaque strings.
        assert!(value["skill_tree"]["domains"].is_array());
        assert!(value["questions"]["questions"].is_array());
    }
}
