//! Generation pipeline — orchestrates JD → SkillTree → QuestionSet.
//!
//! Flow: extract_skill_tree → derive_questions, strictly sequential (stage 2
//! consumes stage 1's output). One invocation is one attempt per stage — no
//! retries here; a caller that wants retry re-invokes `generate`.
//!
//! Run states: Idle → Extracting → (ExtractFailed | Extracted) → Deriving →
//! (DeriveFailed | Completed). Failure states surface as a `PipelineError`
//! tagged with the stage that produced it; the result is never partial.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

pub mod prompts;
pub mod question_gen;
pub mod skill_extract;

use crate::llm::{ChatModel, LlmError};
use question_gen::{Question, QuestionSet};
use skill_extract::SkillTree;

/// Streamed events are handed off through a small bounded channel; the only
/// buffering beyond it is the completed stage output itself.
const EVENT_BUFFER: usize = 16;

/// Which pipeline stage produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extraction,
    Derivation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extraction => write!(f, "extraction"),
            Stage::Derivation => write!(f, "derivation"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} output did not match the expected shape: {detail}")]
    MalformedOutput { stage: Stage, detail: String },

    #[error("{stage} could not reach the model upstream: {detail}")]
    UpstreamUnavailable { stage: Stage, detail: String },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::MalformedOutput { stage, .. } => *stage,
            PipelineError::UpstreamUnavailable { stage, .. } => *stage,
        }
    }

    /// Maps a client-level error into the stage taxonomy: content that failed
    /// schema validation is `MalformedOutput`; everything else (transport,
    /// timeout, API status, missing config) is `UpstreamUnavailable`.
    pub fn from_llm(stage: Stage, err: LlmError) -> Self {
        match err {
            LlmError::Parse(e) => PipelineError::MalformedOutput {
                stage,
                detail: e.to_string(),
            },
            LlmError::EmptyContent => PipelineError::MalformedOutput {
                stage,
                detail: "model returned empty content".to_string(),
            },
            other => PipelineError::UpstreamUnavailable {
                stage,
                detail: other.to_string(),
            },
        }
    }
}

/// Terminal artifact of one pipeline run. Both halves always present.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub skill_tree: SkillTree,
    pub questions: QuestionSet,
}

/// One event of the progressive delivery protocol, in emission order:
/// `Status` ≺ `SkillTree` ≺ `Question`* ≺ `Done`; on failure a single
/// terminal `Error` replaces the remainder of the sequence.
#[derive(Debug)]
pub enum PipelineEvent {
    Status(&'static str),
    SkillTree(SkillTree),
    Question(Question),
    Error(PipelineError),
    Done,
}

/// Blocking mode: runs both stages and returns the assembled result.
pub async fn generate(
    model: &dyn ChatModel,
    jd_text: &str,
) -> Result<GenerationResult, PipelineError> {
    info!(stage = %Stage::Extraction, "pipeline stage starting");
    let skill_tree = skill_extract::extract_skill_tree(model, jd_text).await?;
    info!(
        stage = %Stage::Derivation,
        domains = skill_tree.domains.len(),
        "pipeline stage starting"
    );
    let questions = question_gen::derive_questions(model, &skill_tree).await?;
    info!(questions = questions.questions.len(), "pipeline completed");

    Ok(GenerationResult {
        skill_tree,
        questions,
    })
}

/// Progressive mode: spawns the run and returns its event stream.
///
/// If the consumer drops the stream, the producer notices the closed channel
/// and abandons any in-flight model call (the stage future is dropped, its
/// result discarded — nothing is cached for later requests).
pub fn generate_stream(
    model: Arc<dyn ChatModel>,
    jd_text: String,
) -> ReceiverStream<PipelineEvent> {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    tokio::spawn(run_streamed(model, jd_text, tx));
    ReceiverStream::new(rx)
}

async fn run_streamed(
    model: Arc<dyn ChatModel>,
    jd_text: String,
    tx: mpsc::Sender<PipelineEvent>,
) {
    if tx.send(PipelineEvent::Status("processing")).await.is_err() {
        return;
    }

    let skill_tree = tokio::select! {
        _ = tx.closed() => {
            info!("caller disconnected during extraction; abandoning run");
            return;
        }
        result = skill_extract::extract_skill_tree(model.as_ref(), &jd_text) => {
            match result {
                Ok(tree) => tree,
                Err(e) => {
                    let _ = tx.send(PipelineEvent::Error(e)).await;
                    return;
                }
            }
        }
    };

    if tx
        .send(PipelineEvent::SkillTree(skill_tree.clone()))
        .await
        .is_err()
    {
        return;
    }

    let questions = tokio::select! {
        _ = tx.closed() => {
            info!("caller disconnected during derivation; abandoning run");
            return;
        }
        result = question_gen::derive_questions(model.as_ref(), &skill_tree) => {
            match result {
                Ok(set) => set,
                Err(e) => {
                    let _ = tx.send(PipelineEvent::Error(e)).await;
                    return;
                }
            }
        }
    };

    for question in questions.questions {
        if tx.send(PipelineEvent::Question(question)).await.is_err() {
            return;
        }
    }

    let _ = tx.send(PipelineEvent::Done).await;
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::StreamExt;

    use super::*;

    const TREE_JSON: &str = r#"{"domains":[{"name":"Go","children":[{"name":"Concurrency"}]}]}"#;

    const TWO_QUESTIONS_JSON: &str = r#"{
        "questions": [
            {
                "category": "Go",
                "skill": "Concurrency",
                "strategy": "scenario",
                "level": "senior",
                "question": "q1",
                "tags": []
            },
            {
                "category": "Go",
                "skill": "Concurrency",
                "strategy": "tradeoff",
                "level": "mid",
                "question": "q2",
                "tags": []
            }
        ]
    }"#;

    /// Scripted chat model: returns queued responses in order and counts calls.
    struct StubModel {
        responses: Mutex<VecDeque<Result<String, LlmError>>>,
        calls: AtomicUsize,
    }

    impl StubModel {
        fn new(responses: Vec<Result<String, LlmError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatModel for StubModel {
        async fn invoke(
            &self,
            _system: &str,
            _user: &str,
            _temperature: f32,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("stub model called more times than scripted")
        }
    }

    fn unavailable() -> LlmError {
        LlmError::Api {
            status: 503,
            message: "service unavailable".to_string(),
        }
    }

    #[tokio::test]
    async fn test_generate_returns_complete_result() {
        let model = StubModel::new(vec![
            Ok(TREE_JSON.to_string()),
            Ok(TWO_QUESTIONS_JSON.to_string()),
        ]);

        let result = generate(&model, "Backend engineer, Go, PostgreSQL")
            .await
            .unwrap();

        assert!(!result.skill_tree.is_empty());
        assert_eq!(result.skill_tree.domains[0].name, "Go");
        assert_eq!(result.questions.questions.len(), 2);
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_derivation() {
        let model = StubModel::new(vec![Err(unavailable())]);

        let err = generate(&model, "Backend engineer").await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::UpstreamUnavailable {
                stage: Stage::Extraction,
                ..
            }
        ));
        // Derivation must never have been invoked.
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_derivation_parse_failure_is_tagged_malformed() {
        let model = StubModel::new(vec![
            Ok(TREE_JSON.to_string()),
            Ok("sorry, I cannot help with that".to_string()),
        ]);

        let err = generate(&model, "Backend engineer").await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::MalformedOutput {
                stage: Stage::Derivation,
                ..
            }
        ));
        assert_eq!(err.stage(), Stage::Derivation);
    }

    #[tokio::test]
    async fn test_empty_extraction_is_malformed_output() {
        let model = StubModel::new(vec![Ok(r#"{"domains":[]}"#.to_string())]);

        let err = generate(&model, "Backend engineer").await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::MalformedOutput {
                stage: Stage::Extraction,
                ..
            }
        ));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_accepts_zero_questions() {
        let model = StubModel::new(vec![
            Ok(TREE_JSON.to_string()),
            Ok(r#"{"questions":[]}"#.to_string()),
        ]);

        let result = generate(&model, "Backend engineer").await.unwrap();
        assert!(result.questions.questions.is_empty());
    }

    #[tokio::test]
    async fn test_stream_emits_golden_event_sequence() {
        let model: Arc<dyn ChatModel> = Arc::new(StubModel::new(vec![
            Ok(TREE_JSON.to_string()),
            Ok(TWO_QUESTIONS_JSON.to_string()),
        ]));

        let events: Vec<PipelineEvent> =
            generate_stream(model, "Backend engineer, Go, PostgreSQL".to_string())
                .collect()
                .await;

        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], PipelineEvent::Status("processing")));
        match &events[1] {
            PipelineEvent::SkillTree(tree) => {
                assert_eq!(serde_json::to_string(tree).unwrap(), TREE_JSON);
            }
            other => panic!("expected skill_tree, got {other:?}"),
        }
        match (&events[2], &events[3]) {
            (PipelineEvent::Question(q1), PipelineEvent::Question(q2)) => {
                assert_eq!(q1.question, "q1");
                assert_eq!(q2.question, "q2");
            }
            other => panic!("expected two questions, got {other:?}"),
        }
        assert!(matches!(events[4], PipelineEvent::Done));
    }

    #[tokio::test]
    async fn test_stream_extraction_failure_ends_with_error_event() {
        let model: Arc<dyn ChatModel> = Arc::new(StubModel::new(vec![Err(unavailable())]));

        let events: Vec<PipelineEvent> =
            generate_stream(model, "Backend engineer".to_string()).collect().await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], PipelineEvent::Status("processing")));
        match &events[1] {
            PipelineEvent::Error(e) => assert_eq!(e.stage(), Stage::Extraction),
            other => panic!("expected terminal error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stream_derivation_failure_comes_after_skill_tree() {
        let model: Arc<dyn ChatModel> = Arc::new(StubModel::new(vec![
            Ok(TREE_JSON.to_string()),
            Ok("not json".to_string()),
        ]));

        let events: Vec<PipelineEvent> =
            generate_stream(model, "Backend engineer".to_string()).collect().await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[1], PipelineEvent::SkillTree(_)));
        match &events[2] {
            PipelineEvent::Error(e) => assert_eq!(e.stage(), Stage::Derivation),
            other => panic!("expected terminal error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stream_with_zero_questions_still_ends_done() {
        let model: Arc<dyn ChatModel> = Arc::new(StubModel::new(vec![
            Ok(TREE_JSON.to_string()),
            Ok(r#"{"questions":[]}"#.to_string()),
        ]));

        let events: Vec<PipelineEvent> =
            generate_stream(model, "Backend engineer".to_string()).collect().await;

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], PipelineEvent::Status(_)));
        assert!(matches!(events[1], PipelineEvent::SkillTree(_)));
        assert!(matches!(events[2], PipelineEvent::Done));
    }

    #[test]
    fn test_stage_display_names() {
        assert_eq!(Stage::Extraction.to_string(), "extraction");
        assert_eq!(Stage::Derivation.to_string(), "derivation");
    }

    #[test]
    fn test_error_message_carries_stage_tag() {
        let err = PipelineError::UpstreamUnavailable {
            stage: Stage::Extraction,
            detail: "timeout".to_string(),
        };
        assert!(err.to_string().starts_with("extraction"));
    }
}
