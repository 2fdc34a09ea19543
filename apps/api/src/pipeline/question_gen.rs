//! Question derivation — turns a `SkillTree` into a `QuestionSet`.
//!
//! Runs at a higher temperature (0.7) than extraction: question phrasing
//! should vary between runs. The canonical (un-normalized) tree is serialized
//! into the prompt; the reply is schema-validated into `QuestionSet`. A parse
//! failure is a `MalformedOutput` — it is never collapsed into an empty set,
//! so callers can always tell "zero questions" from "derivation failed".

use serde::{Deserialize, Serialize};

use crate::llm::{strip_json_fences, ChatModel};
use crate::pipeline::prompts::{QUESTION_PROMPT_TEMPLATE, QUESTION_SYSTEM};
use crate::pipeline::skill_extract::SkillTree;
use crate::pipeline::{PipelineError, Stage};

const DERIVE_TEMPERATURE: f32 = 0.7;

/// One derived interview question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub category: String,
    pub skill: String,
    pub strategy: String,
    pub level: String,
    pub question: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The ordered question collection for one pipeline run.
/// Wire shape: `{"questions":[...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub questions: Vec<Question>,
}

/// Derives interview questions from a skill tree via the chat model.
pub async fn derive_questions(
    model: &dyn ChatModel,
    skill_tree: &SkillTree,
) -> Result<QuestionSet, PipelineError> {
    let tree_json =
        serde_json::to_string_pretty(skill_tree).map_err(|e| PipelineError::MalformedOutput {
            stage: Stage::Derivation,
            detail: format!("failed to serialize skill tree: {e}"),
        })?;

    let prompt = QUESTION_PROMPT_TEMPLATE.replace("{skill_tree}", &tree_json);

    let raw = model
        .invoke(QUESTION_SYSTEM, &prompt, DERIVE_TEMPERATURE)
        .await
        .map_err(|e| PipelineError::from_llm(Stage::Derivation, e))?;

    let text = strip_json_fences(&raw);

    serde_json::from_str(text).map_err(|e| PipelineError::MalformedOutput {
        stage: Stage::Derivation,
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_set_deserializes() {
        let json = r#"{
            "questions": [
                {
                    "category": "Go",
                    "skill": "Concurrency",
                    "strategy": "scenario",
                    "level": "senior",
                    "question": "Your worker pool deadlocks under load. How do you diagnose it?",
                    "tags": ["goroutines"]
                }
            ]
        }"#;
        let set: QuestionSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.questions.len(), 1);
        assert_eq!(set.questions[0].category, "Go");
        assert_eq!(set.questions[0].strategy, "scenario");
    }

    #[test]
    fn test_question_tags_default_to_empty() {
        let json = r#"{
            "category": "Go",
            "skill": "Concurrency",
            "strategy": "tradeoff",
            "level": "mid",
            "question": "Channels or mutexes for a shared counter, and why?"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert!(q.tags.is_empty());
    }

    #[test]
    fn test_empty_question_set_is_valid_not_an_error() {
        let set: QuestionSet = serde_json::from_str(r#"{"questions":[]}"#).unwrap();
        assert!(set.questions.is_empty());
    }

    #[test]
    fn test_question_missing_required_field_fails() {
        // No "question" field — must fail deserialization, not default.
        let json = r#"{
            "category": "Go",
            "skill": "Concurrency",
            "strategy": "scenario",
            "level": "senior"
        }"#;
        assert!(serde_json::from_str::<Question>(json).is_err());
    }

    #[test]
    fn test_question_prompt_template_embeds_tree() {
        let prompt = QUESTION_PROMPT_TEMPLATE.replace("{skill_tree}", r#"{"domains":[]}"#);
        assert!(prompt.contains(r#"{"domains":[]}"#));
        assert!(!prompt.contains("{skill_tree}"));
    }
}
