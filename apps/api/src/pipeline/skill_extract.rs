//! Skill extraction — turns a raw job description into a `SkillTree`.
//!
//! Runs at low temperature (0.3): extraction favors precision over variety.
//! Output is schema-validated immediately; anything that does not parse into
//! `SkillTree` is a `MalformedOutput`, never an untyped value passed on.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm::{strip_json_fences, ChatModel};
use crate::pipeline::prompts::{SKILL_EXTRACT_PROMPT_TEMPLATE, SKILL_EXTRACT_SYSTEM};
use crate::pipeline::{PipelineError, Stage};

/// Extraction runs near-deterministic; question derivation is the creative stage.
const EXTRACT_TEMPERATURE: f32 = 0.3;

/// Practical depth bound for extracted trees. Children below this depth are
/// dropped deterministically (truncation, not rejection) and logged.
pub const MAX_TREE_DEPTH: usize = 6;

/// One node of the extracted hierarchy. `children` and `tags` are optional in
/// the wire shape; leaves carry tags, inner nodes carry children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillTreeNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SkillTreeNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// The canonical skill tree for one pipeline run. Acyclic by construction
/// (owned values, no references) and immutable once extraction returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillTree {
    pub domains: Vec<SkillTreeNode>,
}

impl SkillTree {
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// Extracts a skill tree from a job description via the chat model.
pub async fn extract_skill_tree(
    model: &dyn ChatModel,
    jd_text: &str,
) -> Result<SkillTree, PipelineError> {
    let prompt = SKILL_EXTRACT_PROMPT_TEMPLATE.replace("{jd_text}", jd_text);

    let raw = model
        .invoke(SKILL_EXTRACT_SYSTEM, &prompt, EXTRACT_TEMPERATURE)
        .await
        .map_err(|e| PipelineError::from_llm(Stage::Extraction, e))?;

    let text = strip_json_fences(&raw);

    let mut tree: SkillTree =
        serde_json::from_str(text).map_err(|e| PipelineError::MalformedOutput {
            stage: Stage::Extraction,
            detail: e.to_string(),
        })?;

    if tree.is_empty() {
        return Err(PipelineError::MalformedOutput {
            stage: Stage::Extraction,
            detail: "no domains extracted".to_string(),
        });
    }

    let dropped = truncate_to_max_depth(&mut tree);
    if dropped > 0 {
        warn!(
            "extracted skill tree exceeded depth {}; dropped {} nodes",
            MAX_TREE_DEPTH, dropped
        );
    }

    Ok(tree)
}

/// Clamps the tree to `MAX_TREE_DEPTH` levels, returning how many nodes were
/// dropped. Domains count as depth 1.
pub fn truncate_to_max_depth(tree: &mut SkillTree) -> usize {
    let mut dropped = 0;
    truncate_level(&mut tree.domains, 1, &mut dropped);
    dropped
}

fn truncate_level(nodes: &mut [SkillTreeNode], depth: usize, dropped: &mut usize) {
    for node in nodes {
        if depth >= MAX_TREE_DEPTH {
            *dropped += count_nodes(&node.children);
            node.children.clear();
        } else {
            truncate_level(&mut node.children, depth + 1, dropped);
        }
    }
}

fn count_nodes(nodes: &[SkillTreeNode]) -> usize {
    nodes.len() + nodes.iter().map(|n| count_nodes(&n.children)).sum::<usize>()
}
