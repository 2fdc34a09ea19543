//! Tree normalization — materializes the flat `skill_node` rows into the
//! nested `RenderNode` forest the UI consumes.
//!
//! Order-preserving, not order-imposing: children come out in the same
//! relative order the rows came in (callers pre-sort by `level, sort_order`).
//!
//! Orphan policy: a node whose `parent_id` is absent from the input is
//! promoted to a root and logged — never silently dropped.
//!
//! Cycle policy: a visited set is threaded through materialization, and any
//! node left unreachable from a root (only possible inside a parent cycle)
//! fails the whole call with `CyclicHierarchy` instead of recursing forever.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::models::skill::SkillNodeRow;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("skill hierarchy contains a parent cycle involving node {node_id}")]
    CyclicHierarchy { node_id: i32 },
}

/// One node of the UI-facing tree. Derived on every read, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    pub key: String,
    pub name: String,
    pub children: Vec<RenderNode>,
}

/// Builds the render forest from flat rows. Pure function of its input.
pub fn build_render_tree(nodes: &[SkillNodeRow]) -> Result<Vec<RenderNode>, TreeError> {
    let known: HashSet<i32> = nodes.iter().map(|n| n.id).collect();

    let mut children: HashMap<i32, Vec<&SkillNodeRow>> = HashMap::new();
    let mut roots: Vec<&SkillNodeRow> = Vec::new();

    for node in nodes {
        match node.parent_id {
            Some(parent_id) if known.contains(&parent_id) => {
                children.entry(parent_id).or_default().push(node);
            }
            Some(parent_id) => {
                warn!(
                    node_id = node.id,
                    parent_id, "skill node references a missing parent; promoting to root"
                );
                roots.push(node);
            }
            None => roots.push(node),
        }
    }

    let mut visited = HashSet::with_capacity(nodes.len());
    let mut forest = Vec::with_capacity(roots.len());
    for root in roots {
        forest.push(materialize(root, &children, &mut visited)?);
    }

    if visited.len() != nodes.len() {
        let node_id = nodes
            .iter()
            .map(|n| n.id)
            .find(|id| !visited.contains(id))
            .unwrap_or_default();
        return Err(TreeError::CyclicHierarchy { node_id });
    }

    Ok(forest)
}

fn materialize(
    node: &SkillNodeRow,
    children: &HashMap<i32, Vec<&SkillNodeRow>>,
    visited: &mut HashSet<i32>,
) -> Result<RenderNode, TreeError> {
    if !visited.insert(node.id) {
        return Err(TreeError::CyclicHierarchy { node_id: node.id });
    }

    let mut rendered = Vec::new();
    if let Some(kids) = children.get(&node.id) {
        for child in kids {
            rendered.push(materialize(child, children, visited)?);
        }
    }

    Ok(RenderNode {
        key: node.id.to_string(),
        name: node.name.clone(),
        children: rendered,
    })
}
