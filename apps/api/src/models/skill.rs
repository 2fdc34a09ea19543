use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted skill node. Flat, self-referential via `parent_id` (NULL for
/// roots, forming a forest). The pipeline only ever appends rows; deletion is
/// an explicit admin action and cascades to descendants at the DB layer.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SkillNodeRow {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub name: String,
    pub description: String,
    /// 1 = domain, 2 = category, 3 = skill, 4 = knowledge point.
    pub level: i32,
    pub sort_order: i32,
    pub tags: Vec<String>,
    pub auto_generated: bool,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
