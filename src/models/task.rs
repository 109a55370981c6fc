use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Workflow state of a task. Stored as TEXT (`pending`, `in-progress`,
/// `completed`) in the `tasks` table.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

/// Priority of a task. Stored as TEXT (`low`, `medium`, `high`).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// Input for creating a task.
///
/// `status` and `priority` are parsed as enums, so an unknown value is
/// rejected at deserialization; omitting them applies the documented
/// defaults (`pending` / `medium`). There is no owner field: the owner is
/// always the authenticated caller.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 3, max = 200, message = "title must be between 3 and 200 characters"))]
    pub title: String,

    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,
}

/// Input for updating a task. Every field is optional; presence vs. absence
/// is significant:
///
/// - `title`, `status`, `priority`: overwrite only when supplied and
///   non-empty; an omitted or empty value keeps the stored one.
/// - `description`: overwrites whenever supplied, and an explicit `""` is a
///   valid overwrite, distinct from omitting the field.
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct TaskUpdate {
    #[validate(custom = "crate::validation::validate_update_title")]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,
}

/// A task row as stored.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Owner reference; immutable after creation.
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task row joined with its owner's username, the shape every task
/// endpoint returns.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct TaskWithCreator {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_by: i64,
    pub creator_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
