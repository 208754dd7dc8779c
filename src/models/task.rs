use crate::error::ClientError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Represents the priority of a task.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority, the server default.
    #[default]
    Medium,
    /// High priority.
    High,
}

/// The workflow column a task currently occupies.
///
/// Any status may move to any other; there is no ordering between columns.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Not started yet.
    #[default]
    Backlog,
    /// Being worked on.
    Implementing,
    /// Under test.
    Testing,
    /// Shipped.
    Deployed,
}

impl TaskStatus {
    /// Board columns, left to right.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Backlog,
        TaskStatus::Implementing,
        TaskStatus::Testing,
        TaskStatus::Deployed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::Implementing => "implementing",
            TaskStatus::Testing => "testing",
            TaskStatus::Deployed => "deployed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "Backlog",
            TaskStatus::Implementing => "Implementing",
            TaskStatus::Testing => "Testing",
            TaskStatus::Deployed => "Deployed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a column identifier as reported by the drag layer.
///
/// Anything outside the four workflow values is an `InvalidTransition`.
impl FromStr for TaskStatus {
    type Err = ClientError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == raw.trim())
            .ok_or_else(|| ClientError::InvalidTransition(format!("unknown status {:?}", raw)))
    }
}

/// A task as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned identifier, immutable.
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub story_points: Option<u32>,
    #[serde(rename = "sprint", default)]
    pub sprint_id: Option<Uuid>,
    #[serde(rename = "project")]
    pub project_id: Uuid,
    /// Position inside the column, computed by the server.
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub assigned_to: Option<i64>,
    #[serde(default)]
    pub comments_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for creating a task. The server assigns the id and defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskDraft {
    /// Must be between 1 and 300 characters.
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[validate(range(min = 1, max = 100))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(rename = "project")]
    pub project_id: Uuid,
    #[serde(rename = "sprint")]
    pub sprint_id: Option<Uuid>,
}

impl TaskDraft {
    pub fn new(project_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            story_points: None,
            project_id,
            sprint_id: None,
        }
    }
}

/// Partial update. Only the fields that are set are sent.
///
/// Nullable fields are doubly optional: `None` leaves the field alone,
/// `Some(None)` clears it on the server (sent as `null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct TaskPatch {
    #[validate(length(min = 1, max = 300))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[validate(range(min = 1, max = 100))]
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub story_points: Option<Option<u32>>,
    #[serde(
        rename = "sprint",
        default,
        deserialize_with = "nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub sprint_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Option<i64>>,
}

/// Tells an explicit `null` (`Some(None)`) apart from a missing field (`None`).
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

/// Body of `PATCH /tasks/{id}/move`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoveRequest {
    pub status: TaskStatus,
}

/// Query parameters for listing the tasks of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskQuery {
    pub project_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<Uuid>,
}
