use super::UserProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    #[serde(rename = "task")]
    pub task_id: Uuid,
    #[serde(default)]
    pub user: Option<UserProfile>,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommentDraft {
    #[serde(rename = "task")]
    pub task_id: Uuid,
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
}
