use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SprintStatus {
    #[default]
    Planning,
    Active,
    Completed,
}

/// A time-boxed iteration; only used as the board filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "project")]
    pub project_id: Uuid,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: SprintStatus,
    #[serde(default)]
    pub goal: String,
}

/// Payload for creating a sprint.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_sprint_dates"))]
pub struct SprintDraft {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(rename = "project")]
    pub project_id: Uuid,
    pub start_date: NaiveDate,
    /// Must be after `start_date`.
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: SprintStatus,
    #[serde(default)]
    pub goal: String,
}

fn validate_sprint_dates(draft: &SprintDraft) -> Result<(), ValidationError> {
    if draft.end_date <= draft.start_date {
        let mut error = ValidationError::new("sprint_dates");
        error.message = Some("End date must be after start date.".into());
        return Err(error);
    }
    Ok(())
}

/// Picks the sprint a board opens on: the active one, else the first listed.
pub fn default_sprint(sprints: &[Sprint]) -> Option<&Sprint> {
    sprints
        .iter()
        .find(|sprint| sprint.status == SprintStatus::Active)
        .or_else(|| sprints.first())
}
