use crate::client::{ApiClient, ApiRequest};
use crate::error::ClientError;
use crate::models::{Sprint, SprintDraft};
use uuid::Uuid;
use validator::Validate;

impl ApiClient {
    /// `GET /sprints?project_id=`
    pub async fn list_sprints(&self, project_id: Uuid) -> Result<Vec<Sprint>, ClientError> {
        self.send_json(&ApiRequest::get("/sprints").query("project_id", project_id))
            .await
    }

    /// `POST /sprints`
    pub async fn create_sprint(&self, draft: &SprintDraft) -> Result<Sprint, ClientError> {
        draft.validate()?;
        self.send_json(&ApiRequest::post("/sprints").json(draft)?)
            .await
    }

    /// Makes a sprint the project's active one.
    ///
    /// ## Responses:
    /// - `200 OK`: the sprint, now `active`. Any other active sprint of the
    ///   project is put back to `planning`.
    pub async fn set_active_sprint(&self, sprint_id: Uuid) -> Result<Sprint, ClientError> {
        self.send_json(&ApiRequest::patch(format!("/sprints/{}/set_active", sprint_id)))
            .await
    }

    /// Closes a sprint.
    ///
    /// ## Responses:
    /// - `200 OK`: the sprint, now `completed`. Its tasks that were not
    ///   deployed are detached from it and go back to the project backlog.
    pub async fn complete_sprint(&self, sprint_id: Uuid) -> Result<Sprint, ClientError> {
        self.send_json(&ApiRequest::patch(format!("/sprints/{}/complete", sprint_id)))
            .await
    }
}
