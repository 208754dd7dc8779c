use crate::client::{ApiClient, ApiRequest};
use crate::error::ClientError;
use crate::models::{Project, ProjectDraft};
use uuid::Uuid;
use validator::Validate;

impl ApiClient {
    /// `GET /projects`: projects the user owns or is a member of.
    pub async fn list_projects(&self) -> Result<Vec<Project>, ClientError> {
        self.send_json(&ApiRequest::get("/projects")).await
    }

    /// `GET /projects/{id}`
    pub async fn get_project(&self, project_id: Uuid) -> Result<Project, ClientError> {
        self.send_json(&ApiRequest::get(format!("/projects/{}", project_id)))
            .await
    }

    /// `POST /projects`. The caller becomes the owner.
    pub async fn create_project(&self, draft: &ProjectDraft) -> Result<Project, ClientError> {
        draft.validate()?;
        self.send_json(&ApiRequest::post("/projects").json(draft)?)
            .await
    }
}
