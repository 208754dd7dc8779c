use crate::client::{ApiClient, ApiRequest};
use crate::error::ClientError;
use crate::models::{MoveRequest, Task, TaskDraft, TaskPatch, TaskQuery, TaskStatus};
use uuid::Uuid;
use validator::Validate;

impl ApiClient {
    /// Retrieves the tasks of a board.
    ///
    /// ## Query Parameters:
    /// - `project_id`: the project whose tasks are listed.
    /// - `sprint_id` (optional): restricts the list to one sprint.
    pub async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, ClientError> {
        let mut request = ApiRequest::get("/tasks").query("project_id", query.project_id);
        if let Some(sprint_id) = query.sprint_id {
            request = request.query("sprint_id", sprint_id);
        }
        self.send_json(&request).await
    }

    /// `GET /tasks/{id}`
    pub async fn get_task(&self, task_id: Uuid) -> Result<Task, ClientError> {
        self.send_json(&ApiRequest::get(format!("/tasks/{}", task_id)))
            .await
    }

    /// `POST /tasks`. Returns the task as stored, with its server-assigned id.
    pub async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ClientError> {
        draft.validate()?;
        self.send_json(&ApiRequest::post("/tasks").json(draft)?)
            .await
    }

    /// `PUT /tasks/{id}` with only the fields being changed.
    pub async fn update_task(&self, task_id: Uuid, patch: &TaskPatch) -> Result<Task, ClientError> {
        patch.validate()?;
        if patch.is_empty() {
            return Err(ClientError::Validation("nothing to update".into()));
        }
        self.send_json(&ApiRequest::put(format!("/tasks/{}", task_id)).json(patch)?)
            .await
    }

    /// `PATCH /tasks/{id}/move` with the new status.
    pub async fn move_task(&self, task_id: Uuid, status: TaskStatus) -> Result<Task, ClientError> {
        let request = ApiRequest::patch(format!("/tasks/{}/move", task_id)).json(&MoveRequest { status })?;
        self.send_json(&request).await
    }

    /// `DELETE /tasks/{id}`
    pub async fn delete_task(&self, task_id: Uuid) -> Result<(), ClientError> {
        self.send_empty(&ApiRequest::delete(format!("/tasks/{}", task_id)))
            .await
    }
}
