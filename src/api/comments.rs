use crate::client::{ApiClient, ApiRequest};
use crate::error::ClientError;
use crate::models::{Comment, CommentDraft};
use uuid::Uuid;
use validator::Validate;

impl ApiClient {
    /// `GET /comments?task_id=`
    pub async fn list_comments(&self, task_id: Uuid) -> Result<Vec<Comment>, ClientError> {
        self.send_json(&ApiRequest::get("/comments").query("task_id", task_id))
            .await
    }

    /// `POST /comments`. The server attaches the author.
    pub async fn create_comment(&self, draft: &CommentDraft) -> Result<Comment, ClientError> {
        draft.validate()?;
        self.send_json(&ApiRequest::post("/comments").json(draft)?)
            .await
    }

    /// `PUT /comments/{id}`. Only the author may edit.
    pub async fn update_comment(&self, comment_id: Uuid, draft: &CommentDraft) -> Result<Comment, ClientError> {
        draft.validate()?;
        self.send_json(&ApiRequest::put(format!("/comments/{}", comment_id)).json(draft)?)
            .await
    }

    /// `DELETE /comments/{id}`
    pub async fn delete_comment(&self, comment_id: Uuid) -> Result<(), ClientError> {
        self.send_empty(&ApiRequest::delete(format!("/comments/{}", comment_id)))
            .await
    }
}
