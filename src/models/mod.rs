pub mod comment;
pub mod project;
pub mod sprint;
pub mod task;
pub mod user;

pub use comment::{Comment, CommentDraft};
pub use project::{Project, ProjectDraft};
pub use sprint::{default_sprint, Sprint, SprintDraft, SprintStatus};
pub use task::{MoveRequest, Task, TaskDraft, TaskPatch, TaskPriority, TaskQuery, TaskStatus};
pub use user::UserProfile;
