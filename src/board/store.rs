use super::state::{BoardState, Column};
use crate::client::ApiClient;
use crate::error::ClientError;
use crate::models::{default_sprint, Project, Sprint, Task, TaskDraft, TaskPatch, TaskQuery, TaskStatus};
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// What `open_project` found.
#[derive(Debug, Clone)]
pub struct OpenedBoard {
    pub project: Project,
    pub sprints: Vec<Sprint>,
    pub sprint_id: Option<Uuid>,
    pub loaded: LoadOutcome,
}

/// Result of a load that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The server's list replaced the board; holds the new task count.
    Applied(usize),
    /// A newer load, or a `close`, made this result irrelevant. The board was not
    /// touched.
    Superseded,
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied(_))
    }
}

/// The board's tasks plus the state needed to decide whether a network result is
/// still wanted.
#[derive(Debug, Default)]
pub(super) struct BoardInner {
    pub(super) state: BoardState,
    pub(super) filter: Option<TaskQuery>,
    /// Advanced whenever the board starts showing something else (another project
    /// or sprint, or nothing). Results started under an older generation are dropped.
    pub(super) generation: u64,
    /// Ticket of the most recently issued load; only its result may be applied.
    pub(super) load_ticket: u64,
    pub(super) dragging: Option<Uuid>,
}

/// Board State Store.
///
/// All mutations go through the operations below. Locks are never held across a
/// network call: each operation snapshots what it needs, awaits the server, then
/// applies the result if it is still relevant.
pub struct BoardStore {
    pub(super) api: Arc<ApiClient>,
    pub(super) inner: Mutex<BoardInner>,
}

impl BoardStore {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            inner: Mutex::new(BoardInner::default()),
        }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Replaces the task collection with the server's list for a project/sprint.
    ///
    /// On failure the previously loaded tasks are kept and `FetchFailed` is returned
    /// (`SessionExpired` is passed through untouched). A result that arrives after a
    /// newer load was issued, or after `close`, is dropped as `Superseded`.
    pub async fn load(&self, project_id: Uuid, sprint_id: Option<Uuid>) -> Result<LoadOutcome, ClientError> {
        let query = TaskQuery {
            project_id,
            sprint_id,
        };
        let (generation, ticket) = {
            let mut inner = self.inner.lock();
            inner.load_ticket += 1;
            (inner.generation, inner.load_ticket)
        };

        let tasks = self.api.list_tasks(&query).await.map_err(|e| match e {
            ClientError::SessionExpired => e,
            other => {
                log::warn!("Loading tasks for project {} failed: {}", project_id, other);
                ClientError::FetchFailed(other.user_message())
            }
        })?;

        let mut inner = self.inner.lock();
        if inner.generation != generation || inner.load_ticket != ticket {
            log::debug!("Discarding superseded task list for project {}", project_id);
            return Ok(LoadOutcome::Superseded);
        }
        if inner.filter != Some(query) {
            inner.filter = Some(query);
            inner.generation += 1;
        }
        inner.state.replace_all(tasks);
        log::debug!("Loaded {} tasks for project {}", inner.state.len(), project_id);
        Ok(LoadOutcome::Applied(inner.state.len()))
    }

    /// Loads again with the current project/sprint filter.
    pub async fn reload(&self) -> Result<LoadOutcome, ClientError> {
        let filter = self
            .inner
            .lock()
            .filter
            .ok_or_else(|| ClientError::FetchFailed("no board is open".into()))?;
        self.load(filter.project_id, filter.sprint_id).await
    }

    /// Opens a project's board on its active sprint, or its first sprint, or
    /// unfiltered when it has none.
    pub async fn open_project(&self, project_id: Uuid) -> Result<OpenedBoard, ClientError> {
        let (project, sprints) = futures::try_join!(
            self.api.get_project(project_id),
            self.api.list_sprints(project_id)
        )
        .map_err(|e| match e {
            ClientError::SessionExpired => e,
            other => ClientError::FetchFailed(other.user_message()),
        })?;

        let sprint_id = default_sprint(&sprints).map(|sprint| sprint.id);
        let loaded = self.load(project_id, sprint_id).await?;
        log::info!("Opened board for {}", project.name);
        Ok(OpenedBoard {
            project,
            sprints,
            sprint_id,
            loaded,
        })
    }

    /// Forgets the board. Results still in flight are discarded when they arrive.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.filter = None;
        inner.dragging = None;
        inner.state.clear();
    }

    /// Creates a task on the server and adds the returned task to the board.
    ///
    /// Nothing is added locally until the server has assigned the id.
    pub async fn create(&self, draft: &TaskDraft) -> Result<Task, ClientError> {
        let generation = self.inner.lock().generation;
        let task = self.api.create_task(draft).await?;

        let mut inner = self.inner.lock();
        if inner.generation == generation {
            inner.state.upsert(task.clone());
        } else {
            log::debug!("Board changed while creating task {}; not adding it", task.id);
        }
        Ok(task)
    }

    /// Sends a partial update and merges the server's version of the task.
    pub async fn patch(&self, task_id: Uuid, fields: &TaskPatch) -> Result<Task, ClientError> {
        let generation = self.inner.lock().generation;
        let task = self.api.update_task(task_id, fields).await?;

        let mut inner = self.inner.lock();
        if inner.generation == generation {
            inner.state.replace_existing(task.clone());
        }
        Ok(task)
    }

    /// Deletes a task. It leaves the board only once the server has confirmed.
    pub async fn delete(&self, task_id: Uuid) -> Result<(), ClientError> {
        let generation = self.inner.lock().generation;
        self.api.delete_task(task_id).await?;

        let mut inner = self.inner.lock();
        if inner.generation == generation {
            inner.state.remove(task_id);
        }
        Ok(())
    }

    /// Makes `sprint_id` the active sprint. A board open on the same project
    /// switches to it.
    pub async fn activate_sprint(&self, sprint_id: Uuid) -> Result<Sprint, ClientError> {
        let sprint = self.api.set_active_sprint(sprint_id).await?;
        if self.filter().is_some_and(|filter| filter.project_id == sprint.project_id) {
            self.refresh_after_sprint_change(self.load(sprint.project_id, Some(sprint.id)).await)?;
        }
        Ok(sprint)
    }

    /// Completes a sprint. A board showing it is reloaded, since the server
    /// moves its unfinished tasks out.
    pub async fn complete_sprint(&self, sprint_id: Uuid) -> Result<Sprint, ClientError> {
        let sprint = self.api.complete_sprint(sprint_id).await?;
        if self.sprint_filter() == Some(sprint.id) {
            self.refresh_after_sprint_change(self.reload().await)?;
        }
        Ok(sprint)
    }

    fn refresh_after_sprint_change(&self, loaded: Result<LoadOutcome, ClientError>) -> Result<(), ClientError> {
        match loaded {
            Ok(_) => Ok(()),
            Err(ClientError::SessionExpired) => Err(ClientError::SessionExpired),
            Err(e) => {
                log::warn!("Sprint updated but the board could not be reloaded: {}", e);
                Ok(())
            }
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.inner.lock().state.tasks().to_vec()
    }

    pub fn task(&self, task_id: Uuid) -> Option<Task> {
        self.inner.lock().state.get(task_id).cloned()
    }

    pub fn tasks_in_column(&self, status: TaskStatus) -> Vec<Task> {
        self.inner.lock().state.tasks_in_column(status)
    }

    pub fn columns(&self) -> Vec<Column> {
        self.inner.lock().state.columns()
    }

    /// The project/sprint the board currently shows.
    pub fn filter(&self) -> Option<TaskQuery> {
        self.inner.lock().filter
    }

    pub fn sprint_filter(&self) -> Option<Uuid> {
        self.inner.lock().filter.and_then(|filter| filter.sprint_id)
    }
}

impl std::fmt::Debug for BoardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("BoardStore")
            .field("filter", &inner.filter)
            .field("tasks", &inner.state.len())
            .finish()
    }
}
