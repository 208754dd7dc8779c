use super::store::BoardStore;
use crate::error::ClientError;
use crate::models::Task;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Events reported by the pointer-tracking layer, identified by task id and the
/// id of the column the pointer is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Started { task_id: Uuid },
    Ended { task_id: Uuid, over: Option<String> },
    Cancelled,
}

#[derive(Debug)]
pub enum DragOutcome {
    /// A drag began; the task is what the drag overlay should show.
    Lifted(Task),
    /// Nothing changed (dropped outside a column, or onto its own column).
    Ignored,
    /// The board shows the move and the server is being asked.
    Moving(JoinHandle<Result<Task, ClientError>>),
}

impl BoardStore {
    pub fn handle_drag(self: &Arc<Self>, event: DragEvent) -> Result<DragOutcome, ClientError> {
        match event {
            DragEvent::Started { task_id } => {
                let mut inner = self.inner.lock();
                let task = inner
                    .state
                    .get(task_id)
                    .cloned()
                    .ok_or_else(|| ClientError::NotFound(format!("task {} is not on the board", task_id)))?;
                inner.dragging = Some(task_id);
                Ok(DragOutcome::Lifted(task))
            }
            DragEvent::Ended { task_id, over } => {
                self.inner.lock().dragging = None;
                let Some(column) = over else {
                    return Ok(DragOutcome::Ignored);
                };
                match self.on_move_requested(task_id, &column)? {
                    Some(handle) => Ok(DragOutcome::Moving(handle)),
                    None => Ok(DragOutcome::Ignored),
                }
            }
            DragEvent::Cancelled => {
                self.inner.lock().dragging = None;
                Ok(DragOutcome::Ignored)
            }
        }
    }

    /// The task currently being dragged, if any.
    pub fn dragging(&self) -> Option<Task> {
        let inner = self.inner.lock();
        inner.dragging.and_then(|id| inner.state.get(id).cloned())
    }
}
