//! Move Reconciler: the board's one optimistic operation.
//!
//! A move is applied to the local board before the server is asked, so the board
//! reflects it immediately. If the server refuses, the board is re-read from the
//! server, which undoes the move along with any other drift, and `MoveFailed` is
//! returned.

use super::store::{BoardStore, LoadOutcome};
use crate::error::ClientError;
use crate::models::{Task, TaskStatus};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// An optimistic move waiting for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    pub task_id: Uuid,
    pub from: TaskStatus,
    pub to: TaskStatus,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MovePlan {
    /// The task is already in the target column; nothing to do.
    Unchanged(Task),
    /// The local board already shows the move; the server has not been asked yet.
    Pending(PendingMove),
}

impl BoardStore {
    /// Validates a move and applies it locally. No network call is made.
    ///
    /// `target` is a column identifier as reported by the drag layer; anything
    /// other than the four workflow statuses is an `InvalidTransition`.
    pub fn begin_move(&self, task_id: Uuid, target: &str) -> Result<MovePlan, ClientError> {
        let to: TaskStatus = target.parse()?;
        self.begin_move_to(task_id, to)
    }

    pub fn begin_move_to(&self, task_id: Uuid, to: TaskStatus) -> Result<MovePlan, ClientError> {
        let mut inner = self.inner.lock();
        let task = inner
            .state
            .get(task_id)
            .ok_or_else(|| ClientError::NotFound(format!("task {} is not on the board", task_id)))?;

        if task.status == to {
            return Ok(MovePlan::Unchanged(task.clone()));
        }

        let from = task.status;
        inner.state.set_status(task_id, to);
        log::debug!("Task {} moved {} -> {} locally", task_id, from, to);
        Ok(MovePlan::Pending(PendingMove {
            task_id,
            from,
            to,
            generation: inner.generation,
        }))
    }

    /// Persists an optimistic move and reconciles the board with the outcome.
    pub async fn settle(&self, pending: PendingMove) -> Result<Task, ClientError> {
        match self.api.move_task(pending.task_id, pending.to).await {
            Ok(task) => {
                let mut inner = self.inner.lock();
                if inner.generation == pending.generation {
                    // Absorb server-side effects such as the new `order`.
                    inner.state.replace_existing(task.clone());
                }
                Ok(task)
            }
            Err(ClientError::SessionExpired) => {
                self.revert_locally(&pending);
                Err(ClientError::SessionExpired)
            }
            Err(e) => {
                log::warn!(
                    "Server rejected moving task {} to {}: {}",
                    pending.task_id,
                    pending.to,
                    e
                );
                self.roll_back(&pending).await;
                Err(ClientError::MoveFailed(e.user_message()))
            }
        }
    }

    /// Moves a task and waits for the server.
    ///
    /// Returns the task as the server stored it, or the unchanged task when it was
    /// already in the target column.
    pub async fn move_task(&self, task_id: Uuid, target: &str) -> Result<Task, ClientError> {
        match self.begin_move(task_id, target)? {
            MovePlan::Unchanged(task) => Ok(task),
            MovePlan::Pending(pending) => self.settle(pending).await,
        }
    }

    /// Entry point for a drop reported by the drag layer.
    ///
    /// Validation and the optimistic write happen before this returns; persisting
    /// the move runs in the background and its outcome is available through the
    /// returned handle. `None` means there was nothing to persist.
    pub fn on_move_requested(
        self: &Arc<Self>,
        task_id: Uuid,
        target: &str,
    ) -> Result<Option<JoinHandle<Result<Task, ClientError>>>, ClientError> {
        match self.begin_move(task_id, target)? {
            MovePlan::Unchanged(_) => Ok(None),
            MovePlan::Pending(pending) => {
                let board = Arc::clone(self);
                Ok(Some(tokio::spawn(async move { board.settle(pending).await })))
            }
        }
    }

    async fn roll_back(&self, pending: &PendingMove) {
        if self.inner.lock().generation != pending.generation {
            return;
        }
        match self.reload().await {
            Ok(LoadOutcome::Applied(_)) => {}
            Ok(LoadOutcome::Superseded) => {
                log::debug!("Re-read after failed move was superseded; reverting task {} locally", pending.task_id);
                self.revert_locally(pending);
            }
            Err(e) => {
                log::warn!("Re-reading the board after a failed move failed too: {}", e);
                self.revert_locally(pending);
            }
        }
    }

    /// Puts the task back where it was, unless something else has moved it since.
    fn revert_locally(&self, pending: &PendingMove) {
        let mut inner = self.inner.lock();
        if inner.generation != pending.generation {
            return;
        }
        let still_ours = inner
            .state
            .get(pending.task_id)
            .is_some_and(|task| task.status == pending.to);
        if still_ours {
            inner.state.set_status(pending.task_id, pending.from);
        }
    }
}
