use crate::models::{Task, TaskStatus};
use uuid::Uuid;

/// One board column: the tasks whose status is `status`, in server order.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
}

/// The in-memory task collection of a board.
///
/// Holds at most one task per id. Columns are not stored; they are computed from
/// each task's status, so every task is always in exactly one column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardState {
    tasks: Vec<Task>,
}

impl BoardState {
    pub fn new(tasks: Vec<Task>) -> Self {
        let mut state = Self::default();
        state.replace_all(tasks);
        state
    }

    /// Replaces the whole collection. Duplicate ids keep the last occurrence, at
    /// the position of the first.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks.clear();
        for task in tasks {
            self.upsert(task);
        }
    }

    /// Inserts a task, or replaces the task with the same id.
    pub fn upsert(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|existing| existing.id == task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
    }

    /// Replaces a task only if it is still on the board.
    pub fn replace_existing(&mut self, task: Task) -> bool {
        match self.tasks.iter_mut().find(|existing| existing.id == task.id) {
            Some(existing) => {
                *existing = task;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, task_id: Uuid) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id == task_id)?;
        Some(self.tasks.remove(index))
    }

    /// Sets a task's status, returning the previous one.
    pub fn set_status(&mut self, task_id: Uuid, status: TaskStatus) -> Option<TaskStatus> {
        let task = self.tasks.iter_mut().find(|task| task.id == task_id)?;
        Some(std::mem::replace(&mut task.status, status))
    }

    pub fn get(&self, task_id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn tasks_in_column(&self, status: TaskStatus) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|task| task.status == status)
            .cloned()
            .collect()
    }

    pub fn columns(&self) -> Vec<Column> {
        TaskStatus::ALL
            .into_iter()
            .map(|status| Column {
                status,
                tasks: self.tasks_in_column(status),
            })
            .collect()
    }
}
