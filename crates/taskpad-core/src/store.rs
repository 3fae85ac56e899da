//! Task store state and its transition function.
//!
//! `transition` never mutates the state it is given. The task list sits
//! behind an `Rc`, so a transition that leaves the list alone hands back a
//! state whose list is pointer-identical to the input; callers may compare
//! states by reference to detect change.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::filter::Visibility;
use crate::task::{Task, TaskId, TaskPatch};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreState {
    pub tasks: Rc<Vec<Task>>,
    pub filter: Visibility,
}

impl StoreState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.get(id).is_some()
    }

    /// True when both states share the same task list allocation.
    pub fn same_tasks(&self, other: &StoreState) -> bool {
        Rc::ptr_eq(&self.tasks, &other.tasks)
    }

    fn with_tasks(&self, tasks: Vec<Task>) -> Self {
        Self {
            tasks: Rc::new(tasks),
            filter: self.filter,
        }
    }

    fn map_task<F>(&self, id: TaskId, f: F) -> Self
    where
        F: Fn(&Task) -> Task,
    {
        if !self.contains(id) {
            debug!(id = %id, "no task with id; state unchanged");
            return self.clone();
        }

        let tasks = self
            .tasks
            .iter()
            .map(|task| if task.id == id { f(task) } else { task.clone() })
            .collect();
        self.with_tasks(tasks)
    }
}

/// Wire format: `{"type": "ADD_TASK", "payload": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AddTask(Task),
    DeleteTask(TaskId),
    UpdateTask { id: TaskId, updates: TaskPatch },
    ToggleCompleted(TaskId),
    SetFilter(Visibility),
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::AddTask(_) => "ADD_TASK",
            Action::DeleteTask(_) => "DELETE_TASK",
            Action::UpdateTask { .. } => "UPDATE_TASK",
            Action::ToggleCompleted(_) => "TOGGLE_COMPLETED",
            Action::SetFilter(_) => "SET_FILTER",
        }
    }
}

#[tracing::instrument(skip(state, action), fields(kind = action.kind()))]
pub fn transition(state: &StoreState, action: Action) -> StoreState {
    match action {
        Action::AddTask(task) => {
            if state.contains(task.id) {
                warn!(id = %task.id, "add rejected: id already present");
                return state.clone();
            }
            debug!(id = %task.id, "adding task");
            let mut tasks = Vec::with_capacity(state.tasks.len() + 1);
            tasks.extend(state.tasks.iter().cloned());
            tasks.push(task);
            state.with_tasks(tasks)
        }
        Action::DeleteTask(id) => {
            info!(id = %id, "deleting task");
            if !state.contains(id) {
                return state.clone();
            }
            let tasks = state
                .tasks
                .iter()
                .filter(|task| task.id != id)
                .cloned()
                .collect();
            state.with_tasks(tasks)
        }
        Action::UpdateTask { id, updates } => {
            if updates.is_empty() {
                return state.clone();
            }
            state.map_task(id, |task| task.patched(&updates))
        }
        Action::ToggleCompleted(id) => state.map_task(id, |task| Task {
            completed: !task.completed,
            ..task.clone()
        }),
        Action::SetFilter(filter) => {
            debug!(from = %state.filter, to = %filter, "setting filter");
            StoreState {
                tasks: Rc::clone(&state.tasks),
                filter,
            }
        }
    }
}
