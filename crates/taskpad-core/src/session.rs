use std::rc::Rc;

use tracing::{debug, info, instrument, warn};

use crate::error::InputError;
use crate::filter::Visibility;
use crate::store::{Action, StoreState, transition};
use crate::task::{Task, TaskId, TaskPatch};
use crate::view::ViewProjector;

/// Hands out task ids from a monotonic counter.
///
/// `next` is `None` once `u64::MAX` has been handed out or observed.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: Option<u64>,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self { next: Some(1) }
    }
}

impl IdGenerator {
    pub fn next_id(&mut self) -> Result<TaskId, InputError> {
        let id = self.next.ok_or(InputError::IdsExhausted)?;
        self.next = id.checked_add(1);
        Ok(TaskId(id))
    }

    /// Moves the counter past an id that was issued elsewhere.
    pub fn observe(&mut self, id: TaskId) {
        if let Some(next) = self.next
            && id.0 >= next
        {
            self.next = id.0.checked_add(1);
        }
    }
}

/// What a dispatched action did to the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Changed,
    Unchanged,
}

/// One user's task list: the store state plus the caller-side policy
/// (validation, id assignment) and the cached view.
#[derive(Debug, Default)]
pub struct Session {
    state: StoreState,
    ids: IdGenerator,
    projector: ViewProjector,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn filter(&self) -> Visibility {
        self.state.filter
    }

    pub fn visible_tasks(&mut self) -> Rc<Vec<Task>> {
        self.projector.project(&self.state)
    }

    pub fn projector(&self) -> &ViewProjector {
        &self.projector
    }

    #[instrument(skip(self, title, description))]
    pub fn add_task(&mut self, title: &str, description: &str) -> Result<TaskId, InputError> {
        if title.trim().is_empty() || description.trim().is_empty() {
            warn!("add refused: title or description empty");
            return Err(InputError::missing_title_or_description());
        }

        let id = self.ids.next_id()?;
        let task = Task::new(id, title.to_string(), description.to_string());
        if self.apply(Action::AddTask(task)) == Outcome::Unchanged {
            return Err(InputError::DuplicateId { id });
        }
        info!(id = %id, "task created");
        Ok(id)
    }

    pub fn delete_task(&mut self, id: TaskId) -> Outcome {
        self.apply(Action::DeleteTask(id))
    }

    pub fn toggle_completed(&mut self, id: TaskId) -> Outcome {
        self.apply(Action::ToggleCompleted(id))
    }

    pub fn update_task(&mut self, id: TaskId, updates: TaskPatch) -> Result<Outcome, InputError> {
        if let Some(description) = &updates.description
            && description.trim().is_empty()
        {
            return Err(InputError::missing_description());
        }
        Ok(self.apply(Action::UpdateTask { id, updates }))
    }

    pub fn set_filter(&mut self, raw: &str) -> Result<Visibility, InputError> {
        let filter = raw.parse::<Visibility>()?;
        self.apply(Action::SetFilter(filter));
        Ok(filter)
    }

    /// Applies an action from an untrusted source, enforcing the add
    /// precondition and id uniqueness first.
    #[instrument(skip(self, action), fields(kind = action.kind()))]
    pub fn dispatch(&mut self, action: Action) -> Result<Outcome, InputError> {
        if let Action::AddTask(task) = &action {
            if task.title.trim().is_empty() || task.description.trim().is_empty() {
                return Err(InputError::missing_title_or_description());
            }
            if self.state.contains(task.id) {
                return Err(InputError::DuplicateId { id: task.id });
            }
            self.ids.observe(task.id);
        }
        if let Action::UpdateTask { updates, .. } = &action
            && updates
                .description
                .as_deref()
                .is_some_and(|d| d.trim().is_empty())
        {
            return Err(InputError::missing_description());
        }

        Ok(self.apply(action))
    }

    /// Decodes a JSON action and dispatches it.
    pub fn dispatch_json(&mut self, raw: &str) -> Result<Outcome, InputError> {
        let action: Action =
            serde_json::from_str(raw).map_err(|err| InputError::InvalidAction {
                reason: err.to_string(),
            })?;
        self.dispatch(action)
    }

    fn apply(&mut self, action: Action) -> Outcome {
        let next = transition(&self.state, action);
        let outcome = if next.same_tasks(&self.state) {
            Outcome::Unchanged
        } else {
            Outcome::Changed
        };
        debug!(?outcome, tasks = next.tasks.len(), filter = %next.filter, "state advanced");
        self.state = next;
        outcome
    }
}
