use std::rc::Rc;

use tracing::trace;

use crate::filter::{Visibility, project};
use crate::store::StoreState;
use crate::task::Task;

#[derive(Debug, Clone)]
struct CachedView {
    source: Rc<Vec<Task>>,
    visibility: Visibility,
    output: Rc<Vec<Task>>,
}

/// Memoizing wrapper around [`project`]. The cache is keyed on the identity
/// of the task list and the visibility value.
#[derive(Debug, Clone, Default)]
pub struct ViewProjector {
    cached: Option<CachedView>,
    recomputations: u64,
}

impl ViewProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project(&mut self, state: &StoreState) -> Rc<Vec<Task>> {
        if let Some(cached) = &self.cached
            && Rc::ptr_eq(&cached.source, &state.tasks)
            && cached.visibility == state.filter
        {
            trace!(filter = %state.filter, "reusing cached view");
            return Rc::clone(&cached.output);
        }

        let output = match state.filter {
            Visibility::All => Rc::clone(&state.tasks),
            other => Rc::new(project(&state.tasks, other)),
        };

        self.recomputations += 1;
        self.cached = Some(CachedView {
            source: Rc::clone(&state.tasks),
            visibility: state.filter,
            output: Rc::clone(&output),
        });
        output
    }

    /// Number of times the view was actually rebuilt.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}
