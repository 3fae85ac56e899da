//! Recoverable errors raised at the input boundary.
//!
//! None of these are fatal: the caller reports them to the user and the
//! store keeps its previous state.

use thiserror::Error;

use crate::task::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// A required text field was empty after trimming.
    #[error("{message}")]
    MissingField { message: String },

    #[error("invalid filter `{value}`; expected one of: all, completed, incomplete")]
    InvalidFilter { value: String },

    #[error("invalid action: {reason}")]
    InvalidAction { reason: String },

    #[error("task id {id} is already in use")]
    DuplicateId { id: TaskId },

    #[error("no task ids left")]
    IdsExhausted,
}

impl InputError {
    pub fn missing_title_or_description() -> Self {
        Self::MissingField {
            message: "Both task title and description are required!".to_string(),
        }
    }

    pub fn missing_description() -> Self {
        Self::MissingField {
            message: "Description cannot be empty.".to_string(),
        }
    }

    /// Validation failures are surfaced as warnings rather than errors.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }
}
