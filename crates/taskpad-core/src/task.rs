use std::fmt;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("task id is required"));
        }
        let raw = trimmed
            .parse::<u64>()
            .with_context(|| format!("invalid task id: {trimmed}"))?;
        Ok(Self(raw))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,

    pub title: String,

    pub description: String,

    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(id: TaskId, title: String, description: String) -> Self {
        Self {
            id,
            title,
            description,
            completed: false,
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.completed {
            "completed"
        } else {
            "incomplete"
        }
    }

    /// Merges the present fields of `patch` into a copy of this task.
    pub fn patched(&self, patch: &TaskPatch) -> Self {
        let mut next = self.clone();
        if let Some(description) = &patch.description {
            next.description = description.clone();
        }
        if let Some(completed) = patch.completed {
            next.completed = completed;
        }
        next
    }
}

/// Partial update of the mutable task fields. The title is not patchable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn description(text: impl Into<String>) -> Self {
        Self {
            description: Some(text.into()),
            completed: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.completed.is_none()
    }
}
