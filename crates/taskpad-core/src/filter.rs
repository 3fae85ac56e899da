use std::fmt;
use std::str::FromStr;

use serde::{
  Deserialize,
  Serialize
};
use tracing::trace;

use crate::error::InputError;
use crate::task::Task;

/// Which slice of the task list is
/// shown.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  Serialize,
  Deserialize,
  PartialEq,
  Eq,
  Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
  #[default]
  All,
  Completed,
  Incomplete
}

impl Visibility {
  pub const ALL: [Visibility; 3] = [
    Visibility::All,
    Visibility::Completed,
    Visibility::Incomplete
  ];

  pub fn as_str(
    &self
  ) -> &'static str {
    match self {
      | Visibility::All => "all",
      | Visibility::Completed => {
        "completed"
      }
      | Visibility::Incomplete => {
        "incomplete"
      }
    }
  }

  pub fn matches(
    &self,
    task: &Task
  ) -> bool {
    match self {
      | Visibility::All => true,
      | Visibility::Completed => {
        task.completed
      }
      | Visibility::Incomplete => {
        !task.completed
      }
    }
  }
}

impl fmt::Display for Visibility {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Visibility {
  type Err = InputError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "all" => Ok(Visibility::All),
      | "completed" => {
        Ok(Visibility::Completed)
      }
      | "incomplete" => {
        Ok(Visibility::Incomplete)
      }
      | _ => {
        Err(InputError::InvalidFilter {
          value: s.to_string()
        })
      }
    }
  }
}

/// Stable subsequence of `tasks`
/// admitted by `visibility`.
#[tracing::instrument(skip(tasks))]
pub fn project(
  tasks: &[Task],
  visibility: Visibility
) -> Vec<Task> {
  let out: Vec<Task> = match visibility
  {
    | Visibility::All => tasks.to_vec(),
    | _ => {
      tasks
        .iter()
        .filter(|task| {
          visibility.matches(task)
        })
        .cloned()
        .collect()
    }
  };

  trace!(
    input = tasks.len(),
    output = out.len(),
    "projected tasks"
  );
  out
}
