//! What the constructive commands of a [`Provider`](crate::Provider) result in

use std::fmt::{Display, Formatter};

use crate::task::{parse_deadline, Task};

/// Why some user input has been rejected
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputProblem {
    EmptyText,
    EmptyDeadline,
    UnparseableDeadline(String),
}

impl Display for InputProblem {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            InputProblem::EmptyText => write!(f, "the task has no name"),
            InputProblem::EmptyDeadline => write!(f, "the task has no deadline"),
            InputProblem::UnparseableDeadline(d) => write!(f, "{:?} is not a valid deadline", d),
        }
    }
}

/// The result of a command that went through (i.e. that did not fail because of the remote store)
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The user dismissed the input dialog. Nothing has been done
    Cancelled,
    /// The input was rejected. Nothing has been done
    InvalidInput(InputProblem),
    /// The remote store confirmed the change, and the local collection reflects it.
    /// This contains the affected task (for a removal, the task that has been removed)
    Committed(Task),
}

impl Outcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Outcome::Committed(_))
    }

    /// The affected task, in case the command has been committed
    pub fn task(&self) -> Option<&Task> {
        match self {
            Outcome::Committed(task) => Some(task),
            _ => None,
        }
    }
}

/// Check the text and deadline a user entered
pub(crate) fn validate(text: &str, deadline: &str) -> Result<(), InputProblem> {
    if text.trim().is_empty() {
        return Err(InputProblem::EmptyText);
    }
    if deadline.trim().is_empty() {
        return Err(InputProblem::EmptyDeadline);
    }
    if parse_deadline(deadline).is_none() {
        return Err(InputProblem::UnparseableDeadline(deadline.to_string()));
    }
    Ok(())
}
