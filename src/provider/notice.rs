//! Short-lived notifications about the mutations a [`Provider`](crate::Provider) performs

use std::fmt::{Display, Error, Formatter};

use crate::task::TaskId;

/// The mutations a [`Provider`](crate::Provider) can perform
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Load,
    Create,
    Update,
    Toggle,
    Remove,
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            Operation::Load => write!(f, "load the tasks"),
            Operation::Create => write!(f, "add the task"),
            Operation::Update => write!(f, "edit the task"),
            Operation::Toggle => write!(f, "change the task completion"),
            Operation::Remove => write!(f, "delete the task"),
        }
    }
}

/// Something worth a brief, auto-dismissed notification to the user
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    Created(TaskId),
    Updated(TaskId),
    Toggled { id: TaskId, completed: bool },
    Deleted(TaskId),
    /// A remote call failed
    Failed { operation: Operation, message: String },
}

impl Notice {
    pub fn is_failure(&self) -> bool {
        matches!(self, Notice::Failed { .. })
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            Notice::Created(_) => write!(f, "Saved! New task added"),
            Notice::Updated(_) => write!(f, "Saved! Task edited"),
            Notice::Toggled{ completed: true, .. } => write!(f, "Task marked as done"),
            Notice::Toggled{ completed: false, .. } => write!(f, "Task marked as not done"),
            Notice::Deleted(_) => write!(f, "Deleted! Task removed"),
            Notice::Failed{ operation, message } => write!(f, "Unable to {}: {}", operation, message),
        }
    }
}


/// See [`notice_channel`]
pub type NoticeSender = tokio::sync::mpsc::UnboundedSender<Notice>;
/// See [`notice_channel`]
pub type NoticeReceiver = tokio::sync::mpsc::UnboundedReceiver<Notice>;

/// Create a notice channel, that a UI can listen to in order to display confirmations and failures
pub fn notice_channel() -> (NoticeSender, NoticeReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}


/// Logs what happens to a provider, and forwards notices to the listener (if any).
#[derive(Debug, Default)]
pub(crate) struct Reporter {
    channel: Option<NoticeSender>,
}

impl Reporter {
    pub fn new(channel: Option<NoticeSender>) -> Self {
        Self { channel }
    }

    /// Send a notice to the listener (if any). Nobody listening is not an error
    pub fn notify(&self, notice: Notice) {
        if notice.is_failure() {
            log::warn!("{}", notice);
        } else {
            log::info!("{}", notice);
        }

        if let Some(sender) = &self.channel {
            if sender.send(notice).is_err() {
                log::debug!("Nobody is listening to notices anymore");
            }
        }
    }

    pub fn failure(&self, operation: Operation, err: &crate::error::Error) {
        self.notify(Notice::Failed { operation, message: err.to_string() });
    }
}
