//! The in-memory mirror of the remote tasks
//!
//! A [`TaskCollection`] has a single writer (the [`Provider`](crate::Provider) that owns it), and any number of readers.
//! Readers get a [`TaskReceiver`], that is notified whenever the collection changes.

use std::collections::HashSet;

use tokio::sync::watch;

use crate::task::{Task, TaskId};

/// A read-only handle on a [`TaskCollection`]
pub type TaskReceiver = watch::Receiver<Vec<Task>>;

/// The local collection of tasks, in the order they were loaded or created
#[derive(Debug)]
pub struct TaskCollection {
    tasks: watch::Sender<Vec<Task>>,
}

impl Default for TaskCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskCollection {
    /// An empty collection
    pub fn new() -> Self {
        let (tasks, _) = watch::channel(Vec::new());
        Self { tasks }
    }

    /// Get a handle that can read the collection, and be notified of its changes
    pub fn subscribe(&self) -> TaskReceiver {
        self.tasks.subscribe()
    }

    /// A copy of the current tasks
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.borrow().clone()
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.borrow().iter().find(|t| t.id() == id).cloned()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.borrow().iter().any(|t| t.id() == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Replace the whole content of the collection.
    ///
    /// In case several tasks share an ID, only the last one is kept (at the position of the first one)
    pub(crate) fn replace_all(&self, tasks: Vec<Task>) {
        let mut deduped: Vec<Task> = Vec::with_capacity(tasks.len());
        let mut seen = HashSet::new();
        for task in tasks {
            if seen.insert(task.id().clone()) {
                deduped.push(task);
            } else {
                log::warn!("Duplicate task ID {}, keeping its last occurrence", task.id());
                if let Some(slot) = deduped.iter_mut().find(|t| t.id() == task.id()) {
                    *slot = task;
                }
            }
        }
        self.tasks.send_replace(deduped);
    }

    /// Append a task. If a task with the same ID already exists, it is replaced in place
    pub(crate) fn insert(&self, task: Task) {
        self.tasks.send_modify(|tasks| {
            match tasks.iter_mut().find(|t| t.id() == task.id()) {
                Some(existing) => {
                    log::warn!("Task {} is already known, replacing it", task.id());
                    *existing = task;
                },
                None => tasks.push(task),
            }
        });
    }

    /// Replace the task with the same ID. Returns the previous version, or `None` (and changes nothing) if there was none
    pub(crate) fn replace(&self, task: Task) -> Option<Task> {
        let mut previous = None;
        self.tasks.send_if_modified(|tasks| {
            match tasks.iter_mut().find(|t| t.id() == task.id()) {
                None => false,
                Some(existing) => {
                    previous = Some(std::mem::replace(existing, task));
                    true
                },
            }
        });
        previous
    }

    /// Set the completion of a task. Returns its previous completion, or `None` if there is no such task
    pub(crate) fn set_completed(&self, id: &TaskId, completed: bool) -> Option<bool> {
        let mut previous = None;
        self.tasks.send_if_modified(|tasks| {
            match tasks.iter_mut().find(|t| t.id() == id) {
                None => false,
                Some(task) => {
                    previous = Some(task.completed());
                    task.set_completed(completed);
                    true
                },
            }
        });
        previous
    }

    /// Remove a task. Returns it, or `None` if there was no such task
    pub(crate) fn remove(&self, id: &TaskId) -> Option<Task> {
        let mut removed = None;
        self.tasks.send_if_modified(|tasks| {
            match tasks.iter().position(|t| t.id() == id) {
                None => false,
                Some(index) => {
                    removed = Some(tasks.remove(index));
                    true
                },
            }
        });
        removed
    }
}
