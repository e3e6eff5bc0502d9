//! This modules keeps a local collection of tasks consistent with a remote store
//!
//! Every mutation goes through a [`Provider`], which is the only writer of its [`TaskCollection`].

use crate::collection::{TaskCollection, TaskReceiver};
use crate::error::{Error, Result};
use crate::task::{FieldUpdate, Task, TaskFields, TaskId};
use crate::traits::RemoteStore;

pub mod notice;
use notice::{Notice, NoticeSender, Operation, Reporter};
pub mod outcome;
use outcome::{validate, Outcome};

/// What a user dialog returns: `None` when it has been dismissed, `(text, deadline)` otherwise
pub type DialogInput = Option<(String, String)>;


/// Whether a mutation is applied locally before or after the remote store confirms it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MutationPolicy {
    /// Apply the change locally first, without waiting for the remote store
    pub optimistic: bool,
    /// For optimistic changes: undo the local change in case the remote store refuses it
    pub rollback_on_failure: bool,
}

impl MutationPolicy {
    /// Change the local collection only once the remote store has confirmed the change
    pub const fn confirmed() -> Self {
        Self { optimistic: false, rollback_on_failure: false }
    }
    /// Change the local collection at once, and undo it if the remote store fails
    pub const fn optimistic() -> Self {
        Self { optimistic: true, rollback_on_failure: true }
    }
    /// Change the local collection at once, and keep it changed even if the remote store fails.
    /// The local collection may then disagree with the remote store until the next load
    pub const fn optimistic_without_rollback() -> Self {
        Self { optimistic: true, rollback_on_failure: false }
    }
}

/// The [`MutationPolicy`] of each operation that supports one.
///
/// Creations and removals are always confirmed first: IDs only come from the remote store, and a task must never disappear locally while it still exists remotely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Policies {
    pub update: MutationPolicy,
    pub toggle: MutationPolicy,
}

impl Default for Policies {
    fn default() -> Self {
        Self {
            update: MutationPolicy::confirmed(),
            toggle: MutationPolicy::optimistic(),
        }
    }
}


/// A local collection of tasks, backed by a remote store.
///
/// Operations take `&self`, so that several of them can be in flight at the same time.
/// In that case, they complete in whatever order the remote store answers (the last writer wins).
pub struct Provider<R>
where
    R: RemoteStore,
{
    /// The remote source (usually a [`Client`](crate::client::Client))
    remote: R,
    /// The local mirror
    tasks: TaskCollection,

    policies: Policies,
    reporter: Reporter,
}

impl<R> Provider<R>
where
    R: RemoteStore,
{
    /// Create a provider, with an empty local collection. See [`Self::load_all`]
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            tasks: TaskCollection::new(),
            policies: Policies::default(),
            reporter: Reporter::default(),
        }
    }

    pub fn with_policies(mut self, policies: Policies) -> Self {
        self.policies = policies;
        self
    }

    /// Send a [`Notice`] to this channel after each successful or failed remote call
    pub fn with_notices(mut self, sender: NoticeSender) -> Self {
        self.reporter = Reporter::new(Some(sender));
        self
    }

    /// Returns the remote store.
    ///
    /// Apart from tests, there are very few (if any) reasons to access `remote` directly.
    pub fn remote(&self) -> &R { &self.remote }
    /// Returns the local collection. It can only be modified by this provider
    pub fn tasks(&self) -> &TaskCollection { &self.tasks }
    /// Get a read-only handle on the local collection, e.g. for a [`Scheduler`](crate::countdown::scheduler::Scheduler)
    pub fn subscribe(&self) -> TaskReceiver { self.tasks.subscribe() }
    pub fn policies(&self) -> &Policies { &self.policies }

    /// Replace the local collection with every task of the remote store.
    ///
    /// In case of an error, the local collection is left untouched (i.e. empty at startup).
    /// Returns how many tasks are now known.
    pub async fn load_all(&self) -> Result<usize> {
        log::debug!("Loading every task from the remote store");
        let documents = self.reported(Operation::Load, self.remote.list_all().await)?;

        let tasks = documents.into_iter()
            .map(|doc| Task::new(doc.id, doc.fields))
            .collect();
        self.tasks.replace_all(tasks);

        let n_tasks = self.tasks.len();
        log::info!("Loaded {} tasks", n_tasks);
        Ok(n_tasks)
    }

    /// Create a new task. It is added to the local collection once the remote store has given it an ID.
    pub async fn create(&self, text: &str, deadline: &str) -> Result<Outcome> {
        if let Err(problem) = validate(text, deadline) {
            log::debug!("Not creating a task: {}", problem);
            return Ok(Outcome::InvalidInput(problem));
        }

        let fields = TaskFields::new(text.to_string(), deadline.to_string());
        let id = self.reported(Operation::Create, self.remote.create(&fields).await)?;

        let task = Task::new(id.clone(), fields);
        self.tasks.insert(task.clone());
        self.reporter.notify(Notice::Created(id));
        Ok(Outcome::Committed(task))
    }

    /// Same as [`Self::create`], with the answer of an input dialog
    pub async fn create_from_dialog(&self, input: DialogInput) -> Result<Outcome> {
        match input {
            None => Ok(Outcome::Cancelled),
            Some((text, deadline)) => self.create(&text, &deadline).await,
        }
    }

    /// Change the text and deadline of a task. Its completion is not affected.
    pub async fn update(&self, id: &TaskId, text: &str, deadline: &str) -> Result<Outcome> {
        if let Err(problem) = validate(text, deadline) {
            log::debug!("Not updating task {}: {}", id, problem);
            return Ok(Outcome::InvalidInput(problem));
        }
        let previous = self.known_task(id, Operation::Update)?;

        let update = FieldUpdate::new()
            .text(text.to_string())
            .deadline(deadline.to_string());
        let policy = self.policies.update;

        if policy.optimistic {
            self.tasks.replace(previous.merged_with(&update));
        }

        if let Err(err) = self.remote.update_fields(id, &update).await {
            if policy.optimistic && policy.rollback_on_failure {
                let rollback = FieldUpdate::new()
                    .text(previous.text().to_string())
                    .deadline(previous.deadline().to_string());
                // The completion may have changed in the meantime, it is not ours to undo
                if let Some(latest) = self.tasks.get(id) {
                    log::warn!("Rolling back the edition of task {}", id);
                    self.tasks.replace(latest.merged_with(&rollback));
                }
            }
            self.reporter.failure(Operation::Update, &err);
            return Err(err);
        }

        let updated = match self.tasks.get(id) {
            Some(latest) => latest.merged_with(&update),
            None => {
                log::warn!("Task {} has been removed while it was being edited", id);
                return Err(self.unknown_task(id, Operation::Update));
            },
        };
        self.tasks.replace(updated.clone());
        self.reporter.notify(Notice::Updated(id.clone()));
        Ok(Outcome::Committed(updated))
    }

    /// Same as [`Self::update`], with the answer of an input dialog
    pub async fn update_from_dialog(&self, id: &TaskId, input: DialogInput) -> Result<Outcome> {
        match input {
            None => Ok(Outcome::Cancelled),
            Some((text, deadline)) => self.update(id, &text, &deadline).await,
        }
    }

    /// Flip the completion of a task
    pub async fn toggle_completion(&self, id: &TaskId) -> Result<Outcome> {
        let previous = self.known_task(id, Operation::Toggle)?;
        let completed = previous.completed() == false;
        let update = FieldUpdate::new().completed(completed);
        let policy = self.policies.toggle;

        if policy.optimistic {
            self.tasks.set_completed(id, completed);
        }

        if let Err(err) = self.remote.update_fields(id, &update).await {
            if policy.optimistic && policy.rollback_on_failure {
                // Only undo our own change, not a later toggle
                let still_ours = self.tasks.get(id).map(|t| t.completed()) == Some(completed);
                if still_ours {
                    log::warn!("Rolling back the completion of task {}", id);
                    self.tasks.set_completed(id, previous.completed());
                }
            }
            self.reporter.failure(Operation::Toggle, &err);
            return Err(err);
        }

        if policy.optimistic == false && self.tasks.set_completed(id, completed).is_none() {
            log::warn!("Task {} has been removed while its completion was being changed", id);
        }

        let toggled = self.tasks.get(id)
            .unwrap_or_else(|| previous.merged_with(&update));
        self.reporter.notify(Notice::Toggled { id: id.clone(), completed });
        Ok(Outcome::Committed(toggled))
    }

    /// Delete a task. It is removed from the local collection only once the remote store has deleted it.
    pub async fn remove(&self, id: &TaskId) -> Result<Outcome> {
        let previous = self.known_task(id, Operation::Remove)?;

        self.reported(Operation::Remove, self.remote.delete(id).await)?;

        let removed = self.tasks.remove(id).unwrap_or(previous);
        self.reporter.notify(Notice::Deleted(id.clone()));
        Ok(Outcome::Committed(removed))
    }


    /// Returns the local version of a task, or fails (before any remote call) if it is unknown
    fn known_task(&self, id: &TaskId, operation: Operation) -> Result<Task> {
        match self.tasks.get(id) {
            Some(task) => Ok(task),
            None => Err(self.unknown_task(id, operation)),
        }
    }

    fn unknown_task(&self, id: &TaskId, operation: Operation) -> Error {
        let err = Error::UnknownTask(id.clone());
        self.reporter.failure(operation, &err);
        err
    }

    /// Report a failed remote call
    fn reported<T>(&self, operation: Operation, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            self.reporter.failure(operation, err);
        }
        result
    }
}
