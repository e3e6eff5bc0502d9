//! An in-memory remote store, used to test code that needs a [`RemoteStore`] without a network

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::task::{FieldUpdate, TaskFields, TaskId};
use crate::traits::{RemoteDocument, RemoteStore};

/// A call that has reached a [`MockStore`]
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    ListAll,
    Create(TaskFields),
    UpdateFields(TaskId, FieldUpdate),
    Delete(TaskId),
}

/// The four calls of a [`RemoteStore`], regardless of their arguments
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
    ListAll,
    Create,
    UpdateFields,
    Delete,
}

impl Call {
    pub fn kind(&self) -> CallKind {
        match self {
            Call::ListAll => CallKind::ListAll,
            Call::Create(_) => CallKind::Create,
            Call::UpdateFields(_, _) => CallKind::UpdateFields,
            Call::Delete(_) => CallKind::Delete,
        }
    }
}

/// A remote store that keeps its documents in memory.
///
/// Its calls can be made to fail (see [`MockStore::fail_next`]), or be held until [`MockStore::release`] is called.
pub struct MockStore {
    documents: Mutex<Vec<RemoteDocument>>,
    /// How many of the next calls of each kind will fail
    failures: Mutex<HashMap<CallKind, u32>>,
    calls: Mutex<Vec<Call>>,
    /// Assigned in order to created documents when not empty, instead of random IDs
    next_ids: Mutex<Vec<TaskId>>,
    held: watch::Sender<bool>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    pub fn new() -> Self {
        let (held, _) = watch::channel(false);
        Self {
            documents: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            next_ids: Mutex::new(Vec::new()),
            held,
        }
    }

    /// A store that already contains some documents
    pub fn with_documents(documents: Vec<RemoteDocument>) -> Self {
        let store = Self::new();
        *store.documents.lock().unwrap() = documents;
        store
    }

    /// Make the next `count` calls of this kind fail with [`Error::Unavailable`], after they have been recorded
    pub fn fail_next(&self, kind: CallKind, count: u32) {
        *self.failures.lock().unwrap().entry(kind).or_insert(0) += count;
    }

    /// Let every call succeed again
    pub fn stop_failing(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Make the next created documents get these IDs, in this order
    pub fn queue_ids<I: IntoIterator<Item = TaskId>>(&self, ids: I) {
        self.next_ids.lock().unwrap().extend(ids);
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn documents(&self) -> Vec<RemoteDocument> {
        self.documents.lock().unwrap().clone()
    }

    pub fn document(&self, id: &TaskId) -> Option<TaskFields> {
        self.documents.lock().unwrap().iter()
            .find(|doc| &doc.id == id)
            .map(|doc| doc.fields.clone())
    }

    /// Make every following call wait until [`Self::release`] is called
    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    /// Let held calls (and the following ones) go through
    pub fn release(&self) {
        self.held.send_replace(false);
    }

    /// Record a call, wait while the store is held, then tell whether the call should fail
    async fn enter(&self, call: Call) -> Result<()> {
        let kind = call.kind();
        self.calls.lock().unwrap().push(call);

        let mut held = self.held.subscribe();
        loop {
            let is_held = *held.borrow_and_update();
            if is_held == false {
                break;
            }
            if held.changed().await.is_err() {
                break;
            }
        }

        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(&kind) {
            Some(left) if *left > 0 => {
                *left -= 1;
                Err(Error::Unavailable(format!("mocked failure of {:?}", kind)))
            },
            _ => Ok(()),
        }
    }

    fn new_id(&self) -> TaskId {
        let mut next_ids = self.next_ids.lock().unwrap();
        if next_ids.is_empty() {
            TaskId::from(Uuid::new_v4().to_simple().to_string())
        } else {
            next_ids.remove(0)
        }
    }
}

#[async_trait]
impl RemoteStore for MockStore {
    async fn list_all(&self) -> Result<Vec<RemoteDocument>> {
        self.enter(Call::ListAll).await?;
        Ok(self.documents())
    }

    async fn create(&self, fields: &TaskFields) -> Result<TaskId> {
        self.enter(Call::Create(fields.clone())).await?;

        let id = self.new_id();
        self.documents.lock().unwrap().push(RemoteDocument { id: id.clone(), fields: fields.clone() });
        Ok(id)
    }

    async fn update_fields(&self, id: &TaskId, update: &FieldUpdate) -> Result<()> {
        self.enter(Call::UpdateFields(id.clone(), update.clone())).await?;

        let mut documents = self.documents.lock().unwrap();
        match documents.iter_mut().find(|doc| &doc.id == id) {
            None => Err(Error::Unavailable(format!("no document {}", id))),
            Some(doc) => {
                update.apply_to(&mut doc.fields);
                Ok(())
            }
        }
    }

    async fn delete(&self, id: &TaskId) -> Result<()> {
        self.enter(Call::Delete(id.clone())).await?;

        let mut documents = self.documents.lock().unwrap();
        let len_before = documents.len();
        documents.retain(|doc| &doc.id != id);
        if documents.len() == len_before {
            return Err(Error::Unavailable(format!("no document {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fields(text: &str) -> TaskFields {
        TaskFields::new(text.to_string(), "2030-01-01T09:00".to_string())
    }

    #[tokio::test]
    async fn test_mock_store_crud() {
        let store = MockStore::new();
        store.queue_ids(vec![TaskId::from("abc123")]);

        let id = store.create(&fields("Buy milk")).await.unwrap();
        assert_eq!(id, TaskId::from("abc123"));
        let other = store.create(&fields("Pay rent")).await.unwrap();
        assert_ne!(other, id);

        store.update_fields(&id, &FieldUpdate::new().completed(true)).await.unwrap();
        assert_eq!(store.document(&id).unwrap().completed, true);

        store.delete(&id).await.unwrap();
        assert!(store.delete(&id).await.is_err());
        assert_eq!(store.list_all().await.unwrap().len(), 1);
        assert_eq!(store.calls().len(), 6);
    }

    #[tokio::test]
    async fn test_mock_store_failures() {
        let store = MockStore::new();
        store.fail_next(CallKind::Create, 2);

        assert!(matches!(store.create(&fields("Buy milk")).await, Err(Error::Unavailable(_))));
        // Other calls are not affected
        assert!(store.list_all().await.is_ok());
        assert!(store.create(&fields("Buy milk")).await.is_err());
        assert!(store.documents().is_empty());
        assert!(store.create(&fields("Buy milk")).await.is_ok());

        // Failed calls are recorded too
        let kinds: Vec<CallKind> = store.calls().iter().map(Call::kind).collect();
        assert_eq!(kinds, vec![CallKind::Create, CallKind::ListAll, CallKind::Create, CallKind::Create]);

        store.fail_next(CallKind::Delete, 5);
        store.stop_failing();
        assert!(store.list_all().await.is_ok());
    }
}
