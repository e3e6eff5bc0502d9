use async_trait::async_trait;

use crate::error::Result;
use crate::task::{FieldUpdate, TaskFields, TaskId};

/// A document as listed by a [`RemoteStore`]
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteDocument {
    pub id: TaskId,
    pub fields: TaskFields,
}

/// A schema-less document collection that holds the authoritative tasks
#[async_trait]
pub trait RemoteStore {
    /// Returns every document of the collection.
    /// This may be a long process, or can even fail (e.g. in case of a remote server)
    async fn list_all(&self) -> Result<Vec<RemoteDocument>>;

    /// Create a new document. The store picks and returns its ID
    async fn create(&self, fields: &TaskFields) -> Result<TaskId>;

    /// Overwrite only the fields that `update` names, in an existing document
    async fn update_fields(&self, id: &TaskId, update: &FieldUpdate) -> Result<()>;

    /// Delete a document
    async fn delete(&self, id: &TaskId) -> Result<()>;
}
