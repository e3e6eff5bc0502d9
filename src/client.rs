//! This module provides a client for the Firestore REST API

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::task::{FieldUpdate, TaskFields, TaskId};
use crate::traits::{RemoteDocument, RemoteStore};


/// A Firestore value. Only the variants tasks use are mapped, other ones are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Value {
    #[serde(skip_serializing_if = "Option::is_none")]
    string_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    boolean_value: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp_value: Option<String>,
}

impl Value {
    fn string(s: &str) -> Self {
        Self { string_value: Some(s.to_string()), ..Self::default() }
    }
    fn boolean(b: bool) -> Self {
        Self { boolean_value: Some(b), ..Self::default() }
    }
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct DocumentBody {
    fields: BTreeMap<&'static str, Value>,
}

impl DocumentBody {
    fn from_fields(fields: &TaskFields) -> Self {
        let mut map = BTreeMap::new();
        map.insert("text", Value::string(&fields.text));
        map.insert("completed", Value::boolean(fields.completed));
        map.insert("deadline", Value::string(&fields.deadline));
        Self { fields: map }
    }

    fn from_update(update: &FieldUpdate) -> Self {
        let mut map = BTreeMap::new();
        if let Some(text) = &update.text {
            map.insert("text", Value::string(text));
        }
        if let Some(completed) = update.completed {
            map.insert("completed", Value::boolean(completed));
        }
        if let Some(deadline) = &update.deadline {
            map.insert("deadline", Value::string(deadline));
        }
        Self { fields: map }
    }
}

/// The last segment of a document resource name (`projects/p/databases/(default)/documents/tasks/ID`)
fn document_id(name: &str) -> Option<TaskId> {
    name.rsplit('/')
        .next()
        .filter(|id| id.is_empty() == false)
        .map(TaskId::from)
}

/// Turn a Firestore document into a task document.
///
/// Missing fields get defaults, so that every document of the collection shows up as a task.
/// Returns `None` (and logs why) only for documents whose ID cannot be read.
fn decode_document(doc: Document) -> Option<RemoteDocument> {
    let id = match document_id(&doc.name) {
        None => {
            log::warn!("Unable to extract a document ID from {:?}, ignoring it", doc.name);
            return None;
        },
        Some(id) => id,
    };

    let text = match doc.fields.get("text").and_then(|v| v.string_value.clone()) {
        None => {
            log::warn!("Document {} has no text, showing it with an empty one", id);
            String::new()
        },
        Some(text) => text,
    };
    let completed = doc.fields.get("completed")
        .and_then(|v| v.boolean_value)
        .unwrap_or(false);
    // A missing deadline is kept as an empty string, that the countdown considers expired
    let deadline = doc.fields.get("deadline")
        .and_then(|v| v.string_value.clone().or_else(|| v.timestamp_value.clone()))
        .unwrap_or_default();

    Some(RemoteDocument {
        id,
        fields: TaskFields { text, completed, deadline },
    })
}


/// A remote store that keeps its tasks in a Firestore collection
pub struct Client {
    /// `.../projects/{project}/databases/(default)/documents/{collection}`
    collection_url: Url,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl Client {
    /// Create a client for a collection on the public Firestore endpoint. This does not start a connection
    pub fn new<S: AsRef<str>>(project_id: S, collection: S) -> Result<Self> {
        Self::with_endpoint(crate::config::FIRESTORE_ENDPOINT, project_id.as_ref(), collection.as_ref())
    }

    /// Create a client on a custom endpoint (e.g. a local Firestore emulator)
    pub fn with_endpoint(endpoint: &str, project_id: &str, collection: &str) -> Result<Self> {
        let mut collection_url = Url::parse(endpoint)?;
        collection_url.path_segments_mut()
            .map_err(|_| Error::Config(format!("{} cannot be used as a base URL", endpoint)))?
            .pop_if_empty()
            .extend(&["projects", project_id, "databases", "(default)", "documents", collection]);

        Ok(Self {
            collection_url,
            api_key: None,
            http: reqwest::Client::new(),
        })
    }

    /// Build a client from settings read from the environment
    pub fn from_settings(settings: &crate::config::RemoteSettings) -> Result<Self> {
        let client = Self::with_endpoint(&settings.endpoint, &settings.project_id, &settings.collection)?;
        Ok(match &settings.api_key {
            None => client,
            Some(key) => client.with_api_key(key.clone()),
        })
    }

    /// Authenticate requests with a Web API key
    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    fn url_for(&self, id: Option<&TaskId>) -> Result<Url> {
        let mut url = self.collection_url.clone();
        if let Some(id) = id {
            // Pushed as a single segment, so that `?`, `#` or `/` in an ID are escaped
            url.path_segments_mut()
                .map_err(|_| Error::Config(format!("{} cannot be used as a base URL", self.collection_url)))?
                .push(id.as_str());
        }
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() == false {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status { status, body });
        }
        Ok(response)
    }
}

#[async_trait]
impl RemoteStore for Client {
    async fn list_all(&self) -> Result<Vec<RemoteDocument>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.url_for(None)?;
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            log::debug!("Listing documents from {}", self.collection_url);
            let response = self.http.get(url).send().await?;
            let text = Self::check_status(response).await?.text().await?;
            let page: ListResponse = serde_json::from_str(&text)?;

            documents.extend(page.documents.into_iter().filter_map(decode_document));

            match page.next_page_token {
                Some(token) if token.is_empty() == false => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    async fn create(&self, fields: &TaskFields) -> Result<TaskId> {
        let body = serde_json::to_string(&DocumentBody::from_fields(fields))?;

        let response = self.http
            .post(self.url_for(None)?)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let text = Self::check_status(response).await?.text().await?;

        let doc: Document = serde_json::from_str(&text)?;
        document_id(&doc.name)
            .ok_or_else(|| Error::Unavailable(format!("created document has no usable name ({:?})", doc.name)))
    }

    async fn update_fields(&self, id: &TaskId, update: &FieldUpdate) -> Result<()> {
        let mut url = self.url_for(Some(id))?;
        {
            let mut query = url.query_pairs_mut();
            for path in update.field_paths() {
                query.append_pair("updateMask.fieldPaths", path);
            }
            // Without this, PATCH would silently create a missing document
            query.append_pair("currentDocument.exists", "true");
        }
        let body = serde_json::to_string(&DocumentBody::from_update(update))?;

        let response = self.http
            .patch(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<()> {
        let response = self.http
            .delete(self.url_for(Some(id))?)
            .send()
            .await?;
        Self::check_status(response).await?;
        Ok(())
    }
}
