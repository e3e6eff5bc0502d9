//! Support for library configuration options

use std::sync::{Arc, Mutex};
use std::time::Duration;

use once_cell::sync::Lazy;

use crate::countdown::Units;
use crate::error::{Error, Result};

/// Name of the remote collection tasks are stored in.
/// Feel free to override it when initing this library.
pub static COLLECTION_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("tasks".to_string())));

/// How often the countdown labels are recomputed
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Base URL of the Firestore REST API
pub const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com/v1/";

/// Current value of [`COLLECTION_NAME`]
pub fn collection_name() -> String {
    match COLLECTION_NAME.lock() {
        Ok(name) => name.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}


/// Settings to reach a remote store, read from the environment
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteSettings {
    pub project_id: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub endpoint: String,
    pub units: Units,
}

impl RemoteSettings {
    /// Read the settings from `COUNTDOWN_TASKS_*` environment variables.
    ///
    /// Only `COUNTDOWN_TASKS_PROJECT_ID` is required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|value| value.trim().is_empty() == false);

        let project_id = non_empty("COUNTDOWN_TASKS_PROJECT_ID")
            .ok_or_else(|| Error::Config("COUNTDOWN_TASKS_PROJECT_ID is not set".to_string()))?;

        let units = match non_empty("COUNTDOWN_TASKS_LOCALE").as_deref() {
            None | Some("en") => Units::ENGLISH,
            Some("id") => Units::INDONESIAN,
            Some(other) => return Err(Error::Config(format!("unsupported locale {:?}", other))),
        };

        Ok(Self {
            project_id,
            api_key: non_empty("COUNTDOWN_TASKS_API_KEY"),
            collection: non_empty("COUNTDOWN_TASKS_COLLECTION").unwrap_or_else(collection_name),
            endpoint: non_empty("COUNTDOWN_TASKS_ENDPOINT").unwrap_or_else(|| FIRESTORE_ENDPOINT.to_string()),
            units,
        })
    }
}
