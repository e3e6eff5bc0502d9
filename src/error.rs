//! Errors returned by remote stores and by the [`Provider`](crate::Provider)

use crate::task::TaskId;

/// Everything that can go wrong while talking to a remote store
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP request could not be sent, or its response could not be read
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered, but not with a success status
    #[error("unexpected HTTP status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The server answered with a body we could not make sense of
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The operation targets a task that is not in the local collection
    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    /// The store refused the call (e.g. a mocked outage)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
