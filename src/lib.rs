//! This crate keeps a list of deadline-bound tasks, stored in a remote document store, with a live countdown to each deadline.
//!
//! Remote stores implement the [`RemoteStore`](traits::RemoteStore) trait. The [`client`] module provides one for Firestore, and [`mock_store`] an in-memory one.
//!
//! A [`Provider`] keeps a local [`TaskCollection`](collection::TaskCollection) consistent with a remote store: it is the only way to mutate it. \
//! A [`Scheduler`](countdown::scheduler::Scheduler) reads this collection, and keeps a "time remaining" label of each task up to date.

pub mod traits;
pub mod error;
pub use error::{Error, Result};

mod task;
pub use task::{parse_deadline, parse_deadline_in, FieldUpdate, Task, TaskFields, TaskId};
pub mod collection;
pub mod provider;
pub use provider::Provider;
pub use provider::outcome::{InputProblem, Outcome};
pub mod countdown;

pub mod client;
pub mod mock_store;

pub mod config;
pub mod utils;

/// A [`Provider`] backed by a Firestore collection
pub type FirestoreProvider = Provider<client::Client>;
