//! Document store access.
//!
//! [`DocumentStore`] is the seam between the query helpers and a backend:
//! [`FirestoreClient`] talks to the REST API, [`MemoryStore`] keeps documents
//! in memory for tests and offline use.
//!
//! The helpers in this module ([`find_one_by_field`], [`add`], ...) each make
//! one backend call and map the outcome to a [`StoreError`].

mod firestore;
mod helpers;
mod memory;
mod wire;

pub use firestore::FirestoreClient;
pub use helpers::{
    add, delete, find_all_by_field, find_all_by_field_and_order, find_all_by_two_fields,
    find_from_array, find_one_by_field, find_one_by_two_fields, get, get_all, get_all_by_order,
    update,
};
pub use memory::MemoryStore;

use crate::app::App;
use async_trait::async_trait;
use firekit_core::{Query, QueryError};
use firekit_types::{DocumentRef, DocumentSnapshot, Fields, PathError};
use thiserror::Error;

/// Errors reported by a store backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Document already exists.
    #[error("document already exists: {0}")]
    AlreadyExists(String),

    /// Caller lacks permission.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Access token rejected.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Request rejected as malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Request needs something that is missing (e.g. an index).
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// Service temporarily unavailable.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Any other failed response.
    #[error("request failed with status {code} ({status}): {message}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Canonical status name.
        status: String,
        /// Service message.
        message: String,
    },

    /// Transport failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be understood.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Invalid document or collection path.
    #[error("invalid path: {0}")]
    Path(#[from] PathError),

    /// Query rejected before execution.
    #[error("invalid query: {0}")]
    Query(#[from] QueryError),

    /// Client is misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Errors returned by the store helpers.
///
/// Sentinels keep the backend error as their [`source`](std::error::Error::source).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store client could not be created.
    #[error("error getting a new client instance")]
    Client(#[source] BackendError),

    /// Query execution failed.
    #[error("error getting documents snapshots")]
    QueryFailed(#[source] BackendError),

    /// No document matched.
    #[error("document not found")]
    NotFound,

    /// Collection or document path is malformed.
    #[error("ID is not in its proper form")]
    InvalidId(#[source] PathError),

    /// The backend refused the operation.
    #[error("attempted action is not allowed")]
    Forbidden(#[source] BackendError),

    /// Insert failed.
    #[error("adding document: {0}")]
    Add(BackendError),

    /// Re-fetch after insert failed.
    #[error("getting document snapshot: {0}")]
    Fetch(BackendError),

    /// Overwrite failed.
    #[error("updating document: {0}")]
    Update(BackendError),
}

/// A document store backend.
///
/// Every method is a single round trip.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a query and return matching documents in result order.
    async fn run_query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, BackendError>;

    /// Create a document. Fails with `AlreadyExists` if it exists.
    async fn create(&self, doc: &DocumentRef, fields: &Fields) -> Result<(), BackendError>;

    /// Read one document. Fails with `NotFound` if it is missing.
    async fn get(&self, doc: &DocumentRef) -> Result<DocumentSnapshot, BackendError>;

    /// Create or fully overwrite a document.
    async fn set(&self, doc: &DocumentRef, fields: &Fields) -> Result<(), BackendError>;

    /// Delete a document.
    async fn delete(&self, doc: &DocumentRef) -> Result<(), BackendError>;
}

/// Create a document store client bound to `app`.
///
/// # Errors
///
/// Returns [`StoreError::Client`] if the app has no project id or an empty
/// database id.
pub fn new_store_client(app: &App) -> Result<FirestoreClient, StoreError> {
    FirestoreClient::from_app(app).map_err(StoreError::Client)
}
