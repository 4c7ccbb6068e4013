//! Document store client for the Firestore REST v1 API.

use super::wire::{encode_fields, RunQueryRequest, RunQueryRow, WireDocument, WriteBody};
use super::{BackendError, DocumentStore};
use crate::app::{AccessToken, App};
use crate::rest::ApiError;
use async_trait::async_trait;
use firekit_core::Query;
use firekit_types::{validate_collection_path, DocumentRef, DocumentSnapshot, Fields};
use reqwest::{RequestBuilder, Response, StatusCode, Url};

/// Document store client.
///
/// Cheap to clone; clones share the app's connection pool.
#[derive(Debug, Clone)]
pub struct FirestoreClient {
    http: reqwest::Client,
    /// Service endpoint; resource paths are appended segment by segment.
    endpoint: Url,
    /// `projects/{p}/databases/{d}/documents`
    documents_root: String,
    token: AccessToken,
}

impl FirestoreClient {
    /// Build a client from an initialized app.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Configuration`] if the app has no project id
    /// or an empty database id.
    pub fn from_app(app: &App) -> Result<Self, BackendError> {
        let project = app
            .project_id()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                BackendError::Configuration(
                    "project id is required to access the document store".into(),
                )
            })?;
        if app.database_id().is_empty() {
            return Err(BackendError::Configuration(
                "database id must not be empty".into(),
            ));
        }
        let endpoint = app.firestore_endpoint();
        let base = Url::parse(&endpoint.base)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                BackendError::Configuration(format!("invalid endpoint {}", endpoint.base))
            })?;
        Ok(Self {
            http: app.http().clone(),
            endpoint: base,
            documents_root: format!(
                "projects/{}/databases/{}/documents",
                project,
                app.database_id()
            ),
            token: endpoint.token.clone(),
        })
    }

    /// Resource name prefix of every document, `projects/{p}/databases/{d}/documents`.
    pub fn documents_root(&self) -> &str {
        &self.documents_root
    }

    /// URL of `path` under the documents root, with an optional `:method`
    /// suffix. Every segment is percent-encoded, so ids cannot escape into
    /// the query, the fragment or a sibling resource.
    fn resource_url(&self, path: &str, method: Option<&str>) -> Url {
        let mut segments: Vec<String> = std::iter::once("v1")
            .chain(self.documents_root.split('/'))
            .chain(path.split('/').filter(|s| !s.is_empty()))
            .map(str::to_string)
            .collect();
        if let (Some(method), Some(last)) = (method, segments.last_mut()) {
            last.push(':');
            last.push_str(method);
        }

        let mut url = self.endpoint.clone();
        if let Ok(mut path_segments) = url.path_segments_mut() {
            path_segments.pop_if_empty().extend(&segments);
        }
        url
    }

    /// Send a request and turn non-2xx answers into [`BackendError`].
    async fn execute(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.bearer_auth(self.token.secret()).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = error_from_response(status, &body);
        tracing::warn!("Document store request failed: {}", err);
        Err(err)
    }

    async fn read_document(&self, response: Response) -> Result<DocumentSnapshot, BackendError> {
        let doc: WireDocument = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        doc.into_snapshot(&self.documents_root)
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn run_query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, BackendError> {
        validate_collection_path(&query.collection)?;
        query.validate()?;

        // Nested collections are queried under their parent document
        let (parent, collection_id) = match query.collection.rsplit_once('/') {
            Some((parent_doc, id)) => (parent_doc, id),
            None => ("", query.collection.as_str()),
        };
        let url = self.resource_url(parent, Some("runQuery"));
        tracing::debug!("POST {} (collection={})", url, query.collection);

        let response = self
            .execute(
                self.http
                    .post(url)
                    .json(&RunQueryRequest::new(query, collection_id)),
            )
            .await?;
        let rows: Vec<RunQueryRow> = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        rows.into_iter()
            .filter_map(|row| row.document)
            .map(|doc| doc.into_snapshot(&self.documents_root))
            .collect()
    }

    async fn create(&self, doc: &DocumentRef, fields: &Fields) -> Result<(), BackendError> {
        let url = self.resource_url(doc.collection_path(), None);
        tracing::debug!("POST {} (documentId={})", url, doc.id());
        self.execute(
            self.http
                .post(url)
                .query(&[("documentId", doc.id())])
                .json(&WriteBody {
                    fields: encode_fields(fields),
                }),
        )
        .await?;
        Ok(())
    }

    async fn get(&self, doc: &DocumentRef) -> Result<DocumentSnapshot, BackendError> {
        let url = self.resource_url(doc.path(), None);
        tracing::debug!("GET {}", url);
        let response = self.execute(self.http.get(url)).await?;
        self.read_document(response).await
    }

    async fn set(&self, doc: &DocumentRef, fields: &Fields) -> Result<(), BackendError> {
        let url = self.resource_url(doc.path(), None);
        tracing::debug!("PATCH {}", url);
        self.execute(self.http.patch(url).json(&WriteBody {
            fields: encode_fields(fields),
        }))
        .await?;
        Ok(())
    }

    async fn delete(&self, doc: &DocumentRef) -> Result<(), BackendError> {
        let url = self.resource_url(doc.path(), None);
        tracing::debug!("DELETE {}", url);
        self.execute(self.http.delete(url)).await?;
        Ok(())
    }
}

fn error_from_response(status: StatusCode, body: &str) -> BackendError {
    let error = ApiError::parse(status, body);
    match error.status.as_str() {
        "NOT_FOUND" => BackendError::NotFound(error.message),
        "ALREADY_EXISTS" => BackendError::AlreadyExists(error.message),
        "PERMISSION_DENIED" => BackendError::PermissionDenied(error.message),
        "UNAUTHENTICATED" => BackendError::Unauthenticated(error.message),
        "INVALID_ARGUMENT" => BackendError::InvalidArgument(error.message),
        "FAILED_PRECONDITION" => BackendError::FailedPrecondition(error.message),
        "UNAVAILABLE" => BackendError::Unavailable(error.message),
        _ => BackendError::Status {
            code: error.code,
            status: error.status,
            message: error.message,
        },
    }
}
