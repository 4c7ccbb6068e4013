//! Application handle.
//!
//! [`initialize_app`] resolves credentials, validates endpoints and builds the
//! shared HTTP client. The service clients are derived from the resulting
//! [`App`].

use crate::config::{AppConfig, ClientOptions, Credentials};
use crate::messaging::{FcmClient, MessagingError};
use crate::store::{FirestoreClient, StoreError};
use reqwest::Url;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Token the local emulator accepts for unrestricted access.
pub const EMULATOR_TOKEN: &str = "owner";

/// Application initialization errors.
#[derive(Debug, Error)]
pub enum AppError {
    /// Any failure while building the handle.
    #[error("error initializing app")]
    Initialization {
        /// What went wrong.
        #[from]
        source: InitError,
    },
}

/// Causes of [`AppError::Initialization`].
#[derive(Debug, Error)]
pub enum InitError {
    /// Credential variable is not set.
    #[error("credential variable {0} is not set")]
    MissingCredentials(String),

    /// Resolved access token is empty.
    #[error("access token is empty")]
    EmptyToken,

    /// Endpoint URL is malformed or not http(s).
    #[error("invalid {name} endpoint {url:?}: {reason}")]
    InvalidEndpoint {
        /// Which endpoint.
        name: &'static str,
        /// The configured value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Emulator credentials without an emulator host would send the
    /// `owner` token to the production endpoints.
    #[error("emulator credentials require firestore_emulator_host")]
    EmulatorHostRequired,

    /// HTTP client could not be built.
    #[error("building http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct AccessToken(String);

impl AccessToken {
    pub(crate) fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub(crate) fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Base URL and token for one service.
#[derive(Debug, Clone)]
pub(crate) struct Endpoint {
    /// Base URL without trailing slash.
    pub(crate) base: String,
    pub(crate) token: AccessToken,
}

/// Handle to an initialized application.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

struct AppInner {
    project_id: Option<String>,
    database_id: String,
    http: reqwest::Client,
    firestore: Endpoint,
    messaging: Endpoint,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("project_id", &self.inner.project_id)
            .field("database_id", &self.inner.database_id)
            .field("firestore", &self.inner.firestore.base)
            .field("messaging", &self.inner.messaging.base)
            .finish()
    }
}

/// Initialize the application from config and client options.
///
/// # Errors
///
/// Returns [`AppError::Initialization`] if the credentials cannot be
/// resolved, an endpoint is invalid, or the HTTP client cannot be built.
/// A missing project id is not an error here.
///
/// [`Credentials::Emulator`] requires `firestore_emulator_host`. The
/// messaging endpoint has no emulator and receives the `owner` token as is.
pub fn initialize_app(config: AppConfig, options: ClientOptions) -> Result<App, AppError> {
    if config.credentials == Credentials::Emulator && options.firestore_emulator_host.is_none() {
        return Err(InitError::EmulatorHostRequired.into());
    }
    let token = resolve_token(&config.credentials)?;

    let messaging_base = validate_endpoint("messaging", &options.messaging_endpoint)?;
    let firestore = match &options.firestore_emulator_host {
        Some(host) => Endpoint {
            base: validate_endpoint("firestore emulator", &format!("http://{host}"))?,
            token: AccessToken::new(EMULATOR_TOKEN),
        },
        None => Endpoint {
            base: validate_endpoint("firestore", &options.firestore_endpoint)?,
            token: token.clone(),
        },
    };

    let mut builder = reqwest::Client::builder().user_agent(options.user_agent.as_str());
    if let Some(timeout) = options.timeout() {
        builder = builder.timeout(timeout);
    }
    let http = builder.build().map_err(InitError::HttpClient)?;

    tracing::info!(
        "Initialized app: project={:?} database={} firestore={}",
        config.project_id,
        config.database_id,
        firestore.base
    );

    Ok(App {
        inner: Arc::new(AppInner {
            project_id: config.project_id,
            database_id: config.database_id,
            http,
            firestore,
            messaging: Endpoint {
                base: messaging_base,
                token,
            },
        }),
    })
}

fn resolve_token(credentials: &Credentials) -> Result<AccessToken, InitError> {
    let token = match credentials {
        Credentials::AccessToken { token } => token.clone(),
        Credentials::Environment { var } => {
            std::env::var(var).map_err(|_| InitError::MissingCredentials(var.clone()))?
        }
        Credentials::Emulator => EMULATOR_TOKEN.to_string(),
    };
    let token = token.trim();
    if token.is_empty() {
        return Err(InitError::EmptyToken);
    }
    Ok(AccessToken::new(token))
}

fn validate_endpoint(name: &'static str, raw: &str) -> Result<String, InitError> {
    let invalid = |reason: String| InitError::InvalidEndpoint {
        name,
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed".to_string()));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

impl App {
    /// Configured project id, if any.
    pub fn project_id(&self) -> Option<&str> {
        self.inner.project_id.as_deref()
    }

    /// Document database id.
    pub fn database_id(&self) -> &str {
        &self.inner.database_id
    }

    /// Messaging client bound to this app. See [`crate::new_messaging_client`].
    pub fn messaging(&self) -> Result<FcmClient, MessagingError> {
        crate::messaging::new_messaging_client(self)
    }

    /// Document store client bound to this app. See [`crate::new_store_client`].
    pub fn firestore(&self) -> Result<FirestoreClient, StoreError> {
        crate::store::new_store_client(self)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    pub(crate) fn firestore_endpoint(&self) -> &Endpoint {
        &self.inner.firestore
    }

    pub(crate) fn messaging_endpoint(&self) -> &Endpoint {
        &self.inner.messaging
    }
}
