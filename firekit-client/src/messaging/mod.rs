//! Push messaging abstraction.
//!
//! [`Messaging`] is the seam between the [`Sender`](crate::Sender) and the
//! platform: [`FcmClient`] talks to the REST API, [`MockMessaging`] records
//! messages in memory for tests.
//!
//! # Example
//!
//! ```ignore
//! let client = new_messaging_client(&app)?;
//! let id = client.send(&Message::to_topic("news")).await?;
//! ```

mod fcm;
mod mock;

pub use fcm::FcmClient;
pub use mock::MockMessaging;

use crate::app::App;
use async_trait::async_trait;
use firekit_types::Message;
use thiserror::Error;

/// Messaging errors.
///
/// Service failures are classified by the platform's error code.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// Client could not be created.
    #[error("messaging client: {0}")]
    Client(String),

    /// Message was rejected as malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Registration token is no longer valid.
    #[error("registration token is not registered: {0}")]
    Unregistered(String),

    /// Token belongs to a different sender.
    #[error("sender id mismatch: {0}")]
    SenderIdMismatch(String),

    /// Sending rate exceeded.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Service temporarily unavailable.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Service internal error.
    #[error("internal server error: {0}")]
    Internal(String),

    /// APNs or web push credentials were rejected.
    #[error("third-party authentication error: {0}")]
    ThirdPartyAuth(String),

    /// Access token rejected.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Any other failed response.
    #[error("request failed with status {code}: {message}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Service message.
        message: String,
    },

    /// Transport failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be understood.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Injected failure from [`MockMessaging`].
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// A push messaging client.
///
/// Implementations must be `Send + Sync`; one client is shared by every
/// concurrent send.
#[async_trait]
pub trait Messaging: Send + Sync {
    /// Send a message and return the platform's message id
    /// (e.g. `projects/p/messages/123`).
    async fn send(&self, message: &Message) -> Result<String, MessagingError>;

    /// Validate a message without delivering it.
    async fn send_dry_run(&self, message: &Message) -> Result<String, MessagingError>;
}

/// Create a messaging client bound to `app`.
///
/// # Errors
///
/// Returns [`MessagingError::Client`] if the app has no project id.
pub fn new_messaging_client(app: &App) -> Result<FcmClient, MessagingError> {
    FcmClient::from_app(app)
}
