//! Push sender with a delivery counter.

use crate::messaging::{Messaging, MessagingError};
use firekit_types::Message;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sends push messages and counts successful deliveries.
///
/// The counter only moves after the platform confirms a send. No lock is held
/// while a send is in flight, so concurrent `send_push` calls run in parallel.
///
/// # Example
///
/// ```ignore
/// let sender = Sender::new(app.messaging()?);
/// let id = sender.send_push(&Message::to_token(token).with_notification("Hi", "there")).await?;
/// assert_eq!(sender.push_count(), 1);
/// ```
#[derive(Debug)]
pub struct Sender<M> {
    client: M,
    push_count: AtomicU64,
}

impl<M: Messaging> Sender<M> {
    /// Wrap a messaging client. The counter starts at zero.
    pub fn new(client: M) -> Self {
        Self {
            client,
            push_count: AtomicU64::new(0),
        }
    }

    /// Send one message and return the platform's message id.
    ///
    /// # Errors
    ///
    /// Returns the client's error unchanged; the counter is not touched.
    pub async fn send_push(&self, message: &Message) -> Result<String, MessagingError> {
        match self.client.send(message).await {
            Ok(id) => {
                let count = self.push_count.fetch_add(1, Ordering::AcqRel) + 1;
                tracing::debug!(
                    "Push sent to {}: {} (count={})",
                    message.target.kind(),
                    id,
                    count
                );
                Ok(id)
            }
            Err(e) => {
                tracing::debug!("Push to {} failed: {}", message.target.kind(), e);
                Err(e)
            }
        }
    }

    /// Validate a message with a dry run. Never counted.
    pub async fn validate(&self, message: &Message) -> Result<String, MessagingError> {
        self.client.send_dry_run(message).await
    }

    /// Number of successful sends so far.
    pub fn push_count(&self) -> u64 {
        self.push_count.load(Ordering::Acquire)
    }

    /// The wrapped messaging client.
    pub fn client(&self) -> &M {
        &self.client
    }
}
