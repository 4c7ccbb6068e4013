//! Mock messaging client for testing.
//!
//! Records sent messages and allows injecting failures.

use super::{Messaging, MessagingError};
use async_trait::async_trait;
use firekit_types::{Message, Target};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock messaging client for testing.
///
/// Clones share state, so a test can keep one handle while a
/// [`Sender`](crate::Sender) owns another.
#[derive(Debug, Default, Clone)]
pub struct MockMessaging {
    inner: Arc<Mutex<MockMessagingInner>>,
}

#[derive(Debug, Default)]
struct MockMessagingInner {
    sent_messages: Vec<Message>,
    validated: usize,
    next_id: u64,
    fail_next_send: Option<String>,
    rejected_tokens: HashSet<String>,
    latency: Duration,
    in_flight: usize,
    max_in_flight: usize,
}

impl MockMessaging {
    /// Create a new mock client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all messages that were delivered.
    pub fn sent_messages(&self) -> Vec<Message> {
        let inner = self.inner.lock().unwrap();
        inner.sent_messages.clone()
    }

    /// Get the last message that was delivered.
    pub fn last_sent(&self) -> Option<Message> {
        let inner = self.inner.lock().unwrap();
        inner.sent_messages.last().cloned()
    }

    /// Number of dry-run validations.
    pub fn validated_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.validated
    }

    /// Cause the next send to fail with the given reason.
    pub fn fail_next_send(&self, reason: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_send = Some(reason.to_string());
    }

    /// Fail every message addressed to `token` with `Unregistered`.
    pub fn reject_token(&self, token: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.rejected_tokens.insert(token.to_string());
    }

    /// Delay every send by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.latency = latency;
    }

    /// Highest number of sends observed in flight at once.
    pub fn max_concurrent_sends(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.max_in_flight
    }

    /// Clear all state (messages, failures, latency).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockMessagingInner::default();
    }

    async fn deliver(&self, message: &Message, dry_run: bool) -> Result<String, MessagingError> {
        let latency = {
            let mut inner = self.inner.lock().unwrap();
            inner.in_flight += 1;
            inner.max_in_flight = inner.max_in_flight.max(inner.in_flight);
            inner.latency
        };

        // Lock released while sleeping so sends overlap
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut inner = self.inner.lock().unwrap();
        inner.in_flight -= 1;

        if let Some(reason) = inner.fail_next_send.take() {
            return Err(MessagingError::SendFailed(reason));
        }
        if let Target::Token(token) = &message.target {
            if inner.rejected_tokens.contains(token) {
                return Err(MessagingError::Unregistered(token.clone()));
            }
        }

        if dry_run {
            inner.validated += 1;
            return Ok("projects/mock/messages/fake_message_id".to_string());
        }

        inner.next_id += 1;
        inner.sent_messages.push(message.clone());
        Ok(format!("projects/mock/messages/{}", inner.next_id))
    }
}

#[async_trait]
impl Messaging for MockMessaging {
    async fn send(&self, message: &Message) -> Result<String, MessagingError> {
        self.deliver(message, false).await
    }

    async fn send_dry_run(&self, message: &Message) -> Result<String, MessagingError> {
        self.deliver(message, true).await
    }
}
