//! # firekit-client
//!
//! Typed wrappers around the platform's push messaging and document store
//! services.
//!
//! ## Features
//!
//! - **App initialization**: credentials, endpoints and one shared HTTP client
//! - **Push sender**: sends through any [`Messaging`] client and counts deliveries
//! - **Store helpers**: find/add/update/delete with uniform error sentinels
//! - **Test doubles**: [`MockMessaging`] and [`MemoryStore`]
//!
//! ## Example
//!
//! ```ignore
//! use firekit_client::{initialize_app, store, AppConfig, ClientOptions, Sender};
//! use firekit_core::Filter;
//! use firekit_types::Message;
//!
//! let app = initialize_app(AppConfig::new("my-project"), ClientOptions::default())?;
//!
//! let sender = Sender::new(app.messaging()?);
//! sender.send_push(&Message::to_topic("news").with_notification("Hi", "there")).await?;
//!
//! let db = app.firestore()?;
//! let user = store::find_one_by_field(&db, "users", Filter::equal("email", "a@b.c")).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod config;
pub mod messaging;
mod rest;
pub mod sender;
pub mod store;

pub use app::{initialize_app, App, AppError, InitError};
pub use config::{AppConfig, ClientOptions, Config, ConfigError, Credentials};
pub use messaging::{new_messaging_client, FcmClient, Messaging, MessagingError, MockMessaging};
pub use sender::Sender;
pub use store::{
    new_store_client, BackendError, DocumentStore, FirestoreClient, MemoryStore, StoreError,
};
