//! # firekit-types
//!
//! Shared types for the firekit platform wrappers.
//!
//! This crate provides the foundational types used across all firekit crates:
//! - [`Value`], [`Fields`] - The document store's value model
//! - [`DocumentRef`], [`DocumentSnapshot`] - Document identity and reads
//! - [`Message`] - Push message payloads for the messaging service
//! - [`PathError`] - Path validation errors

#![warn(missing_docs)]
#![warn(clippy::all)]

mod document;
mod error;
mod message;
mod value;

pub use document::{
    new_document_id, validate_collection_path, DocumentRef, DocumentSnapshot, MAX_PATH_BYTES,
};
pub use error::PathError;
pub use message::{
    AndroidConfig, AndroidNotification, AndroidPriority, ApnsConfig, FcmOptions, Message,
    Notification, Target, WebpushConfig,
};
pub use value::{fields_from_json, get_field, Fields, Value};
