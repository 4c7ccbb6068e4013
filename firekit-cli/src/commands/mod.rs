//! CLI command implementations.

pub mod find;
pub mod push;
pub mod store;

use anyhow::{Context, Result};
use firekit_client::{App, DocumentStore, MemoryStore};
use firekit_types::{fields_from_json, DocumentSnapshot, Fields};

/// Where commands send their requests.
pub enum Backend {
    /// In-memory messaging and store.
    Mock,
    /// The platform, through an initialized app.
    Platform(App),
}

impl Backend {
    /// Document store for this backend.
    pub fn store(&self) -> Result<Box<dyn DocumentStore>> {
        let store: Box<dyn DocumentStore> = match self {
            Backend::Mock => Box::new(MemoryStore::new()),
            Backend::Platform(app) => {
                Box::new(app.firestore().context("Failed to create store client")?)
            }
        };
        Ok(store)
    }
}

/// Parse a JSON object argument into document fields.
pub fn parse_fields(json: &str) -> Result<Fields> {
    let value: serde_json::Value = serde_json::from_str(json).context("Invalid JSON")?;
    fields_from_json(value).context("Document fields must be a JSON object")
}

/// JSON rendering of a snapshot for output.
pub fn snapshot_json(snapshot: &DocumentSnapshot) -> serde_json::Value {
    serde_json::json!({
        "path": snapshot.reference.path(),
        "data": snapshot.to_json(),
        "create_time": snapshot.create_time,
        "update_time": snapshot.update_time,
    })
}

/// Pretty-print a JSON value to stdout.
pub fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
