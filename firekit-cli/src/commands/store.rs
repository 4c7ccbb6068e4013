//! Single-document commands: get, add, update, delete.

use anyhow::{Context, Result};
use firekit_client::store;
use firekit_types::DocumentRef;

use super::{parse_fields, print_json, snapshot_json, Backend};

fn parse_path(path: &str) -> Result<DocumentRef> {
    DocumentRef::parse(path).with_context(|| format!("Invalid document path: {}", path))
}

/// Run the get command.
pub async fn get(backend: &Backend, path: &str) -> Result<()> {
    let doc = parse_path(path)?;
    let store = backend.store()?;
    let snapshot = store::get(store.as_ref(), &doc)
        .await
        .with_context(|| format!("Failed to get {}", doc))?;
    print_json(&snapshot_json(&snapshot))
}

/// Run the add command.
pub async fn add(backend: &Backend, collection: &str, json: &str) -> Result<()> {
    let fields = parse_fields(json)?;
    let store = backend.store()?;
    let snapshot = store::add(store.as_ref(), collection, &fields)
        .await
        .with_context(|| format!("Failed to add to {}", collection))?;
    print_json(&snapshot_json(&snapshot))
}

/// Run the update command.
pub async fn update(backend: &Backend, path: &str, json: &str) -> Result<()> {
    let doc = parse_path(path)?;
    let fields = parse_fields(json)?;
    let store = backend.store()?;
    store::update(store.as_ref(), &doc, &fields)
        .await
        .with_context(|| format!("Failed to update {}", doc))?;
    println!("Updated: {}", doc);
    Ok(())
}

/// Run the delete command.
pub async fn delete(backend: &Backend, path: &str) -> Result<()> {
    let doc = parse_path(path)?;
    let store = backend.store()?;
    store::delete(store.as_ref(), &doc)
        .await
        .with_context(|| format!("Failed to delete {}", doc))?;
    println!("Deleted: {}", doc);
    Ok(())
}
