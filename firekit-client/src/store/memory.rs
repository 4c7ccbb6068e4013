//! In-memory document store.
//!
//! Useful for tests and offline runs. Queries are evaluated with
//! [`Query::execute`], which follows the platform's value ordering.

use super::{BackendError, DocumentStore};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use firekit_core::Query;
use firekit_types::{validate_collection_path, DocumentRef, DocumentSnapshot, Fields};
use std::sync::{Arc, Mutex};

/// Concurrent in-memory [`DocumentStore`].
///
/// Clones share the same documents.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    docs: Arc<DashMap<DocumentRef, StoredDocument>>,
    state: Arc<Mutex<StoreState>>,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    fields: Fields,
    create_time: String,
    update_time: String,
}

#[derive(Debug, Default)]
struct StoreState {
    query: Option<BackendError>,
    create: Option<BackendError>,
    get: Option<BackendError>,
    set: Option<BackendError>,
    delete: Option<BackendError>,
    clock: u64,
}

impl StoreState {
    /// Monotonic fake timestamp, one second per write.
    fn tick(&mut self) -> String {
        self.clock += 1;
        let secs = self.clock;
        format!(
            "1970-01-01T{:02}:{:02}:{:02}Z",
            (secs / 3600) % 24,
            (secs / 60) % 60,
            secs % 60
        )
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Remove every document.
    pub fn clear(&self) {
        self.docs.clear();
    }

    /// Cause the next query to fail with `error`.
    pub fn fail_next_query(&self, error: BackendError) {
        self.state.lock().unwrap().query = Some(error);
    }

    /// Cause the next create to fail with `error`.
    pub fn fail_next_create(&self, error: BackendError) {
        self.state.lock().unwrap().create = Some(error);
    }

    /// Cause the next get to fail with `error`.
    pub fn fail_next_get(&self, error: BackendError) {
        self.state.lock().unwrap().get = Some(error);
    }

    /// Cause the next set to fail with `error`.
    pub fn fail_next_set(&self, error: BackendError) {
        self.state.lock().unwrap().set = Some(error);
    }

    /// Cause the next delete to fail with `error`.
    pub fn fail_next_delete(&self, error: BackendError) {
        self.state.lock().unwrap().delete = Some(error);
    }

    fn take_failure(
        &self,
        slot: fn(&mut StoreState) -> &mut Option<BackendError>,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        match slot(&mut state).take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn now(&self) -> String {
        self.state.lock().unwrap().tick()
    }

    fn snapshot(reference: &DocumentRef, stored: &StoredDocument) -> DocumentSnapshot {
        let mut snapshot = DocumentSnapshot::new(reference.clone(), stored.fields.clone());
        snapshot.create_time = Some(stored.create_time.clone());
        snapshot.update_time = Some(stored.update_time.clone());
        snapshot
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn run_query(&self, query: &Query) -> Result<Vec<DocumentSnapshot>, BackendError> {
        self.take_failure(|f| &mut f.query)?;
        validate_collection_path(&query.collection)?;
        query.validate()?;

        let candidates: Vec<DocumentSnapshot> = self
            .docs
            .iter()
            .filter(|entry| entry.key().collection_path() == query.collection)
            .map(|entry| Self::snapshot(entry.key(), entry.value()))
            .collect();
        Ok(query.execute(candidates))
    }

    async fn create(&self, doc: &DocumentRef, fields: &Fields) -> Result<(), BackendError> {
        self.take_failure(|f| &mut f.create)?;
        let now = self.now();
        match self.docs.entry(doc.clone()) {
            Entry::Occupied(_) => {
                Err(BackendError::AlreadyExists(doc.path().to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert(StoredDocument {
                    fields: fields.clone(),
                    create_time: now.clone(),
                    update_time: now,
                });
                Ok(())
            }
        }
    }

    async fn get(&self, doc: &DocumentRef) -> Result<DocumentSnapshot, BackendError> {
        self.take_failure(|f| &mut f.get)?;
        self.docs
            .get(doc)
            .map(|stored| Self::snapshot(doc, &stored))
            .ok_or_else(|| BackendError::NotFound(doc.path().to_string()))
    }

    async fn set(&self, doc: &DocumentRef, fields: &Fields) -> Result<(), BackendError> {
        self.take_failure(|f| &mut f.set)?;
        let now = self.now();
        self.docs
            .entry(doc.clone())
            .and_modify(|stored| {
                stored.fields = fields.clone();
                stored.update_time = now.clone();
            })
            .or_insert_with(|| StoredDocument {
                fields: fields.clone(),
                create_time: now.clone(),
                update_time: now.clone(),
            });
        Ok(())
    }

    async fn delete(&self, doc: &DocumentRef) -> Result<(), BackendError> {
        self.take_failure(|f| &mut f.delete)?;
        self.docs
            .remove(doc)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(doc.path().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firekit_core::{Direction, Filter, Operator};
    use firekit_types::Value;

    fn fields(pairs: &[(&str, Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn doc(path: &str) -> DocumentRef {
        DocumentRef::parse(path).unwrap()
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = MemoryStore::new();
        store
            .create(&doc("users/alice"), &fields(&[("age", 31.into())]))
            .await
            .unwrap();

        let snap = store.get(&doc("users/alice")).await.unwrap();
        assert_eq!(snap.get("age"), Some(&Value::Integer(31)));
        assert!(snap.create_time.is_some());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn create_twice_is_already_exists() {
        let store = MemoryStore::new();
        store.create(&doc("users/alice"), &Fields::new()).await.unwrap();
        let err = store.create(&doc("users/alice"), &Fields::new()).await.unwrap_err();
        assert!(matches!(err, BackendError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn set_overwrites_and_keeps_create_time() {
        let store = MemoryStore::new();
        let alice = doc("users/alice");
        store
            .create(&alice, &fields(&[("age", 31.into()), ("city", "Oslo".into())]))
            .await
            .unwrap();
        let before = store.get(&alice).await.unwrap();

        store.set(&alice, &fields(&[("age", 32.into())])).await.unwrap();
        let after = store.get(&alice).await.unwrap();

        assert_eq!(after.get("age"), Some(&Value::Integer(32)));
        // set replaces, it does not merge
        assert_eq!(after.get("city"), None);
        assert_eq!(after.create_time, before.create_time);
        assert_ne!(after.update_time, before.update_time);
    }

    #[tokio::test]
    async fn missing_documents_are_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get(&doc("users/ghost")).await,
            Err(BackendError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(&doc("users/ghost")).await,
            Err(BackendError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn query_sees_only_its_collection() {
        let store = MemoryStore::new();
        store
            .create(&doc("users/alice"), &fields(&[("age", 31.into())]))
            .await
            .unwrap();
        store
            .create(&doc("users/bob"), &fields(&[("age", 25.into())]))
            .await
            .unwrap();
        store
            .create(&doc("users/alice/posts/p1"), &fields(&[("age", 99.into())]))
            .await
            .unwrap();

        let query = Query::collection("users")
            .where_field("age", Operator::GreaterThan, 20)
            .order_by("age", Direction::Ascending);
        let docs = store.run_query(&query).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["bob", "alice"]);

        let posts = store
            .run_query(&Query::collection("users/alice/posts").filter(Filter::equal("age", 99)))
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
    }

    #[tokio::test]
    async fn injected_failures_are_one_shot() {
        let store = MemoryStore::new();
        store.fail_next_query(BackendError::Unavailable("down".into()));

        let err = store.run_query(&Query::collection("users")).await.unwrap_err();
        assert!(matches!(err, BackendError::Unavailable(_)));
        assert!(store.run_query(&Query::collection("users")).await.is_ok());

        store.fail_next_delete(BackendError::PermissionDenied("no".into()));
        store.create(&doc("users/alice"), &Fields::new()).await.unwrap();
        assert!(store.delete(&doc("users/alice")).await.is_err());
        assert!(store.delete(&doc("users/alice")).await.is_ok());
    }

    #[tokio::test]
    async fn clones_share_documents() {
        let store = MemoryStore::new();
        let clone = store.clone();
        clone.create(&doc("users/alice"), &Fields::new()).await.unwrap();
        assert!(!store.is_empty());
        store.clear();
        assert!(clone.is_empty());
    }
}
