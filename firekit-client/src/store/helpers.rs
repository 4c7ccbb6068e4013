//! Query and mutation helpers.
//!
//! Every read helper maps its outcome the same way:
//! - backend `PermissionDenied` becomes [`StoreError::Forbidden`]
//! - any other backend failure becomes [`StoreError::QueryFailed`]
//! - an empty result becomes [`StoreError::NotFound`]
//! - a malformed collection path becomes [`StoreError::InvalidId`]

use super::{BackendError, DocumentStore, StoreError};
use firekit_core::{Direction, Filter, Query};
use firekit_types::{
    new_document_id, validate_collection_path, DocumentRef, DocumentSnapshot, Fields, Value,
};

fn read_error(err: BackendError) -> StoreError {
    match err {
        e @ BackendError::PermissionDenied(_) => StoreError::Forbidden(e),
        e => StoreError::QueryFailed(e),
    }
}

/// Validate, execute and map a query. Never returns an empty vector.
async fn run<S>(store: &S, query: Query) -> Result<Vec<DocumentSnapshot>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    validate_collection_path(&query.collection).map_err(StoreError::InvalidId)?;
    query
        .validate()
        .map_err(|e| StoreError::QueryFailed(BackendError::Query(e)))?;

    let docs = store.run_query(&query).await.map_err(|e| {
        tracing::debug!("Query on {} failed: {}", query.collection, e);
        read_error(e)
    })?;
    if docs.is_empty() {
        return Err(StoreError::NotFound);
    }
    Ok(docs)
}

async fn first<S>(store: &S, query: Query) -> Result<DocumentSnapshot, StoreError>
where
    S: DocumentStore + ?Sized,
{
    run(store, query.limit(1))
        .await?
        .into_iter()
        .next()
        .ok_or(StoreError::NotFound)
}

/// First document in `collection` matching `filter`.
pub async fn find_one_by_field<S>(
    store: &S,
    collection: &str,
    filter: Filter,
) -> Result<DocumentSnapshot, StoreError>
where
    S: DocumentStore + ?Sized,
{
    first(store, Query::collection(collection).filter(filter)).await
}

/// First document in `collection` matching both filters.
pub async fn find_one_by_two_fields<S>(
    store: &S,
    collection: &str,
    first_filter: Filter,
    second_filter: Filter,
) -> Result<DocumentSnapshot, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let query = Query::collection(collection)
        .filter(first_filter)
        .filter(second_filter);
    first(store, query).await
}

/// All documents in `collection` matching `filter`.
pub async fn find_all_by_field<S>(
    store: &S,
    collection: &str,
    filter: Filter,
) -> Result<Vec<DocumentSnapshot>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    run(store, Query::collection(collection).filter(filter)).await
}

/// All documents in `collection` matching both filters.
pub async fn find_all_by_two_fields<S>(
    store: &S,
    collection: &str,
    first_filter: Filter,
    second_filter: Filter,
) -> Result<Vec<DocumentSnapshot>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let query = Query::collection(collection)
        .filter(first_filter)
        .filter(second_filter);
    run(store, query).await
}

/// All documents in `collection` matching `filter`, ordered by `order_field`.
pub async fn find_all_by_field_and_order<S>(
    store: &S,
    collection: &str,
    filter: Filter,
    order_field: &str,
    direction: Direction,
) -> Result<Vec<DocumentSnapshot>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let query = Query::collection(collection)
        .filter(filter)
        .order_by(order_field, direction);
    run(store, query).await
}

/// All documents in `collection` whose array `field` contains `value`.
pub async fn find_from_array<S>(
    store: &S,
    collection: &str,
    field: &str,
    value: impl Into<Value>,
) -> Result<Vec<DocumentSnapshot>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let query = Query::collection(collection).filter(Filter::array_contains(field, value));
    run(store, query).await
}

/// Every document in `collection`.
pub async fn get_all<S>(store: &S, collection: &str) -> Result<Vec<DocumentSnapshot>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    run(store, Query::collection(collection)).await
}

/// Every document in `collection`, ordered by `order_field`.
pub async fn get_all_by_order<S>(
    store: &S,
    collection: &str,
    order_field: &str,
    direction: Direction,
) -> Result<Vec<DocumentSnapshot>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    run(
        store,
        Query::collection(collection).order_by(order_field, direction),
    )
    .await
}

/// Fetch one document by reference.
pub async fn get<S>(store: &S, doc: &DocumentRef) -> Result<DocumentSnapshot, StoreError>
where
    S: DocumentStore + ?Sized,
{
    store.get(doc).await.map_err(|e| match e {
        BackendError::NotFound(_) => StoreError::NotFound,
        other => read_error(other),
    })
}

/// Insert `fields` under a generated id, then read the document back.
///
/// # Errors
///
/// [`StoreError::Add`] if the insert fails, [`StoreError::Fetch`] if the
/// read-back fails.
pub async fn add<S>(
    store: &S,
    collection: &str,
    fields: &Fields,
) -> Result<DocumentSnapshot, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let doc = DocumentRef::new(collection, &new_document_id()).map_err(StoreError::InvalidId)?;
    store.create(&doc, fields).await.map_err(StoreError::Add)?;
    tracing::debug!("Added document {}", doc);
    store.get(&doc).await.map_err(StoreError::Fetch)
}

/// Overwrite the fields of `doc`. Fields not in `fields` are removed.
pub async fn update<S>(store: &S, doc: &DocumentRef, fields: &Fields) -> Result<(), StoreError>
where
    S: DocumentStore + ?Sized,
{
    store.set(doc, fields).await.map_err(StoreError::Update)
}

/// Delete `doc`. The backend's error is returned unchanged.
pub async fn delete<S>(store: &S, doc: &DocumentRef) -> Result<(), BackendError>
where
    S: DocumentStore + ?Sized,
{
    store.delete(doc).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use firekit_core::Operator;
    use std::error::Error as _;

    fn fields(pairs: &[(&str, Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        let rows = [
            ("users/alice", "Oslo", 31, vec!["admin", "dev"]),
            ("users/bob", "Bergen", 25, vec!["dev"]),
            ("users/carol", "Oslo", 40, vec!["ops"]),
        ];
        for (path, city, age, roles) in rows {
            store
                .create(
                    &DocumentRef::parse(path).unwrap(),
                    &fields(&[
                        ("city", city.into()),
                        ("age", age.into()),
                        ("roles", roles.into()),
                    ]),
                )
                .await
                .unwrap();
        }
        store
    }

    fn ids(docs: &[DocumentSnapshot]) -> Vec<&str> {
        docs.iter().map(|d| d.id()).collect()
    }

    // ===========================================
    // Read helpers
    // ===========================================

    #[tokio::test]
    async fn find_one_returns_first_match() {
        let store = seeded().await;
        let doc = find_one_by_field(&store, "users", Filter::equal("city", "Oslo"))
            .await
            .unwrap();
        assert_eq!(doc.id(), "alice");
    }

    #[tokio::test]
    async fn find_one_by_two_fields_needs_both() {
        let store = seeded().await;
        let doc = find_one_by_two_fields(
            &store,
            "users",
            Filter::equal("city", "Oslo"),
            Filter::new("age", Operator::GreaterThan, 35),
        )
        .await
        .unwrap();
        assert_eq!(doc.id(), "carol");
    }

    #[tokio::test]
    async fn find_all_variants() {
        let store = seeded().await;

        let docs = find_all_by_field(&store, "users", Filter::new("age", Operator::LessThan, 35))
            .await
            .unwrap();
        assert_eq!(ids(&docs), vec!["alice", "bob"]);

        let docs = find_all_by_two_fields(
            &store,
            "users",
            Filter::equal("city", "Oslo"),
            Filter::array_contains("roles", "admin"),
        )
        .await
        .unwrap();
        assert_eq!(ids(&docs), vec!["alice"]);

        let docs = find_all_by_field_and_order(
            &store,
            "users",
            Filter::equal("city", "Oslo"),
            "age",
            Direction::Descending,
        )
        .await
        .unwrap();
        assert_eq!(ids(&docs), vec!["carol", "alice"]);
    }

    #[tokio::test]
    async fn find_from_array_matches_elements() {
        let store = seeded().await;
        let docs = find_from_array(&store, "users", "roles", "dev").await.unwrap();
        assert_eq!(ids(&docs), vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn get_all_and_ordered() {
        let store = seeded().await;
        assert_eq!(get_all(&store, "users").await.unwrap().len(), 3);

        let docs = get_all_by_order(&store, "users", "age", Direction::Ascending)
            .await
            .unwrap();
        assert_eq!(ids(&docs), vec!["bob", "alice", "carol"]);
    }

    #[tokio::test]
    async fn empty_results_are_not_found() {
        let store = seeded().await;
        let nobody = || Filter::equal("city", "Trondheim");

        assert!(matches!(
            find_one_by_field(&store, "users", nobody()).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            find_one_by_two_fields(&store, "users", nobody(), nobody()).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            find_all_by_field(&store, "users", nobody()).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            find_all_by_two_fields(&store, "users", nobody(), nobody()).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            find_all_by_field_and_order(&store, "users", nobody(), "age", Direction::Ascending)
                .await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            find_from_array(&store, "users", "roles", "nobody").await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            get_all(&store, "teams").await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            get_all_by_order(&store, "teams", "name", Direction::Ascending).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn backend_failure_is_query_failed_with_source() {
        let store = seeded().await;
        store.fail_next_query(BackendError::Unavailable("backend down".into()));

        let err = get_all(&store, "users").await.unwrap_err();
        assert_eq!(err.to_string(), "error getting documents snapshots");
        assert!(matches!(
            &err,
            StoreError::QueryFailed(BackendError::Unavailable(_))
        ));
        assert!(err.source().unwrap().to_string().contains("backend down"));
    }

    #[tokio::test]
    async fn permission_denied_is_forbidden() {
        let store = seeded().await;
        store.fail_next_query(BackendError::PermissionDenied("rules".into()));

        let err = find_all_by_field(&store, "users", Filter::equal("city", "Oslo"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
        assert_eq!(err.to_string(), "attempted action is not allowed");
    }

    #[tokio::test]
    async fn bad_collection_path_is_invalid_id() {
        let store = seeded().await;
        for collection in ["users/alice", "", "__reserved__"] {
            let err = get_all(&store, collection).await.unwrap_err();
            assert!(
                matches!(err, StoreError::InvalidId(_)),
                "{collection:?} gave {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn invalid_query_fails_before_backend() {
        let store = seeded().await;
        // operand must be an array
        let err = find_all_by_field(&store, "users", Filter::new("age", Operator::In, 25))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::QueryFailed(BackendError::Query(_))
        ));
    }

    #[tokio::test]
    async fn get_maps_missing_and_forbidden() {
        let store = seeded().await;
        let alice = DocumentRef::parse("users/alice").unwrap();
        assert_eq!(get(&store, &alice).await.unwrap().id(), "alice");

        let ghost = DocumentRef::parse("users/ghost").unwrap();
        assert!(matches!(get(&store, &ghost).await, Err(StoreError::NotFound)));

        store.fail_next_get(BackendError::PermissionDenied("rules".into()));
        assert!(matches!(
            get(&store, &alice).await,
            Err(StoreError::Forbidden(_))
        ));
    }

    // ===========================================
    // Mutations
    // ===========================================

    #[tokio::test]
    async fn add_returns_snapshot_of_new_document() {
        let store = MemoryStore::new();
        let snap = add(&store, "users", &fields(&[("name", "dave".into())]))
            .await
            .unwrap();

        assert_eq!(snap.id().len(), 20);
        assert_eq!(snap.reference.collection_path(), "users");
        assert_eq!(snap.get("name"), Some(&Value::String("dave".into())));

        let fetched = get(&store, &snap.reference).await.unwrap();
        assert_eq!(fetched.reference, snap.reference);
    }

    #[tokio::test]
    async fn add_errors_are_wrapped() {
        let store = MemoryStore::new();

        store.fail_next_create(BackendError::Unavailable("down".into()));
        let err = add(&store, "users", &Fields::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Add(_)));
        assert!(err.to_string().starts_with("adding document: "));

        store.fail_next_get(BackendError::Unavailable("down".into()));
        let err = add(&store, "users", &Fields::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Fetch(_)));
        assert!(err.to_string().starts_with("getting document snapshot: "));

        let err = add(&store, "users/alice", &Fields::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(_)));
    }

    #[tokio::test]
    async fn update_overwrites_fields() {
        let store = seeded().await;
        let bob = DocumentRef::parse("users/bob").unwrap();

        update(&store, &bob, &fields(&[("age", 26.into())]))
            .await
            .unwrap();

        let snap = get(&store, &bob).await.unwrap();
        assert_eq!(snap.get("age"), Some(&Value::Integer(26)));
        assert_eq!(snap.get("city"), None);

        store.fail_next_set(BackendError::Unavailable("down".into()));
        let err = update(&store, &bob, &Fields::new()).await.unwrap_err();
        assert!(err.to_string().starts_with("updating document: "));
    }

    #[tokio::test]
    async fn delete_passes_backend_error_through() {
        let store = seeded().await;
        let bob = DocumentRef::parse("users/bob").unwrap();
        delete(&store, &bob).await.unwrap();

        let err = delete(&store, &bob).await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(ref path) if path == "users/bob"));
    }

    #[tokio::test]
    async fn helpers_accept_trait_objects() {
        let store = seeded().await;
        let dyn_store: &dyn DocumentStore = &store;
        assert_eq!(get_all(dyn_store, "users").await.unwrap().len(), 3);
    }
}
