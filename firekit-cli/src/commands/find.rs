//! Query a collection through the find helpers.

use anyhow::{Context, Result};
use clap::Args;
use firekit_client::{store, DocumentStore};
use firekit_core::{Direction, Filter, Operator};
use firekit_types::{DocumentSnapshot, Value};

use super::{print_json, snapshot_json, Backend};

/// Arguments of the `find` command.
#[derive(Args, Debug)]
pub struct FindArgs {
    /// Collection path
    pub collection: String,

    /// Filter as "field op value", e.g. "age >= 18" (at most twice)
    #[arg(long = "where", value_name = "FILTER")]
    pub filters: Vec<String>,

    /// Array membership filter as field=value
    #[arg(long, conflicts_with = "filters")]
    pub contains: Option<String>,

    /// Order as field[:asc|desc]
    #[arg(long)]
    pub order: Option<String>,

    /// Print only the first match
    #[arg(long, conflicts_with_all = ["order", "contains"])]
    pub first: bool,
}

/// Run the find command.
pub async fn run(backend: &Backend, args: &FindArgs) -> Result<()> {
    let store = backend.store()?;
    let docs = query(store.as_ref(), args)
        .await
        .with_context(|| format!("Failed to query {}", args.collection))?;
    let rendered: Vec<serde_json::Value> = docs.iter().map(snapshot_json).collect();
    if args.first {
        if let Some(doc) = rendered.into_iter().next() {
            print_json(&doc)?;
        }
        return Ok(());
    }
    print_json(&serde_json::Value::Array(rendered))
}

/// Pick the helper matching the given flags.
pub async fn query(store: &dyn DocumentStore, args: &FindArgs) -> Result<Vec<DocumentSnapshot>> {
    let collection = args.collection.as_str();

    if let Some(contains) = &args.contains {
        let (field, value) = contains
            .split_once('=')
            .with_context(|| format!("--contains must be FIELD=VALUE: {}", contains))?;
        return Ok(store::find_from_array(store, collection, field.trim(), parse_value(value)).await?);
    }

    let filters = args
        .filters
        .iter()
        .map(|f| parse_filter(f))
        .collect::<Result<Vec<_>>>()?;
    let order = args.order.as_deref().map(parse_order).transpose()?;

    let docs = match (filters.as_slice(), order, args.first) {
        ([], None, _) => store::get_all(store, collection).await?,
        ([], Some((field, dir)), _) => store::get_all_by_order(store, collection, &field, dir).await?,
        ([f], None, true) => vec![store::find_one_by_field(store, collection, f.clone()).await?],
        ([f], None, false) => store::find_all_by_field(store, collection, f.clone()).await?,
        ([f], Some((field, dir)), _) => {
            store::find_all_by_field_and_order(store, collection, f.clone(), &field, dir).await?
        }
        ([a, b], None, true) => vec![
            store::find_one_by_two_fields(store, collection, a.clone(), b.clone()).await?,
        ],
        ([a, b], None, false) => {
            store::find_all_by_two_fields(store, collection, a.clone(), b.clone()).await?
        }
        ([_, _], Some(_), _) => anyhow::bail!("--order can only be combined with one --where"),
        _ => anyhow::bail!("At most two --where filters are supported"),
    };
    Ok(docs)
}

/// Parse `"field op value"`. The value is read as JSON when possible.
pub fn parse_filter(raw: &str) -> Result<Filter> {
    let raw = raw.trim();
    let (field, rest) = raw
        .split_once(char::is_whitespace)
        .with_context(|| format!("Filter must be \"field op value\": {}", raw))?;
    let (op, value) = rest
        .trim_start()
        .split_once(char::is_whitespace)
        .with_context(|| format!("Filter must be \"field op value\": {}", raw))?;
    let op: Operator = op.parse()?;
    Ok(Filter::new(field, op, parse_value(value)))
}

/// Parse `field[:asc|desc]`.
pub fn parse_order(raw: &str) -> Result<(String, Direction)> {
    match raw.rsplit_once(':') {
        Some((field, dir)) => Ok((field.to_string(), dir.parse()?)),
        None => Ok((raw.to_string(), Direction::Ascending)),
    }
}

/// JSON literal if it parses, otherwise the raw string.
pub fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();
    serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from_json)
        .unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use firekit_client::{MemoryStore, StoreError};
    use firekit_types::{DocumentRef, Fields};

    fn args(collection: &str) -> FindArgs {
        FindArgs {
            collection: collection.to_string(),
            filters: Vec::new(),
            contains: None,
            order: None,
            first: false,
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for (id, city, age) in [("alice", "Oslo", 31), ("bob", "Bergen", 25), ("carol", "Oslo", 40)] {
            let mut fields = Fields::new();
            fields.insert("city".into(), city.into());
            fields.insert("age".into(), age.into());
            fields.insert("tags".into(), vec![city.to_lowercase()].into());
            store
                .create(&DocumentRef::new("users", id).unwrap(), &fields)
                .await
                .unwrap();
        }
        store
    }

    fn ids(docs: &[DocumentSnapshot]) -> Vec<&str> {
        docs.iter().map(|d| d.id()).collect()
    }

    #[test]
    fn filter_values_prefer_json() {
        let filter = parse_filter("age >= 18").unwrap();
        assert_eq!(filter.field, "age");
        assert_eq!(filter.op, Operator::GreaterThanOrEqual);
        assert_eq!(filter.value, Value::Integer(18));

        let filter = parse_filter("city == New York").unwrap();
        assert_eq!(filter.value, Value::String("New York".into()));

        let filter = parse_filter(r#"role in ["admin", "ops"]"#).unwrap();
        assert_eq!(filter.op, Operator::In);
        assert!(matches!(filter.value, Value::Array(ref v) if v.len() == 2));
    }

    #[test]
    fn malformed_filters_are_rejected() {
        assert!(parse_filter("age").is_err());
        assert!(parse_filter("age >=").is_err());
        assert!(parse_filter("age ~= 3").is_err());
    }

    #[test]
    fn order_defaults_to_ascending() {
        assert_eq!(
            parse_order("age").unwrap(),
            ("age".to_string(), Direction::Ascending)
        );
        assert_eq!(
            parse_order("age:desc").unwrap(),
            ("age".to_string(), Direction::Descending)
        );
        assert!(parse_order("age:sideways").is_err());
    }

    #[tokio::test]
    async fn dispatches_to_matching_helper() {
        let store = seeded().await;

        let docs = query(&store, &args("users")).await.unwrap();
        assert_eq!(ids(&docs), vec!["alice", "bob", "carol"]);

        let docs = query(
            &store,
            &FindArgs {
                filters: vec!["city == Oslo".into()],
                order: Some("age:desc".into()),
                ..args("users")
            },
        )
        .await
        .unwrap();
        assert_eq!(ids(&docs), vec!["carol", "alice"]);

        let docs = query(
            &store,
            &FindArgs {
                filters: vec!["city == Oslo".into(), "age < 35".into()],
                first: true,
                ..args("users")
            },
        )
        .await
        .unwrap();
        assert_eq!(ids(&docs), vec!["alice"]);

        let docs = query(
            &store,
            &FindArgs {
                contains: Some("tags=bergen".into()),
                ..args("users")
            },
        )
        .await
        .unwrap();
        assert_eq!(ids(&docs), vec!["bob"]);
    }

    #[tokio::test]
    async fn too_many_filters_and_empty_results() {
        let store = seeded().await;
        let err = query(
            &store,
            &FindArgs {
                filters: vec!["a == 1".into(), "b == 2".into(), "c == 3".into()],
                ..args("users")
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("At most two"));

        let err = query(
            &store,
            &FindArgs {
                filters: vec!["city == Trondheim".into()],
                ..args("users")
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NotFound)
        ));
    }
}
