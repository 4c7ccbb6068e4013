//! # firekit-core
//!
//! Pure query logic for firekit.
//!
//! Nothing in this crate performs I/O. It describes collection queries
//! (filters, ordering, limit), checks them against the document store's
//! rules, and evaluates them over in-memory snapshots using the store's
//! value ordering.
//!
//! ## Example
//!
//! ```
//! use firekit_core::{Direction, Filter, Operator, Query};
//!
//! let query = Query::collection("users")
//!     .filter(Filter::new("age", Operator::GreaterThan, 30))
//!     .order_by("age", Direction::Descending)
//!     .limit(1);
//! assert!(query.validate().is_ok());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ordering;
pub mod query;

pub use ordering::compare_values;
pub use query::{Direction, Filter, Operator, Order, Query, QueryError, MAX_DISJUNCTION_VALUES};
