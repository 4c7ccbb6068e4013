//! Collection queries.
//!
//! A [`Query`] names a collection, zero or more [`Filter`]s (combined with
//! AND), an optional ordering and an optional limit. It can be checked with
//! [`Query::validate`] and evaluated over in-memory snapshots with
//! [`Query::execute`]. Remote backends translate it to their own wire form.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use firekit_types::{
    get_field, validate_collection_path, DocumentSnapshot, Fields, PathError, Value,
};
use thiserror::Error;

use crate::ordering::{compare_values, type_rank, values_equal};

/// Maximum number of values in an `in`, `not-in` or `array-contains-any` operand.
pub const MAX_DISJUNCTION_VALUES: usize = 30;

/// Query construction errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Collection path is malformed.
    #[error("invalid collection: {0}")]
    Path(#[from] PathError),

    /// Operator string is not recognised.
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// Direction string is not recognised.
    #[error("unknown direction: {0}")]
    UnknownDirection(String),

    /// A filter or order names an empty field path.
    #[error("empty field path")]
    EmptyField,

    /// Operator needs an array operand of bounded size.
    #[error("operator {op} needs an array of 1 to {max} values")]
    InvalidDisjunction {
        /// The offending operator.
        op: Operator,
        /// Upper bound on operand size.
        max: usize,
    },

    /// More than one array-membership filter.
    #[error("only one array-contains or array-contains-any filter is allowed")]
    MultipleArrayFilters,

    /// More than one negation filter.
    #[error("only one != or not-in filter is allowed")]
    MultipleNegations,

    /// `in` and `not-in` in the same query.
    #[error("in and not-in cannot be combined")]
    InWithNotIn,

    /// Limit of zero.
    #[error("limit must be greater than zero")]
    ZeroLimit,
}

/// Comparison operator of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `array-contains`
    ArrayContains,
    /// `array-contains-any`
    ArrayContainsAny,
    /// `in`
    In,
    /// `not-in`
    NotIn,
}

impl Operator {
    /// The operator's string form, as accepted by [`Operator::from_str`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::ArrayContains => "array-contains",
            Operator::ArrayContainsAny => "array-contains-any",
            Operator::In => "in",
            Operator::NotIn => "not-in",
        }
    }

    fn takes_array_operand(&self) -> bool {
        matches!(
            self,
            Operator::In | Operator::NotIn | Operator::ArrayContainsAny
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "==" => Operator::Equal,
            "!=" => Operator::NotEqual,
            "<" => Operator::LessThan,
            "<=" => Operator::LessThanOrEqual,
            ">" => Operator::GreaterThan,
            ">=" => Operator::GreaterThanOrEqual,
            "array-contains" => Operator::ArrayContains,
            "array-contains-any" => Operator::ArrayContainsAny,
            "in" => Operator::In,
            "not-in" => Operator::NotIn,
            other => return Err(QueryError::UnknownOperator(other.to_string())),
        })
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

impl FromStr for Direction {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Ascending),
            "desc" | "descending" => Ok(Direction::Descending),
            other => Err(QueryError::UnknownDirection(other.to_string())),
        }
    }
}

/// A single field condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Dotted field path.
    pub field: String,
    /// Comparison operator.
    pub op: Operator,
    /// Operand.
    pub value: Value,
}

impl Filter {
    /// Create a filter.
    pub fn new(field: &str, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            op,
            value: value.into(),
        }
    }

    /// Shorthand for an equality filter.
    pub fn equal(field: &str, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Equal, value)
    }

    /// Shorthand for an array-membership filter.
    pub fn array_contains(field: &str, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::ArrayContains, value)
    }

    /// Whether the document fields satisfy this filter.
    ///
    /// A document that lacks the field never matches.
    pub fn matches(&self, fields: &Fields) -> bool {
        let Some(actual) = get_field(fields, &self.field) else {
            return false;
        };
        let operand = &self.value;

        match self.op {
            Operator::Equal => values_equal(actual, operand),
            Operator::NotEqual => {
                !matches!(actual, Value::Null) && !values_equal(actual, operand)
            }
            Operator::LessThan => same_class_cmp(actual, operand) == Some(Ordering::Less),
            Operator::LessThanOrEqual => matches!(
                same_class_cmp(actual, operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::GreaterThan => same_class_cmp(actual, operand) == Some(Ordering::Greater),
            Operator::GreaterThanOrEqual => matches!(
                same_class_cmp(actual, operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::ArrayContains => actual
                .as_array()
                .is_some_and(|items| items.iter().any(|item| values_equal(item, operand))),
            Operator::ArrayContainsAny => {
                let (Some(items), Some(candidates)) = (actual.as_array(), operand.as_array())
                else {
                    return false;
                };
                items
                    .iter()
                    .any(|item| candidates.iter().any(|c| values_equal(item, c)))
            }
            Operator::In => operand
                .as_array()
                .is_some_and(|candidates| candidates.iter().any(|c| values_equal(actual, c))),
            Operator::NotIn => {
                !matches!(actual, Value::Null)
                    && operand.as_array().is_some_and(|candidates| {
                        !candidates.iter().any(|c| values_equal(actual, c))
                    })
            }
        }
    }
}

/// Range comparisons only hold between values of the same type class.
fn same_class_cmp(actual: &Value, operand: &Value) -> Option<Ordering> {
    (type_rank(actual) == type_rank(operand)).then(|| compare_values(actual, operand))
}

/// One ordering clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Dotted field path.
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
}

/// A collection query.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Collection path, e.g. `users` or `users/alice/posts`.
    pub collection: String,
    /// Filters, combined with AND.
    pub filters: Vec<Filter>,
    /// Ordering clauses, applied in sequence.
    pub orders: Vec<Order>,
    /// Maximum number of results.
    pub limit: Option<u32>,
}

impl Query {
    /// Start a query over every document in a collection.
    pub fn collection(path: &str) -> Self {
        Self {
            collection: path.trim_matches('/').to_string(),
            filters: Vec::new(),
            orders: Vec::new(),
            limit: None,
        }
    }

    /// Add a filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Shorthand for `filter(Filter::new(field, op, value))`.
    pub fn where_field(self, field: &str, op: Operator, value: impl Into<Value>) -> Self {
        self.filter(Filter::new(field, op, value))
    }

    /// Add an ordering clause.
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.orders.push(Order {
            field: field.to_string(),
            direction,
        });
        self
    }

    /// Cap the number of results.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check the query against the store's structural rules.
    pub fn validate(&self) -> Result<(), QueryError> {
        validate_collection_path(&self.collection)?;

        let mut array_filters = 0;
        let mut negations = 0;
        let mut has_in = false;
        let mut has_not_in = false;

        for filter in &self.filters {
            if filter.field.is_empty() {
                return Err(QueryError::EmptyField);
            }
            if filter.op.takes_array_operand() {
                let size = filter.value.as_array().map(<[Value]>::len).unwrap_or(0);
                if size == 0 || size > MAX_DISJUNCTION_VALUES {
                    return Err(QueryError::InvalidDisjunction {
                        op: filter.op,
                        max: MAX_DISJUNCTION_VALUES,
                    });
                }
            }
            match filter.op {
                Operator::ArrayContains | Operator::ArrayContainsAny => array_filters += 1,
                Operator::NotEqual => negations += 1,
                Operator::NotIn => {
                    negations += 1;
                    has_not_in = true;
                }
                Operator::In => has_in = true,
                _ => {}
            }
        }

        if array_filters > 1 {
            return Err(QueryError::MultipleArrayFilters);
        }
        if negations > 1 {
            return Err(QueryError::MultipleNegations);
        }
        if has_in && has_not_in {
            return Err(QueryError::InWithNotIn);
        }
        if self.orders.iter().any(|o| o.field.is_empty()) {
            return Err(QueryError::EmptyField);
        }
        if self.limit == Some(0) {
            return Err(QueryError::ZeroLimit);
        }
        Ok(())
    }

    /// Evaluate the query over a set of snapshots.
    ///
    /// Snapshots outside the query's collection are ignored. Documents that
    /// lack an ordered field are dropped. Ties sort by document path in the
    /// direction of the last order; unordered queries sort by path ascending.
    pub fn execute<I>(&self, docs: I) -> Vec<DocumentSnapshot>
    where
        I: IntoIterator<Item = DocumentSnapshot>,
    {
        let mut matched: Vec<DocumentSnapshot> = docs
            .into_iter()
            .filter(|doc| doc.reference.collection_path() == self.collection)
            .filter(|doc| self.filters.iter().all(|f| f.matches(&doc.fields)))
            .filter(|doc| {
                self.orders
                    .iter()
                    .all(|o| get_field(&doc.fields, &o.field).is_some())
            })
            .collect();

        matched.sort_by(|a, b| self.compare_docs(a, b));

        if let Some(limit) = self.limit {
            matched.truncate(limit as usize);
        }
        matched
    }

    fn compare_docs(&self, a: &DocumentSnapshot, b: &DocumentSnapshot) -> Ordering {
        for order in &self.orders {
            let (Some(left), Some(right)) = (
                get_field(&a.fields, &order.field),
                get_field(&b.fields, &order.field),
            ) else {
                continue;
            };
            let ord = match order.direction {
                Direction::Ascending => compare_values(left, right),
                Direction::Descending => compare_values(right, left),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        match self.orders.last().map(|o| o.direction) {
            Some(Direction::Descending) => b.reference.cmp(&a.reference),
            _ => a.reference.cmp(&b.reference),
        }
    }
}
