//! Query translation: filters, sort specs and projections over products.
//!
//! A [`FindQuery`] is built from untrusted input (query string or JSON body),
//! validated against the product field whitelist, and then either translated
//! to MongoDB documents or evaluated in memory. Both paths share one AST so
//! they agree on semantics.

pub mod eval;
pub mod filter;
pub mod parse;
pub mod presets;
pub mod projection;
pub mod sort;

pub use filter::{Field, FieldFilter, Filter, Predicate, RegexPredicate};
pub use projection::Projection;
pub use sort::{SortDirection, SortSpec};

use strum::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Maximum nesting of combinators and `$not`.
pub const MAX_DEPTH: usize = 32;
/// Maximum number of values in `$in` / `$nin`.
pub const MAX_IN_VALUES: usize = 1_000;
/// Upper bound on `limit`.
pub const MAX_LIMIT: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("filter is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("unknown operator '{operator}' on field '{field}'")]
    UnknownOperator { field: String, operator: String },

    #[error("unknown top-level operator '{0}'")]
    UnknownCombinator(String),

    #[error("'{0}' requires a non-empty array of filters")]
    InvalidCombinator(String),

    #[error("filter nesting exceeds {MAX_DEPTH} levels")]
    TooDeep,

    #[error("'{operator}' accepts at most {MAX_IN_VALUES} values, got {count}")]
    TooManyValues { operator: String, count: usize },

    #[error("invalid regex for '{field}': {reason}")]
    InvalidRegex { field: String, reason: String },

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("invalid sort: {0}")]
    InvalidSort(String),

    #[error("invalid projection: {0}")]
    InvalidProjection(String),

    #[error("limit {0} exceeds maximum of {MAX_LIMIT}")]
    LimitTooLarge(u64),
}

impl QueryError {
    /// Short label for rejection metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            QueryError::MalformedJson(_) => "malformed_json",
            QueryError::UnknownField(_) => "unknown_field",
            QueryError::UnknownOperator { .. } | QueryError::UnknownCombinator(_) => {
                "unknown_operator"
            }
            QueryError::InvalidCombinator(_) => "invalid_combinator",
            QueryError::TooDeep => "too_deep",
            QueryError::TooManyValues { .. } => "too_many_values",
            QueryError::InvalidRegex { .. } => "invalid_regex",
            QueryError::InvalidValue { .. } => "invalid_value",
            QueryError::InvalidSort(_) => "invalid_sort",
            QueryError::InvalidProjection(_) => "invalid_projection",
            QueryError::LimitTooLarge(_) => "limit_too_large",
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Fields of a stored product that queries may reference.
///
/// Parsing accepts `id` as an alias of `_id`; display is the stored name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
pub enum ProductField {
    #[strum(to_string = "_id", serialize = "id")]
    Id,
    #[strum(to_string = "title")]
    Title,
    #[strum(to_string = "price")]
    Price,
    #[strum(to_string = "description")]
    Description,
    #[strum(to_string = "createdAt")]
    CreatedAt,
}

/// Value type stored under a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Text,
    Timestamp,
}

impl ProductField {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            ProductField::Price => FieldKind::Number,
            ProductField::CreatedAt => FieldKind::Timestamp,
            ProductField::Id | ProductField::Title | ProductField::Description => FieldKind::Text,
        }
    }

    /// Parse a field name from client input.
    pub fn parse(name: &str) -> QueryResult<Self> {
        name.parse()
            .map_err(|_| QueryError::UnknownField(name.to_string()))
    }
}

/// A complete read request: which products, in what order, which fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub sort: SortSpec,
    pub projection: Projection,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindQuery {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Set the page size; values above [`MAX_LIMIT`] are rejected.
    ///
    /// `0` means no limit, as it does for a MongoDB cursor.
    pub fn limit(mut self, limit: u64) -> QueryResult<Self> {
        if limit > MAX_LIMIT {
            return Err(QueryError::LimitTooLarge(limit));
        }
        self.limit = (limit > 0).then_some(limit);
        Ok(self)
    }

    /// Build from the string forms used in query strings and request bodies.
    pub fn from_parts(
        filter: Option<Filter>,
        sort: Option<&str>,
        fields: Option<&str>,
        skip: Option<u64>,
        limit: Option<u64>,
    ) -> QueryResult<Self> {
        let mut query = FindQuery::new(filter.unwrap_or_default())
            .sort(sort.map(SortSpec::parse).transpose()?.unwrap_or_default())
            .projection(fields.map(Projection::parse).transpose()?.unwrap_or_default())
            .skip(skip.unwrap_or(0));
        if let Some(limit) = limit {
            query = query.limit(limit)?;
        }
        Ok(query)
    }
}
