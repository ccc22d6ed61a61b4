//! Filter AST, fluent builders and translation to MongoDB documents.

use mongodb::bson::{Bson, Document, doc};
use regex::{Regex, RegexBuilder};

use super::{ProductField, QueryError, QueryResult};

/// A predicate tree over product documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Filter {
    /// `{}`: every document matches
    #[default]
    MatchAll,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    /// No child may match
    Nor(Vec<Filter>),
    Field(FieldFilter),
}

/// One or more operators on a single field, combined conjunctively.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: ProductField,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq(Bson),
    Ne(Bson),
    Gt(Bson),
    Gte(Bson),
    Lt(Bson),
    Lte(Bson),
    In(Vec<Bson>),
    Nin(Vec<Bson>),
    Exists(bool),
    Regex(RegexPredicate),
    /// Inverts the conjunction of the wrapped operators
    Not(Vec<Predicate>),
}

/// A validated `$regex` with its `$options`.
#[derive(Debug, Clone)]
pub struct RegexPredicate {
    pattern: String,
    options: String,
    compiled: Regex,
}

impl PartialEq for RegexPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.options == other.options
    }
}

impl RegexPredicate {
    /// Accepted `$options` flags.
    pub const OPTIONS: &'static str = "imsx";

    /// Compile `pattern` with MongoDB-style `options` (`i`, `m`, `s`, `x`).
    pub fn new(pattern: &str, options: &str) -> Result<Self, String> {
        let mut builder = RegexBuilder::new(pattern);
        for flag in options.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                other => return Err(format!("unsupported regex option '{other}'")),
            };
        }
        let compiled = builder.build().map_err(|e| e.to_string())?;
        Ok(Self {
            pattern: pattern.to_string(),
            options: options.to_string(),
            compiled,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn options(&self) -> &str {
        &self.options
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.compiled.is_match(text)
    }
}

impl Predicate {
    /// Operator name as it appears in a filter document.
    pub fn operator(&self) -> &'static str {
        match self {
            Predicate::Eq(_) => "$eq",
            Predicate::Ne(_) => "$ne",
            Predicate::Gt(_) => "$gt",
            Predicate::Gte(_) => "$gte",
            Predicate::Lt(_) => "$lt",
            Predicate::Lte(_) => "$lte",
            Predicate::In(_) => "$in",
            Predicate::Nin(_) => "$nin",
            Predicate::Exists(_) => "$exists",
            Predicate::Regex(_) => "$regex",
            Predicate::Not(_) => "$not",
        }
    }

    /// Write this operator into an operator document.
    fn write_into(&self, ops: &mut Document) {
        match self {
            Predicate::Eq(v)
            | Predicate::Ne(v)
            | Predicate::Gt(v)
            | Predicate::Gte(v)
            | Predicate::Lt(v)
            | Predicate::Lte(v) => {
                ops.insert(self.operator(), v.clone());
            }
            Predicate::In(values) | Predicate::Nin(values) => {
                ops.insert(self.operator(), Bson::Array(values.clone()));
            }
            Predicate::Exists(exists) => {
                ops.insert("$exists", *exists);
            }
            Predicate::Regex(regex) => {
                ops.insert("$regex", regex.pattern());
                if !regex.options().is_empty() {
                    ops.insert("$options", regex.options());
                }
            }
            Predicate::Not(inner) => {
                ops.insert("$not", operators_document(inner));
            }
        }
    }
}

fn operators_document(predicates: &[Predicate]) -> Document {
    let mut ops = Document::new();
    for predicate in predicates {
        predicate.write_into(&mut ops);
    }
    ops
}

fn has_repeated_operator(predicates: &[Predicate]) -> bool {
    predicates.iter().enumerate().any(|(i, p)| {
        predicates[..i]
            .iter()
            .any(|earlier| earlier.operator() == p.operator())
    })
}

impl FieldFilter {
    fn to_document(&self) -> Document {
        let name = self.field.as_str();
        if has_repeated_operator(&self.predicates) {
            // One operator document cannot hold the same key twice
            let parts: Vec<Document> = self
                .predicates
                .iter()
                .map(|p| doc! { name: operators_document(std::slice::from_ref(p)) })
                .collect();
            return doc! { "$and": parts };
        }
        doc! { name: operators_document(&self.predicates) }
    }
}

impl Filter {
    pub fn and(children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(children.into_iter().collect())
    }

    pub fn nor(children: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Nor(children.into_iter().collect())
    }

    /// Translate to a MongoDB query document.
    pub fn to_document(&self) -> Document {
        match self {
            Filter::MatchAll => Document::new(),
            Filter::And(children) => doc! { "$and": Self::documents(children) },
            Filter::Or(children) => doc! { "$or": Self::documents(children) },
            Filter::Nor(children) => doc! { "$nor": Self::documents(children) },
            Filter::Field(field) => field.to_document(),
        }
    }

    fn documents(children: &[Filter]) -> Vec<Document> {
        children.iter().map(Filter::to_document).collect()
    }
}

/// A field without predicates places no constraint and becomes
/// [`Filter::MatchAll`]; `{field: {}}` would instead match only an empty
/// embedded document.
impl From<FieldFilter> for Filter {
    fn from(field: FieldFilter) -> Self {
        if field.predicates.is_empty() {
            Filter::MatchAll
        } else {
            Filter::Field(field)
        }
    }
}

/// Fluent builder for a [`FieldFilter`].
///
/// ```
/// use domain_products::query::{Field, Filter, ProductField};
/// use mongodb::bson::doc;
///
/// let filter = Filter::and([
///     Field::new(ProductField::Price).gt(100).into(),
///     Field::new(ProductField::Title).regex("phone", "i").unwrap().into(),
/// ]);
/// assert_eq!(
///     filter.to_document(),
///     doc! { "$and": [
///         { "price": { "$gt": 100 } },
///         { "title": { "$regex": "phone", "$options": "i" } },
///     ] }
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Field(FieldFilter);

impl Field {
    pub fn new(field: ProductField) -> Self {
        Field(FieldFilter {
            field,
            predicates: Vec::new(),
        })
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.0.predicates.push(predicate);
        self
    }

    pub fn eq(self, value: impl Into<Bson>) -> Self {
        self.with(Predicate::Eq(value.into()))
    }

    pub fn ne(self, value: impl Into<Bson>) -> Self {
        self.with(Predicate::Ne(value.into()))
    }

    pub fn gt(self, value: impl Into<Bson>) -> Self {
        self.with(Predicate::Gt(value.into()))
    }

    pub fn gte(self, value: impl Into<Bson>) -> Self {
        self.with(Predicate::Gte(value.into()))
    }

    pub fn lt(self, value: impl Into<Bson>) -> Self {
        self.with(Predicate::Lt(value.into()))
    }

    pub fn lte(self, value: impl Into<Bson>) -> Self {
        self.with(Predicate::Lte(value.into()))
    }

    pub fn is_in<V: Into<Bson>>(self, values: impl IntoIterator<Item = V>) -> Self {
        self.with(Predicate::In(values.into_iter().map(Into::into).collect()))
    }

    pub fn not_in<V: Into<Bson>>(self, values: impl IntoIterator<Item = V>) -> Self {
        self.with(Predicate::Nin(values.into_iter().map(Into::into).collect()))
    }

    pub fn exists(self, exists: bool) -> Self {
        self.with(Predicate::Exists(exists))
    }

    pub fn regex(self, pattern: &str, options: &str) -> QueryResult<Self> {
        let regex =
            RegexPredicate::new(pattern, options).map_err(|reason| QueryError::InvalidRegex {
                field: self.0.field.to_string(),
                reason,
            })?;
        Ok(self.with(Predicate::Regex(regex)))
    }

    pub fn not(self, predicate: Predicate) -> Self {
        self.with(Predicate::Not(vec![predicate]))
    }

    pub fn build(self) -> FieldFilter {
        self.0
    }
}

impl From<Field> for Filter {
    fn from(field: Field) -> Self {
        field.0.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_all_is_empty_document() {
        assert_eq!(Filter::MatchAll.to_document(), doc! {});
    }

    #[test]
    fn test_field_without_predicates_is_match_all() {
        let filter: Filter = Field::new(ProductField::Price).into();
        assert_eq!(filter, Filter::MatchAll);
        assert_eq!(filter.to_document(), doc! {});

        let nested = Filter::nor([Field::new(ProductField::Title).into()]);
        assert_eq!(nested.to_document(), doc! { "$nor": [{}] });
        assert!(!nested.matches(&doc! { "title": "iPhone" }));
    }

    #[test]
    fn test_field_operators_translate() {
        let filter: Filter = Field::new(ProductField::Price).gte(10).lt(20.5).into();
        assert_eq!(
            filter.to_document(),
            doc! { "price": { "$gte": 10, "$lt": 20.5 } }
        );
    }

    #[test]
    fn test_combinators_translate() {
        let filter = Filter::nor([
            Field::new(ProductField::Price).gt(500).into(),
            Field::new(ProductField::Title)
                .regex("tablet", "i")
                .unwrap()
                .into(),
        ]);
        assert_eq!(
            filter.to_document(),
            doc! { "$nor": [
                { "price": { "$gt": 500 } },
                { "title": { "$regex": "tablet", "$options": "i" } },
            ] }
        );
    }

    #[test]
    fn test_not_translates_to_operator_object() {
        let filter: Filter = Field::new(ProductField::Price)
            .not(Predicate::Gt(Bson::Int32(500)))
            .into();
        assert_eq!(
            filter.to_document(),
            doc! { "price": { "$not": { "$gt": 500 } } }
        );
    }

    #[test]
    fn test_membership_translates_to_arrays() {
        let filter: Filter = Field::new(ProductField::Title)
            .is_in(["iPhone", "Tablet X"])
            .into();
        assert_eq!(
            filter.to_document(),
            doc! { "title": { "$in": ["iPhone", "Tablet X"] } }
        );
    }

    #[test]
    fn test_repeated_operator_splits_into_and() {
        let filter: Filter = Field::new(ProductField::Price).gt(1).gt(2).into();
        assert_eq!(
            filter.to_document(),
            doc! { "$and": [
                { "price": { "$gt": 1 } },
                { "price": { "$gt": 2 } },
            ] }
        );
    }

    #[test]
    fn test_regex_without_options_omits_options_key() {
        let filter: Filter = Field::new(ProductField::Title)
            .regex("^i", "")
            .unwrap()
            .into();
        assert_eq!(filter.to_document(), doc! { "title": { "$regex": "^i" } });
    }

    #[test]
    fn test_regex_builder_rejects_bad_input() {
        let err = Field::new(ProductField::Title).regex("(", "").unwrap_err();
        assert!(matches!(err, QueryError::InvalidRegex { .. }));

        let err = Field::new(ProductField::Title).regex("a", "g").unwrap_err();
        assert!(matches!(err, QueryError::InvalidRegex { .. }));
    }

    #[test]
    fn test_regex_options() {
        let regex = RegexPredicate::new("^phone$", "im").unwrap();
        assert!(regex.is_match("case\nPHONE"));
        assert!(!RegexPredicate::new("^phone$", "").unwrap().is_match("case\nphone"));
    }
}
