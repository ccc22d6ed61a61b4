//! In-memory evaluation of filters over BSON documents.
//!
//! Mirrors MongoDB semantics for top-level scalar fields: a missing field
//! fails every comparison, while `$ne`, `$nin` and `$not` match it.

use mongodb::bson::{Bson, Document};
use std::cmp::Ordering;

use super::filter::{Filter, Predicate};

impl Filter {
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::MatchAll => true,
            Filter::And(children) => children.iter().all(|c| c.matches(doc)),
            Filter::Or(children) => children.iter().any(|c| c.matches(doc)),
            Filter::Nor(children) => !children.iter().any(|c| c.matches(doc)),
            Filter::Field(field) => {
                let value = doc.get(field.field.as_str());
                field.predicates.iter().all(|p| p.matches(value))
            }
        }
    }
}

impl Predicate {
    /// Evaluate against a field value; `None` means the field is absent.
    pub fn matches(&self, value: Option<&Bson>) -> bool {
        match self {
            Predicate::Eq(expected) => equals(value, expected),
            Predicate::Ne(expected) => !equals(value, expected),
            Predicate::Gt(bound) => ordered(value, bound, |o| o == Ordering::Greater),
            Predicate::Gte(bound) => ordered(value, bound, |o| o != Ordering::Less),
            Predicate::Lt(bound) => ordered(value, bound, |o| o == Ordering::Less),
            Predicate::Lte(bound) => ordered(value, bound, |o| o != Ordering::Greater),
            Predicate::In(values) => values.iter().any(|v| equals(value, v)),
            Predicate::Nin(values) => !values.iter().any(|v| equals(value, v)),
            Predicate::Exists(exists) => value.is_some() == *exists,
            Predicate::Regex(regex) => matches!(value, Some(Bson::String(s)) if regex.is_match(s)),
            Predicate::Not(inner) => !inner.iter().all(|p| p.matches(value)),
        }
    }
}

/// Equality as MongoDB applies it: `null` matches null or absent fields.
fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match (value, expected) {
        (None, Bson::Null) | (Some(Bson::Null), Bson::Null) => true,
        (None, _) => false,
        (Some(actual), expected) => compare(actual, expected) == Some(Ordering::Equal),
    }
}

fn ordered(value: Option<&Bson>, bound: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    value
        .and_then(|actual| compare(actual, bound))
        .is_some_and(accept)
}

/// Compare two values of the same type class; `None` when they don't compare.
///
/// Numbers compare numerically across int/double encodings.
pub(crate) fn compare(a: &Bson, b: &Bson) -> Option<Ordering> {
    match (a, b) {
        (Bson::String(a), Bson::String(b)) => Some(a.cmp(b)),
        (Bson::Boolean(a), Bson::Boolean(b)) => Some(a.cmp(b)),
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        _ => match (as_number(a), as_number(b)) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    }
}

pub(crate) fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(d) => Some(*d),
        _ => None,
    }
}
