//! Parsing untrusted JSON into a [`Filter`].
//!
//! Accepts the MongoDB filter dialect restricted to the product field
//! whitelist and a fixed operator set. Anything else (including `$where`,
//! `$expr` and embedded documents) is rejected before reaching the store.

use mongodb::bson::Bson;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::filter::{FieldFilter, Filter, Predicate, RegexPredicate};
use super::{FieldKind, MAX_DEPTH, MAX_IN_VALUES, ProductField, QueryError, QueryResult};
use crate::models::timestamp;

impl Filter {
    /// Parse a filter from its JSON text (the `?filter=` query parameter).
    pub fn parse_str(raw: &str) -> QueryResult<Filter> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| QueryError::MalformedJson(e.to_string()))?;
        Filter::from_json(&value)
    }

    /// Parse a filter from a JSON value. `{}` matches everything.
    pub fn from_json(value: &Value) -> QueryResult<Filter> {
        parse_filter(value, 0)
    }
}

fn parse_filter(value: &Value, depth: usize) -> QueryResult<Filter> {
    if depth > MAX_DEPTH {
        return Err(QueryError::TooDeep);
    }
    let Value::Object(map) = value else {
        return Err(QueryError::MalformedJson(
            "filter must be a JSON object".to_string(),
        ));
    };

    let mut clauses = Vec::with_capacity(map.len());
    for (key, value) in map {
        let clause = match key.as_str() {
            "$and" => Filter::And(parse_children(key, value, depth)?),
            "$or" => Filter::Or(parse_children(key, value, depth)?),
            "$nor" => Filter::Nor(parse_children(key, value, depth)?),
            op if op.starts_with('$') => {
                return Err(QueryError::UnknownCombinator(op.to_string()));
            }
            name => {
                let field = ProductField::parse(name)?;
                Filter::Field(FieldFilter {
                    field,
                    predicates: parse_field_value(field, value, depth)?,
                })
            }
        };
        clauses.push(clause);
    }

    Ok(match clauses.len() {
        0 => Filter::MatchAll,
        1 => clauses.remove(0),
        _ => Filter::And(clauses),
    })
}

fn parse_children(combinator: &str, value: &Value, depth: usize) -> QueryResult<Vec<Filter>> {
    match value {
        Value::Array(children) if !children.is_empty() => children
            .iter()
            .map(|child| parse_filter(child, depth + 1))
            .collect(),
        _ => Err(QueryError::InvalidCombinator(combinator.to_string())),
    }
}

/// `{field: value}` is exact match; `{field: {$op: value, ...}}` a conjunction.
fn parse_field_value(
    field: ProductField,
    value: &Value,
    depth: usize,
) -> QueryResult<Vec<Predicate>> {
    match value {
        Value::Object(ops) if is_operator_object(ops) => parse_operators(field, ops, depth + 1),
        Value::Object(_) => Err(invalid(field, "embedded documents are not supported")),
        scalar => Ok(vec![Predicate::Eq(parse_scalar(field, scalar, true)?)]),
    }
}

fn is_operator_object(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|key| key.starts_with('$'))
}

fn parse_operators(
    field: ProductField,
    ops: &Map<String, Value>,
    depth: usize,
) -> QueryResult<Vec<Predicate>> {
    if depth > MAX_DEPTH {
        return Err(QueryError::TooDeep);
    }

    let mut predicates = Vec::with_capacity(ops.len());
    for (operator, value) in ops {
        let predicate = match operator.as_str() {
            "$eq" => Predicate::Eq(parse_scalar(field, value, true)?),
            "$ne" => Predicate::Ne(parse_scalar(field, value, true)?),
            "$gt" => Predicate::Gt(parse_scalar(field, value, false)?),
            "$gte" => Predicate::Gte(parse_scalar(field, value, false)?),
            "$lt" => Predicate::Lt(parse_scalar(field, value, false)?),
            "$lte" => Predicate::Lte(parse_scalar(field, value, false)?),
            "$in" => Predicate::In(parse_set(field, operator, value)?),
            "$nin" => Predicate::Nin(parse_set(field, operator, value)?),
            "$exists" => match value {
                Value::Bool(exists) => Predicate::Exists(*exists),
                _ => return Err(invalid(field, "$exists expects a boolean")),
            },
            "$regex" => Predicate::Regex(parse_regex(field, value, ops.get("$options"))?),
            "$options" if ops.contains_key("$regex") => continue,
            "$options" => return Err(invalid(field, "$options requires $regex")),
            "$not" => match value {
                Value::Object(inner) if is_operator_object(inner) => {
                    Predicate::Not(parse_operators(field, inner, depth + 1)?)
                }
                _ => return Err(invalid(field, "$not expects an operator object")),
            },
            other => {
                return Err(QueryError::UnknownOperator {
                    field: field.to_string(),
                    operator: other.to_string(),
                });
            }
        };
        predicates.push(predicate);
    }
    Ok(predicates)
}

fn parse_set(field: ProductField, operator: &str, value: &Value) -> QueryResult<Vec<Bson>> {
    let Value::Array(values) = value else {
        return Err(invalid(field, &format!("{operator} expects an array")));
    };
    if values.len() > MAX_IN_VALUES {
        return Err(QueryError::TooManyValues {
            operator: operator.to_string(),
            count: values.len(),
        });
    }
    values
        .iter()
        .map(|value| parse_scalar(field, value, true))
        .collect()
}

fn parse_regex(
    field: ProductField,
    pattern: &Value,
    options: Option<&Value>,
) -> QueryResult<RegexPredicate> {
    if field.kind() == FieldKind::Number {
        return Err(invalid(field, "$regex applies to text fields only"));
    }
    let Value::String(pattern) = pattern else {
        return Err(invalid(field, "$regex expects a string"));
    };
    let options = match options {
        None => "",
        Some(Value::String(options)) => options.as_str(),
        Some(_) => return Err(invalid(field, "$options expects a string")),
    };
    RegexPredicate::new(pattern, options).map_err(|reason| QueryError::InvalidRegex {
        field: field.to_string(),
        reason,
    })
}

/// Convert a JSON scalar to the BSON type stored under `field`.
fn parse_scalar(field: ProductField, value: &Value, allow_null: bool) -> QueryResult<Bson> {
    match (field.kind(), value) {
        (_, Value::Null) if allow_null => Ok(Bson::Null),
        (FieldKind::Number, Value::Number(n)) => Ok(match n.as_i64() {
            Some(i) => Bson::Int64(i),
            None => Bson::Double(n.as_f64().unwrap_or(f64::NAN)),
        }),
        (FieldKind::Number, _) => Err(invalid(field, "expected a number")),
        (FieldKind::Text, Value::String(s)) if field == ProductField::Id => {
            // Ids are stored lower-case hyphenated
            Ok(Bson::String(match Uuid::parse_str(s) {
                Ok(id) => id.hyphenated().to_string(),
                Err(_) => s.clone(),
            }))
        }
        (FieldKind::Text, Value::String(s)) => Ok(Bson::String(s.clone())),
        (FieldKind::Text, _) => Err(invalid(field, "expected a string")),
        (FieldKind::Timestamp, Value::String(s)) => timestamp::parse(s)
            .map(|t| Bson::String(timestamp::format(&t)))
            .map_err(|_| invalid(field, "expected an RFC 3339 timestamp")),
        (FieldKind::Timestamp, _) => Err(invalid(field, "expected an RFC 3339 timestamp")),
    }
}

fn invalid(field: ProductField, reason: &str) -> QueryError {
    QueryError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Field;
    use mongodb::bson::doc;
    use serde_json::json;

    fn parse(value: Value) -> QueryResult<Filter> {
        Filter::from_json(&value)
    }

    #[test]
    fn test_empty_object_matches_all() {
        assert_eq!(parse(json!({})).unwrap(), Filter::MatchAll);
    }

    #[test]
    fn test_exact_match_is_eq() {
        let filter = parse(json!({"title": "iPhone"})).unwrap();
        assert_eq!(filter, Field::new(ProductField::Title).eq("iPhone").into());
    }

    #[test]
    fn test_multiple_keys_are_implicit_and() {
        let filter = parse(json!({"title": "iPhone", "price": {"$gt": 100}})).unwrap();
        let Filter::And(children) = filter else {
            panic!("expected implicit and");
        };
        assert_eq!(children.len(), 2);
    }

    #[test]
    fn test_operators_are_conjunctive() {
        let filter = parse(json!({"price": {"$gte": 100, "$lte": 500}})).unwrap();
        assert_eq!(
            filter.to_document(),
            doc! { "price": { "$gte": 100_i64, "$lte": 500_i64 } }
        );
    }

    #[test]
    fn test_id_alias_and_normalisation() {
        let id = Uuid::now_v7();
        let filter = parse(json!({"id": id.to_string().to_uppercase()})).unwrap();
        assert_eq!(
            filter.to_document(),
            doc! { "_id": { "$eq": id.to_string() } }
        );
    }

    #[test]
    fn test_created_at_is_normalised() {
        let filter = parse(json!({"createdAt": {"$gte": "2024-01-01T02:00:00+02:00"}})).unwrap();
        assert_eq!(
            filter.to_document(),
            doc! { "createdAt": { "$gte": "2024-01-01T00:00:00.000Z" } }
        );
    }

    #[test]
    fn test_nested_combinators() {
        let filter = parse(json!({
            "$or": [
                {"price": {"$gt": 500}},
                {"$and": [{"title": {"$regex": "phone", "$options": "i"}}, {"price": {"$lt": 200}}]}
            ]
        }))
        .unwrap();
        let Filter::Or(children) = filter else {
            panic!("expected or");
        };
        assert!(matches!(children[1], Filter::And(_)));
    }

    #[test]
    fn test_not_wraps_operator_object() {
        let filter = parse(json!({"price": {"$not": {"$gt": 500}}})).unwrap();
        assert_eq!(
            filter,
            Field::new(ProductField::Price)
                .not(Predicate::Gt(Bson::Int64(500)))
                .into()
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert_eq!(
            parse(json!({"password": "x"})),
            Err(QueryError::UnknownField("password".to_string()))
        );
        assert!(parse(json!({"$or": [{"price.currency": "usd"}]})).is_err());
    }

    #[test]
    fn test_code_execution_operators_rejected() {
        let err = parse(json!({"$where": "sleep(1000)"})).unwrap_err();
        assert_eq!(err, QueryError::UnknownCombinator("$where".to_string()));

        let err = parse(json!({"$expr": {"$gt": ["$price", 1]}})).unwrap_err();
        assert_eq!(err.reason(), "unknown_operator");

        let err = parse(json!({"price": {"$where": "1"}})).unwrap_err();
        assert!(matches!(err, QueryError::UnknownOperator { .. }));
    }

    #[test]
    fn test_combinator_needs_non_empty_array() {
        for bad in [json!({"$and": []}), json!({"$or": {}}), json!({"$nor": "x"})] {
            assert!(matches!(parse(bad), Err(QueryError::InvalidCombinator(_))));
        }
    }

    #[test]
    fn test_depth_limit() {
        let mut filter = json!({"price": 1});
        for _ in 0..=MAX_DEPTH {
            filter = json!({"$and": [filter]});
        }
        assert_eq!(parse(filter), Err(QueryError::TooDeep));

        let mut shallow = json!({"price": 1});
        for _ in 0..(MAX_DEPTH - 2) {
            shallow = json!({"$and": [shallow]});
        }
        assert!(parse(shallow).is_ok());
    }

    #[test]
    fn test_in_limit() {
        let values: Vec<u32> = (0..=MAX_IN_VALUES as u32).collect();
        let err = parse(json!({"price": {"$in": values}})).unwrap_err();
        assert!(matches!(err, QueryError::TooManyValues { .. }));

        assert!(parse(json!({"price": {"$in": [1, 2.5]}})).is_ok());
        assert!(parse(json!({"price": {"$nin": 1}})).is_err());
    }

    #[test]
    fn test_type_mismatch_rejected() {
        assert!(parse(json!({"price": "cheap"})).is_err());
        assert!(parse(json!({"price": {"$gt": null}})).is_err());
        assert!(parse(json!({"title": {"$gt": 5}})).is_err());
        assert!(parse(json!({"title": true})).is_err());
        assert!(parse(json!({"createdAt": {"$lt": "yesterday"}})).is_err());
        assert!(parse(json!({"price": {"$exists": 1}})).is_err());
    }

    #[test]
    fn test_null_allowed_for_equality() {
        assert!(parse(json!({"description": null})).is_ok());
        assert!(parse(json!({"description": {"$ne": null}})).is_ok());
    }

    #[test]
    fn test_embedded_documents_rejected() {
        assert!(parse(json!({"title": {}})).is_err());
        assert!(parse(json!({"title": {"en": "phone"}})).is_err());
        assert!(parse(json!({"title": {"$eq": "a", "en": "b"}})).is_err());
    }

    #[test]
    fn test_regex_validation() {
        assert!(parse(json!({"title": {"$regex": "^i", "$options": "i"}})).is_ok());
        assert!(matches!(
            parse(json!({"title": {"$regex": "(unclosed"}})),
            Err(QueryError::InvalidRegex { .. })
        ));
        assert!(matches!(
            parse(json!({"title": {"$regex": "a", "$options": "g"}})),
            Err(QueryError::InvalidRegex { .. })
        ));
        assert!(parse(json!({"title": {"$options": "i"}})).is_err());
        assert!(parse(json!({"price": {"$regex": "1"}})).is_err());
    }

    #[test]
    fn test_parse_str() {
        assert!(Filter::parse_str(r#"{"price":{"$gt":100}}"#).is_ok());
        assert!(matches!(
            Filter::parse_str("{price:"),
            Err(QueryError::MalformedJson(_))
        ));
        assert!(matches!(
            Filter::parse_str("[1]"),
            Err(QueryError::MalformedJson(_))
        ));
    }
}
