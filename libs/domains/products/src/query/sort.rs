use mongodb::bson::{Bson, Document};
use std::cmp::Ordering;
use std::str::FromStr;
use strum::Display;

use super::eval::as_number;
use super::{ProductField, QueryError, QueryResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum SortDirection {
    #[default]
    #[strum(to_string = "asc")]
    Ascending,
    #[strum(to_string = "desc")]
    Descending,
}

impl SortDirection {
    pub fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = QueryError;

    /// `asc`/`ascending`/`1` or `desc`/`descending`/`-1`, case-insensitive.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Ok(SortDirection::Ascending),
            "desc" | "descending" | "-1" => Ok(SortDirection::Descending),
            other => Err(QueryError::InvalidSort(format!(
                "unknown direction '{other}', expected asc or desc"
            ))),
        }
    }
}

/// Ordered sort keys. `_id` ascending is always the final tie-breaker, so an
/// empty spec means insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortSpec {
    keys: Vec<(ProductField, SortDirection)>,
}

impl SortSpec {
    pub fn by(field: ProductField, direction: SortDirection) -> Self {
        Self {
            keys: vec![(field, direction)],
        }
    }

    /// Add a key; later keys break ties of earlier ones. Each field may
    /// appear once, which bounds a spec to one key per [`ProductField`].
    pub fn then(mut self, field: ProductField, direction: SortDirection) -> QueryResult<Self> {
        if self.keys.iter().any(|(f, _)| *f == field) {
            return Err(QueryError::InvalidSort(format!("'{field}' listed twice")));
        }
        self.keys.push((field, direction));
        Ok(self)
    }

    pub fn keys(&self) -> &[(ProductField, SortDirection)] {
        &self.keys
    }

    /// Parse `"price:desc,title"`, `"price:-1"` or `"-price title"`.
    pub fn parse(raw: &str) -> QueryResult<Self> {
        let mut spec = SortSpec::default();
        for token in raw
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            let (name, direction) = match token.split_once(':') {
                Some((name, direction)) => (name, direction.parse()?),
                None => match token.strip_prefix('-') {
                    Some(name) => (name, SortDirection::Descending),
                    None => (
                        token.strip_prefix('+').unwrap_or(token),
                        SortDirection::Ascending,
                    ),
                },
            };
            spec = spec.then(ProductField::parse(name)?, direction)?;
        }
        Ok(spec)
    }

    /// `{field: ±1, ..., _id: 1}`
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        for (field, direction) in &self.keys {
            doc.insert(field.as_str(), direction.as_i32());
        }
        if !doc.contains_key(ProductField::Id.as_str()) {
            doc.insert(ProductField::Id.as_str(), 1);
        }
        doc
    }

    /// Order two documents the way the store would.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for (field, direction) in &self.keys {
            let ordering = direction.apply(sort_cmp(a.get(field.as_str()), b.get(field.as_str())));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        let id = ProductField::Id.as_str();
        sort_cmp(a.get(id), b.get(id))
    }
}

/// Total order for sorting: missing/null < numbers < strings < anything else.
fn sort_cmp(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    fn rank(value: Option<&Bson>) -> u8 {
        match value {
            None | Some(Bson::Null) => 0,
            Some(v) if as_number(v).is_some() => 1,
            Some(Bson::String(_)) => 2,
            Some(_) => 3,
        }
    }

    rank(a).cmp(&rank(b)).then_with(|| match (a, b) {
        (Some(Bson::String(a)), Some(Bson::String(b))) => a.cmp(b),
        (Some(a), Some(b)) => match (as_number(a), as_number(b)) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            _ => Ordering::Equal,
        },
        _ => Ordering::Equal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_direction_parsing() {
        for raw in ["asc", "ASC", "ascending", "1"] {
            assert_eq!(raw.parse::<SortDirection>().unwrap(), SortDirection::Ascending);
        }
        for raw in ["desc", "Descending", "-1"] {
            assert_eq!(raw.parse::<SortDirection>().unwrap(), SortDirection::Descending);
        }
        assert!("up".parse::<SortDirection>().is_err());
        assert!("".parse::<SortDirection>().is_err());
    }

    #[test]
    fn test_parse_colon_form() {
        let spec = SortSpec::parse("price:desc,title").unwrap();
        assert_eq!(
            spec.keys(),
            &[
                (ProductField::Price, SortDirection::Descending),
                (ProductField::Title, SortDirection::Ascending),
            ]
        );
    }

    #[test]
    fn test_parse_prefix_form() {
        let spec = SortSpec::parse("-price title").unwrap();
        assert_eq!(spec, SortSpec::parse("price:-1, title:1").unwrap());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            SortSpec::parse("weight").unwrap_err(),
            QueryError::UnknownField("weight".to_string())
        );
        assert!(SortSpec::parse("price:sideways").is_err());
        assert!(matches!(
            SortSpec::parse("price,-price"),
            Err(QueryError::InvalidSort(_))
        ));
    }

    #[test]
    fn test_every_field_once_is_accepted() {
        let mut spec = SortSpec::default();
        let fields = [
            ProductField::Price,
            ProductField::Title,
            ProductField::Description,
            ProductField::CreatedAt,
            ProductField::Id,
        ];
        for field in fields {
            spec = spec.then(field, SortDirection::Ascending).unwrap();
        }
        assert_eq!(spec.keys().len(), 5);
        assert!(spec.then(ProductField::Title, SortDirection::Descending).is_err());
    }

    #[test]
    fn test_document_appends_id_tiebreak() {
        assert_eq!(SortSpec::default().to_document(), doc! { "_id": 1 });
        assert_eq!(
            SortSpec::parse("-price").unwrap().to_document(),
            doc! { "price": -1, "_id": 1 }
        );
        assert_eq!(
            SortSpec::parse("-_id").unwrap().to_document(),
            doc! { "_id": -1 }
        );
    }

    #[test]
    fn test_compare_missing_sorts_first() {
        let spec = SortSpec::parse("description").unwrap();
        let with = doc! { "_id": "a", "description": "x" };
        let without = doc! { "_id": "b" };
        assert_eq!(spec.compare(&without, &with), Ordering::Less);
    }

    #[test]
    fn test_compare_ties_break_on_id() {
        let spec = SortSpec::parse("price:desc").unwrap();
        let a = doc! { "_id": "a", "price": 10 };
        let b = doc! { "_id": "b", "price": 10.0 };
        let c = doc! { "_id": "c", "price": 20 };

        let mut docs = vec![b.clone(), c.clone(), a.clone()];
        docs.sort_by(|x, y| spec.compare(x, y));
        assert_eq!(docs, vec![c, a, b]);
    }
}
