use mongodb::bson::{Document, doc};

use super::{ProductField, QueryError, QueryResult};

/// Which fields a read returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Projection {
    #[default]
    All,
    /// Every field except `_id` (Mongoose `-_id`)
    AllExceptId,
    /// Only `fields`; `_id` only when requested
    Include {
        fields: Vec<ProductField>,
        include_id: bool,
    },
}

impl Projection {
    /// Inclusion of `fields`, without `_id`.
    pub fn include(fields: impl IntoIterator<Item = ProductField>) -> Self {
        let mut selected = Vec::new();
        let mut include_id = false;
        for field in fields {
            if field == ProductField::Id {
                include_id = true;
            } else if !selected.contains(&field) {
                selected.push(field);
            }
        }
        Projection::Include {
            fields: selected,
            include_id,
        }
    }

    /// Parse `"title,price"` or `"title price -_id"`; empty means all fields.
    pub fn parse(raw: &str) -> QueryResult<Self> {
        let mut fields = Vec::new();
        let mut exclude_id = false;

        for token in raw
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
        {
            match token.strip_prefix('-') {
                Some(name) if ProductField::parse(name)? == ProductField::Id => exclude_id = true,
                Some(name) => {
                    return Err(QueryError::InvalidProjection(format!(
                        "cannot exclude '{name}', only -_id is supported"
                    )));
                }
                None => fields.push(ProductField::parse(token.strip_prefix('+').unwrap_or(token))?),
            }
        }

        if exclude_id && fields.contains(&ProductField::Id) {
            return Err(QueryError::InvalidProjection(
                "_id is both included and excluded".to_string(),
            ));
        }

        Ok(match (fields.is_empty(), exclude_id) {
            (true, false) => Projection::All,
            (true, true) => Projection::AllExceptId,
            (false, _) => Projection::include(fields),
        })
    }

    /// Store projection document; `None` returns whole documents.
    pub fn to_document(&self) -> Option<Document> {
        match self {
            Projection::All => None,
            Projection::AllExceptId => Some(doc! { "_id": 0 }),
            Projection::Include { fields, include_id } => {
                let mut doc = Document::new();
                for field in fields {
                    doc.insert(field.as_str(), 1);
                }
                doc.insert(ProductField::Id.as_str(), i32::from(*include_id));
                Some(doc)
            }
        }
    }

    /// Apply to a full document.
    pub fn apply(&self, doc: &Document) -> Document {
        match self {
            Projection::All => doc.clone(),
            Projection::AllExceptId => {
                let mut out = doc.clone();
                out.remove(ProductField::Id.as_str());
                out
            }
            Projection::Include { fields, include_id } => {
                let mut out = Document::new();
                if *include_id {
                    if let Some(id) = doc.get(ProductField::Id.as_str()) {
                        out.insert(ProductField::Id.as_str(), id.clone());
                    }
                }
                for field in fields {
                    if let Some(value) = doc.get(field.as_str()) {
                        out.insert(field.as_str(), value.clone());
                    }
                }
                out
            }
        }
    }
}
