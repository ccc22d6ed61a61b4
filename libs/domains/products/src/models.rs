use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Product entity, stored in the `products` collection.
///
/// The same serde representation is used for BSON and JSON: `_id` is the
/// hyphenated UUID string and `createdAt` an RFC 3339 string with
/// millisecond precision, so string order matches insertion and time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Unique identifier (UUID v7, stored as `_id`)
    #[serde(rename = "_id", alias = "id", with = "uuid_string")]
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    pub title: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation timestamp, set once on insert
    #[serde(rename = "createdAt", with = "timestamp")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
}

/// A product restricted to the fields a projection selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductView {
    #[serde(
        rename = "_id",
        default,
        skip_serializing_if = "Option::is_none",
        with = "uuid_string::option"
    )]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "createdAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub created_at: Option<DateTime<Utc>>,
}

/// DTO for creating a new product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_create_price"))]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// DTO for a partial update.
///
/// `description` distinguishes "absent" (`None`), "clear" (`Some(None)`, sent as
/// `null`) and "set" (`Some(Some(..))`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_update"))]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "present_or_null")]
    #[schema(value_type = Option<String>, nullable)]
    pub description: Option<Option<String>>,
}

/// Query string accepted by `GET /products`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[serde(deny_unknown_fields)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Filter expression as JSON, e.g. `{"price":{"$gt":100}}`
    pub filter: Option<String>,
    /// Sort spec, e.g. `price:desc,title` or `-price title`
    pub sort: Option<String>,
    /// Projection, e.g. `title,price` or `title price -_id`
    pub fields: Option<String>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// Body of `POST /products/query`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct QueryRequest {
    /// Filter expression object
    #[schema(value_type = Option<Object>)]
    pub filter: Option<serde_json::Value>,
    pub sort: Option<String>,
    pub fields: Option<String>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

/// Query string carrying only a filter (`GET /products/count`).
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
#[into_params(parameter_in = Query)]
pub struct FilterParams {
    /// Filter expression as JSON
    pub filter: Option<String>,
}

/// `?order=` for the price-sorted routes.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(deny_unknown_fields)]
#[into_params(parameter_in = Query)]
pub struct OrderParams {
    /// `asc`, `desc`, `1` or `-1`; ascending when omitted
    pub order: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CountResponse {
    #[serde(rename = "totalProducts")]
    pub total_products: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdvancedResponse {
    pub total: u64,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

fn validate_create_price(input: &CreateProduct) -> Result<(), ValidationError> {
    check_finite(input.price)
}

fn validate_update(input: &UpdateProduct) -> Result<(), ValidationError> {
    if input.is_empty() {
        return Err(ValidationError::new("empty_update")
            .with_message("update must set at least one of title, price, description".into()));
    }
    input.price.map_or(Ok(()), check_finite)
}

fn check_finite(price: f64) -> Result<(), ValidationError> {
    if price.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("price_not_finite"))
    }
}

/// Keeps an explicit `null` distinct from an absent field.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Product {
    pub fn new(input: CreateProduct) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: input.title,
            price: input.price,
            description: input.description,
            created_at: timestamp::now(),
        }
    }

    /// Apply updates from UpdateProduct DTO
    pub fn apply_update(&mut self, update: UpdateProduct) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
    }
}

impl UpdateProduct {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.price.is_none() && self.description.is_none()
    }
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            id: Some(product.id),
            title: Some(product.title),
            price: Some(product.price),
            description: product.description,
            created_at: Some(product.created_at),
        }
    }
}

/// `Uuid` as its hyphenated string.
///
/// The BSON serializer is not human-readable, so the default `Uuid` impl would
/// store binary; the string form keeps `_id` comparable and sortable.
pub(crate) mod uuid_string {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&id.hyphenated())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Uuid::parse_str(&raw).map_err(D::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(id: &Option<Uuid>, serializer: S) -> Result<S::Ok, S::Error> {
            match id {
                Some(id) => super::serialize(id, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Uuid>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| Uuid::parse_str(&raw).map_err(D::Error::custom))
                .transpose()
        }
    }
}

/// RFC 3339 UTC timestamps with millisecond precision (`2024-05-01T12:00:00.000Z`).
pub(crate) mod timestamp {
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    /// Current time truncated to the stored precision.
    pub fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(3)
    }

    pub fn format(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw).map(|value| value.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(D::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| parse(&raw).map_err(D::Error::custom))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;
    use serde_json::json;

    fn create(title: &str, price: f64) -> CreateProduct {
        CreateProduct {
            title: title.to_string(),
            price,
            description: None,
        }
    }

    #[test]
    fn test_product_json_shape() {
        let product = Product::new(CreateProduct {
            description: Some("A phone".to_string()),
            ..create("iPhone", 150.0)
        });
        let value = serde_json::to_value(&product).unwrap();

        assert_eq!(value["_id"], json!(product.id.to_string()));
        assert_eq!(value["title"], "iPhone");
        assert_eq!(value["price"], 150.0);
        assert_eq!(value["description"], "A phone");
        assert!(value["createdAt"].as_str().unwrap().ends_with('Z'));
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_product_bson_stores_strings() {
        let product = Product::new(create("iPhone", 150.0));
        let doc = bson::to_document(&product).unwrap();

        assert_eq!(doc.get_str("_id").unwrap(), product.id.to_string());
        assert_eq!(
            doc.get_str("createdAt").unwrap(),
            timestamp::format(&product.created_at)
        );
        assert!(!doc.contains_key("description"));

        let back: Product = bson::from_document(doc).unwrap();
        assert_eq!(back, product);
    }

    #[test]
    fn test_price_accepts_integer_bson() {
        let doc = bson::doc! {
            "_id": Uuid::now_v7().to_string(),
            "title": "Tablet X",
            "price": 300_i32,
            "createdAt": "2024-01-01T00:00:00.000Z",
        };
        let product: Product = bson::from_document(doc).unwrap();
        assert_eq!(product.price, 300.0);
    }

    #[test]
    fn test_product_accepts_id_alias() {
        let id = Uuid::now_v7();
        let product: Product = serde_json::from_value(json!({
            "id": id,
            "title": "Laptop Pro",
            "price": 800,
            "createdAt": "2024-01-01T00:00:00.000+02:00",
        }))
        .unwrap();
        assert_eq!(product.id, id);
        assert_eq!(timestamp::format(&product.created_at), "2023-12-31T22:00:00.000Z");
    }

    #[test]
    fn test_timestamp_string_order_is_time_order() {
        let earlier = timestamp::parse("2024-01-01T09:59:59.999Z").unwrap();
        let later = timestamp::parse("2024-01-01T10:00:00Z").unwrap();
        assert!(timestamp::format(&earlier) < timestamp::format(&later));
    }

    #[test]
    fn test_view_omits_missing_fields() {
        let view = ProductView {
            title: Some("iPhone".to_string()),
            price: Some(150.0),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            json!({"title": "iPhone", "price": 150.0})
        );
    }

    #[test]
    fn test_create_validation() {
        assert!(create("iPhone", 150.0).validate().is_ok());
        assert!(create("", 150.0).validate().is_err());
        assert!(create(&"x".repeat(201), 150.0).validate().is_err());
        assert!(create("iPhone", -1.0).validate().is_err());
        assert!(create("iPhone", f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_create_rejects_unknown_fields() {
        let result: Result<CreateProduct, _> =
            serde_json::from_value(json!({"title": "iPhone", "price": 1, "createdAt": "x"}));
        assert!(result.is_err());

        let result: Result<CreateProduct, _> = serde_json::from_value(json!({"title": "iPhone"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_update_tracks_description_presence() {
        let absent: UpdateProduct = serde_json::from_value(json!({"price": 10})).unwrap();
        assert_eq!(absent.description, None);

        let cleared: UpdateProduct = serde_json::from_value(json!({"description": null})).unwrap();
        assert_eq!(cleared.description, Some(None));

        let empty: UpdateProduct = serde_json::from_value(json!({"description": ""})).unwrap();
        assert_eq!(empty.description, Some(Some(String::new())));
    }

    #[test]
    fn test_update_validation() {
        let empty = UpdateProduct::default();
        assert!(empty.is_empty());
        assert!(empty.validate().is_err());

        let bad_title = UpdateProduct {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(bad_title.validate().is_err());

        let bad_price = UpdateProduct {
            price: Some(-5.0),
            ..Default::default()
        };
        assert!(bad_price.validate().is_err());

        let ok = UpdateProduct {
            description: Some(None),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_update_rejects_immutable_fields() {
        let result: Result<UpdateProduct, _> =
            serde_json::from_value(json!({"_id": Uuid::now_v7(), "title": "x"}));
        assert!(result.is_err());
        let result: Result<UpdateProduct, _> =
            serde_json::from_value(json!({"createdAt": "2024-01-01T00:00:00Z"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_update_leaves_unspecified_fields() {
        let mut product = Product::new(CreateProduct {
            description: Some("old".to_string()),
            ..create("iPhone", 150.0)
        });
        let before = product.clone();

        product.apply_update(UpdateProduct {
            price: Some(175.0),
            ..Default::default()
        });

        assert_eq!(product.price, 175.0);
        assert_eq!(product.title, before.title);
        assert_eq!(product.description, before.description);
        assert_eq!(product.created_at, before.created_at);
        assert_eq!(product.id, before.id);

        product.apply_update(UpdateProduct {
            description: Some(None),
            ..Default::default()
        });
        assert_eq!(product.description, None);
    }
}
