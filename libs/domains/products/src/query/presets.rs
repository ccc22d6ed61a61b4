//! Fixed filters behind the `/products/{and,or,not,nor}` routes.

use mongodb::bson::Bson;

use super::{Field, Filter, Predicate, ProductField, QueryResult};

/// Price above which a product counts as premium.
pub const PREMIUM_PRICE: i32 = 500;
/// Price above which a phone counts for the `and` preset.
pub const PHONE_MIN_PRICE: i32 = 100;

/// `price > 100 AND title ~ /phone/i`
pub fn phones_over_100() -> QueryResult<Filter> {
    Ok(Filter::and([
        Field::new(ProductField::Price).gt(PHONE_MIN_PRICE).into(),
        Field::new(ProductField::Title).regex("phone", "i")?.into(),
    ]))
}

/// `price > 500 OR title ~ /laptop/i`
pub fn premium_or_laptop() -> QueryResult<Filter> {
    Ok(Filter::or([
        Field::new(ProductField::Price).gt(PREMIUM_PRICE).into(),
        Field::new(ProductField::Title).regex("laptop", "i")?.into(),
    ]))
}

/// `NOT (price > 500)`, which includes products without a price
pub fn not_premium() -> Filter {
    Field::new(ProductField::Price)
        .not(Predicate::Gt(Bson::Int32(PREMIUM_PRICE)))
        .into()
}

/// `NOR (price > 500, title ~ /tablet/i)`
pub fn neither_premium_nor_tablet() -> QueryResult<Filter> {
    Ok(Filter::nor([
        Field::new(ProductField::Price).gt(PREMIUM_PRICE).into(),
        Field::new(ProductField::Title).regex("tablet", "i")?.into(),
    ]))
}
