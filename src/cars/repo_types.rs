use sqlx::FromRow;
use time::OffsetDateTime;

/// Row of the `car` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Car {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price_eur: i32,
    pub image_url: String,
    pub description: Option<String>,
    pub seller_uid: Option<String>, // NULL only on legacy rows
    pub created_at: OffsetDateTime,
}

/// Mutable listing fields, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarFields {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price_eur: i32,
    pub image_url: String,
    pub description: Option<String>,
}

impl Car {
    pub fn apply(&mut self, fields: &CarFields) {
        self.make = fields.make.clone();
        self.model = fields.model.clone();
        self.year = fields.year;
        self.price_eur = fields.price_eur;
        self.image_url = fields.image_url.clone();
        self.description = fields.description.clone();
    }
}
