use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use super::repo_types::Car;

/// Public projection of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarDto {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price_eur: i32,
    pub image_url: String,
    pub description: Option<String>,
    pub seller_uid: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Car> for CarDto {
    fn from(c: Car) -> Self {
        Self {
            id: c.id,
            make: c.make,
            model: c.model,
            year: c.year,
            price_eur: c.price_eur,
            image_url: c.image_url,
            description: c.description,
            seller_uid: c.seller_uid,
            created_at: c.created_at,
        }
    }
}

/// Create/update body. Everything is optional here so that a missing field
/// is reported by validation instead of failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarPayload {
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub price_eur: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// `GET /cars` query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub year_from: Option<i32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub year_to: Option<i32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub price_from: Option<i32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub price_to: Option<i32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub size: Option<i64>,
    #[serde(default)]
    pub sort: Option<String>,
}

/// `?yearFrom=` is the same as leaving the parameter out.
fn empty_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(de)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(de::Error::custom),
    }
}
