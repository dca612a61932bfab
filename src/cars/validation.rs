use super::{dto::CarPayload, repo_types::CarFields};
use crate::error::FieldError;

pub const MIN_YEAR: i64 = 1950;
pub const MAX_YEAR: i64 = 2100;
pub const MAX_NAME_LEN: usize = 64;
pub const MAX_DESCRIPTION_LEN: usize = 2000;

const BLANK: &str = "must not be blank";

/// Checks a create/update body, reporting every failing field at once.
pub fn validate(payload: CarPayload) -> Result<CarFields, Vec<FieldError>> {
    let mut errors = Vec::new();

    let make = required_text("make", payload.make, Some(MAX_NAME_LEN), &mut errors);
    let model = required_text("model", payload.model, Some(MAX_NAME_LEN), &mut errors);

    let year = match payload.year {
        None => {
            errors.push(FieldError::new("year", "must not be null"));
            None
        }
        Some(y) if y < MIN_YEAR => {
            errors.push(FieldError::new(
                "year",
                format!("must be greater than or equal to {MIN_YEAR}"),
            ));
            None
        }
        Some(y) if y > MAX_YEAR => {
            errors.push(FieldError::new(
                "year",
                format!("must be less than or equal to {MAX_YEAR}"),
            ));
            None
        }
        Some(y) => i32::try_from(y).ok(),
    };

    let price_eur = match payload.price_eur {
        None => {
            errors.push(FieldError::new("priceEur", "must not be null"));
            None
        }
        Some(p) if p < 0 => {
            errors.push(FieldError::new("priceEur", "must be greater than or equal to 0"));
            None
        }
        Some(p) => match i32::try_from(p) {
            Ok(p) => Some(p),
            Err(_) => {
                errors.push(FieldError::new(
                    "priceEur",
                    format!("must be less than or equal to {}", i32::MAX),
                ));
                None
            }
        },
    };

    let image_url = required_text("imageUrl", payload.image_url, None, &mut errors);

    let description = payload.description;
    if let Some(d) = &description {
        if d.chars().count() > MAX_DESCRIPTION_LEN {
            errors.push(FieldError::new(
                "description",
                format!("size must be between 0 and {MAX_DESCRIPTION_LEN}"),
            ));
        }
    }

    match (make, model, year, price_eur, image_url) {
        (Some(make), Some(model), Some(year), Some(price_eur), Some(image_url))
            if errors.is_empty() =>
        {
            Ok(CarFields {
                make,
                model,
                year,
                price_eur,
                image_url,
                description,
            })
        }
        _ => Err(errors),
    }
}

fn required_text(
    field: &str,
    value: Option<String>,
    max_len: Option<usize>,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        errors.push(FieldError::new(field, BLANK));
        return None;
    };
    if let Some(max) = max_len {
        if value.chars().count() > max {
            errors.push(FieldError::new(
                field,
                format!("size must be between 0 and {max}"),
            ));
            return None;
        }
    }
    Some(value)
}
