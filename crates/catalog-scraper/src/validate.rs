//! Coercion and schema validation from [`RawRecord`] to [`Item`].

use std::collections::HashSet;

use catalog_core::Item;
use rust_decimal::Decimal;

use crate::listing::RawRecord;
use crate::normalize::normalize_price;

/// Why one raw record was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Position of the record in listing (DOM) order.
    pub index: usize,
    /// Raw id token, when one was present, to make the failure traceable.
    pub raw_id: Option<String>,
    pub field: &'static str,
    pub reason: String,
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "record {} (id {}): {}: {}",
            self.index,
            self.raw_id.as_deref().unwrap_or("?"),
            self.field,
            self.reason
        )
    }
}

/// Validated items plus one failure per rejected record, both in input order.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub items: Vec<Item>,
    pub failures: Vec<ValidationFailure>,
}

/// Largest price the store's `NUMERIC(12, 2)` columns can hold:
/// `9_999_999_999.99`, i.e. `999_999_999_999` at scale 2.
const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Validates every record independently. A record failing any rule is
/// dropped and reported; it never produces a partial [`Item`].
///
/// Ids must be unique within one listing: the first record with a given id
/// wins and later ones are rejected as duplicates.
#[must_use]
pub fn validate_records(records: &[RawRecord]) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();
    let mut seen = HashSet::new();
    for (index, record) in records.iter().enumerate() {
        let result = validate_record(record).and_then(|item| {
            if seen.insert(item.id) {
                Ok(item)
            } else {
                Err((
                    "id",
                    format!("duplicate id {} already accepted in this listing", item.id),
                ))
            }
        });
        match result {
            Ok(item) => outcome.items.push(item),
            Err((field, reason)) => outcome.failures.push(ValidationFailure {
                index,
                raw_id: record.id.clone(),
                field,
                reason,
            }),
        }
    }
    outcome
}

/// Validates a single record, reporting the first failing field.
///
/// # Errors
///
/// Returns `(field, reason)` for the first rule the record violates.
pub fn validate_record(record: &RawRecord) -> Result<Item, (&'static str, String)> {
    let id = coerce_int::<i64>("id", record.id.as_deref())?;
    if id <= 0 {
        return Err(("id", format!("expected a positive integer, got {id}")));
    }

    let title = require_non_empty("title", record.title.as_deref())?;
    let url = require_non_empty("url", record.url.as_deref())?;
    let image = require_absolute_url("image", record.image.as_deref())?;

    let raw_price = record
        .price
        .as_deref()
        .ok_or(("price", "missing".to_string()))?;
    let price = normalize_price(raw_price)
        .ok_or_else(|| ("price", format!("no numeric amount in {raw_price:?}")))?;
    if price > MAX_PRICE {
        return Err(("price", format!("{price} exceeds the maximum of {MAX_PRICE}")));
    }

    let description = record
        .description
        .as_deref()
        .map(str::trim)
        .ok_or(("description", "missing".to_string()))?
        .to_string();

    let review_count = coerce_int::<i32>("review_count", record.review_count.as_deref())?;
    if review_count < 0 {
        return Err((
            "review_count",
            format!("expected a non-negative integer, got {review_count}"),
        ));
    }

    let review_score = i32::try_from(record.rating)
        .map_err(|_| ("review_score", format!("{} is out of range", record.rating)))?;

    Ok(Item {
        id,
        title,
        url,
        image,
        price,
        description,
        review_count,
        review_score,
    })
}

fn coerce_int<T: std::str::FromStr>(
    field: &'static str,
    raw: Option<&str>,
) -> Result<T, (&'static str, String)> {
    let raw = raw.ok_or((field, "missing".to_string()))?;
    raw.trim()
        .parse::<T>()
        .map_err(|_| (field, format!("{raw:?} is not an integer")))
}

fn require_non_empty(
    field: &'static str,
    raw: Option<&str>,
) -> Result<String, (&'static str, String)> {
    match raw.map(str::trim) {
        None => Err((field, "missing".to_string())),
        Some("") => Err((field, "must not be empty".to_string())),
        Some(value) => Ok(value.to_string()),
    }
}

fn require_absolute_url(
    field: &'static str,
    raw: Option<&str>,
) -> Result<String, (&'static str, String)> {
    let value = require_non_empty(field, raw)?;
    match url::Url::parse(&value) {
        Ok(parsed) if !parsed.cannot_be_a_base() => Ok(value),
        Ok(_) => Err((field, format!("{value:?} is not a hierarchical URL"))),
        Err(e) => Err((field, format!("{value:?} is not an absolute URL: {e}"))),
    }
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
