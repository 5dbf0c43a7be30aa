//! String normalization helpers shared by listing extraction, validation,
//! and variant enrichment.
//!
//! These helpers never fail loudly: they return `None` (or the input
//! unchanged) and leave rejecting the record to [`crate::validate`].

use rust_decimal::Decimal;

/// Converts a formatted currency string into a decimal amount.
///
/// Every non-digit character is dropped, the remaining digits are read as
/// integer cents, and the result is scaled by 100:
/// `"$1,234.56"` → `123456` → `1234.56`.
///
/// Returns `None` when the text contains no digits or the digit run does not
/// fit in an `i64`.
#[must_use]
pub fn normalize_price(raw: &str) -> Option<Decimal> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let cents = digits.parse::<i64>().ok()?;
    Some(Decimal::new(cents, 2))
}

/// Last `/`-delimited segment of a link, e.g. `"548"` for `".../product/548"`.
///
/// A trailing slash yields an empty segment, which later fails id coercion.
#[must_use]
pub fn trailing_segment(href: &str) -> &str {
    href.rsplit('/').next().unwrap_or_default()
}

/// First whitespace-delimited token, e.g. `"14"` for `"14 reviews"`.
#[must_use]
pub fn leading_token(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}

/// Resolves a possibly relative link against the page it was found on.
///
/// Falls back to the raw value when either side cannot be parsed.
#[must_use]
pub fn resolve_url(page_url: &str, raw: &str) -> String {
    url::Url::parse(page_url)
        .and_then(|base| base.join(raw))
        .map_or_else(|_| raw.to_string(), String::from)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
