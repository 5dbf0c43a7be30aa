use std::str::FromStr;

use rust_decimal::Decimal;

use super::*;

fn valid_record(id: &str) -> RawRecord {
    RawRecord {
        id: Some(id.to_string()),
        title: Some("Lenovo ThinkPad X1".to_string()),
        url: Some(format!("/test-sites/e-commerce/allinone/product/{id}")),
        image: Some("https://webscraper.io/images/x1.png".to_string()),
        price: Some("$1,101.83".to_string()),
        description: Some("Lenovo ThinkPad X1, 14\" FHD".to_string()),
        review_count: Some("14".to_string()),
        rating: 3,
    }
}

fn failure_field(record: &RawRecord) -> &'static str {
    validate_record(record)
        .expect_err("expected record to be rejected")
        .0
}

#[test]
fn valid_record_coerces_all_fields() {
    let item = validate_record(&valid_record("548")).unwrap();
    assert_eq!(item.id, 548);
    assert_eq!(item.title, "Lenovo ThinkPad X1");
    assert_eq!(item.url, "/test-sites/e-commerce/allinone/product/548");
    assert_eq!(item.image, "https://webscraper.io/images/x1.png");
    assert_eq!(item.price, Decimal::from_str("1101.83").unwrap());
    assert_eq!(item.review_count, 14);
    assert_eq!(item.review_score, 3);
}

#[test]
fn non_numeric_id_is_rejected() {
    assert_eq!(failure_field(&valid_record("thinkpad")), "id");
}

#[test]
fn zero_id_is_rejected() {
    assert_eq!(failure_field(&valid_record("0")), "id");
}

#[test]
fn empty_id_token_is_rejected() {
    assert_eq!(failure_field(&valid_record("")), "id");
}

#[test]
fn missing_title_is_rejected() {
    let mut record = valid_record("548");
    record.title = None;
    assert_eq!(failure_field(&record), "title");
}

#[test]
fn blank_title_is_rejected() {
    let mut record = valid_record("548");
    record.title = Some("   ".to_string());
    assert_eq!(failure_field(&record), "title");
}

#[test]
fn relative_image_is_rejected() {
    let mut record = valid_record("548");
    record.image = Some("/images/x1.png".to_string());
    assert_eq!(failure_field(&record), "image");
}

#[test]
fn opaque_image_url_is_rejected() {
    let mut record = valid_record("548");
    record.image = Some("data:image/png;base64,AAAA".to_string());
    assert_eq!(failure_field(&record), "image");
}

#[test]
fn price_without_digits_is_rejected() {
    let mut record = valid_record("548");
    record.price = Some("Sold out".to_string());
    assert_eq!(failure_field(&record), "price");
}

#[test]
fn missing_price_is_rejected() {
    let mut record = valid_record("548");
    record.price = None;
    assert_eq!(failure_field(&record), "price");
}

#[test]
fn empty_description_is_allowed() {
    let mut record = valid_record("548");
    record.description = Some(String::new());
    let item = validate_record(&record).unwrap();
    assert!(item.description.is_empty());
}

#[test]
fn missing_description_is_rejected() {
    let mut record = valid_record("548");
    record.description = None;
    assert_eq!(failure_field(&record), "description");
}

#[test]
fn non_numeric_review_count_is_rejected() {
    let mut record = valid_record("548");
    record.review_count = Some("many".to_string());
    assert_eq!(failure_field(&record), "review_count");
}

#[test]
fn negative_review_count_is_rejected() {
    let mut record = valid_record("548");
    record.review_count = Some("-2".to_string());
    assert_eq!(failure_field(&record), "review_count");
}

#[test]
fn validate_records_splits_valid_and_failed_in_order() {
    let mut broken = valid_record("549");
    broken.price = None;
    let records = vec![valid_record("548"), broken, valid_record("550")];

    let outcome = validate_records(&records);

    let ids: Vec<i64> = outcome.items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![548, 550]);
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.index, 1);
    assert_eq!(failure.raw_id.as_deref(), Some("549"));
    assert_eq!(failure.field, "price");
}

#[test]
fn every_rejected_record_has_a_failure() {
    let records = vec![RawRecord::default(), RawRecord::default()];
    let outcome = validate_records(&records);
    assert!(outcome.items.is_empty());
    assert_eq!(outcome.failures.len(), records.len());
}

#[test]
fn failure_display_names_record_and_field() {
    let failure = ValidationFailure {
        index: 2,
        raw_id: Some("abc".to_string()),
        field: "id",
        reason: "\"abc\" is not an integer".to_string(),
    };
    assert_eq!(
        failure.to_string(),
        "record 2 (id abc): id: \"abc\" is not an integer"
    );
}

#[test]
fn price_at_store_limit_is_accepted() {
    let mut record = valid_record("548");
    record.price = Some("$9,999,999,999.99".to_string());
    let item = validate_record(&record).unwrap();
    assert_eq!(item.price, Decimal::from_str("9999999999.99").unwrap());
}

#[test]
fn price_above_store_limit_is_rejected() {
    let mut record = valid_record("548");
    record.price = Some("$10,000,000,000.00".to_string());
    assert_eq!(failure_field(&record), "price");
}

#[test]
fn duplicate_id_keeps_first_record_and_rejects_later_ones() {
    let mut carbon = valid_record("548");
    carbon.title = Some("Lenovo ThinkPad X1 Carbon".to_string());
    let records = vec![valid_record("548"), valid_record("550"), carbon];

    let outcome = validate_records(&records);

    let ids: Vec<i64> = outcome.items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![548, 550]);
    assert_eq!(outcome.items[0].title, "Lenovo ThinkPad X1");
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.index, 2);
    assert_eq!(failure.raw_id.as_deref(), Some("548"));
    assert_eq!(failure.field, "id");
    assert!(failure.reason.contains("duplicate id 548"), "{}", failure.reason);
}

#[test]
fn rejected_record_does_not_claim_its_id() {
    let mut broken = valid_record("548");
    broken.price = None;
    let records = vec![broken, valid_record("548")];

    let outcome = validate_records(&records);

    assert_eq!(outcome.items.len(), 1);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].field, "price");
}
