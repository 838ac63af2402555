// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::logparse::parse_log;

#[yare::parameterized(
    type_err = { "TypeError: Cannot read property", ErrorKind::TypeError },
    type_spaced = { "a type error occurred", ErrorKind::TypeError },
    reference = { "ReferenceError: x is not defined", ErrorKind::ReferenceError },
    syntax = { "SyntaxError: Unexpected token", ErrorKind::SyntaxError },
    network = { "Connection refused by upstream", ErrorKind::NetworkError },
    database = { "SQL constraint violated", ErrorKind::DatabaseError },
    auth = { "request was unauthorized", ErrorKind::AuthenticationError },
    timeout = { "operation timeout after 30s", ErrorKind::TimeoutError },
    generic = { "something odd happened", ErrorKind::GenericError },
)]
fn classification_by_keyword(text: &str, kind: ErrorKind) {
    assert_eq!(classify_error(text), kind);
}

#[test]
fn classification_prefers_earlier_rules() {
    // Both "typeerror" and "network" appear; the type rule is checked first.
    assert_eq!(classify_error("TypeError during network call"), ErrorKind::TypeError);
}

#[test]
fn stack_trace_matches_at_frames() {
    let text = "boom\n    at CheckoutPage.handleCoupon (/app/cart.js:45:12)\n    at CheckoutPage.applyDiscount (/app/cart.js:67:8)\n";
    let stack = extract_stack_trace(text).unwrap();
    assert!(stack.starts_with("at CheckoutPage.handleCoupon"));
    assert!(stack.contains("applyDiscount"));
}

#[test]
fn no_stack_trace_yields_none() {
    assert_eq!(extract_stack_trace("plain failure message"), None);
}

#[test]
fn key_components_union_is_deduplicated() {
    let text = r#"failed 'coupon' at /app/cart.js loading 'coupon' via applyDiscount(code) code 4042"#;
    let components = extract_key_components(text);
    assert!(components.contains(&"coupon".to_string()));
    assert!(components.contains(&"/app/cart.js".to_string()));
    assert!(components.contains(&"applyDiscount(code)".to_string()));
    assert!(components.contains(&"4042".to_string()));
    let coupon_count = components.iter().filter(|c| *c == "coupon").count();
    assert_eq!(coupon_count, 1);
}

#[test]
fn hash_is_stable_and_distinguishes_content() {
    let a = signature_hash("TypeError", Some("x is null"));
    let b = signature_hash("TypeError", Some("x is null"));
    let c = signature_hash("TypeError", Some("y is null"));
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.as_str().len(), 32);
}

#[test]
fn signature_from_error_entry() {
    let parsed = parse_log(
        "2024-01-15T10:30:10 ERROR TypeError: Cannot read property 'map' of undefined\n",
    );
    let entry = parsed.errors().next().unwrap();
    let sig = extract_signature(&ReportId::new("r-1"), entry);
    assert_eq!(sig.kind, ErrorKind::TypeError);
    assert_eq!(sig.severity, Severity::High);
    assert_eq!(sig.frequency, 1);
    assert!(sig.key_components.contains(&"map".to_string()));
}
