//! CORS origin resolution.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use commander_core::Headers;
use commander_web::CorsConfig;
use proptest::prelude::*;

fn allow_list() -> CorsConfig {
    CorsConfig::new(["A", "B", "C"], ["GET"])
}

#[test]
fn test_listed_origin_is_echoed() {
    let headers = Headers::new().with("Origin", "B");
    assert_eq!(allow_list().resolve_origin(&headers), "B");
}

#[test]
fn test_unlisted_origin_falls_back_to_first() {
    let headers = Headers::new().with("Origin", "Z");
    assert_eq!(allow_list().resolve_origin(&headers), "A");
}

#[test]
fn test_missing_origin_falls_back_to_first() {
    assert_eq!(allow_list().resolve_origin(&Headers::new()), "A");
}

#[test]
fn test_origin_header_name_is_case_insensitive() {
    for name in ["origin", "Origin", "ORIGIN"] {
        let headers = Headers::new().with(name, "C");
        assert_eq!(allow_list().resolve_origin(&headers), "C", "header spelled {name}");
    }
}

#[test]
fn test_lowercase_spelling_wins() {
    let headers = Headers::new().with("origin", "B").with("Origin", "C");
    assert_eq!(allow_list().resolve_origin(&headers), "B");
}

proptest! {
    #[test]
    fn prop_resolved_origin_is_always_allow_listed(
        allowed in proptest::collection::vec("[a-z]{1,8}", 1..5),
        origin in "[a-z]{0,8}",
    ) {
        let cors = CorsConfig::new(allowed.clone(), ["GET"]);
        let resolved = cors.resolve_origin(&Headers::new().with("Origin", origin.clone()));

        prop_assert!(allowed.contains(&resolved));
        if allowed.contains(&origin) {
            prop_assert_eq!(resolved, origin);
        } else {
            prop_assert_eq!(&resolved, &allowed[0]);
        }
    }
}
