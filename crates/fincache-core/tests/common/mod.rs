#![allow(dead_code)]
use fincache_core::{CacheValue, Namespace, codec};

/// Helper to create a CacheValue from a JSON string slice.
/// Panics if the JSON is invalid (intended for tests).
pub fn value_from_json(json: &str) -> CacheValue {
    codec::decode(json).expect("Failed to create test value from JSON")
}

/// Helper to build a namespace that is known to be valid.
pub fn ns(name: &str) -> Namespace {
    Namespace::new(name).expect("valid test namespace")
}

/// Returns a nested forecast-like fixture covering every variant.
pub fn forecast_fixture() -> CacheValue {
    value_from_json(
        r#"{
        "account_id": 42,
        "currency": "EUR",
        "projected": true,
        "confidence": 0.87,
        "notes": null,
        "months": [
            {"month": "2024-01", "balance": 1520.5, "flags": []},
            {"month": "2024-02", "balance": -35.25, "flags": ["overdraft"]}
        ],
        "categories": {
            "groceries": {"spent": 310, "budget": 400.0},
            "rent": {"spent": 950, "budget": 950}
        }
    }"#,
    )
}
