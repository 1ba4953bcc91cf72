use fincache_core::{CacheKey, KeyArgs, MAX_KEY_LENGTH, NamespaceRegistry};

mod common;

#[test]
fn test_identical_inputs_same_key() {
    let ns = common::ns("forecast");

    let first = KeyArgs::new()
        .arg(42)
        .named("horizon", 12)
        .named("scenario", "pessimistic")
        .named("include_pending", true);
    let second = KeyArgs::new()
        .arg(42)
        .named("include_pending", true)
        .named("scenario", "pessimistic")
        .named("horizon", 12);

    assert_eq!(CacheKey::derive(&ns, &first), CacheKey::derive(&ns, &second));
}

#[test]
fn test_different_inputs_different_keys() {
    let ns = common::ns("report");
    let base = CacheKey::derive(&ns, &KeyArgs::new().arg(1).named("month", "2024-01"));

    let other_owner = CacheKey::derive(&ns, &KeyArgs::new().arg(2).named("month", "2024-01"));
    let other_month = CacheKey::derive(&ns, &KeyArgs::new().arg(1).named("month", "2024-02"));
    let other_ns = CacheKey::derive(
        &common::ns("analytics"),
        &KeyArgs::new().arg(1).named("month", "2024-01"),
    );

    assert_ne!(base, other_owner);
    assert_ne!(base, other_month);
    assert_ne!(base, other_ns);
}

#[test]
fn test_bounded_key_for_large_inputs() {
    let ns = common::ns("analytics");
    let categories: Vec<String> = (0..60).map(|i| format!("category-{i}")).collect();
    let args = KeyArgs::new().arg(7).named("categories", categories);

    let key = CacheKey::derive(&ns, &args);
    assert!(key.as_str().len() <= MAX_KEY_LENGTH);
    assert!(key.is_hashed());
    assert_eq!(key, CacheKey::derive(&ns, &args.clone()));
}

#[test]
fn test_scope_patterns_match_key_convention() {
    let registry = NamespaceRegistry::new()
        .with(common::ns("forecast"))
        .with(common::ns("report"));

    let key = CacheKey::derive(&common::ns("forecast"), &KeyArgs::new().arg("u-1").arg(6));
    let scope = registry.scope("u-1");

    let prefix = scope.patterns()[0].trim_end_matches('*').to_string();
    assert!(key.as_str().starts_with(&prefix));
}
