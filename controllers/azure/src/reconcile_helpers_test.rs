//! Unit tests for reconcile_helpers module

use super::*;
use crds::{ConditionReason, ConditionType};

fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_optional_matches_unset_is_unmanaged() {
    assert!(optional_matches::<str>(None, Some("TLS1_2")));
    assert!(optional_matches(Some("TLS1_2"), Some("TLS1_2")));
    assert!(!optional_matches(Some("TLS1_2"), Some("TLS1_0")));
    assert!(!optional_matches(Some("TLS1_2"), None));
}

#[test]
fn test_tags_match() {
    let desired = tags(&[("env", "prod")]);
    assert!(tags_match(None, Some(&desired)));
    assert!(tags_match(Some(&desired), Some(&tags(&[("env", "prod")]))));
    assert!(!tags_match(Some(&desired), Some(&tags(&[("env", "dev")]))));
    assert!(!tags_match(Some(&desired), None));
    assert!(tags_match(Some(&BTreeMap::new()), None));
}

#[test]
fn test_map_contains_ignores_extra_observed_keys() {
    let desired = tags(&[("maxmemory-policy", "allkeys-lru")]);
    let observed = tags(&[("maxmemory-policy", "allkeys-lru"), ("maxclients", "1000")]);
    assert!(map_contains(Some(&desired), Some(&observed)));
    assert!(!map_contains(Some(&observed), Some(&desired)));
    assert!(map_contains(None, None));
}

#[test]
fn test_late_init_only_fills_unset_fields() {
    let mut field: Option<String> = None;
    assert!(late_init(&mut field, Some(&"1.2".to_string())));
    assert_eq!(field.as_deref(), Some("1.2"));

    assert!(!late_init(&mut field, Some(&"1.0".to_string())));
    assert_eq!(field.as_deref(), Some("1.2"));

    let mut empty: Option<i32> = None;
    assert!(!late_init(&mut empty, None));
}

#[test]
fn test_provisioning_condition() {
    let ready = provisioning_condition(Some("Succeeded"));
    assert_eq!(ready.type_, ConditionType::Ready);
    assert_eq!(ready.reason, ConditionReason::Available);

    assert_eq!(provisioning_condition(Some("creating")).reason, ConditionReason::Creating);
    assert_eq!(provisioning_condition(Some("Deleting")).reason, ConditionReason::Deleting);
    assert_eq!(provisioning_condition(Some("Failed")).reason, ConditionReason::Unavailable);
    assert_eq!(provisioning_condition(None).reason, ConditionReason::Unavailable);
}

#[test]
fn test_sql_sku_name() {
    assert_eq!(sql_sku_name(SkuTier::Basic, "Gen5", 1), "B_Gen5_1");
    assert_eq!(sql_sku_name(SkuTier::GeneralPurpose, "Gen5", 2), "GP_Gen5_2");
    assert_eq!(sql_sku_name(SkuTier::MemoryOptimized, "Gen5", 4), "MO_Gen5_4");
}

#[test]
fn test_generate_password() {
    let password = generate_password();
    assert_eq!(password.len(), 31);
    assert!(password.chars().any(|c| c.is_ascii_uppercase()));
    assert!(password.chars().any(|c| c.is_ascii_lowercase()));
    assert!(password.contains('!'));
    assert_ne!(password, generate_password());
}
