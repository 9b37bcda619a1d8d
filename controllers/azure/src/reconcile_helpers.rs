//! Helper functions shared by the per-kind external clients
//!
//! Comparison of desired and observed fields, late initialization, readiness
//! mapping and generated secrets.

use crds::{Condition, SkuTier};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Provisioning state of a resource that is ready
pub const STATE_SUCCEEDED: &str = "Succeeded";
/// Provisioning state of a resource that is being created
pub const STATE_CREATING: &str = "Creating";
/// Provisioning state of a resource that is being deleted
pub const STATE_DELETING: &str = "Deleting";

/// A field left unset in the spec is not managed and always matches
pub fn optional_matches<T: PartialEq + ?Sized>(desired: Option<&T>, observed: Option<&T>) -> bool {
    match desired {
        None => true,
        Some(d) => observed == Some(d),
    }
}

/// Tags match when unset in the spec or equal to the observed tags
pub fn tags_match(
    desired: Option<&BTreeMap<String, String>>,
    observed: Option<&BTreeMap<String, String>>,
) -> bool {
    match desired {
        None => true,
        Some(d) => d == observed.unwrap_or(&BTreeMap::new()),
    }
}

/// Every desired key is present in `observed` with the same value.
///
/// Azure adds its own keys to maps such as the Redis configuration; only the
/// keys the spec sets are compared.
pub fn map_contains(
    desired: Option<&BTreeMap<String, String>>,
    observed: Option<&BTreeMap<String, String>>,
) -> bool {
    let Some(desired) = desired else {
        return true;
    };
    let empty = BTreeMap::new();
    let observed = observed.unwrap_or(&empty);
    desired.iter().all(|(k, v)| observed.get(k) == Some(v))
}

/// Fill an unset spec field from the observed value, returning true when it changed
pub fn late_init<T: Clone>(field: &mut Option<T>, observed: Option<&T>) -> bool {
    match (field.as_ref(), observed) {
        (None, Some(value)) => {
            *field = Some(value.clone());
            true
        }
        _ => false,
    }
}

/// Case-insensitive comparison of an ARM state
pub fn state_is(state: Option<&str>, expected: &str) -> bool {
    state.is_some_and(|s| s.eq_ignore_ascii_case(expected))
}

/// Ready condition for a resource reporting an ARM `provisioningState`
pub fn provisioning_condition(state: Option<&str>) -> Condition {
    if state_is(state, STATE_SUCCEEDED) {
        Condition::available()
    } else if state_is(state, STATE_CREATING) {
        Condition::creating()
    } else if state_is(state, STATE_DELETING) {
        Condition::deleting()
    } else {
        Condition::unavailable()
    }
}

/// SKU name of a MySQL or PostgreSQL server: `{B|GP|MO}_{family}_{capacity}`
pub fn sql_sku_name(tier: SkuTier, family: &str, capacity: i32) -> String {
    let prefix = match tier {
        SkuTier::Basic => "B",
        SkuTier::GeneralPurpose => "GP",
        SkuTier::MemoryOptimized => "MO",
    };
    format!("{}_{}_{}", prefix, family, capacity)
}

/// ARM string of an SKU tier
pub fn sku_tier(tier: SkuTier) -> &'static str {
    match tier {
        SkuTier::Basic => "Basic",
        SkuTier::GeneralPurpose => "GeneralPurpose",
        SkuTier::MemoryOptimized => "MemoryOptimized",
    }
}

/// Generate an administrator password.
///
/// Azure requires characters from three of uppercase, lowercase, digits and
/// symbols; the fixed characters guarantee uppercase, lowercase and a symbol.
pub fn generate_password() -> String {
    let first = Uuid::new_v4().simple().to_string();
    let second = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("Az{}!{}", &first[..14], &second[..14])
}

#[cfg(test)]
#[path = "reconcile_helpers_test.rs"]
mod reconcile_helpers_test;
