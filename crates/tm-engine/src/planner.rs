//! Step planning: which migrations an `up` or `down` would touch.
//!
//! Pure functions over the loaded migration set and the applied-version
//! set. Step counts arrive already validated as non-negative.

use std::collections::BTreeSet;
use tm_core::Migration;

/// Every loaded migration not yet applied, ascending by version.
pub fn plan_up<'a>(migrations: &'a [Migration], applied: &BTreeSet<i64>) -> Vec<&'a Migration> {
    let mut plan: Vec<&Migration> = migrations
        .iter()
        .filter(|m| !applied.contains(&m.version))
        .collect();
    plan.sort_by_key(|m| m.version);
    plan
}

/// Applied migrations that are also loaded, descending by version, truncated
/// to `limit` entries (`0` means all).
pub fn plan_down<'a>(
    migrations: &'a [Migration],
    applied: &BTreeSet<i64>,
    limit: usize,
) -> Vec<&'a Migration> {
    let mut plan: Vec<&Migration> = migrations
        .iter()
        .filter(|m| applied.contains(&m.version))
        .collect();
    plan.sort_by_key(|m| std::cmp::Reverse(m.version));
    if limit > 0 {
        plan.truncate(limit);
    }
    plan
}

/// Applied versions with no loaded migration, ascending.
pub fn unknown_versions(migrations: &[Migration], applied: &BTreeSet<i64>) -> Vec<i64> {
    let loaded: BTreeSet<i64> = migrations.iter().map(|m| m.version).collect();
    applied.difference(&loaded).copied().collect()
}
