//! # Freshness Reconciliation
//!
//! The core merge algorithm: fold each provider's fresh mapping into the
//! persisted cache snapshot, field by field, deciding per field whether to
//! keep the fresh value or fall back to the last good cached one, and
//! recording a staleness flag for everything emitted.
//!
//! The rules, in order:
//! - a valid fresh value always wins and is flagged fresh;
//! - an invalid fresh value (sentinel, blank) falls back to the cached
//!   value, flagged stale;
//! - an invalid fresh value with no cache history is kept as-is and
//!   flagged fresh, because inventing a default would be worse than
//!   showing the truth;
//! - a fresh field that is absent outright (failed extraction) behaves
//!   like an invalid one: cached value, flagged stale;
//! - a wholly absent fetch falls back to the cached category wholesale,
//!   every field flagged stale.
//!
//! A field present in neither fresh data nor cache is simply absent from
//! the result; the renderer shows `N/A` for it.

use crate::{cache::Snapshot, providers::Fetched, AgeMap, Category, FieldMap};
use std::collections::HashMap;

/// Reconciled values and age flags for every category, the renderer's
/// single data input for one run.
#[derive(Debug, Default)]
pub struct DashboardData {
    values: HashMap<Category, FieldMap>,
    ages: HashMap<Category, AgeMap>,
}

impl DashboardData {
    pub fn value(&self, category: Category, field: &str) -> Option<&crate::FieldValue> {
        self.values.get(&category)?.get(field)
    }

    /// Whether the currently held value for this field came from cache.
    /// Fields we never emitted are not stale, they are absent.
    pub fn is_stale(&self, category: Category, field: &str) -> bool {
        self.ages
            .get(&category)
            .and_then(|ages| ages.get(field))
            .copied()
            .unwrap_or(false)
    }

    pub fn category(&self, category: Category) -> Option<&FieldMap> {
        self.values.get(&category)
    }
}

/// Merge one category's fresh mapping against the cache snapshot.
///
/// Returns the result mapping plus one explicit age flag per emitted
/// field; cache-sourced and fresh fields are never mixed silently.
pub fn reconcile(
    fresh: Option<&FieldMap>,
    snapshot: &Snapshot,
    category: Category,
) -> (FieldMap, AgeMap) {
    let mut result = FieldMap::new();
    let mut ages = AgeMap::new();
    let cached = snapshot.get(category.as_str());

    match fresh {
        Some(fresh) => {
            // Fields the adapter attempted but could not produce (failed
            // extraction, dead endpoint half of a merged category) count as
            // absent fresh values: fall back to cache, flagged stale.
            if let Some(cached) = cached {
                for (field, value) in cached {
                    if !fresh.contains_key(field) {
                        result.insert(field.clone(), value.clone());
                        ages.insert(field.clone(), true);
                    }
                }
            }

            for (field, value) in fresh {
                if value.is_valid() {
                    result.insert(field.clone(), value.clone());
                    ages.insert(field.clone(), false);
                } else if let Some(old) = cached.and_then(|c| c.get(field)) {
                    log::debug!(
                        "{}.{}: fresh value invalid, using cached {:?}",
                        category,
                        field,
                        old
                    );
                    result.insert(field.clone(), old.clone());
                    ages.insert(field.clone(), true);
                } else {
                    // Nothing better available; keep the invalid value
                    // rather than substituting an unexplained default.
                    result.insert(field.clone(), value.clone());
                    ages.insert(field.clone(), false);
                }
            }
        }
        None => {
            if let Some(cached) = cached {
                log::info!("{}: fetch failed, showing cached values", category);
                for (field, value) in cached {
                    result.insert(field.clone(), value.clone());
                    ages.insert(field.clone(), true);
                }
            }
        }
    }

    (result, ages)
}

/// Reconcile every category of a fetch pass against the snapshot.
pub fn assemble(fetched: &Fetched, snapshot: &Snapshot) -> DashboardData {
    let mut data = DashboardData::default();
    for category in Category::ALL {
        let (values, ages) = reconcile(fetched.get(category), snapshot, category);
        data.values.insert(category, values);
        data.ages.insert(category, ages);
    }
    data
}

/// Write the run's values back into the snapshot for the next invocation.
///
/// Only valid values are persisted: an invalid sentinel that survived
/// reconciliation (no cache history) must never displace a future good
/// value, and repeated runs against the same broken provider must leave
/// the snapshot unchanged.
pub fn refresh_snapshot(snapshot: &mut Snapshot, data: &DashboardData) {
    for category in Category::ALL {
        let Some(values) = data.values.get(&category) else {
            continue;
        };
        if values.is_empty() {
            continue;
        }
        let entry = snapshot.entry(category.as_str().to_string()).or_default();
        for (field, value) in values {
            if value.is_valid() {
                entry.insert(field.clone(), value.clone());
            }
        }
    }
}
