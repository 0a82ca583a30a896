//! Explore usage counts pushed down to views.

use std::collections::{BTreeMap, BTreeSet};

use super::record::ExploreKey;

/// Raw query counts per explore.
///
/// A count can be tied to a model or to an explore name alone. Lookups try
/// the exact (model, explore) pair first, then the model-less entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageData {
    counts: BTreeMap<(Option<String>, String), u64>,
}

impl UsageData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a count. Repeated rows for the same key accumulate.
    pub fn insert(&mut self, model: Option<&str>, explore: &str, count: u64) {
        let key = (model.map(str::to_string), explore.to_string());
        let entry = self.counts.entry(key).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    /// Count for an explore, if the usage source mentions it.
    pub fn get(&self, key: &ExploreKey) -> Option<u64> {
        self.counts
            .get(&(Some(key.model.clone()), key.explore.clone()))
            .or_else(|| self.counts.get(&(None, key.explore.clone())))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Sum each explore's count into every view it touches.
///
/// Returns None when there is no usage source, so callers can keep
/// "unknown" apart from zero. Views no counted explore touches are absent
/// from the map and read as 0.
pub fn propagate_usage(
    explores: &BTreeMap<ExploreKey, BTreeSet<String>>,
    usage: Option<&UsageData>,
) -> Option<BTreeMap<String, u64>> {
    let usage = usage?;
    let mut by_view: BTreeMap<String, u64> = BTreeMap::new();

    for (key, views) in explores {
        let Some(count) = usage.get(key) else {
            continue;
        };
        for view in views {
            let total = by_view.entry(view.clone()).or_insert(0);
            *total = total.saturating_add(count);
        }
    }

    Some(by_view)
}
