//! Ranked accumulation of candidate controls

use crate::control::Control;
use crate::types::FoundType;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// One piece of evidence for one control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub control: Control,
    pub found_type: FoundType,
    pub deviation: i32,
    pub distance: i32,
    pub start: i32,
    pub hierarchy: String,
    pub index: usize,
}

impl Entry {
    /// Ranking order; see [`WeightedControlList::entries_sorted`]
    pub fn rank_cmp(&self, other: &Entry) -> Ordering {
        self.found_type
            .rank()
            .cmp(&other.found_type.rank())
            .then_with(|| self.deviation.cmp(&other.deviation))
            .then_with(|| self.distance.cmp(&other.distance))
            .then_with(|| self.start.cmp(&other.start))
            .then_with(|| compare_hierarchy(&self.hierarchy, &other.hierarchy))
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Component-wise order of `>`-joined pre-order paths; an ancestor is a
/// prefix of its descendants and sorts first
fn compare_hierarchy(first: &str, second: &str) -> Ordering {
    hierarchy_components(first).cmp(hierarchy_components(second))
}

fn hierarchy_components(hierarchy: &str) -> impl Iterator<Item = u32> + '_ {
    hierarchy
        .split('>')
        .filter(|component| !component.is_empty())
        .map(|component| component.trim().parse::<u32>().unwrap_or(u32::MAX))
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} found by: {} deviation: {} distance: {} start: {} hierarchy: {} index: {}",
            self.control.description(),
            self.found_type,
            self.deviation,
            self.distance,
            self.start,
            self.hierarchy,
            self.index
        )
    }
}

/// Append-only candidate list read through a sorted, de-duplicated view
///
/// `add` takes `&self`; entries sit behind a lock, so one list may be filled
/// from several worker threads (`Send + Sync`).
#[derive(Debug, Default)]
pub struct WeightedControlList {
    entries: RwLock<Vec<Entry>>,
}

impl WeightedControlList {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &self,
        control: Control,
        found_type: FoundType,
        deviation: i32,
        distance: i32,
        start: i32,
        hierarchy: impl Into<String>,
        index: usize,
    ) {
        self.add_entry(Entry {
            control,
            found_type,
            deviation,
            distance,
            start,
            hierarchy: hierarchy.into(),
            index,
        });
    }

    pub fn add_entry(&self, entry: Entry) {
        self.entries.write().push(entry);
    }

    /// Append a batch under one lock acquisition
    pub fn extend(&self, entries: impl IntoIterator<Item = Entry>) {
        self.entries.write().extend(entries);
    }

    pub fn add_all(&self, other: &WeightedControlList) {
        let others = other.entries();
        self.extend(others);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of raw entries, duplicates included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Raw entries in insertion order
    pub fn entries(&self) -> Vec<Entry> {
        self.entries.read().clone()
    }

    /// Raw entries in ranking order, duplicates included
    pub fn entries_ranked(&self) -> Vec<Entry> {
        let mut entries = self.entries();
        entries.sort_by(Entry::rank_cmp);
        entries
    }

    /// Entries sorted ascending by found type rank, deviation, distance,
    /// start, hierarchy (ancestor first) and index; only the best entry per
    /// control is kept
    pub fn entries_sorted(&self) -> Vec<Entry> {
        let mut seen = HashSet::new();
        self.entries_ranked()
            .into_iter()
            .filter(|entry| seen.insert(entry.control.node()))
            .collect()
    }

    /// Best ranked entry
    pub fn best(&self) -> Option<Entry> {
        self.entries_ranked().into_iter().next()
    }

    /// Keep only entries accepted by `predicate`
    pub fn retain(&self, predicate: impl FnMut(&Entry) -> bool) {
        self.entries.write().retain(predicate);
    }
}

impl Clone for WeightedControlList {
    fn clone(&self) -> Self {
        Self {
            entries: RwLock::new(self.entries()),
        }
    }
}

impl fmt::Display for WeightedControlList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.entries_sorted() {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}
