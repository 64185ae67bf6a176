//! Per-type import counters

use serde::{Serialize, Serializer};
use serde::ser::SerializeStruct;

/// Counts of created, updated, deleted and ignored objects
///
/// Counters only move through the `inc_*` methods and [`Stats::merge`];
/// `total` is always derived from the four counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    created: u64,
    updated: u64,
    deleted: u64,
    ignored: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn updated(&self) -> u64 {
        self.updated
    }

    pub fn deleted(&self) -> u64 {
        self.deleted
    }

    pub fn ignored(&self) -> u64 {
        self.ignored
    }

    pub fn total(&self) -> u64 {
        self.created + self.updated + self.deleted + self.ignored
    }

    pub fn inc_created(&mut self) {
        self.created += 1;
    }

    pub fn inc_updated(&mut self) {
        self.updated += 1;
    }

    pub fn inc_deleted(&mut self) {
        self.deleted += 1;
    }

    pub fn inc_ignored(&mut self) {
        self.ignored += 1;
    }

    pub fn inc_ignored_by(&mut self, count: u64) {
        self.ignored += count;
    }

    /// Element-wise sum of two stats
    pub fn merge(&mut self, other: &Stats) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.ignored += other.ignored;
    }
}

impl Serialize for Stats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Stats", 5)?;
        state.serialize_field("created", &self.created)?;
        state.serialize_field("updated", &self.updated)?;
        state.serialize_field("deleted", &self.deleted)?;
        state.serialize_field("ignored", &self.ignored)?;
        state.serialize_field("total", &self.total())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = Stats::new();
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_total_tracks_counters() {
        let mut stats = Stats::new();
        stats.inc_created();
        stats.inc_created();
        stats.inc_updated();
        stats.inc_deleted();
        stats.inc_ignored_by(3);

        assert_eq!(stats.created(), 2);
        assert_eq!(stats.updated(), 1);
        assert_eq!(stats.deleted(), 1);
        assert_eq!(stats.ignored(), 3);
        assert_eq!(stats.total(), 7);
    }

    #[test]
    fn test_merge_is_elementwise_sum() {
        let mut a = Stats::new();
        a.inc_created();
        a.inc_ignored();

        let mut b = Stats::new();
        b.inc_created();
        b.inc_deleted();

        let mut ab = a;
        ab.merge(&b);
        let mut ba = b;
        ba.merge(&a);

        assert_eq!(ab, ba);
        assert_eq!(ab.created(), 2);
        assert_eq!(ab.deleted(), 1);
        assert_eq!(ab.ignored(), 1);
        assert_eq!(ab.total(), 4);
    }

    #[test]
    fn test_serializes_total() {
        let mut stats = Stats::new();
        stats.inc_updated();
        let json: serde_json::Value = serde_json::to_value(stats).unwrap();
        assert_eq!(json["updated"], 1);
        assert_eq!(json["total"], 1);
    }
}
