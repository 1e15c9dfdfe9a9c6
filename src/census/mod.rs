//! Resource census
//!
//! [`Census`] holds the two accumulator tables filled during a run:
//! per-region counts keyed by region then region label, and cross-region
//! totals keyed by total label. [`engine`] drives the counters that fill it.

pub mod engine;

pub use engine::CensusEngine;

use serde::Serialize;
use std::collections::BTreeMap;

/// Per-region counts: region -> region label -> count
pub type PerRegionCounts = BTreeMap<String, BTreeMap<String, u64>>;

/// Cross-region totals: total label -> count
pub type TotalCounts = BTreeMap<String, u64>;

/// Accumulated counts for one census run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Census {
    per_region: PerRegionCounts,
    totals: TotalCounts,
}

impl Census {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the count of one resource kind in one region
    pub fn record_region(&mut self, region: &str, label: &str, count: u64) {
        self.per_region
            .entry(region.to_string())
            .or_default()
            .insert(label.to_string(), count);
    }

    /// Record the cross-region total of one resource kind
    pub fn record_total(&mut self, label: &str, count: u64) {
        self.totals.insert(label.to_string(), count);
    }

    pub fn per_region(&self) -> &PerRegionCounts {
        &self.per_region
    }

    /// Totals in lexicographic label order
    pub fn totals(&self) -> &TotalCounts {
        &self.totals
    }

    pub fn region_count(&self, region: &str, label: &str) -> Option<u64> {
        self.per_region.get(region)?.get(label).copied()
    }

    pub fn total(&self, label: &str) -> Option<u64> {
        self.totals.get(label).copied()
    }

    /// Sum of every total
    pub fn grand_total(&self) -> u64 {
        self.totals.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_census_is_empty() {
        let census = Census::new();
        assert!(census.per_region().is_empty());
        assert!(census.totals().is_empty());
        assert_eq!(census.grand_total(), 0);
    }

    #[test]
    fn test_record_region_groups_by_region() {
        let mut census = Census::new();
        census.record_region("us-east-1", "instances", 2);
        census.record_region("us-east-1", "volumes", 1);
        census.record_region("eu-west-1", "instances", 5);

        assert_eq!(census.per_region().len(), 2);
        assert_eq!(census.region_count("us-east-1", "volumes"), Some(1));
        assert_eq!(census.region_count("eu-west-1", "instances"), Some(5));
        assert_eq!(census.region_count("eu-west-1", "volumes"), None);
    }

    #[test]
    fn test_totals_sorted_and_summed() {
        let mut census = Census::new();
        census.record_total("Volumes", 2);
        census.record_total("Instances", 4);
        census.record_total("Users", 0);

        let labels: Vec<&str> = census.totals().keys().map(|k| k.as_str()).collect();
        assert_eq!(labels, vec!["Instances", "Users", "Volumes"]);
        assert_eq!(census.grand_total(), 6);
    }

    #[test]
    fn test_serializes_both_tables() {
        let mut census = Census::new();
        census.record_region("us-east-1", "lambdas", 3);
        census.record_total("Lambda Functions", 3);

        let json = serde_json::to_value(&census).unwrap();
        assert_eq!(json["per_region"]["us-east-1"]["lambdas"], 3);
        assert_eq!(json["totals"]["Lambda Functions"], 3);
    }
}
