//! Statistics over the record store
//!
//! This module provides functionality for computing and displaying
//! statistics from the records a crawl has stored.

use crate::storage::Record;
use crate::url::LocationId;
use std::collections::{BTreeMap, HashSet};

/// Record store statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatistics {
    /// Total number of stored records
    pub total_records: usize,

    /// Outgoing links summed over all records
    pub total_links: usize,

    /// Distinct link targets across all records
    pub unique_links: usize,

    /// Distinct link targets that have no record yet
    pub pending_links: usize,

    /// Records with a provenance timestamp
    pub records_with_provenance: usize,

    /// Records whose body text is empty
    pub empty_bodies: usize,

    /// Stored records per host
    pub records_by_host: BTreeMap<String, usize>,
}

impl StoreStatistics {
    /// Computes statistics for a set of records
    pub fn from_records(records: &[Record]) -> Self {
        let stored: HashSet<&LocationId> = records.iter().map(|r| &r.location).collect();
        let mut targets: HashSet<&LocationId> = HashSet::new();
        let mut stats = Self {
            total_records: records.len(),
            ..Self::default()
        };

        for record in records {
            stats.total_links += record.outgoing.len();
            targets.extend(record.outgoing.iter());

            if record.provenance_timestamp.is_some() {
                stats.records_with_provenance += 1;
            }
            if record.body.trim().is_empty() {
                stats.empty_bodies += 1;
            }

            let host = record.location.host().unwrap_or("(none)").to_string();
            *stats.records_by_host.entry(host).or_insert(0) += 1;
        }

        stats.unique_links = targets.len();
        stats.pending_links = targets.iter().filter(|t| !stored.contains(*t)).count();
        stats
    }

    /// Share of records with a provenance timestamp, as a percentage
    pub fn provenance_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            self.records_with_provenance as f64 / self.total_records as f64 * 100.0
        }
    }

    pub fn average_links(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            self.total_links as f64 / self.total_records as f64
        }
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Record Store Statistics ===\n");

    println!("Overview:");
    println!("  Records stored: {}", stats.total_records);
    println!(
        "  Outgoing links: {} ({:.1} per record)",
        stats.total_links,
        stats.average_links()
    );
    println!("  Distinct link targets: {}", stats.unique_links);
    println!("  Targets without a record: {}", stats.pending_links);
    println!(
        "  With provenance: {} ({:.1}%)",
        stats.records_with_provenance,
        stats.provenance_rate()
    );
    println!("  Empty bodies: {}", stats.empty_bodies);
    println!();

    if !stats.records_by_host.is_empty() {
        println!("Records by Host:");
        let mut hosts: Vec<_> = stats.records_by_host.iter().collect();
        hosts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (host, count) in hosts {
            println!("  {}: {}", host, count);
        }
    }
}
