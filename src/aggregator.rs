//! Aggregation manager
//!
//! Fans one query out to every configured source client concurrently and
//! reconciles the partial results: individual source failures are logged
//! and skipped, survivors are merged, deduplicated per (vendor, source)
//! and sorted ascending by price.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::PriceCache;
use crate::shared::types::{PriceRecord, PriceStatistics};
use crate::sources::SourceClient;

pub struct AggregationManager {
    clients: Vec<Arc<dyn SourceClient>>,
    cache: Arc<PriceCache>,
}

impl AggregationManager {
    pub fn new(clients: Vec<Arc<dyn SourceClient>>, cache: Arc<PriceCache>) -> Self {
        Self { clients, cache }
    }

    pub fn source_count(&self) -> usize {
        self.clients.len()
    }

    /// Query every source concurrently and reconcile the merged result set.
    ///
    /// All client futures are issued before any is awaited; a failing source
    /// never blocks or discards the others' results.
    pub async fn search_all_sources(&self, term: &str, region: &str) -> Vec<PriceRecord> {
        info!(
            "🔍 Searching {} sources for '{}' in {}",
            self.clients.len(),
            term,
            region
        );

        let futures = self
            .clients
            .iter()
            .map(|client| client.search(term, region));
        let settled = join_all(futures).await;

        let mut merged = Vec::new();
        for (client, outcome) in self.clients.iter().zip(settled) {
            match outcome {
                Ok(records) => merged.extend(records),
                Err(e) => {
                    warn!("❌ Source {} failed: {}", client.label().as_str(), e);
                }
            }
        }

        let records = reconcile(merged);
        info!("🎯 Aggregated {} price records for '{}'", records.len(), term);
        records
    }

    /// Summary statistics over records with a positive price.
    /// Absent when nothing remains, never zeroed.
    pub fn statistics(&self, records: &[PriceRecord]) -> Option<PriceStatistics> {
        let mut prices: Vec<f64> = records
            .iter()
            .filter(|r| r.is_valid())
            .map(|r| r.price)
            .collect();
        if prices.is_empty() {
            return None;
        }
        prices.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = prices.len();
        let sum: f64 = prices.iter().sum();
        let average = sum / count as f64;

        let median = if count % 2 == 1 {
            prices[count / 2]
        } else {
            (prices[count / 2 - 1] + prices[count / 2]) / 2.0
        };

        let variance =
            prices.iter().map(|p| (p - average).powi(2)).sum::<f64>() / count as f64;

        Some(PriceStatistics {
            count,
            min: prices[0],
            max: prices[count - 1],
            average,
            median,
            std_deviation: variance.sqrt(),
        })
    }

    /// Administrative escape hatch exposed to operators
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        info!("🧹 Price cache cleared");
    }
}

/// Drop invalid records, keep one record per (vendor, source) pair and
/// sort ascending by price. The sort is stable, so ties keep their
/// discovery order. A vendor reached through two different providers stays
/// once per provider.
fn reconcile(records: Vec<PriceRecord>) -> Vec<PriceRecord> {
    let mut seen = HashSet::new();
    let mut result: Vec<PriceRecord> = records
        .into_iter()
        .filter(|r| r.is_valid())
        .filter(|r| seen.insert((r.vendor.to_lowercase(), r.source)))
        .collect();
    result.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal));
    result
}
