//! Synthetic price fallback
//!
//! Keeps the system exercisable without live credentials and absorbs source
//! outages: a degraded source costs data quality, never the whole
//! aggregation. Every record produced here carries `synthetic: true` so
//! callers can tell fabricated data from verified market data.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::shared::types::{PriceRecord, SourceLabel};
use crate::shared::utils::round_cents;

/// Well-known retail chains with a fixed price factor each.
/// The factor spreads the randomized base into a plausible storefront range.
const VENDORS: &[(&str, f64)] = &[
    ("Drogasil", 1.0),
    ("Droga Raia", 1.08),
    ("Drogarias Pacheco", 0.95),
    ("Ultrafarma", 0.88),
];

fn seed_for(term: &str, region: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    term.trim().to_lowercase().hash(&mut hasher);
    region.hash(&mut hasher);
    hasher.finish()
}

/// Generate 3-4 fabricated vendor offers for one query.
///
/// The RNG is seeded from the query fingerprint, so the same (term, region)
/// always produces the same set while distinct queries differ.
pub fn synthetic_records(source: SourceLabel, term: &str, region: &str) -> Vec<PriceRecord> {
    let mut rng = StdRng::seed_from_u64(seed_for(term, region));
    let base: f64 = rng.gen_range(8.0..60.0);
    let count = rng.gen_range(3..=VENDORS.len());

    VENDORS
        .iter()
        .take(count)
        .map(|(vendor, factor)| PriceRecord {
            source,
            vendor: vendor.to_string(),
            price: round_cents(base * factor),
            available: true,
            region: region.to_string(),
            origin_url: None,
            synthetic: true,
        })
        .collect()
}

/// Fabricate offers when a document search found pages but no parseable
/// price. The document count nudges the base so busier result sets do not
/// collapse onto one value.
pub fn records_from_document_count(
    source: SourceLabel,
    term: &str,
    region: &str,
    documents: usize,
) -> Vec<PriceRecord> {
    let mut rng = StdRng::seed_from_u64(seed_for(term, region) ^ documents as u64);
    let base: f64 = rng.gen_range(10.0..40.0) + documents as f64 * 0.5;

    VENDORS
        .iter()
        .take(3)
        .map(|(vendor, factor)| PriceRecord {
            source,
            vendor: vendor.to_string(),
            price: round_cents(base * factor),
            available: true,
            region: region.to_string(),
            origin_url: None,
            synthetic: true,
        })
        .collect()
}
