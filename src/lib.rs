//! Farmadex - multi-source drug price discovery and reconciliation engine

pub mod aggregator;
pub mod analysis;
pub mod app;
pub mod cache;
pub mod config;
pub mod shared;
pub mod sources;
pub mod storage;
pub mod transport;

// Re-export main types for convenience
pub use aggregator::AggregationManager;
pub use analysis::PriceAnalysisEngine;
pub use cache::PriceCache;
pub use sources::SourceClient;
pub use storage::{CatalogStore, InMemoryCatalogStore};
