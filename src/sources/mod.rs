//! External price source clients
//!
//! One adapter per provider behind a single capability trait. Adapters own
//! their full failure policy: cache lookup first, then the network under
//! retry, then the synthetic fallback. `search` returning `Err` is a
//! contract violation the aggregation manager still tolerates.

pub mod cliquefarma;
pub mod consultaremedios;
pub mod retry;
pub mod synthetic;
pub mod websearch;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::cache::PriceCache;
use crate::config::Config;
use crate::shared::errors::SourceError;
use crate::shared::types::{PriceRecord, SourceLabel};
use crate::transport::HttpTransport;

pub use retry::{with_backoff, RetryPolicy};

/// Capability interface implemented by each provider adapter
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Which provider this adapter handles
    fn label(&self) -> SourceLabel;

    /// Query the provider and normalize its response into price records.
    /// Failures are absorbed internally; the result set may be synthetic.
    async fn search(&self, term: &str, region: &str) -> Result<Vec<PriceRecord>, SourceError>;
}

/// Per-adapter wiring shared by every provider
#[derive(Clone)]
pub struct SourceSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub use_synthetic: bool,
    pub retry: RetryPolicy,
}

/// Build every configured source client against the shared cache and transport
pub fn build_clients(
    config: &Config,
    cache: Arc<PriceCache>,
    transport: Arc<dyn HttpTransport>,
) -> Vec<Arc<dyn SourceClient>> {
    let retry = RetryPolicy {
        max_attempts: config.retry.max_attempts,
        base_delay: std::time::Duration::from_millis(config.retry.base_delay_ms),
    };

    let mut clients: Vec<Arc<dyn SourceClient>> = Vec::new();

    let cliquefarma = cliquefarma::CliqueFarmaClient::new(
        transport.clone(),
        cache.clone(),
        SourceSettings {
            api_key: config.sources.cliquefarma.api_key.clone(),
            base_url: config.sources.cliquefarma.base_url.clone(),
            use_synthetic: config.sources.use_synthetic,
            retry: retry.clone(),
        },
    );
    clients.push(Arc::new(cliquefarma));

    let consultaremedios = consultaremedios::ConsultaRemediosClient::new(
        transport.clone(),
        cache.clone(),
        SourceSettings {
            api_key: config.sources.consultaremedios.api_key.clone(),
            base_url: config.sources.consultaremedios.base_url.clone(),
            use_synthetic: config.sources.use_synthetic,
            retry: retry.clone(),
        },
    );
    clients.push(Arc::new(consultaremedios));

    let websearch = websearch::WebSearchClient::new(
        transport,
        cache,
        SourceSettings {
            api_key: config.sources.websearch.api_key.clone(),
            base_url: config.sources.websearch.base_url.clone(),
            use_synthetic: config.sources.use_synthetic,
            retry,
        },
        config.search.allowed_domains.clone(),
        config.search.vendor_labels.clone(),
    );
    clients.push(Arc::new(websearch));

    info!("🎯 Created {} price source clients", clients.len());
    clients
}
