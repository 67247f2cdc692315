// src/app.rs
use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::aggregator::AggregationManager;
use crate::analysis::PriceAnalysisEngine;
use crate::cache::PriceCache;
use crate::config::Config;
use crate::shared::errors::AnalysisError;
use crate::sources;
use crate::storage::InMemoryCatalogStore;
use crate::transport::ReqwestTransport;

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub term: Option<String>,
    pub region: String,
    pub pharmacy_id: String,
    pub search_only: bool,
    pub clear_cache: bool,
    pub config: Config,
}

impl AppCfg {
    /// Merge priority: CLI args > config file > defaults
    pub fn from_cli(
        term: Option<String>,
        region: Option<String>,
        pharmacy_id: Option<String>,
        search_only: bool,
        clear_cache: bool,
        synthetic: bool,
        mut config: Config,
    ) -> Self {
        if synthetic {
            config.sources.use_synthetic = true;
        }
        let region = region
            .map(|r| r.trim().to_uppercase())
            .unwrap_or_else(|| config.analysis.default_region.clone());
        let pharmacy_id = pharmacy_id.unwrap_or_else(|| config.analysis.pharmacy_id.clone());

        Self {
            term,
            region,
            pharmacy_id,
            search_only,
            clear_cache,
            config,
        }
    }
}

pub async fn run(app_cfg: AppCfg) -> Result<()> {
    let config = &app_cfg.config;

    let cache = Arc::new(PriceCache::new(Duration::from_secs(config.cache.ttl_secs)));
    let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(
        config.http.timeout_secs,
    ))?);
    let clients = sources::build_clients(config, cache.clone(), transport);
    let aggregator = Arc::new(AggregationManager::new(clients, cache));

    if app_cfg.clear_cache {
        aggregator.clear_cache().await;
        println!("{}", json!({ "status": "cache cleared" }));
        return Ok(());
    }

    let term = match app_cfg.term.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => term.to_string(),
        _ => anyhow::bail!("--term is required and must be non-empty"),
    };

    if app_cfg.search_only {
        let records = aggregator.search_all_sources(&term, &app_cfg.region).await;
        let statistics = aggregator.statistics(&records);
        let output = json!({
            "term": term,
            "region": app_cfg.region,
            "records": records,
            "statistics": statistics,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let store = Arc::new(InMemoryCatalogStore::new(config.catalog.products.clone()));
    info!(
        "Loaded {} catalog products for pharmacy '{}'",
        config.catalog.products.len(),
        app_cfg.pharmacy_id
    );

    let engine = PriceAnalysisEngine::new(store, aggregator);
    match engine
        .analyze(&app_cfg.pharmacy_id, &term, &app_cfg.region)
        .await
    {
        Ok(analysis) => {
            println!("{}", serde_json::to_string_pretty(&analysis)?);
            Ok(())
        }
        Err(AnalysisError::ProductNotFound(term)) => {
            anyhow::bail!("No catalog product matches '{}'", term)
        }
        Err(e) => Err(e.into()),
    }
}
