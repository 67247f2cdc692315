//! Consulta Remédios product search API client
//!
//! Response shape differs from CliqueFarma: offers are nested per product
//! and prices come back as decimal strings.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{synthetic, with_backoff, SourceClient, SourceSettings};
use crate::cache::{cache_key, PriceCache};
use crate::shared::errors::{SourceError, TransportError};
use crate::shared::types::{PriceRecord, SourceLabel};
use crate::shared::utils::{round_cents, urlencode};
use crate::transport::HttpTransport;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    produtos: Vec<ProductEntry>,
}

#[derive(Debug, Deserialize)]
struct ProductEntry {
    #[allow(dead_code)]
    nome: Option<String>,
    #[serde(default)]
    ofertas: Vec<OfferEntry>,
}

#[derive(Debug, Deserialize)]
struct OfferEntry {
    loja: StoreEntry,
    /// Decimal string, e.g. "12.50"
    preco: String,
    #[serde(default)]
    em_estoque: bool,
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StoreEntry {
    nome: String,
}

pub struct ConsultaRemediosClient {
    transport: Arc<dyn HttpTransport>,
    cache: Arc<PriceCache>,
    settings: SourceSettings,
}

impl ConsultaRemediosClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        cache: Arc<PriceCache>,
        settings: SourceSettings,
    ) -> Self {
        Self {
            transport,
            cache,
            settings,
        }
    }

    async fn fetch_offers(
        &self,
        term: &str,
        region: &str,
        api_key: &str,
    ) -> Result<Vec<PriceRecord>, TransportError> {
        let url = format!(
            "{}/api/v2/produtos/busca?q={}&estado={}",
            self.settings.base_url,
            urlencode(term),
            region
        );
        let headers = [(
            "Authorization".to_string(),
            format!("Bearer {}", api_key),
        )];

        let response = self.transport.get(&url, &headers).await?;
        if !response.is_success() {
            return Err(TransportError::Status(response.status));
        }

        let parsed: SearchResponse = response.json()?;
        let mut records = Vec::new();
        for product in parsed.produtos {
            for offer in product.ofertas {
                let price = offer
                    .preco
                    .replace(',', ".")
                    .parse::<f64>()
                    .unwrap_or(0.0);
                let record = PriceRecord {
                    source: SourceLabel::ConsultaRemedios,
                    vendor: offer.loja.nome,
                    price: round_cents(price),
                    available: offer.em_estoque,
                    region: region.to_string(),
                    origin_url: offer.link,
                    synthetic: false,
                };
                if record.is_valid() {
                    records.push(record);
                }
            }
        }

        if records.is_empty() {
            return Err(TransportError::Network(
                "no product offer with a valid price".to_string(),
            ));
        }
        Ok(records)
    }
}

#[async_trait]
impl SourceClient for ConsultaRemediosClient {
    fn label(&self) -> SourceLabel {
        SourceLabel::ConsultaRemedios
    }

    async fn search(&self, term: &str, region: &str) -> Result<Vec<PriceRecord>, SourceError> {
        let key = cache_key(self.label(), term, region);
        if let Some(hit) = self.cache.get(&key).await {
            debug!("Cache hit for {}", key);
            return Ok(hit);
        }

        let api_key = match (&self.settings.api_key, self.settings.use_synthetic) {
            (Some(api_key), false) => api_key.clone(),
            _ => {
                info!("Consulta Remédios running without credentials, using synthetic data");
                let records = synthetic::synthetic_records(self.label(), term, region);
                self.cache.set(&key, records.clone()).await;
                return Ok(records);
            }
        };

        let records = match with_backoff(&self.settings.retry, "Consulta Remédios", || {
            self.fetch_offers(term, region, &api_key)
        })
        .await
        {
            Ok(records) => {
                info!(
                    "✅ Consulta Remédios returned {} offers for '{}'",
                    records.len(),
                    term
                );
                records
            }
            Err(e) => {
                warn!(
                    "❌ Consulta Remédios unavailable, falling back to synthetic data: {}",
                    e
                );
                synthetic::synthetic_records(self.label(), term, region)
            }
        };

        self.cache.set(&key, records.clone()).await;
        Ok(records)
    }
}
