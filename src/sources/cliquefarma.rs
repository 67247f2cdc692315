//! CliqueFarma price comparison API client

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

/// Offer listing returned by the CliqueFarma API
#[derive(Debug, Deserialize)]
struct CliqueFarmaResponse {
    ofertas: Vec<CliqueFarmaOffer>,
}

#[derive(Debug, Deserialize)]
struct CliqueFarmaOffer {
    farmacia: String,
    preco: f64,
    #[serde(default)]
    disponivel: bool,
    url: Option<String>,
}

pub struct CliqueFarmaClient {
    transport: Arc<dyn HttpTransport>,
    cache: Arc<PriceCache>,
    settings: SourceSettings,
}

impl CliqueFarmaClient {
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
            "{}/v1/ofertas?produto={}&uf={}",
            self.settings.base_url,
            urlencode(term),
            region
        );
        let headers = [("X-Api-Key".to_string(), api_key.to_string())];

        let response = self.transport.get(&url, &headers).await?;
        if !response.is_success() {
            return Err(TransportError::Status(response.status));
        }

        let parsed: CliqueFarmaResponse = response.json()?;
        if parsed.ofertas.is_empty() {
            // Same handling as an outage: retry, then synthetic fallback
            return Err(TransportError::Network("empty offer list".to_string()));
        }

        let records = parsed
            .ofertas
            .into_iter()
            .map(|offer| PriceRecord {
                source: SourceLabel::CliqueFarma,
                vendor: offer.farmacia,
                price: round_cents(offer.preco),
                available: offer.disponivel,
                region: region.to_string(),
                origin_url: offer.url,
                synthetic: false,
            })
            .filter(PriceRecord::is_valid)
            .collect::<Vec<_>>();

        if records.is_empty() {
            return Err(TransportError::Network(
                "no offer with a valid price".to_string(),
            ));
        }
        Ok(records)
    }
}

#[async_trait]
impl SourceClient for CliqueFarmaClient {
    fn label(&self) -> SourceLabel {
        SourceLabel::CliqueFarma
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
                info!("CliqueFarma running without credentials, using synthetic data");
                let records = synthetic::synthetic_records(self.label(), term, region);
                self.cache.set(&key, records.clone()).await;
                return Ok(records);
            }
        };

        let records = match with_backoff(&self.settings.retry, "CliqueFarma", || {
            self.fetch_offers(term, region, &api_key)
        })
        .await
        {
            Ok(records) => {
                info!("✅ CliqueFarma returned {} offers for '{}'", records.len(), term);
                records
            }
            Err(e) => {
                warn!("❌ CliqueFarma unavailable, falling back to synthetic data: {}", e);
                synthetic::synthetic_records(self.label(), term, region)
            }
        };

        self.cache.set(&key, records.clone()).await;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::RetryPolicy;
    use crate::transport::mock::MockTransport;
    use std::time::Duration;

    fn settings(api_key: Option<&str>) -> SourceSettings {
        SourceSettings {
            api_key: api_key.map(str::to_string),
            base_url: "https://api.cliquefarma.test".to_string(),
            use_synthetic: false,
            retry: RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
            },
        }
    }

    fn client(transport: Arc<MockTransport>, api_key: Option<&str>) -> CliqueFarmaClient {
        CliqueFarmaClient::new(transport, Arc::new(PriceCache::default()), settings(api_key))
    }

    const OFFERS_BODY: &str = r#"{
        "ofertas": [
            {"farmacia": "Drogasil", "preco": 13.90, "disponivel": true, "url": "https://drogasil.com.br/p/1"},
            {"farmacia": "Ultrafarma", "preco": 8.90, "disponivel": true, "url": null},
            {"farmacia": "Quebrada", "preco": 0.0, "disponivel": false, "url": null}
        ]
    }"#;

    #[tokio::test]
    async fn test_normalizes_offers_and_drops_invalid_prices() {
        let transport = Arc::new(MockTransport::always(OFFERS_BODY));
        let client = client(transport, Some("key"));

        let records = client.search("Dipirona", "SP").await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.price > 0.0 && !r.synthetic));
        assert_eq!(records[0].vendor, "Drogasil");
        assert_eq!(records[0].source, SourceLabel::CliqueFarma);
    }

    #[tokio::test]
    async fn test_missing_credential_yields_synthetic_set() {
        let transport = Arc::new(MockTransport::always(OFFERS_BODY));
        let client = client(transport.clone(), None);

        let records = client.search("Dipirona", "SP").await.unwrap();
        assert!(!records.is_empty());
        assert!(records.iter().all(|r| r.synthetic));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_outage_falls_back_to_synthetic_after_retries() {
        let transport = Arc::new(MockTransport::always_failing());
        let client = client(transport.clone(), Some("key"));

        let records = client.search("Dipirona", "SP").await.unwrap();
        assert!(records.iter().all(|r| r.synthetic));
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn test_cached_hit_bypasses_network() {
        let transport = Arc::new(MockTransport::always(OFFERS_BODY));
        let client = client(transport.clone(), Some("key"));

        let first = client.search("Dipirona", "SP").await.unwrap();
        let second = client.search("DIPIRONA", "SP").await.unwrap();
        assert_eq!(first.len(), second.len());
        assert_eq!(transport.call_count(), 1);
    }
}
