//! Web search price discovery
//!
//! Runs a ranked-document search restricted to an allow-list of pharmacy
//! domains, then mines vendor names and `R$` amounts out of the result
//! titles and snippets. The least structured source by far, so everything
//! here is defensive: unparseable documents are noise, and a result page
//! with no extractable price still yields a fabricated estimate.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{synthetic, with_backoff, SourceClient, SourceSettings};
use crate::cache::{cache_key, PriceCache};
use crate::shared::errors::{SourceError, TransportError};
use crate::shared::types::{PriceRecord, SourceLabel};
use crate::shared::utils::{parse_brl_amount, urlencode};
use crate::transport::HttpTransport;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<SearchDocument>,
}

#[derive(Debug, Deserialize)]
struct SearchDocument {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

pub struct WebSearchClient {
    transport: Arc<dyn HttpTransport>,
    cache: Arc<PriceCache>,
    settings: SourceSettings,
    allowed_domains: Vec<String>,
    /// domain fragment -> storefront label
    vendor_labels: Vec<(String, String)>,
}

impl WebSearchClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        cache: Arc<PriceCache>,
        settings: SourceSettings,
        allowed_domains: Vec<String>,
        vendor_labels: Vec<(String, String)>,
    ) -> Self {
        Self {
            transport,
            cache,
            settings,
            allowed_domains,
            vendor_labels,
        }
    }

    /// Query restricted to the configured pharmacy domains
    fn build_query(&self, term: &str, region: &str) -> String {
        let sites = self
            .allowed_domains
            .iter()
            .map(|d| format!("site:{}", d))
            .collect::<Vec<_>>()
            .join(" OR ");
        format!("{} preço {} {}", term, region, sites)
    }

    /// Resolve a storefront label for a result document.
    /// Falls back to the URL's primary domain segment.
    fn vendor_for(&self, url: &str) -> String {
        for (domain, label) in &self.vendor_labels {
            if url.contains(domain.as_str()) {
                return label.clone();
            }
        }
        primary_domain_segment(url)
    }

    async fn fetch_documents(
        &self,
        term: &str,
        region: &str,
        api_key: &str,
    ) -> Result<Vec<SearchDocument>, TransportError> {
        let url = format!(
            "{}/search?q={}",
            self.settings.base_url,
            urlencode(&self.build_query(term, region))
        );
        let headers = [("X-API-KEY".to_string(), api_key.to_string())];

        let response = self.transport.get(&url, &headers).await?;
        if !response.is_success() {
            return Err(TransportError::Status(response.status));
        }

        let parsed: SearchResponse = response.json()?;
        if parsed.organic.is_empty() {
            return Err(TransportError::Network("no documents found".to_string()));
        }
        Ok(parsed.organic)
    }

    /// Extract one price record per document that carries a plausible amount
    fn extract_records(&self, documents: &[SearchDocument], region: &str) -> Vec<PriceRecord> {
        documents
            .iter()
            .filter_map(|doc| {
                let text = format!("{} {}", doc.title, doc.snippet);
                let price = parse_brl_amount(&text)?;
                Some(PriceRecord {
                    source: SourceLabel::WebSearch,
                    vendor: self.vendor_for(&doc.link),
                    price,
                    available: true,
                    region: region.to_string(),
                    origin_url: Some(doc.link.clone()),
                    synthetic: false,
                })
            })
            .collect()
    }
}

#[async_trait]
impl SourceClient for WebSearchClient {
    fn label(&self) -> SourceLabel {
        SourceLabel::WebSearch
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
                info!("Web search running without credentials, using synthetic data");
                let records = synthetic::synthetic_records(self.label(), term, region);
                self.cache.set(&key, records.clone()).await;
                return Ok(records);
            }
        };

        let records = match with_backoff(&self.settings.retry, "Busca Web", || {
            self.fetch_documents(term, region, &api_key)
        })
        .await
        {
            Ok(documents) => {
                let records = self.extract_records(&documents, region);
                if records.is_empty() {
                    // Pages exist but none exposed a price in the listing
                    info!(
                        "Web search found {} documents without parseable prices, estimating",
                        documents.len()
                    );
                    synthetic::records_from_document_count(
                        self.label(),
                        term,
                        region,
                        documents.len(),
                    )
                } else {
                    info!(
                        "✅ Web search extracted {} prices from {} documents for '{}'",
                        records.len(),
                        documents.len(),
                        term
                    );
                    records
                }
            }
            Err(e) => {
                warn!("❌ Web search unavailable, falling back to synthetic data: {}", e);
                synthetic::synthetic_records(self.label(), term, region)
            }
        };

        self.cache.set(&key, records.clone()).await;
        Ok(records)
    }
}

/// "https://www.drogasil.com.br/p/dipirona" -> "Drogasil"
fn primary_domain_segment(url: &str) -> String {
    let host = url
        .split("://")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or(url)
        .trim_start_matches("www.");
    let segment = host.split('.').next().unwrap_or(host);

    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => segment.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::RetryPolicy;
    use crate::transport::mock::MockTransport;
    use std::time::Duration;

    fn default_labels() -> Vec<(String, String)> {
        vec![
            ("drogasil.com.br".to_string(), "Drogasil".to_string()),
            ("drogaraia.com.br".to_string(), "Droga Raia".to_string()),
            ("ultrafarma.com.br".to_string(), "Ultrafarma".to_string()),
        ]
    }

    fn client(transport: Arc<MockTransport>, api_key: Option<&str>) -> WebSearchClient {
        WebSearchClient::new(
            transport,
            Arc::new(PriceCache::default()),
            SourceSettings {
                api_key: api_key.map(str::to_string),
                base_url: "https://search.test".to_string(),
                use_synthetic: false,
                retry: RetryPolicy {
                    max_attempts: 2,
                    base_delay: Duration::from_millis(1),
                },
            },
            vec!["drogasil.com.br".to_string(), "drogaraia.com.br".to_string()],
            default_labels(),
        )
    }

    const DOCS_BODY: &str = r#"{
        "organic": [
            {"title": "Dipirona 500mg por R$ 9,90", "link": "https://www.drogasil.com.br/p/1", "snippet": "em até 3x"},
            {"title": "Dipirona Monoidratada", "link": "https://www.drogaraia.com.br/p/2", "snippet": "oferta R$ 11,50 na retirada"},
            {"title": "Bula da dipirona", "link": "https://www.farmaboa.com.br/bula", "snippet": "posologia e contraindicações"}
        ]
    }"#;

    #[tokio::test]
    async fn test_extracts_prices_and_vendor_labels() {
        let transport = Arc::new(MockTransport::always(DOCS_BODY));
        let client = client(transport, Some("key"));

        let records = client.search("Dipirona", "SP").await.unwrap();
        // the bula page has no price and is dropped
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].vendor, "Drogasil");
        assert_eq!(records[0].price, 9.9);
        assert_eq!(records[1].vendor, "Droga Raia");
        assert_eq!(records[1].price, 11.5);
        assert!(records.iter().all(|r| !r.synthetic));
    }

    #[tokio::test]
    async fn test_unknown_domain_falls_back_to_domain_segment() {
        let body = r#"{"organic": [
            {"title": "Oferta R$ 19,90", "link": "https://www.farmaboa.com.br/p/9", "snippet": ""}
        ]}"#;
        let transport = Arc::new(MockTransport::always(body));
        let client = client(transport, Some("key"));

        let records = client.search("Omeprazol", "SP").await.unwrap();
        assert_eq!(records[0].vendor, "Farmaboa");
    }

    #[tokio::test]
    async fn test_documents_without_prices_yield_estimates() {
        let body = r#"{"organic": [
            {"title": "Dipirona bula", "link": "https://www.drogasil.com.br/bula", "snippet": "sem preço"},
            {"title": "Dipirona genérico", "link": "https://www.drogaraia.com.br/g", "snippet": "consulte"}
        ]}"#;
        let transport = Arc::new(MockTransport::always(body));
        let client = client(transport, Some("key"));

        let records = client.search("Dipirona", "SP").await.unwrap();
        assert!(!records.is_empty());
        assert!(records.iter().all(|r| r.synthetic && r.price > 0.0));
    }

    #[tokio::test]
    async fn test_empty_result_set_is_an_outage() {
        let transport = Arc::new(MockTransport::always(r#"{"organic": []}"#));
        let client = client(transport.clone(), Some("key"));

        let records = client.search("Dipirona", "SP").await.unwrap();
        assert!(records.iter().all(|r| r.synthetic));
        assert_eq!(transport.call_count(), 2);
    }

    #[test]
    fn test_primary_domain_segment() {
        assert_eq!(
            primary_domain_segment("https://www.ultrafarma.com.br/p/3"),
            "Ultrafarma"
        );
        assert_eq!(primary_domain_segment("http://paguemenos.com.br"), "Paguemenos");
    }

    #[test]
    fn test_query_restricted_to_allow_list() {
        let transport = Arc::new(MockTransport::always("{}"));
        let client = client(transport, Some("key"));
        let query = client.build_query("Dipirona", "SP");
        assert!(query.contains("site:drogasil.com.br"));
        assert!(query.contains("OR site:drogaraia.com.br"));
        assert!(query.starts_with("Dipirona preço SP"));
    }
}
