//! Competitive price analysis engine
//!
//! Combines one local catalog product with the aggregated external price
//! set: market average, position classification, recommendation text and
//! current margin. The computed analysis is complete before the audit
//! write happens; a persistence failure is logged and swallowed.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregator::AggregationManager;
use crate::shared::errors::AnalysisError;
use crate::shared::types::{CompetitivePosition, PriceAnalysis, PriceRecord};
use crate::shared::utils::{format_brl, round_cents};
use crate::storage::CatalogStore;

/// Gap beyond which a below-market price reads as under-pricing
const BELOW_SEVERITY_PCT: f64 = 15.0;
/// Gap beyond which an above-market price reads as losing sales
const ABOVE_SEVERITY_PCT: f64 = 20.0;

pub struct PriceAnalysisEngine {
    catalog: Arc<dyn CatalogStore>,
    aggregator: Arc<AggregationManager>,
}

impl PriceAnalysisEngine {
    pub fn new(catalog: Arc<dyn CatalogStore>, aggregator: Arc<AggregationManager>) -> Self {
        Self { catalog, aggregator }
    }

    /// Analyze one product's market position.
    ///
    /// `ProductNotFound` is the only failure a caller sees; the external
    /// side degrades internally and always yields some price set.
    pub async fn analyze(
        &self,
        pharmacy_id: &str,
        term: &str,
        region: &str,
    ) -> Result<PriceAnalysis, AnalysisError> {
        let product = self
            .catalog
            .find_product(pharmacy_id, term)
            .await?
            .ok_or_else(|| AnalysisError::ProductNotFound(term.to_string()))?;

        info!(
            "📊 Analyzing '{}' (sell {}) against the market",
            product.name,
            format_brl(product.sell_price)
        );

        let external_prices = self
            .aggregator
            .search_all_sources(&product.name, region)
            .await;

        // With no external data the product is its own reference point
        let market_average = match mean_price(&external_prices) {
            Some(avg) => avg,
            None => {
                warn!("No external prices for '{}', using local sell price", product.name);
                product.sell_price
            }
        };

        let delta = percentage_delta(product.sell_price, market_average);
        let position = classify(delta);
        let recommendation = recommendation_text(position, delta, market_average);
        let margin_percent = margin(product.sell_price, product.cost_price);

        let analysis = PriceAnalysis {
            id: Uuid::new_v4(),
            product,
            external_prices,
            market_average: round_cents(market_average),
            position,
            recommendation,
            margin_percent: round_cents(margin_percent),
            created_at: Utc::now(),
        };

        // Audit trail write is fire-and-forget
        if let Err(e) = self.catalog.persist_analysis(pharmacy_id, &analysis).await {
            warn!("⚠️ Failed to persist analysis audit record: {}", e);
        }

        Ok(analysis)
    }
}

fn mean_price(records: &[PriceRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    Some(records.iter().map(|r| r.price).sum::<f64>() / records.len() as f64)
}

/// Signed gap between the local price and the market average, in percent
pub fn percentage_delta(local: f64, market_average: f64) -> f64 {
    if market_average == 0.0 {
        return 0.0;
    }
    (local - market_average) / market_average * 100.0
}

/// Boundary values land on the non-average side: exactly -5 is Below,
/// exactly +5 is Above.
pub fn classify(delta_pct: f64) -> CompetitivePosition {
    if delta_pct <= -5.0 {
        CompetitivePosition::Below
    } else if delta_pct >= 5.0 {
        CompetitivePosition::Above
    } else {
        CompetitivePosition::Average
    }
}

/// Pure function of (position, gap, market average)
pub fn recommendation_text(
    position: CompetitivePosition,
    delta_pct: f64,
    market_average: f64,
) -> String {
    let gap = delta_pct.abs();
    let target = format_brl(market_average);

    match position {
        CompetitivePosition::Below if gap > BELOW_SEVERITY_PCT => format!(
            "Seu preço está {:.1}% abaixo da média de mercado ({}). Há espaço para reajustar em direção a {} sem perder competitividade.",
            gap, target, target
        ),
        CompetitivePosition::Below => format!(
            "Seu preço está {:.1}% abaixo da média de mercado ({}). Posição agressiva, favorece giro de estoque.",
            gap, target
        ),
        CompetitivePosition::Above if gap > ABOVE_SEVERITY_PCT => format!(
            "Seu preço está {:.1}% acima da média de mercado ({}). Risco de perda de vendas; reduza para próximo de {}.",
            gap, target, target
        ),
        CompetitivePosition::Above => format!(
            "Seu preço está {:.1}% acima da média de mercado ({}). Considere aproximar do alvo {} para se manter competitivo.",
            gap, target, target
        ),
        CompetitivePosition::Average => format!(
            "Seu preço está alinhado à média de mercado ({}), diferença de {:.1}%.",
            target, gap
        ),
    }
}

/// Current gross margin over the sell price; zero when cost is unknown
pub fn margin(sell_price: f64, cost_price: f64) -> f64 {
    if cost_price > 0.0 && sell_price > 0.0 {
        (sell_price - cost_price) / sell_price * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PriceCache;
    use crate::shared::errors::{SourceError, StorageError};
    use crate::shared::types::{CatalogProduct, SourceLabel};
    use crate::sources::SourceClient;
    use crate::storage::InMemoryCatalogStore;
    use async_trait::async_trait;

    fn dipirona() -> CatalogProduct {
        CatalogProduct {
            id: "7891058001".to_string(),
            name: "Dipirona Monoidratada 500mg".to_string(),
            sell_price: 12.5,
            cost_price: 8.0,
            current_stock: 40,
            active_ingredient: Some("Dipirona Monoidratada".to_string()),
            manufacturer: Some("EMS".to_string()),
        }
    }

    struct FixedSource {
        prices: Vec<f64>,
    }

    #[async_trait]
    impl SourceClient for FixedSource {
        fn label(&self) -> SourceLabel {
            SourceLabel::CliqueFarma
        }

        async fn search(&self, _term: &str, region: &str) -> Result<Vec<PriceRecord>, SourceError> {
            Ok(self
                .prices
                .iter()
                .enumerate()
                .map(|(i, price)| PriceRecord {
                    source: SourceLabel::CliqueFarma,
                    vendor: format!("Farmácia {}", i),
                    price: *price,
                    available: true,
                    region: region.to_string(),
                    origin_url: None,
                    synthetic: false,
                })
                .collect())
        }
    }

    fn engine_with(
        prices: Vec<f64>,
        store: Arc<dyn CatalogStore>,
    ) -> PriceAnalysisEngine {
        let clients: Vec<Arc<dyn SourceClient>> = if prices.is_empty() {
            vec![]
        } else {
            vec![Arc::new(FixedSource { prices })]
        };
        let aggregator = Arc::new(AggregationManager::new(
            clients,
            Arc::new(PriceCache::default()),
        ));
        PriceAnalysisEngine::new(store, aggregator)
    }

    #[test]
    fn test_classification_boundaries_are_inclusive() {
        assert_eq!(classify(percentage_delta(95.0, 100.0)), CompetitivePosition::Below);
        assert_eq!(classify(percentage_delta(105.0, 100.0)), CompetitivePosition::Above);
        assert_eq!(classify(percentage_delta(104.99, 100.0)), CompetitivePosition::Average);
        assert_eq!(classify(percentage_delta(95.01, 100.0)), CompetitivePosition::Average);
        assert_eq!(classify(-5.5), CompetitivePosition::Below);
        assert_eq!(classify(0.0), CompetitivePosition::Average);
    }

    #[test]
    fn test_margin() {
        assert!((margin(12.5, 8.0) - 36.0).abs() < 0.001);
        assert_eq!(margin(12.5, 0.0), 0.0);
        assert_eq!(margin(0.0, 8.0), 0.0);
    }

    #[test]
    fn test_recommendation_severity_thresholds() {
        let severe_below = recommendation_text(CompetitivePosition::Below, -16.1, 10.0);
        assert!(severe_below.contains("16.1% abaixo"));
        assert!(severe_below.contains("reajustar"));

        let mild_below = recommendation_text(CompetitivePosition::Below, -8.0, 10.0);
        assert!(mild_below.contains("giro de estoque"));

        let severe_above = recommendation_text(CompetitivePosition::Above, 25.0, 10.0);
        assert!(severe_above.contains("Risco de perda de vendas"));
        assert!(severe_above.contains("R$ 10,00"));

        let mild_above = recommendation_text(CompetitivePosition::Above, 10.0, 10.0);
        assert!(mild_above.contains("alvo R$ 10,00"));

        let average = recommendation_text(CompetitivePosition::Average, 1.2, 10.0);
        assert!(average.contains("alinhado"));
    }

    #[tokio::test]
    async fn test_end_to_end_scenario_above_market() {
        let store = Arc::new(InMemoryCatalogStore::new(vec![dipirona()]));
        let engine = engine_with(vec![8.9, 9.5, 13.9], store.clone());

        let analysis = engine.analyze("f1", "Dipirona", "SP").await.unwrap();

        assert!((analysis.market_average - 10.77).abs() < 0.01);
        assert_eq!(analysis.position, CompetitivePosition::Above);
        assert!((analysis.margin_percent - 36.0).abs() < 0.01);
        // delta ≈ +16.1%, under the 20% severity bar
        assert!(analysis.recommendation.contains("16.1% acima"));
        assert_eq!(analysis.external_prices.len(), 3);
        assert_eq!(analysis.external_prices[0].price, 8.9);

        let persisted = store.persisted_analyses().await;
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].id, analysis.id);
    }

    #[tokio::test]
    async fn test_empty_external_set_forces_average() {
        let store = Arc::new(InMemoryCatalogStore::new(vec![dipirona()]));
        let engine = engine_with(vec![], store);

        let analysis = engine.analyze("f1", "Dipirona", "SP").await.unwrap();
        assert_eq!(analysis.market_average, 12.5);
        assert_eq!(analysis.position, CompetitivePosition::Average);
        assert!(analysis.external_prices.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let store = Arc::new(InMemoryCatalogStore::new(vec![dipirona()]));
        let engine = engine_with(vec![10.0], store);

        let result = engine.analyze("f1", "Amoxicilina", "SP").await;
        assert!(matches!(result, Err(AnalysisError::ProductNotFound(_))));
    }

    struct FailingPersistStore {
        inner: InMemoryCatalogStore,
    }

    #[async_trait]
    impl CatalogStore for FailingPersistStore {
        async fn find_product(
            &self,
            pharmacy_id: &str,
            term: &str,
        ) -> Result<Option<CatalogProduct>, StorageError> {
            self.inner.find_product(pharmacy_id, term).await
        }

        async fn persist_analysis(
            &self,
            _pharmacy_id: &str,
            _analysis: &PriceAnalysis,
        ) -> Result<(), StorageError> {
            Err(StorageError::Persistence("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_persistence_failure_is_swallowed() {
        let store = Arc::new(FailingPersistStore {
            inner: InMemoryCatalogStore::new(vec![dipirona()]),
        });
        let engine = engine_with(vec![11.0, 12.0], store);

        let analysis = engine.analyze("f1", "Dipirona", "SP").await.unwrap();
        assert!(analysis.market_average > 0.0);
    }
}
