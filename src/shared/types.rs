//! Common types used across the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// External price source identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceLabel {
    CliqueFarma,
    ConsultaRemedios,
    WebSearch,
}

impl SourceLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLabel::CliqueFarma => "CliqueFarma",
            SourceLabel::ConsultaRemedios => "Consulta Remédios",
            SourceLabel::WebSearch => "Busca Web",
        }
    }

    /// Stable lowercase identifier used in cache keys and config sections
    pub fn id(&self) -> &'static str {
        match self {
            SourceLabel::CliqueFarma => "cliquefarma",
            SourceLabel::ConsultaRemedios => "consultaremedios",
            SourceLabel::WebSearch => "websearch",
        }
    }
}

impl FromStr for SourceLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cliquefarma" => Ok(SourceLabel::CliqueFarma),
            "consultaremedios" | "consulta_remedios" => Ok(SourceLabel::ConsultaRemedios),
            "websearch" | "web_search" | "busca" => Ok(SourceLabel::WebSearch),
            _ => Err(anyhow::anyhow!("Unknown price source: {}", s)),
        }
    }
}

/// One normalized price observation from an external source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRecord {
    pub source: SourceLabel,
    pub vendor: String,
    /// Price in BRL, two-decimal semantics
    pub price: f64,
    pub available: bool,
    pub region: String,
    pub origin_url: Option<String>,
    /// True when the record was fabricated by the synthetic fallback
    pub synthetic: bool,
}

impl PriceRecord {
    /// Records with non-positive prices never enter a result set
    pub fn is_valid(&self) -> bool {
        self.price > 0.0
    }
}

/// Local catalog product, read through the storage collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    pub sell_price: f64,
    pub cost_price: f64,
    pub current_stock: u32,
    pub active_ingredient: Option<String>,
    pub manufacturer: Option<String>,
}

/// Summary statistics over a set of price records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStatistics {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub median: f64,
    pub std_deviation: f64,
}

/// Position of the local sell price relative to the market average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitivePosition {
    Below,
    Average,
    Above,
}

impl CompetitivePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitivePosition::Below => "below",
            CompetitivePosition::Average => "average",
            CompetitivePosition::Above => "above",
        }
    }
}

/// Result of one competitive pricing analysis, immutable once computed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceAnalysis {
    pub id: Uuid,
    pub product: CatalogProduct,
    /// Sorted ascending by price, deduplicated per (vendor, source)
    pub external_prices: Vec<PriceRecord>,
    pub market_average: f64,
    pub position: CompetitivePosition,
    pub recommendation: String,
    pub margin_percent: f64,
    pub created_at: DateTime<Utc>,
}
