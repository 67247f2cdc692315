use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use crate::shared::types::CatalogProduct;

#[derive(Debug, Clone, Deserialize)]
pub struct CacheCfg {
    pub ttl_secs: u64,
}

impl Default for CacheCfg {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryCfg {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryCfg {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpCfg {
    pub timeout_secs: u64,
}

impl Default for HttpCfg {
    fn default() -> Self {
        Self { timeout_secs: 12 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceApiCfg {
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesCfg {
    /// Global switch: skip the network everywhere, demo with synthetic data
    pub use_synthetic: bool,
    pub cliquefarma: SourceApiCfg,
    pub consultaremedios: SourceApiCfg,
    pub websearch: SourceApiCfg,
}

impl Default for SourcesCfg {
    fn default() -> Self {
        Self {
            use_synthetic: false,
            cliquefarma: SourceApiCfg {
                api_key: None,
                base_url: "https://api.cliquefarma.com.br".to_string(),
            },
            consultaremedios: SourceApiCfg {
                api_key: None,
                base_url: "https://consultaremedios.com.br".to_string(),
            },
            websearch: SourceApiCfg {
                api_key: None,
                base_url: "https://google.serper.dev".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchCfg {
    /// Pharmacy storefronts the document search is restricted to
    pub allowed_domains: Vec<String>,
    /// domain fragment -> storefront label
    pub vendor_labels: Vec<(String, String)>,
}

impl Default for SearchCfg {
    fn default() -> Self {
        Self {
            allowed_domains: vec![
                "drogasil.com.br".to_string(),
                "drogaraia.com.br".to_string(),
                "ultrafarma.com.br".to_string(),
                "drogariaspacheco.com.br".to_string(),
                "paguemenos.com.br".to_string(),
            ],
            vendor_labels: vec![
                ("drogasil.com.br".to_string(), "Drogasil".to_string()),
                ("drogaraia.com.br".to_string(), "Droga Raia".to_string()),
                ("ultrafarma.com.br".to_string(), "Ultrafarma".to_string()),
                (
                    "drogariaspacheco.com.br".to_string(),
                    "Drogarias Pacheco".to_string(),
                ),
                ("paguemenos.com.br".to_string(), "Pague Menos".to_string()),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisCfg {
    pub default_region: String,
    pub pharmacy_id: String,
}

impl Default for AnalysisCfg {
    fn default() -> Self {
        Self {
            default_region: "SP".to_string(),
            pharmacy_id: "demo".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogCfg {
    pub products: Vec<CatalogProduct>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheCfg,
    pub retry: RetryCfg,
    pub http: HttpCfg,
    pub sources: SourcesCfg,
    pub search: SearchCfg,
    pub analysis: AnalysisCfg,
    pub catalog: CatalogCfg,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read {}", path.as_ref().display()))?;
        let cfg: Self = toml::from_str(&s).context("parse config file")?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_usable() {
        let cfg = Config::default();
        assert_eq!(cfg.cache.ttl_secs, 300);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.analysis.default_region, "SP");
        assert!(!cfg.search.allowed_domains.is_empty());
        assert!(cfg.catalog.products.is_empty());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [cache]
            ttl_secs = 60

            [sources]
            use_synthetic = true

            [[catalog.products]]
            id = "7891058001"
            name = "Dipirona Monoidratada 500mg"
            sell_price = 12.5
            cost_price = 8.0
            current_stock = 40
            active_ingredient = "Dipirona Monoidratada"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.cache.ttl_secs, 60);
        assert!(cfg.sources.use_synthetic);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.catalog.products.len(), 1);
        assert_eq!(cfg.catalog.products[0].name, "Dipirona Monoidratada 500mg");
        assert!(cfg.catalog.products[0].manufacturer.is_none());
    }

    #[test]
    fn test_vendor_label_pairs_parse_from_toml() {
        let cfg: Config = toml::from_str(
            r#"
            [search]
            allowed_domains = ["farmaboa.com.br"]
            vendor_labels = [["farmaboa.com.br", "Farma Boa"]]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.search.vendor_labels.len(), 1);
        assert_eq!(cfg.search.vendor_labels[0].1, "Farma Boa");
    }
}
