//! Catalog storage collaborator
//!
//! The engine reads the pharmacy's own catalog and writes analysis audit
//! records through this seam. The in-memory implementation backs the CLI
//! and the test suite; a relational store slots in behind the same trait.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::shared::errors::StorageError;
use crate::shared::types::{CatalogProduct, PriceAnalysis};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Find the catalog product matching `term` for one pharmacy.
    /// Matching: case-insensitive substring on name or active ingredient,
    /// or an exact hit on the product id (barcode-like).
    async fn find_product(
        &self,
        pharmacy_id: &str,
        term: &str,
    ) -> Result<Option<CatalogProduct>, StorageError>;

    /// Append one analysis to the audit trail
    async fn persist_analysis(
        &self,
        pharmacy_id: &str,
        analysis: &PriceAnalysis,
    ) -> Result<(), StorageError>;
}

/// Process-local catalog used by the CLI and tests
#[derive(Default)]
pub struct InMemoryCatalogStore {
    products: Vec<CatalogProduct>,
    persisted: Arc<RwLock<Vec<PriceAnalysis>>>,
}

impl InMemoryCatalogStore {
    pub fn new(products: Vec<CatalogProduct>) -> Self {
        Self {
            products,
            persisted: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Audit records written so far, oldest first
    pub async fn persisted_analyses(&self) -> Vec<PriceAnalysis> {
        self.persisted.read().await.clone()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn find_product(
        &self,
        _pharmacy_id: &str,
        term: &str,
    ) -> Result<Option<CatalogProduct>, StorageError> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }

        let hit = self.products.iter().find(|p| {
            p.id == term
                || p.name.to_lowercase().contains(&needle)
                || p.active_ingredient
                    .as_ref()
                    .map(|ingredient| ingredient.to_lowercase().contains(&needle))
                    .unwrap_or(false)
        });
        Ok(hit.cloned())
    }

    async fn persist_analysis(
        &self,
        _pharmacy_id: &str,
        analysis: &PriceAnalysis,
    ) -> Result<(), StorageError> {
        self.persisted.write().await.push(analysis.clone());
        Ok(())
    }
}
