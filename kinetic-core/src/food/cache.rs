use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use tokio::sync::RwLock;

use crate::error::FoodError;
use crate::food::{FoodDatabase, ProductDetails, ProductSummary};

/// Wraps a food database with a product cache keyed by product code.
///
/// The cache lives as long as the wrapper and is never evicted. Only products
/// that were found are cached; searches always go to the source.
pub struct FoodLookup<D> {
    source: D,
    products: RwLock<HashMap<String, ProductDetails>>,
}

impl<D: FoodDatabase> FoodLookup<D> {
    pub fn new(source: D) -> Self {
        Self {
            source,
            products: RwLock::new(HashMap::new()),
        }
    }

    pub async fn cached_products(&self) -> usize {
        self.products.read().await.len()
    }

    pub fn source(&self) -> &D {
        &self.source
    }
}

#[async_trait]
impl<D: FoodDatabase> FoodDatabase for FoodLookup<D> {
    async fn search(&self, query: &str) -> Result<Vec<ProductSummary>, FoodError> {
        self.source.search(query).await
    }

    async fn product(&self, code: &str) -> Result<Option<ProductDetails>, FoodError> {
        let code = code.trim();
        if let Some(hit) = self.products.read().await.get(code) {
            debug!("Product cache hit for {}", code);
            return Ok(Some(hit.clone()));
        }

        let fetched = self.source.product(code).await?;
        if let Some(product) = &fetched {
            self.products
                .write()
                .await
                .insert(code.to_string(), product.clone());
        }
        Ok(fetched)
    }
}
