//! Remote food data: product search and per-100 g nutrient lookup.

mod cache;
pub mod openfoodfacts;

pub use cache::FoodLookup;
pub use openfoodfacts::OpenFoodFacts;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FoodError;
use crate::nutrition::Nutrients;

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct ProductSummary {
    pub code: String,
    pub name: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Record))]
pub struct ProductDetails {
    pub code: String,
    pub name: String,
    pub brand: Option<String>,
    /// Free text as published by the source, e.g. "30 g".
    pub serving_size: Option<String>,
    pub per_100g: Nutrients,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FoodDatabase: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<ProductSummary>, FoodError>;
    /// `None` when no product has this code.
    async fn product(&self, code: &str) -> Result<Option<ProductDetails>, FoodError>;
}
