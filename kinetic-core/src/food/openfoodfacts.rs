//! Open Food Facts client.
//!
//! Text search goes through the legacy `cgi/search.pl` endpoint, barcode lookup
//! through `api/v0/product/{code}.json`. Nutriment values are published either as
//! numbers or as numeric strings, so both are accepted.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::error::FoodError;
use crate::food::{FoodDatabase, ProductDetails, ProductSummary};
use crate::nutrition::Nutrients;

pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";
const TIMEOUT: Duration = Duration::from_secs(15);
const PAGE_SIZE: u32 = 24;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<RawProduct>,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    code: Option<String>,
    product: Option<RawProduct>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProduct {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    brands: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    serving_size: Option<String>,
    #[serde(default)]
    nutriments: Option<serde_json::Map<String, Value>>,
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn nutriment(map: &serde_json::Map<String, Value>, key: &str) -> Option<f64> {
    let value: f64 = match map.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', ".").parse().ok()?,
        _ => return None,
    };
    (value.is_finite() && value >= 0.0).then_some(value)
}

pub fn parse_search(body: &str) -> Result<Vec<ProductSummary>, FoodError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .products
        .into_iter()
        .filter_map(|raw| {
            Some(ProductSummary {
                code: non_empty(raw.code)?,
                name: non_empty(raw.product_name)?,
                brand: non_empty(raw.brands),
                image_url: non_empty(raw.image_url),
            })
        })
        .collect())
}

/// `Ok(None)` when the service reports the code as unknown.
pub fn parse_product(body: &str) -> Result<Option<ProductDetails>, FoodError> {
    let response: ProductResponse = serde_json::from_str(body)?;
    let Some(raw) = response.product.filter(|_| response.status == 1) else {
        return Ok(None);
    };

    let Some(code) = non_empty(raw.code).or(non_empty(response.code)) else {
        return Ok(None);
    };
    let nutriments = raw.nutriments.unwrap_or_default();
    let per_100g = Nutrients {
        kcal: nutriment(&nutriments, "energy-kcal_100g"),
        protein_g: nutriment(&nutriments, "proteins_100g").unwrap_or(0.0),
        carbs_g: nutriment(&nutriments, "carbohydrates_100g").unwrap_or(0.0),
        fat_g: nutriment(&nutriments, "fat_100g").unwrap_or(0.0),
    };

    Ok(Some(ProductDetails {
        name: non_empty(raw.product_name).unwrap_or_else(|| code.clone()),
        code,
        brand: non_empty(raw.brands),
        serving_size: non_empty(raw.serving_size),
        per_100g,
    }))
}

pub struct OpenFoodFacts {
    base_url: String,
    client: Client,
}

impl OpenFoodFacts {
    /// The service asks integrators to identify themselves with a descriptive
    /// user agent.
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self, FoodError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_text(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<(StatusCode, String), FoodError> {
        debug!("GET {}", url);
        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl FoodDatabase for OpenFoodFacts {
    async fn search(&self, query: &str) -> Result<Vec<ProductSummary>, FoodError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(vec![]);
        }

        let url = format!("{}/cgi/search.pl", self.base_url);
        let page_size = PAGE_SIZE.to_string();
        let (status, body) = self
            .get_text(
                &url,
                &[
                    ("search_terms", query),
                    ("search_simple", "1"),
                    ("action", "process"),
                    ("json", "1"),
                    ("page_size", &page_size),
                ],
            )
            .await?;
        if !status.is_success() {
            warn!("Food search for '{}' failed with {}", query, status);
            return Err(FoodError::Status(status.as_u16()));
        }
        parse_search(&body)
    }

    async fn product(&self, code: &str) -> Result<Option<ProductDetails>, FoodError> {
        let code = code.trim();
        if code.is_empty() {
            return Ok(None);
        }

        let url = format!("{}/api/v0/product/{}.json", self.base_url, code);
        let (status, body) = self.get_text(&url, &[]).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            warn!("Product lookup for {} failed with {}", code, status);
            return Err(FoodError::Status(status.as_u16()));
        }
        parse_product(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_skips_products_without_code_or_name() {
        let body = r#"{
            "count": 3,
            "products": [
                {"code": "3017620422003", "product_name": "Nutella", "brands": "Ferrero",
                 "image_url": "https://images.example/nutella.jpg"},
                {"code": "", "product_name": "Orphan"},
                {"code": "5449000000996", "product_name": "  ", "brands": "Coca-Cola"},
                {"code": "737628064502", "product_name": "Rice Noodles"}
            ]
        }"#;
        let products = parse_search(body).unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].brand.as_deref(), Some("Ferrero"));
        assert_eq!(products[1].code, "737628064502");
        assert_eq!(products[1].image_url, None);
    }

    #[test]
    fn product_reads_nutriments_per_100g() {
        let body = r#"{
            "status": 1,
            "code": "3017620422003",
            "product": {
                "product_name": "Nutella",
                "brands": "Ferrero",
                "serving_size": "15 g",
                "nutriments": {
                    "energy-kcal_100g": 539,
                    "proteins_100g": "6,3",
                    "carbohydrates_100g": 57.5,
                    "fat_100g": 30.9
                }
            }
        }"#;
        let product = parse_product(body).unwrap().unwrap();
        assert_eq!(product.code, "3017620422003");
        assert_eq!(product.serving_size.as_deref(), Some("15 g"));
        assert_eq!(product.per_100g.kcal, Some(539.0));
        assert_eq!(product.per_100g.protein_g, 6.3);
        assert_eq!(product.per_100g.carbs_g, 57.5);
    }

    #[test]
    fn missing_energy_stays_unknown() {
        let body = r#"{"status": 1, "code": "42", "product": {"nutriments": {"fat_100g": 1}}}"#;
        let product = parse_product(body).unwrap().unwrap();
        assert_eq!(product.name, "42");
        assert_eq!(product.per_100g.kcal, None);
        assert_eq!(product.per_100g.protein_g, 0.0);
    }

    #[test]
    fn unknown_product_is_none() {
        let body = r#"{"status": 0, "code": "0000", "status_verbose": "product not found"}"#;
        assert_eq!(parse_product(body).unwrap(), None);
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        assert!(matches!(parse_search("<html>"), Err(FoodError::Decode(_))));
    }
}
