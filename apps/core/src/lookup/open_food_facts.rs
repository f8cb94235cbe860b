//! Open Food Facts API client.
//!
//! Two read-only endpoints are used:
//! - `GET {base}/api/v2/product/{barcode}.json` for exact barcode lookups
//! - `GET {base}/cgi/search.pl?search_terms=...&json=1` for free-text search,
//!   of which only the first product is consumed
//!
//! There is no caching and no retry: identical queries issue identical
//! requests, and any failure is reported as "not found".

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::traits::ProductSource;
use crate::config::AppConfig;
use crate::engine::ingredients::title_case;
use crate::error::{AppError, AppResult};
use crate::models::{split_labels, NutriGrade, NutritionRecord, RecordSource};

/// Name used when a barcode product has no `product_name`.
const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Barcode endpoint response
#[derive(Debug, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    status: Value,
    product: Option<RawProduct>,
}

/// Search endpoint response. Products stay untyped so a malformed entry
/// after the first one cannot spoil the lookup.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawProduct {
    product_name: Option<String>,
    brands: Option<String>,
    categories: Option<String>,
    ingredients_text: Option<String>,
    image_url: Option<String>,
    nutriscore_grade: Option<String>,
    nutriments: HashMap<String, Value>,
}

impl RawProduct {
    /// Nutriment values arrive as numbers or numeric strings.
    fn nutriment(&self, key: &str) -> Option<f64> {
        match self.nutriments.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn into_record(self, fallback_name: &str) -> NutritionRecord {
        let non_empty = |s: Option<String>| s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        NutritionRecord {
            energy_kcal_per_100g: self.nutriment("energy-kcal_100g"),
            protein_g: self.nutriment("proteins_100g"),
            carbohydrates_g: self.nutriment("carbohydrates_100g"),
            sugar_g: self.nutriment("sugars_100g"),
            fat_g: self.nutriment("fat_100g"),
            saturated_fat_g: self.nutriment("saturated-fat_100g"),
            fiber_g: self.nutriment("fiber_100g"),
            sodium_g: self.nutriment("sodium_100g"),
            nutri_grade: self
                .nutriscore_grade
                .as_deref()
                .map(NutriGrade::from_code)
                .unwrap_or_default(),
            category_labels: self.categories.as_deref().map(split_labels).unwrap_or_default(),
            name: non_empty(self.product_name).unwrap_or_else(|| fallback_name.to_string()),
            brand: non_empty(self.brands),
            ingredients_text: self.ingredients_text.unwrap_or_default(),
            image_url: non_empty(self.image_url),
            source: RecordSource::OpenFoodFacts,
        }
    }
}

/// Barcodes are numeric GTIN/EAN codes.
fn is_valid_barcode(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_digit())
}

/// HTTP client for the Open Food Facts product database.
#[derive(Debug, Clone)]
pub struct OpenFoodFactsClient {
    client: Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    /// Creates a client whose requests all carry the configured timeout.
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
        })
    }

    async fn fetch_by_barcode(&self, code: &str) -> AppResult<Option<NutritionRecord>> {
        let url = format!("{}/api/v2/product/{}.json", self.base_url, code);
        debug!("GET {}", url);

        let response: ProductResponse = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(AppError::from_transport)?
            .json()
            .await
            .map_err(AppError::from_transport)?;

        if response.status.as_i64() != Some(1) {
            debug!("Barcode {} reported status {}", code, response.status);
            return Ok(None);
        }

        Ok(response.product.map(|p| p.into_record(UNKNOWN_PRODUCT)))
    }

    async fn fetch_by_name(&self, query: &str) -> AppResult<Option<NutritionRecord>> {
        let url = format!("{}/cgi/search.pl", self.base_url);
        debug!("GET {} search_terms={}", url, query);

        let response: SearchResponse = self
            .client
            .get(&url)
            .query(&[
                ("search_terms", query),
                ("search_simple", "1"),
                ("action", "process"),
                ("json", "1"),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(AppError::from_transport)?
            .json()
            .await
            .map_err(AppError::from_transport)?;

        let Some(first) = response.products.into_iter().next() else {
            return Ok(None);
        };

        let product: RawProduct = serde_json::from_value(first)?;
        Ok(Some(product.into_record(&title_case(query))))
    }
}

#[async_trait]
impl ProductSource for OpenFoodFactsClient {
    #[instrument(skip(self))]
    async fn find_by_name(&self, query: &str) -> Option<NutritionRecord> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        match self.fetch_by_name(query).await {
            Ok(found) => {
                if found.is_none() {
                    debug!("No search results for '{}'", query);
                }
                found
            }
            Err(e) => {
                warn!("Product search for '{}' failed: {}", query, e);
                None
            }
        }
    }

    #[instrument(skip(self))]
    async fn find_by_barcode(&self, code: &str) -> Option<NutritionRecord> {
        let code = code.trim();
        if !is_valid_barcode(code) {
            debug!("Rejected malformed barcode '{}'", code);
            return None;
        }

        match self.fetch_by_barcode(code).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Barcode lookup for {} failed: {}", code, e);
                None
            }
        }
    }
}
