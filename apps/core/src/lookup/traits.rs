use async_trait::async_trait;

use crate::models::NutritionRecord;

/// Defines the public interface for a product database.
///
/// This trait abstracts where nutrition records come from (the remote Open
/// Food Facts API, the local CSV catalog, a test double) so the engine can be
/// driven by any of them. Implementations absorb their own failures: every
/// error, timeout or empty result is reported as `None`.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Resolves a free-text product name to the first matching record.
    async fn find_by_name(&self, query: &str) -> Option<NutritionRecord>;

    /// Resolves a barcode (GTIN/EAN) to its record.
    async fn find_by_barcode(&self, code: &str) -> Option<NutritionRecord>;
}
