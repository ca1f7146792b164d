use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Persistent OpenFoodFacts cache entry (collection: barcode_cache).
/// Negative lookups are cached too, so a barcode known to be missing is
/// answered with 404 without re-querying upstream within the TTL.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BarcodeCacheEntry {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub barcode: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductInfo>,
    /// Unix timestamp of the upstream fetch
    pub fetched_at: i64,
}

/// Normalized product view extracted from the OpenFoodFacts response.
/// Nutriments are per 100g.
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct ProductInfo {
    pub barcode: String,
    pub name: String,
    pub brands: Option<String>,
    pub energy_kcal_100g: Option<f64>,
    pub proteins_100g: Option<f64>,
    pub carbohydrates_100g: Option<f64>,
    pub fat_100g: Option<f64>,
    pub image_url: Option<String>,
}
