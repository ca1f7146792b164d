use crate::{
    database::MongoDB,
    models::{BarcodeCacheEntry, ProductInfo},
    utils::error::AppError,
};
use lazy_static::lazy_static;
use mongodb::bson::doc;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

const OFF_API_BASE: &str = "https://world.openfoodfacts.org/api/v2/product";

/// Both cache tiers share a 1-day TTL.
pub const CACHE_TTL_SECONDS: u64 = 86_400;

#[derive(Debug, Clone)]
struct MemCached {
    found: bool,
    product: Option<ProductInfo>,
    at: Instant,
}

lazy_static! {
    static ref BARCODE_CACHE: Mutex<HashMap<String, MemCached>> = Mutex::new(HashMap::new());
}

#[derive(Debug, Deserialize)]
struct OffResponse {
    status: i32,
    #[serde(default)]
    product: Option<OffProduct>,
}

#[derive(Debug, Deserialize)]
struct OffProduct {
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    brands: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    nutriments: Option<OffNutriments>,
}

#[derive(Debug, Deserialize)]
struct OffNutriments {
    #[serde(rename = "energy-kcal_100g", default)]
    energy_kcal_100g: Option<f64>,
    #[serde(default)]
    proteins_100g: Option<f64>,
    #[serde(default)]
    carbohydrates_100g: Option<f64>,
    #[serde(default)]
    fat_100g: Option<f64>,
}

/// True while a cache entry is still inside its TTL window.
pub fn is_fresh(fetched_at: i64, now: i64, ttl_seconds: u64) -> bool {
    now >= fetched_at && (now - fetched_at) as u64 <= ttl_seconds
}

/// Barcode lookup with a two-tier cache: in-memory (per process) in front of
/// a persistent collection, both with a 1-day TTL. Negative results are
/// cached too — a barcode known to be missing is answered with 404 without
/// touching OpenFoodFacts again within the TTL.
pub async fn lookup(db: &MongoDB, barcode: &str) -> Result<ProductInfo, AppError> {
    let barcode = barcode.trim();
    if barcode.is_empty() || !barcode.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation("Barcode must be numeric".into()));
    }

    // 1. In-memory tier
    if let Some(cached) = mem_get(barcode) {
        log::debug!("📦 Barcode {} served from memory cache (found: {})", barcode, cached.found);
        return match cached.product {
            Some(product) if cached.found => Ok(product),
            _ => Err(AppError::NotFound("Product not found".into())),
        };
    }

    // 2. Persistent tier
    let now = chrono::Utc::now().timestamp();
    let persisted = db
        .collection::<BarcodeCacheEntry>("barcode_cache")
        .find_one(doc! { "barcode": barcode })
        .await
        .map_err(AppError::db)?;

    if let Some(entry) = persisted {
        if is_fresh(entry.fetched_at, now, CACHE_TTL_SECONDS) {
            log::debug!("📦 Barcode {} served from persistent cache (found: {})", barcode, entry.found);
            mem_put(barcode, entry.found, entry.product.clone());
            return match entry.product {
                Some(product) if entry.found => Ok(product),
                _ => Err(AppError::NotFound("Product not found".into())),
            };
        }
    }

    // 3. Upstream
    fetch_and_cache(db, barcode, now).await
}

async fn fetch_and_cache(db: &MongoDB, barcode: &str, now: i64) -> Result<ProductInfo, AppError> {
    log::info!("🥫 Fetching barcode {} from OpenFoodFacts", barcode);

    let url = format!("{}/{}.json", OFF_API_BASE, barcode);

    let client = reqwest::Client::new();
    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .timeout(std::time::Duration::from_secs(15))
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("OpenFoodFacts request failed: {}", e)))?;

    if !response.status().is_success() && response.status().as_u16() != 404 {
        return Err(AppError::Upstream(format!("OpenFoodFacts API error: {}", response.status())));
    }

    let parsed: OffResponse = response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to parse OpenFoodFacts response: {}", e)))?;

    if parsed.status != 1 {
        persist(db, barcode, false, None, now).await?;
        mem_put(barcode, false, None);
        log::info!("🚫 Barcode {} not found upstream — cached negative", barcode);
        return Err(AppError::NotFound("Product not found".into()));
    }

    let off = parsed
        .product
        .ok_or_else(|| AppError::Upstream("OpenFoodFacts response missing product".into()))?;
    let nutriments = off.nutriments.unwrap_or(OffNutriments {
        energy_kcal_100g: None,
        proteins_100g: None,
        carbohydrates_100g: None,
        fat_100g: None,
    });

    let product = ProductInfo {
        barcode: barcode.to_string(),
        name: off.product_name.unwrap_or_else(|| "Unknown product".to_string()),
        brands: off.brands,
        energy_kcal_100g: nutriments.energy_kcal_100g,
        proteins_100g: nutriments.proteins_100g,
        carbohydrates_100g: nutriments.carbohydrates_100g,
        fat_100g: nutriments.fat_100g,
        image_url: off.image_url,
    };

    persist(db, barcode, true, Some(product.clone()), now).await?;
    mem_put(barcode, true, Some(product.clone()));

    log::info!("✅ Barcode {} resolved: {}", barcode, product.name);

    Ok(product)
}

async fn persist(
    db: &MongoDB,
    barcode: &str,
    found: bool,
    product: Option<ProductInfo>,
    now: i64,
) -> Result<(), AppError> {
    let product_bson = match &product {
        Some(p) => mongodb::bson::to_bson(p)
            .map_err(|e| AppError::Database(format!("Failed to serialize product: {}", e)))?,
        None => mongodb::bson::Bson::Null,
    };

    db.collection::<BarcodeCacheEntry>("barcode_cache")
        .update_one(
            doc! { "barcode": barcode },
            doc! { "$set": { "found": found, "product": product_bson, "fetched_at": now } },
        )
        .upsert(true)
        .await
        .map_err(AppError::db)?;
    Ok(())
}

fn mem_get(barcode: &str) -> Option<MemCached> {
    let cache = BARCODE_CACHE.lock().ok()?;
    let entry = cache.get(barcode)?;
    if entry.at.elapsed().as_secs() <= CACHE_TTL_SECONDS {
        Some(entry.clone())
    } else {
        None
    }
}

fn mem_put(barcode: &str, found: bool, product: Option<ProductInfo>) {
    if let Ok(mut cache) = BARCODE_CACHE.lock() {
        cache.insert(barcode.to_string(), MemCached { found, product, at: Instant::now() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_freshness() {
        let now = 1_700_000_000i64;
        assert!(is_fresh(now, now, CACHE_TTL_SECONDS));
        assert!(is_fresh(now - 86_000, now, CACHE_TTL_SECONDS));
        assert!(!is_fresh(now - 86_500, now, CACHE_TTL_SECONDS));
        // Clock skew: an entry "from the future" is not fresh
        assert!(!is_fresh(now + 10, now, CACHE_TTL_SECONDS));
    }

    #[test]
    fn test_negative_entry_served_from_memory() {
        mem_put("0000000000000", false, None);
        let hit = mem_get("0000000000000").expect("entry should be fresh");
        assert!(!hit.found);
        assert!(hit.product.is_none());
    }
}
