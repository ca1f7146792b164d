use crate::utils::error::AppError;
use serde::{Deserialize, Serialize};

const SPOONACULAR_API_BASE: &str = "https://api.spoonacular.com";

fn api_key() -> Result<String, AppError> {
    std::env::var("SPOONACULAR_API_KEY")
        .map_err(|_| AppError::Config("SPOONACULAR_API_KEY is not configured".into()))
}

#[derive(Debug, Deserialize)]
struct SpoonacularSearchResponse {
    #[serde(default)]
    results: Vec<SpoonacularSearchHit>,
    #[serde(default)]
    #[serde(rename = "totalResults")]
    total_results: i64,
}

#[derive(Debug, Deserialize)]
struct SpoonacularSearchHit {
    id: i64,
    title: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    nutrition: Option<SpoonacularNutrition>,
}

#[derive(Debug, Deserialize)]
struct SpoonacularNutrition {
    #[serde(default)]
    nutrients: Vec<SpoonacularNutrient>,
}

#[derive(Debug, Deserialize)]
struct SpoonacularNutrient {
    name: String,
    amount: f64,
}

#[derive(Debug, Deserialize)]
struct SpoonacularRecipeInfo {
    id: i64,
    title: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    #[serde(rename = "readyInMinutes")]
    ready_in_minutes: Option<u32>,
    #[serde(default)]
    servings: Option<u32>,
    #[serde(default)]
    #[serde(rename = "sourceUrl")]
    source_url: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    nutrition: Option<SpoonacularNutrition>,
    #[serde(default)]
    #[serde(rename = "extendedIngredients")]
    extended_ingredients: Vec<SpoonacularIngredient>,
}

#[derive(Debug, Deserialize)]
struct SpoonacularIngredient {
    #[serde(default)]
    original: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RecipeSummary {
    pub recipe_id: i64,
    pub title: String,
    pub image: Option<String>,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RecipeSearchResult {
    pub results: Vec<RecipeSummary>,
    pub total_results: i64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RecipeDetail {
    pub recipe_id: i64,
    pub title: String,
    pub image: Option<String>,
    pub ready_in_minutes: Option<u32>,
    pub servings: Option<u32>,
    pub source_url: Option<String>,
    pub summary: Option<String>,
    pub ingredients: Vec<String>,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
}

fn nutrient(nutrition: &Option<SpoonacularNutrition>, name: &str) -> Option<f64> {
    nutrition
        .as_ref()?
        .nutrients
        .iter()
        .find(|n| n.name.eq_ignore_ascii_case(name))
        .map(|n| n.amount)
}

fn clamp_page_size(requested: Option<u32>) -> u32 {
    requested.unwrap_or(10).clamp(1, 50)
}

/// Recipe search against Spoonacular's complexSearch, macros included so the
/// app can render results without a second round-trip per recipe.
pub async fn search_recipes(
    query: &str,
    max_calories: Option<f64>,
    number: Option<u32>,
    offset: Option<u32>,
) -> Result<RecipeSearchResult, AppError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("Search query is required".into()));
    }

    let key = api_key()?;
    log::info!("🥗 Searching recipes: {}", query);

    let mut url = format!(
        "{}/recipes/complexSearch?apiKey={}&query={}&addRecipeNutrition=true&number={}&offset={}",
        SPOONACULAR_API_BASE,
        key,
        urlencoding::encode(query),
        clamp_page_size(number),
        offset.unwrap_or(0),
    );
    if let Some(max) = max_calories {
        if max.is_finite() && max > 0.0 {
            url.push_str(&format!("&maxCalories={}", max.round() as i64));
        }
    }

    let client = reqwest::Client::new();
    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .timeout(std::time::Duration::from_secs(15))
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("Spoonacular request failed: {}", e)))?;

    if response.status().as_u16() == 402 {
        return Err(AppError::Upstream("Spoonacular quota exceeded".into()));
    }
    if !response.status().is_success() {
        return Err(AppError::Upstream(format!("Spoonacular API error: {}", response.status())));
    }

    let parsed: SpoonacularSearchResponse = response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to parse Spoonacular response: {}", e)))?;

    let results = parsed
        .results
        .into_iter()
        .map(|hit| RecipeSummary {
            recipe_id: hit.id,
            title: hit.title,
            image: hit.image,
            calories: nutrient(&hit.nutrition, "Calories"),
            protein_g: nutrient(&hit.nutrition, "Protein"),
            carbs_g: nutrient(&hit.nutrition, "Carbohydrates"),
            fat_g: nutrient(&hit.nutrition, "Fat"),
        })
        .collect();

    Ok(RecipeSearchResult { results, total_results: parsed.total_results })
}

pub async fn get_recipe_detail(recipe_id: i64) -> Result<RecipeDetail, AppError> {
    if recipe_id <= 0 {
        return Err(AppError::Validation("Invalid recipe id".into()));
    }

    let key = api_key()?;
    log::info!("🥗 Fetching recipe detail: {}", recipe_id);

    let url = format!(
        "{}/recipes/{}/information?apiKey={}&includeNutrition=true",
        SPOONACULAR_API_BASE, recipe_id, key
    );

    let client = reqwest::Client::new();
    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .timeout(std::time::Duration::from_secs(15))
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("Spoonacular request failed: {}", e)))?;

    if response.status().as_u16() == 404 {
        return Err(AppError::NotFound("Recipe not found".into()));
    }
    if !response.status().is_success() {
        return Err(AppError::Upstream(format!("Spoonacular API error: {}", response.status())));
    }

    let info: SpoonacularRecipeInfo = response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to parse Spoonacular response: {}", e)))?;

    Ok(RecipeDetail {
        recipe_id: info.id,
        title: info.title,
        image: info.image,
        ready_in_minutes: info.ready_in_minutes,
        servings: info.servings,
        source_url: info.source_url,
        summary: info.summary,
        ingredients: info
            .extended_ingredients
            .into_iter()
            .filter_map(|i| i.original)
            .collect(),
        calories: nutrient(&info.nutrition, "Calories"),
        protein_g: nutrient(&info.nutrition, "Protein"),
        carbs_g: nutrient(&info.nutrition, "Carbohydrates"),
        fat_g: nutrient(&info.nutrition, "Fat"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_clamped() {
        assert_eq!(clamp_page_size(None), 10);
        assert_eq!(clamp_page_size(Some(0)), 1);
        assert_eq!(clamp_page_size(Some(500)), 50);
        assert_eq!(clamp_page_size(Some(25)), 25);
    }

    #[test]
    fn test_nutrient_lookup_case_insensitive() {
        let nutrition = Some(SpoonacularNutrition {
            nutrients: vec![
                SpoonacularNutrient { name: "Calories".into(), amount: 420.0 },
                SpoonacularNutrient { name: "Protein".into(), amount: 32.5 },
            ],
        });
        assert_eq!(nutrient(&nutrition, "calories"), Some(420.0));
        assert_eq!(nutrient(&nutrition, "Protein"), Some(32.5));
        assert_eq!(nutrient(&nutrition, "Fat"), None);
        assert_eq!(nutrient(&None, "Calories"), None);
    }
}
