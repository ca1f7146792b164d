use crate::services::recipe_service::{self, RecipeDetail, RecipeSearchResult};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct RecipeSearchQuery {
    pub query: String,
    pub max_calories: Option<f64>,
    pub number: Option<u32>,
    pub offset: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/recipes/search",
    tag = "Recipes",
    params(
        ("query" = String, Query, description = "Free-text recipe search"),
        ("max_calories" = Option<f64>, Query, description = "Upper calorie bound per serving"),
        ("number" = Option<u32>, Query, description = "Page size, 1-50"),
        ("offset" = Option<u32>, Query, description = "Pagination offset")
    ),
    responses(
        (status = 200, description = "Matching recipes with macros", body = RecipeSearchResult),
        (status = 502, description = "Spoonacular unavailable")
    ),
    security(("bearer_auth" = []))
)]
pub async fn search_recipes(query: web::Query<RecipeSearchQuery>) -> HttpResponse {
    log::info!("🥗 GET /recipes/search - q: {}", query.query);

    match recipe_service::search_recipes(
        &query.query,
        query.max_calories,
        query.number,
        query.offset,
    )
    .await
    {
        Ok(result) => HttpResponse::Ok().json(json!({
            "success": true,
            "total_results": result.total_results,
            "results": result.results,
        })),
        Err(e) => {
            log::warn!("❌ Recipe search failed: {}", e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/recipes/{recipe_id}",
    tag = "Recipes",
    params(("recipe_id" = i64, Path, description = "Spoonacular recipe id")),
    responses(
        (status = 200, description = "Recipe detail", body = RecipeDetail),
        (status = 404, description = "Recipe not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_recipe(path: web::Path<i64>) -> HttpResponse {
    let recipe_id = path.into_inner();
    log::info!("🥗 GET /recipes/{}", recipe_id);

    match recipe_service::get_recipe_detail(recipe_id).await {
        Ok(detail) => HttpResponse::Ok().json(json!({ "success": true, "recipe": detail })),
        Err(e) => {
            log::warn!("❌ Recipe detail failed: {} - {}", recipe_id, e);
            e.to_response()
        }
    }
}
