use crate::models::ProductInfo;
use crate::{database::MongoDB, services::barcode_service};
use actix_web::{web, HttpResponse};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/products/{barcode}",
    tag = "Products",
    params(("barcode" = String, Path, description = "EAN/UPC barcode digits")),
    responses(
        (status = 200, description = "Product nutrition per 100g", body = ProductInfo),
        (status = 404, description = "Barcode unknown to OpenFoodFacts"),
        (status = 502, description = "OpenFoodFacts unavailable")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_product(db: web::Data<MongoDB>, path: web::Path<String>) -> HttpResponse {
    let barcode = path.into_inner();
    log::info!("🥫 GET /api/products/{}", barcode);

    match barcode_service::lookup(&db, &barcode).await {
        Ok(product) => HttpResponse::Ok().json(json!({ "success": true, "product": product })),
        Err(e) => {
            log::warn!("❌ Barcode lookup failed: {} - {}", barcode, e);
            e.to_response()
        }
    }
}
