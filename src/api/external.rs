use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    api::ensure_admin,
    services::auth_service::Claims,
    services::geocode_service,
};

#[derive(Deserialize)]
pub struct GeocodeQuery {
    pub address: String,
}

/// GET /api/v1/external/geocode - ferramenta do console admin para
/// preencher coordenadas de uma listagem a partir do endereço
#[utoipa::path(
    get,
    path = "/api/v1/external/geocode",
    tag = "External",
    params(
        ("address" = String, Query, description = "Free-form address to geocode")
    ),
    responses(
        (status = 200, description = "Coordinates for the address"),
        (status = 403, description = "Admin access required"),
        (status = 502, description = "Geocoder failure or no result")
    ),
    security(("bearer_auth" = []))
)]
pub async fn geocode(
    user: web::ReqData<Claims>,
    query: web::Query<GeocodeQuery>,
) -> HttpResponse {
    log::info!("📍 GET /external/geocode (by {})", user.sub);

    if let Err(e) = ensure_admin(&user) {
        return e.to_response();
    }

    match geocode_service::geocode_address(&query.address).await {
        Ok(point) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "address": query.address,
            "lat": point.lat,
            "lng": point.lng,
        })),
        Err(e) => {
            log::warn!("⚠️ Geocoding failed for '{}': {}", query.address, e);
            HttpResponse::BadGateway().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}
