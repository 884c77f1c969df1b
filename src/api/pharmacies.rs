use actix_web::{web, HttpResponse};

use crate::{
    api::ensure_admin,
    database::MongoDB,
    models::{Category, Role},
    services::auth_service::Claims,
    services::{manage_service, pharmacy_service},
    utils::error::AppError,
};

async fn ensure_can_edit(
    db: &MongoDB,
    claims: &Claims,
    pharmacy_id: &str,
) -> Result<(), AppError> {
    match claims.role {
        Role::Admin => Ok(()),
        Role::Manager => {
            if manage_service::is_assigned(db, &claims.sub, Category::Pharmacy, pharmacy_id).await? {
                Ok(())
            } else {
                Err(AppError::Forbidden(
                    "You are not assigned to this listing".to_string(),
                ))
            }
        }
        Role::None => Err(AppError::Forbidden(
            "Management access required".to_string(),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/pharmacies",
    tag = "Pharmacies",
    params(
        ("q" = Option<String>, Query, description = "Title search (case-insensitive)"),
        ("city" = Option<String>, Query, description = "City filter"),
        ("page" = Option<i64>, Query, description = "Page number (1-based)"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)")
    ),
    responses(
        (status = 200, description = "Paginated pharmacy listing"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_pharmacies(
    db: web::Data<MongoDB>,
    params: web::Query<pharmacy_service::ListPharmaciesParams>,
) -> HttpResponse {
    log::info!("💊 GET /pharmacies");

    match pharmacy_service::list_pharmacies(&db, &params).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Failed to list pharmacies: {}", e);
            e.to_response()
        }
    }
}

pub async fn get_pharmacy(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> HttpResponse {
    let pharmacy_id = path.into_inner();
    log::info!("💊 GET /pharmacies/{}", pharmacy_id);

    match pharmacy_service::get_pharmacy(&db, &pharmacy_id).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::warn!("⚠️ Failed to get pharmacy {}: {}", pharmacy_id, e);
            e.to_response()
        }
    }
}

pub async fn create_pharmacy(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<pharmacy_service::CreatePharmacyRequest>,
) -> HttpResponse {
    log::info!("📝 POST /pharmacies - by {}", user.sub);

    if let Err(e) = ensure_admin(&user) {
        return e.to_response();
    }

    match pharmacy_service::create_pharmacy(&db, request.into_inner()).await {
        Ok(response) => HttpResponse::Created().json(response),
        Err(e) => {
            log::error!("❌ Failed to create pharmacy: {}", e);
            e.to_response()
        }
    }
}

pub async fn update_pharmacy(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<pharmacy_service::UpdatePharmacyRequest>,
) -> HttpResponse {
    let pharmacy_id = path.into_inner();
    log::info!("🔧 PUT /pharmacies/{} - by {}", pharmacy_id, user.sub);

    // 404 antes de 403: não adianta autorizar edição de algo que não existe
    if let Err(e) = pharmacy_service::get_pharmacy(&db, &pharmacy_id).await {
        return e.to_response();
    }

    if let Err(e) = ensure_can_edit(&db, &user, &pharmacy_id).await {
        log::warn!("🚫 Edit denied on pharmacy {} for {}", pharmacy_id, user.sub);
        return e.to_response();
    }

    match pharmacy_service::update_pharmacy(&db, &pharmacy_id, request.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Failed to update pharmacy {}: {}", pharmacy_id, e);
            e.to_response()
        }
    }
}

pub async fn delete_pharmacy(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> HttpResponse {
    let pharmacy_id = path.into_inner();
    log::info!("🗑️  DELETE /pharmacies/{} - by {}", pharmacy_id, user.sub);

    if let Err(e) = ensure_admin(&user) {
        return e.to_response();
    }

    match pharmacy_service::delete_pharmacy(&db, &pharmacy_id).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Failed to delete pharmacy {}: {}", pharmacy_id, e);
            e.to_response()
        }
    }
}
