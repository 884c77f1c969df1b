use actix_web::{web, HttpResponse};

use crate::{
    api::ensure_admin,
    database::MongoDB,
    models::{Category, Role},
    services::auth_service::Claims,
    services::{facility_service, manage_service},
    utils::error::AppError,
};

/// Admin pode editar qualquer listagem; manager só as que lhe foram
/// atribuídas na categoria correspondente.
async fn ensure_can_edit(
    db: &MongoDB,
    claims: &Claims,
    category: Category,
    entity_id: &str,
) -> Result<(), AppError> {
    match claims.role {
        Role::Admin => Ok(()),
        Role::Manager => {
            if manage_service::is_assigned(db, &claims.sub, category, entity_id).await? {
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
    path = "/api/v1/facilities",
    tag = "Facilities",
    params(
        ("q" = Option<String>, Query, description = "Title search (case-insensitive)"),
        ("category" = Option<String>, Query, description = "hospital | clinic"),
        ("city" = Option<String>, Query, description = "City filter"),
        ("page" = Option<i64>, Query, description = "Page number (1-based)"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)")
    ),
    responses(
        (status = 200, description = "Paginated facility listing"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_facilities(
    db: web::Data<MongoDB>,
    params: web::Query<facility_service::ListFacilitiesParams>,
) -> HttpResponse {
    log::info!("🏥 GET /facilities");

    match facility_service::list_facilities(&db, &params).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Failed to list facilities: {}", e);
            e.to_response()
        }
    }
}

pub async fn get_facility(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> HttpResponse {
    let facility_id = path.into_inner();
    log::info!("🏥 GET /facilities/{}", facility_id);

    match facility_service::get_facility(&db, &facility_id).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::warn!("⚠️ Failed to get facility {}: {}", facility_id, e);
            e.to_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/facilities",
    tag = "Facilities",
    request_body = facility_service::CreateFacilityRequest,
    responses(
        (status = 201, description = "Facility created"),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_facility(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<facility_service::CreateFacilityRequest>,
) -> HttpResponse {
    log::info!("📝 POST /facilities - by {}", user.sub);

    if let Err(e) = ensure_admin(&user) {
        return e.to_response();
    }

    match facility_service::create_facility(&db, request.into_inner()).await {
        Ok(response) => HttpResponse::Created().json(response),
        Err(e) => {
            log::error!("❌ Failed to create facility: {}", e);
            e.to_response()
        }
    }
}

pub async fn update_facility(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
    request: web::Json<facility_service::UpdateFacilityRequest>,
) -> HttpResponse {
    let facility_id = path.into_inner();
    log::info!("🔧 PUT /facilities/{} - by {}", facility_id, user.sub);

    // Carrega a facility antes para saber a categoria do gate de manager
    let current = match facility_service::get_facility(&db, &facility_id).await {
        Ok(response) => response.facility,
        Err(e) => return e.to_response(),
    };

    if let Err(e) = ensure_can_edit(&db, &user, current.category.into(), &facility_id).await {
        log::warn!("🚫 Edit denied on facility {} for {}", facility_id, user.sub);
        return e.to_response();
    }

    match facility_service::update_facility(&db, &facility_id, request.into_inner()).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Failed to update facility {}: {}", facility_id, e);
            e.to_response()
        }
    }
}

pub async fn delete_facility(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> HttpResponse {
    let facility_id = path.into_inner();
    log::info!("🗑️  DELETE /facilities/{} - by {}", facility_id, user.sub);

    if let Err(e) = ensure_admin(&user) {
        return e.to_response();
    }

    match facility_service::delete_facility(&db, &facility_id).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Failed to delete facility {}: {}", facility_id, e);
            e.to_response()
        }
    }
}
