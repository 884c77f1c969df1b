use actix_web::{web, HttpResponse};

use crate::{
    api::ensure_admin,
    database::MongoDB,
    models::Category,
    services::auth_service::Claims,
    services::manage_service::{self, ReconcileRequest, ReconcileResponse},
    utils::error::AppError,
};

#[utoipa::path(
    post,
    path = "/api/v1/admin/managers",
    tag = "Managers",
    request_body = ReconcileRequest,
    responses(
        (status = 200, description = "Assignments reconciled and role recomputed", body = ReconcileResponse),
        (status = 400, description = "Malformed body (unknown entity_type)"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Target user does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_managers(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    request: web::Json<ReconcileRequest>,
) -> HttpResponse {
    log::info!(
        "🔁 POST /admin/managers - {} entities [{}] for user {} (by {})",
        request.entity_ids.len(),
        request.entity_type,
        request.user_id,
        user.sub
    );

    if let Err(e) = ensure_admin(&user) {
        log::warn!("🚫 Manager update denied for {}", user.sub);
        return e.to_response();
    }

    let category = match Category::parse(&request.entity_type) {
        Some(category) => category,
        None => {
            return AppError::Validation(format!(
                "Unknown entity_type '{}'; expected hospital, clinic or pharmacy",
                request.entity_type
            ))
            .to_response()
        }
    };

    let body = request.into_inner();

    match manage_service::reconcile(&db, &body.user_id, category, body.entity_ids).await {
        Ok(response) => {
            log::info!("✅ {}", response.message);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::error!("❌ Reconcile failed for user {}: {}", body.user_id, e);
            e.to_response()
        }
    }
}

/// GET /api/v1/admin/managers/{user_id} - conjuntos de atribuição atuais
/// (o console admin usa isso para montar o formulário de atribuição)
pub async fn get_user_assignments(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> HttpResponse {
    let user_id = path.into_inner();
    log::info!("📋 GET /admin/managers/{} (by {})", user_id, user.sub);

    if let Err(e) = ensure_admin(&user) {
        return e.to_response();
    }

    match manage_service::list_user_assignments(&db, &user_id).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::warn!("⚠️ Failed to list assignments for {}: {}", user_id, e);
            e.to_response()
        }
    }
}
