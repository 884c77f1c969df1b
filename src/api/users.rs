use actix_web::{web, HttpResponse};

use crate::{
    api::ensure_admin,
    database::MongoDB,
    services::auth_service::Claims,
    services::user_service,
};

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "Users",
    params(
        ("q" = Option<String>, Query, description = "Search by email or name"),
        ("page" = Option<i64>, Query, description = "Page number (1-based)"),
        ("limit" = Option<i64>, Query, description = "Page size (max 100)")
    ),
    responses(
        (status = 200, description = "Paginated user listing"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    params: web::Query<user_service::ListUsersParams>,
) -> HttpResponse {
    log::info!("👥 GET /admin/users (by {})", user.sub);

    if let Err(e) = ensure_admin(&user) {
        return e.to_response();
    }

    match user_service::list_users(&db, &params).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Failed to list users: {}", e);
            e.to_response()
        }
    }
}

pub async fn get_user(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> HttpResponse {
    let user_id = path.into_inner();
    log::info!("👤 GET /admin/users/{} (by {})", user_id, user.sub);

    if let Err(e) = ensure_admin(&user) {
        return e.to_response();
    }

    match user_service::get_user(&db, &user_id).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::warn!("⚠️ Failed to get user {}: {}", user_id, e);
            e.to_response()
        }
    }
}

pub async fn delete_user(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> HttpResponse {
    let user_id = path.into_inner();
    log::info!("🗑️  DELETE /admin/users/{} (by {})", user_id, user.sub);

    if let Err(e) = ensure_admin(&user) {
        return e.to_response();
    }

    match user_service::delete_user(&db, &user_id).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Failed to delete user {}: {}", user_id, e);
            e.to_response()
        }
    }
}
