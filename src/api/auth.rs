use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::services::auth_service::{self, AuthResponse, Claims, LoginRequest, MessageResponse, RegisterRequest};
use crate::database::MongoDB;

#[derive(Deserialize)]
pub struct ConfirmQuery {
    pub token: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = MessageResponse),
        (status = 400, description = "Invalid request or user already exists")
    )
)]
pub async fn register(
    db: web::Data<MongoDB>,
    request: web::Json<RegisterRequest>,
) -> HttpResponse {
    log::info!("📝 POST /auth/register - email: {}", request.email);

    match auth_service::register(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Registration successful: {}", request.email);
            HttpResponse::Created().json(response)
        }
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", request.email, e);
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/confirm",
    tag = "Auth",
    params(
        ("token" = String, Query, description = "Verification token from the email")
    ),
    responses(
        (status = 200, description = "Account verified", body = MessageResponse),
        (status = 400, description = "Invalid or already used token")
    )
)]
pub async fn confirm(
    db: web::Data<MongoDB>,
    query: web::Query<ConfirmQuery>,
) -> HttpResponse {
    log::info!("✉️  GET /auth/confirm");

    match auth_service::confirm_email(&db, &query.token).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::warn!("❌ Email confirmation failed: {}", e);
            HttpResponse::BadRequest().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    db: web::Data<MongoDB>,
    request: web::Json<LoginRequest>,
) -> HttpResponse {
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    match auth_service::login(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.email);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            HttpResponse::Unauthorized().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

pub async fn refresh_token(
    db: web::Data<MongoDB>,
    request: web::Json<auth_service::RefreshTokenRequest>,
) -> HttpResponse {
    log::info!("🔄 POST /auth/refresh");

    match auth_service::refresh_token(&db, &request).await {
        Ok(response) => {
            log::info!("✅ Token refreshed");
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Token refresh failed: {}", e);
            HttpResponse::Unauthorized().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/verify",
    tag = "Auth",
    responses(
        (status = 200, description = "Token is valid"),
        (status = 401, description = "Invalid or expired token")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn verify_token(req: HttpRequest) -> HttpResponse {
    log::info!("✓ GET /auth/verify");

    let auth_header = req.headers().get("Authorization");

    if let Some(auth_value) = auth_header {
        if let Ok(auth_str) = auth_value.to_str() {
            if auth_str.starts_with("Bearer ") {
                let token = &auth_str[7..];

                match auth_service::verify_token(token) {
                    Ok(claims) => {
                        log::info!("✅ Token valid for user: {}", claims.sub);
                        return HttpResponse::Ok().json(serde_json::json!({
                            "valid": true,
                            "user_id": claims.sub,
                            "role": claims.role,
                        }));
                    }
                    Err(e) => {
                        log::warn!("❌ Token invalid: {}", e);
                        return HttpResponse::Unauthorized().json(serde_json::json!({
                            "valid": false,
                            "error": e
                        }));
                    }
                }
            }
        }
    }

    HttpResponse::Unauthorized().json(serde_json::json!({
        "valid": false,
        "error": "Missing or malformed Authorization header"
    }))
}

/// GET /api/v1/auth/me - dados do usuário autenticado
pub async fn get_me(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
) -> HttpResponse {
    let user_id = &user.sub;

    log::info!("👤 GET /auth/me - user {}", user_id);

    match auth_service::get_current_user(&db, user_id).await {
        Ok(info) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": info
        })),
        Err(e) => {
            log::warn!("❌ Failed to load current user {}: {}", user_id, e);
            HttpResponse::NotFound().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}

/// DELETE /api/v1/auth/delete-account - soft delete da própria conta
pub async fn delete_account(
    user: web::ReqData<Claims>,
    db: web::Data<MongoDB>,
) -> HttpResponse {
    let user_id = &user.sub;

    log::info!("🗑️  DELETE /auth/delete-account - user {}", user_id);

    match auth_service::delete_user_account(&db, user_id).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => {
            log::error!("❌ Error deleting account {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e
            }))
        }
    }
}
