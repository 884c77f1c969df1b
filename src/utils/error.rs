use actix_web::HttpResponse;
use std::fmt;

use crate::api::metrics;

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    NotFound(String),
    Forbidden(String),
    Database(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Invalid request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Mapeia cada variante para a resposta HTTP correspondente.
    pub fn to_response(&self) -> HttpResponse {
        metrics::increment_error_count();

        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });

        match self {
            AppError::Validation(_) => HttpResponse::BadRequest().json(body),
            AppError::NotFound(_) => HttpResponse::NotFound().json(body),
            AppError::Forbidden(_) => HttpResponse::Forbidden().json(body),
            AppError::Database(_) => HttpResponse::InternalServerError().json(body),
        }
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("x".into()).to_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".into()).to_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Forbidden("x".into()).to_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Database("x".into()).to_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_display_includes_message() {
        let err = AppError::NotFound("User abc not found".into());
        assert_eq!(err.to_string(), "Not found: User abc not found");
    }
}
