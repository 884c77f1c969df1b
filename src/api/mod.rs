pub mod auth;
pub mod external;
pub mod facilities;
pub mod health;
pub mod manage;
pub mod metrics;
pub mod pharmacies;
pub mod swagger;
pub mod users;

use crate::models::Role;
use crate::services::auth_service::Claims;
use crate::utils::error::AppError;

/// Gate de admin no nível do handler: o middleware só autentica,
/// a autorização é checada aqui.
pub(crate) fn ensure_admin(claims: &Claims) -> Result<(), AppError> {
    if claims.role == Role::Admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_with_role(role: Role) -> Claims {
        Claims {
            sub: "u1".into(),
            email: "x@y.z".into(),
            name: None,
            role,
            iat: 0,
            exp: 0,
            jti: "j".into(),
            aud: "a".into(),
            iss: "i".into(),
        }
    }

    #[test]
    fn test_ensure_admin() {
        assert!(ensure_admin(&claims_with_role(Role::Admin)).is_ok());
        assert!(ensure_admin(&claims_with_role(Role::Manager)).is_err());
        assert!(ensure_admin(&claims_with_role(Role::None)).is_err());
    }
}
