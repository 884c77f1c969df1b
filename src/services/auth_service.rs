use crate::{
    database::MongoDB,
    models::{Role, User},
    services::mailer_service,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user_id
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub iat: usize, // issued at
    pub exp: usize, // expiration
    pub jti: String, // JWT ID
    pub aud: String, // audience
    pub iss: String, // issuer
}

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub refresh_token: Option<String>,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_verified: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl UserInfo {
    pub fn from_user(user: &User) -> Self {
        UserInfo {
            id: user.user_id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            is_verified: user.is_verified,
        }
    }
}

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret-change-me".to_string())
}

fn get_jwt_issuer() -> String {
    std::env::var("JWT_ISSUER").unwrap_or_else(|_| "medifind-service".to_string())
}

fn get_jwt_audience() -> String {
    std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "medifind-api".to_string())
}

// Generate short-lived access token (1h)
pub fn generate_jwt(user: &User) -> Result<String, String> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::hours(1)).timestamp() as usize;
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: user.user_id.clone(),
        email: user.email.clone(),
        name: Some(user.full_name()),
        role: user.role,
        iat,
        exp,
        jti,
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| format!("Failed to generate token: {}", e))
}

// Generate refresh token (longer expiry)
pub fn generate_refresh_token(user_id: &str) -> Result<String, String> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::days(30)).timestamp() as usize;
    let jti = Uuid::new_v4().to_string();

    let claims = Claims {
        sub: user_id.to_string(),
        email: String::new(),
        name: None,
        role: Role::None,
        iat,
        exp,
        jti,
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| format!("Failed to generate refresh token: {}", e))
}

// Verify JWT token
pub fn verify_token(token: &str) -> Result<Claims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[get_jwt_audience()]);

    let mut issuers = HashSet::new();
    issuers.insert(get_jwt_issuer());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

// User registration
pub async fn register(db: &MongoDB, request: &RegisterRequest) -> Result<MessageResponse, String> {
    let collection = db.collection::<User>("users");

    if !request.email.contains('@') {
        return Err("A valid email is required".to_string());
    }
    if request.password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    if request.first_name.trim().is_empty() || request.last_name.trim().is_empty() {
        return Err("First and last name are required".to_string());
    }

    // Check if user already exists (soft-deleted accounts keep the email)
    let existing = collection
        .find_one(doc! { "email": &request.email })
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    if existing.is_some() {
        return Err("User already exists".to_string());
    }

    let hashed_password =
        hash(&request.password, DEFAULT_COST).map_err(|e| format!("Failed to hash password: {}", e))?;

    let new_user_id = ObjectId::new().to_hex();
    let verification_token = Uuid::new_v4().to_string();

    let new_user = User {
        _id: None,
        user_id: new_user_id.clone(),
        email: request.email.clone(),
        password: Some(hashed_password),
        first_name: request.first_name.clone(),
        last_name: request.last_name.clone(),
        gender: request.gender.clone(),
        role: Role::None,
        is_verified: false,
        verification_token: Some(verification_token.clone()),
        created_at: Some(BsonDateTime::now()),
        updated_at: Some(BsonDateTime::now()),
        last_login: None,
        deleted_at: None,
    };

    collection
        .insert_one(&new_user)
        .await
        .map_err(|e| format!("Failed to create user: {}", e))?;

    log::info!("✅ User registered successfully: {}", request.email);

    // Envio best-effort: falha de email não falha o cadastro
    if let Err(e) = mailer_service::send_verification_email(&request.email, &verification_token).await {
        log::error!("❌ Failed to send verification email to {}: {}", request.email, e);
    }

    Ok(MessageResponse {
        success: true,
        message: "Registration successful. Check your email to verify the account.".to_string(),
    })
}

// Confirm email address with the token sent at registration
pub async fn confirm_email(db: &MongoDB, token: &str) -> Result<MessageResponse, String> {
    let collection = db.collection::<User>("users");

    let result = collection
        .update_one(
            doc! { "verification_token": token, "deleted_at": Bson::Null },
            doc! {
                "$set": { "is_verified": true, "updated_at": BsonDateTime::now() },
                "$unset": { "verification_token": "" },
            },
        )
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    if result.modified_count == 0 {
        return Err("Invalid or already used verification token".to_string());
    }

    log::info!("✅ Account verified");

    Ok(MessageResponse {
        success: true,
        message: "Account verified. You can now log in.".to_string(),
    })
}

// User login
pub async fn login(db: &MongoDB, request: &LoginRequest) -> Result<AuthResponse, String> {
    let collection = db.collection::<User>("users");

    let filter = doc! {
        "email": &request.email,
        "deleted_at": Bson::Null,
    };

    let user = collection
        .find_one(filter)
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "Invalid credentials".to_string())?;

    let stored_password = user
        .password
        .as_ref()
        .ok_or_else(|| "Invalid credentials".to_string())?;

    let valid = verify(&request.password, stored_password)
        .map_err(|e| format!("Password verification error: {}", e))?;

    if !valid {
        return Err("Invalid credentials".to_string());
    }

    if !user.is_verified {
        return Err("Account is not verified. Check your email.".to_string());
    }

    collection
        .update_one(
            doc! { "user_id": &user.user_id },
            doc! { "$set": { "last_login": BsonDateTime::now() } },
        )
        .await
        .map_err(|e| format!("Database error: {}", e))?;

    let token = generate_jwt(&user)?;
    let refresh_token = generate_refresh_token(&user.user_id)?;

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(refresh_token),
        user: UserInfo::from_user(&user),
    })
}

// Refresh token: o role é relido do banco, então uma reconciliação
// de atribuições se propaga para o próximo access token.
pub async fn refresh_token(db: &MongoDB, request: &RefreshTokenRequest) -> Result<AuthResponse, String> {
    let claims = verify_token(&request.refresh_token)?;

    let collection = db.collection::<User>("users");

    let filter = doc! {
        "user_id": &claims.sub,
        "deleted_at": Bson::Null,
    };

    let user = collection
        .find_one(filter)
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    let token = generate_jwt(&user)?;
    let new_refresh_token = generate_refresh_token(&user.user_id)?;

    Ok(AuthResponse {
        success: true,
        token,
        refresh_token: Some(new_refresh_token),
        user: UserInfo::from_user(&user),
    })
}

// Get current user
pub async fn get_current_user(db: &MongoDB, user_id: &str) -> Result<UserInfo, String> {
    let collection = db.collection::<User>("users");

    let filter = doc! {
        "user_id": user_id,
        "deleted_at": Bson::Null,
    };

    let user = collection
        .find_one(filter)
        .await
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| "User not found".to_string())?;

    Ok(UserInfo::from_user(&user))
}

/// Soft delete: marca a conta com deleted_at. As linhas de atribuição não
/// são tocadas aqui (só o reconciliador cria/remove essas linhas).
pub async fn delete_user_account(db: &MongoDB, user_id: &str) -> Result<MessageResponse, String> {
    log::info!("🗑️ Soft-deleting account for user_id: {}", user_id);

    let collection = db.collection::<User>("users");

    let result = collection
        .update_one(
            doc! { "user_id": user_id, "deleted_at": Bson::Null },
            doc! { "$set": {
                "deleted_at": BsonDateTime::now(),
                "updated_at": BsonDateTime::now(),
            } },
        )
        .await
        .map_err(|e| format!("Failed to delete user: {}", e))?;

    if result.modified_count == 0 {
        return Err(format!("User {} not found", user_id));
    }

    log::info!("✅ Account {} marked as deleted", user_id);

    Ok(MessageResponse {
        success: true,
        message: "Account deleted".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(role: Role) -> User {
        User {
            _id: None,
            user_id: "u1".into(),
            email: "ana@example.com".into(),
            password: None,
            first_name: "Ana".into(),
            last_name: "Souza".into(),
            gender: None,
            role,
            is_verified: true,
            verification_token: None,
            created_at: None,
            updated_at: None,
            last_login: None,
            deleted_at: None,
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let user = sample_user(Role::Admin);
        let token = generate_jwt(&user).unwrap();

        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_refresh_token_roundtrip() {
        let token = generate_refresh_token("u42").unwrap();
        let claims = verify_token(&token).unwrap();
        assert_eq!(claims.sub, "u42");
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        assert!(verify_token("not-a-jwt").is_err());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let user = sample_user(Role::None);
        let mut token = generate_jwt(&user).unwrap();
        token.push('x');
        assert!(verify_token(&token).is_err());
    }
}
