use crate::database::MongoDB;
use crate::models::{Role, User};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};

/// Garante que existe pelo menos um admin. Sem isso o endpoint de
/// atribuição de managers não tem quem o chame após um deploy limpo.
/// O admin inicial vem de ADMIN_EMAIL/ADMIN_PASSWORD.
pub async fn seed_initial_admin(db: &MongoDB) {
    let collection = db.collection::<User>("users");

    let count = collection
        .count_documents(doc! { "role": "admin" })
        .await
        .unwrap_or(0);

    if count > 0 {
        log::info!("👤 Admin seed: {} admin account(s) already in DB — skipping", count);
        return;
    }

    let email = match std::env::var("ADMIN_EMAIL") {
        Ok(email) => email,
        Err(_) => {
            log::warn!("👤 Admin seed: no admin in DB and ADMIN_EMAIL not set — skipping");
            return;
        }
    };

    let password = match std::env::var("ADMIN_PASSWORD") {
        Ok(password) => password,
        Err(_) => {
            log::warn!("👤 Admin seed: ADMIN_PASSWORD not set — skipping");
            return;
        }
    };

    let hashed = match bcrypt::hash(&password, bcrypt::DEFAULT_COST) {
        Ok(hashed) => hashed,
        Err(e) => {
            log::error!("   ❌ Admin seed: failed to hash password: {}", e);
            return;
        }
    };

    let now = BsonDateTime::now();
    let admin = User {
        _id: None,
        user_id: ObjectId::new().to_hex(),
        email: email.clone(),
        password: Some(hashed),
        first_name: "Admin".to_string(),
        last_name: "MediFind".to_string(),
        gender: None,
        role: Role::Admin,
        is_verified: true,
        verification_token: None,
        created_at: Some(now),
        updated_at: Some(now),
        last_login: None,
        deleted_at: None,
    };

    match collection.insert_one(&admin).await {
        Ok(_) => log::info!("   ✅ Admin seed: created initial admin {}", email),
        Err(e) => log::error!("   ❌ Admin seed: failed to insert admin: {}", e),
    }
}
