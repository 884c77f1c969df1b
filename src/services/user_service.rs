// ==================== ADMIN USER MANAGEMENT ====================

use crate::{
    database::MongoDB,
    models::User,
    services::auth_service::UserInfo,
    services::facility_service::{normalize_pagination, regex_escape},
    utils::error::AppError,
};
use futures::stream::StreamExt;
use mongodb::bson::{doc, Bson, DateTime, Document};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ListUsersParams {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<UserInfo>,
    pub total: u64,
    pub page: i64,
    pub pages: u64,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Busca por email ou nome, sempre excluindo contas soft-deleted.
pub fn build_users_filter(params: &ListUsersParams) -> Document {
    let mut filter = doc! { "deleted_at": Bson::Null };

    if let Some(q) = params.q.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = regex_escape(q.trim());
        filter.insert(
            "$or",
            vec![
                doc! { "email": { "$regex": &pattern, "$options": "i" } },
                doc! { "first_name": { "$regex": &pattern, "$options": "i" } },
                doc! { "last_name": { "$regex": &pattern, "$options": "i" } },
            ],
        );
    }

    filter
}

pub async fn list_users(db: &MongoDB, params: &ListUsersParams) -> Result<UsersResponse, AppError> {
    let collection = db.collection::<User>("users");

    let filter = build_users_filter(params);
    let (page, limit, skip) = normalize_pagination(params.page, params.limit);

    let total = collection.count_documents(filter.clone()).await?;

    let options = mongodb::options::FindOptions::builder()
        .sort(doc! { "email": 1 })
        .skip(skip)
        .limit(limit)
        .build();

    let mut cursor = collection.find(filter).with_options(options).await?;

    let mut users = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(user) => users.push(UserInfo::from_user(&user)),
            Err(e) => log::error!("Error reading user: {}", e),
        }
    }

    let pages = (total + limit as u64 - 1) / limit as u64;

    Ok(UsersResponse {
        success: true,
        users,
        total,
        page,
        pages,
    })
}

pub async fn get_user(db: &MongoDB, user_id: &str) -> Result<UserResponse, AppError> {
    let collection = db.collection::<User>("users");

    let user = collection
        .find_one(doc! { "user_id": user_id, "deleted_at": Bson::Null })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    Ok(UserResponse {
        success: true,
        user: UserInfo::from_user(&user),
    })
}

/// Soft delete por um admin. Linhas de atribuição ficam intactas (só o
/// reconciliador mexe nelas); como a conta some dos filtros, elas viram
/// inertes.
pub async fn delete_user(db: &MongoDB, user_id: &str) -> Result<DeleteResponse, AppError> {
    let collection = db.collection::<User>("users");

    let result = collection
        .update_one(
            doc! { "user_id": user_id, "deleted_at": Bson::Null },
            doc! { "$set": {
                "deleted_at": DateTime::now(),
                "updated_at": DateTime::now(),
            } },
        )
        .await?;

    if result.modified_count == 0 {
        return Err(AppError::NotFound(format!("User {} not found", user_id)));
    }

    log::info!("🗑️  User {} soft-deleted by admin", user_id);

    Ok(DeleteResponse {
        success: true,
        message: "User deleted".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_users_filter_searches_email_and_names() {
        let params = ListUsersParams {
            q: Some("ana".into()),
            page: None,
            limit: None,
        };

        let filter = build_users_filter(&params);
        let or = filter.get_array("$or").unwrap();
        assert_eq!(or.len(), 3);
    }

    #[test]
    fn test_users_filter_without_query() {
        let params = ListUsersParams {
            q: None,
            page: None,
            limit: None,
        };

        let filter = build_users_filter(&params);
        assert!(!filter.contains_key("$or"));
        assert!(filter.contains_key("deleted_at"));
    }
}
