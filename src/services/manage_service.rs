// ==================== MANAGE ASSIGNMENTS ====================
// Sincroniza o conjunto de entidades que um usuário gerencia em uma
// categoria e recalcula o papel (role) do usuário a partir das contagens
// pós-escrita nas três categorias.

use crate::{
    database::MongoDB,
    models::{Category, ManageAssignment, Role, User},
    utils::error::AppError,
};
use async_trait::async_trait;
use mongodb::bson::{doc, Bson, DateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ==================== REQUEST/RESPONSE MODELS ====================

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ReconcileRequest {
    pub user_id: String,
    pub entity_type: String, // "hospital" | "clinic" | "pharmacy"
    pub entity_ids: Vec<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ReconcileResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserAssignmentsResponse {
    pub success: bool,
    pub user_id: String,
    pub role: Role,
    pub hospital_ids: Vec<String>,
    pub clinic_ids: Vec<String>,
    pub pharmacy_ids: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct SyncDelta {
    pub added: usize,
    pub removed: usize,
}

// ==================== ASSIGNMENT STORE ====================

/// As três collections de atribuição ficam atrás desta interface, de modo
/// que a reconciliação e o recálculo de role não dependem de collections
/// concretas (uma migração para tabela única com coluna de categoria não
/// tocaria na lógica).
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn count_by_user(&self, user_id: &str) -> Result<u64, AppError>;
    async fn current_ids(&self, user_id: &str) -> Result<HashSet<String>, AppError>;
    async fn sync_desired_set(
        &self,
        user_id: &str,
        desired: &HashSet<String>,
    ) -> Result<SyncDelta, AppError>;
}

pub struct MongoAssignmentStore<'a> {
    db: &'a MongoDB,
    collection: &'static str,
}

impl<'a> MongoAssignmentStore<'a> {
    pub fn for_category(db: &'a MongoDB, category: Category) -> Self {
        Self {
            db,
            collection: category.assignment_collection(),
        }
    }
}

#[async_trait]
impl AssignmentStore for MongoAssignmentStore<'_> {
    async fn count_by_user(&self, user_id: &str) -> Result<u64, AppError> {
        let collection = self.db.collection::<ManageAssignment>(self.collection);
        let count = collection
            .count_documents(doc! { "user_id": user_id })
            .await?;
        Ok(count)
    }

    async fn current_ids(&self, user_id: &str) -> Result<HashSet<String>, AppError> {
        use futures::stream::StreamExt;

        let collection = self.db.collection::<ManageAssignment>(self.collection);
        let mut cursor = collection.find(doc! { "user_id": user_id }).await?;

        let mut ids = HashSet::new();
        while let Some(result) = cursor.next().await {
            match result {
                Ok(row) => {
                    ids.insert(row.entity_id);
                }
                Err(e) => log::error!("Error reading assignment row: {}", e),
            }
        }

        Ok(ids)
    }

    /// Escreve o delta entre o conjunto atual e o desejado.
    ///
    /// Escritas sequenciais sem transação: uma falha no meio deixa o banco
    /// no estado em que a falha o encontrou (sem rollback compensatório).
    async fn sync_desired_set(
        &self,
        user_id: &str,
        desired: &HashSet<String>,
    ) -> Result<SyncDelta, AppError> {
        let current = self.current_ids(user_id).await?;
        let (to_add, to_remove) = compute_delta(&current, desired);
        let (added, removed) = (to_add.len(), to_remove.len());

        let collection = self.db.collection::<ManageAssignment>(self.collection);

        if !to_add.is_empty() {
            let now = DateTime::now();
            let rows: Vec<ManageAssignment> = to_add
                .iter()
                .map(|entity_id| ManageAssignment {
                    _id: None,
                    user_id: user_id.to_string(),
                    entity_id: entity_id.clone(),
                    created_at: Some(now),
                    updated_at: Some(now),
                })
                .collect();

            collection.insert_many(&rows).await?;
        }

        if !to_remove.is_empty() {
            collection
                .delete_many(doc! {
                    "user_id": user_id,
                    "entity_id": { "$in": to_remove },
                })
                .await?;
        }

        Ok(SyncDelta { added, removed })
    }
}

// ==================== PURE LOGIC ====================

/// `to_add = desired − current`, `to_remove = current − desired`.
pub fn compute_delta(
    current: &HashSet<String>,
    desired: &HashSet<String>,
) -> (Vec<String>, Vec<String>) {
    let mut to_add: Vec<String> = desired.difference(current).cloned().collect();
    let mut to_remove: Vec<String> = current.difference(desired).cloned().collect();

    // Ordem estável para logs e para o $in do delete
    to_add.sort();
    to_remove.sort();

    (to_add, to_remove)
}

/// Deriva o role a partir da contagem total de atribuições.
/// `Admin` é protegido: nunca rebaixado por este caminho.
pub fn derive_role(current: Role, total_assignments: u64) -> Role {
    if current == Role::Admin {
        return Role::Admin;
    }
    if total_assignments > 0 {
        Role::Manager
    } else {
        Role::None
    }
}

// ==================== SERVICE FUNCTIONS ====================

/// Sincroniza as atribuições de `(user_id, category)` com o conjunto
/// desejado e recalcula o role do usuário.
///
/// Idempotente: repetir a chamada com o mesmo conjunto não gera escritas.
/// Não valida a existência das entidades referenciadas (soft delete nas
/// listagens mitiga linhas penduradas). Chamadas concorrentes para o mesmo
/// `(user_id, category)` não são serializadas.
pub async fn reconcile(
    db: &MongoDB,
    user_id: &str,
    category: Category,
    entity_ids: Vec<String>,
) -> Result<ReconcileResponse, AppError> {
    let users = db.collection::<User>("users");

    let user = users
        .find_one(doc! { "user_id": user_id, "deleted_at": Bson::Null })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    // Duplicatas no payload são ignoradas; ordem é irrelevante
    let desired: HashSet<String> = entity_ids.into_iter().collect();

    let store = MongoAssignmentStore::for_category(db, category);
    let delta = store.sync_desired_set(user_id, &desired).await?;

    log::info!(
        "🔁 Assignments reconciled for user {} [{}]: +{} -{}",
        user_id,
        category.as_str(),
        delta.added,
        delta.removed
    );

    // Recontagem pós-escrita nas três categorias
    let mut total: u64 = 0;
    for cat in Category::ALL {
        total += MongoAssignmentStore::for_category(db, cat)
            .count_by_user(user_id)
            .await?;
    }

    let new_role = derive_role(user.role, total);

    if new_role != user.role {
        users
            .update_one(
                doc! { "user_id": user_id },
                doc! { "$set": {
                    "role": new_role.as_str(),
                    "updated_at": DateTime::now(),
                } },
            )
            .await?;

        log::info!(
            "👤 Role updated for user {}: {} -> {}",
            user_id,
            user.role.as_str(),
            new_role.as_str()
        );
    }

    Ok(ReconcileResponse {
        message: format!(
            "Assignments updated: {} added, {} removed ({} total, role {})",
            delta.added,
            delta.removed,
            total,
            new_role.as_str()
        ),
    })
}

/// Conjuntos atuais de atribuição do usuário, por categoria.
pub async fn list_user_assignments(
    db: &MongoDB,
    user_id: &str,
) -> Result<UserAssignmentsResponse, AppError> {
    let users = db.collection::<User>("users");

    let user = users
        .find_one(doc! { "user_id": user_id, "deleted_at": Bson::Null })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    let mut per_category: Vec<Vec<String>> = Vec::with_capacity(3);
    for cat in Category::ALL {
        let mut ids: Vec<String> = MongoAssignmentStore::for_category(db, cat)
            .current_ids(user_id)
            .await?
            .into_iter()
            .collect();
        ids.sort();
        per_category.push(ids);
    }

    let mut it = per_category.into_iter();

    Ok(UserAssignmentsResponse {
        success: true,
        user_id: user.user_id,
        role: user.role,
        hospital_ids: it.next().unwrap_or_default(),
        clinic_ids: it.next().unwrap_or_default(),
        pharmacy_ids: it.next().unwrap_or_default(),
    })
}

/// Verifica se o usuário tem uma linha de atribuição para a entidade.
/// Usado pelo gate de edição dos managers.
pub async fn is_assigned(
    db: &MongoDB,
    user_id: &str,
    category: Category,
    entity_id: &str,
) -> Result<bool, AppError> {
    let collection = db.collection::<ManageAssignment>(category.assignment_collection());

    let row = collection
        .find_one(doc! { "user_id": user_id, "entity_id": entity_id })
        .await?;

    Ok(row.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_delta_adds_and_removes() {
        let current = set(&["h1", "h2"]);
        let desired = set(&["h2", "h3"]);

        let (to_add, to_remove) = compute_delta(&current, &desired);
        assert_eq!(to_add, vec!["h3".to_string()]);
        assert_eq!(to_remove, vec!["h1".to_string()]);
    }

    #[test]
    fn test_delta_is_empty_when_sets_match() {
        // Segunda chamada com o mesmo conjunto: nenhuma escrita
        let current = set(&["h1", "h2"]);
        let desired = set(&["h1", "h2"]);

        let (to_add, to_remove) = compute_delta(&current, &desired);
        assert!(to_add.is_empty());
        assert!(to_remove.is_empty());
    }

    #[test]
    fn test_delta_empty_desired_unassigns_everything() {
        let current = set(&["h1", "h2"]);
        let desired = set(&[]);

        let (to_add, to_remove) = compute_delta(&current, &desired);
        assert!(to_add.is_empty());
        assert_eq!(to_remove, vec!["h1".to_string(), "h2".to_string()]);
    }

    #[test]
    fn test_delta_from_empty_current() {
        let current = set(&[]);
        let desired = set(&["h1", "h2"]);

        let (to_add, to_remove) = compute_delta(&current, &desired);
        assert_eq!(to_add, vec!["h1".to_string(), "h2".to_string()]);
        assert!(to_remove.is_empty());
    }

    #[test]
    fn test_derive_role_none_to_manager() {
        assert_eq!(derive_role(Role::None, 1), Role::Manager);
        assert_eq!(derive_role(Role::None, 5), Role::Manager);
    }

    #[test]
    fn test_derive_role_manager_to_none() {
        assert_eq!(derive_role(Role::Manager, 0), Role::None);
    }

    #[test]
    fn test_derive_role_admin_is_protected() {
        // Admin nunca é rebaixado por este caminho, qualquer que seja a contagem
        assert_eq!(derive_role(Role::Admin, 0), Role::Admin);
        assert_eq!(derive_role(Role::Admin, 3), Role::Admin);
    }

    #[test]
    fn test_duplicate_ids_collapse_in_desired_set() {
        let ids = vec!["h1".to_string(), "h1".to_string(), "h2".to_string()];
        let desired: HashSet<String> = ids.into_iter().collect();
        assert_eq!(desired.len(), 2);
    }
}
