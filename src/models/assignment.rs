use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// Partição sob a qual atribuições de gestão são registradas.
///
/// Hospital e Clinic compartilham a collection de entidades (`facilities`),
/// mas cada categoria tem sua própria collection de atribuições.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Hospital,
    Clinic,
    Pharmacy,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Hospital, Category::Clinic, Category::Pharmacy];

    pub fn parse(s: &str) -> Option<Category> {
        match s {
            "hospital" => Some(Category::Hospital),
            "clinic" => Some(Category::Clinic),
            "pharmacy" => Some(Category::Pharmacy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hospital => "hospital",
            Category::Clinic => "clinic",
            Category::Pharmacy => "pharmacy",
        }
    }

    pub fn assignment_collection(&self) -> &'static str {
        match self {
            Category::Hospital => "hospital_managers",
            Category::Clinic => "clinic_managers",
            Category::Pharmacy => "pharmacy_managers",
        }
    }
}

impl From<super::facility::FacilityCategory> for Category {
    fn from(c: super::facility::FacilityCategory) -> Self {
        match c {
            super::facility::FacilityCategory::Hospital => Category::Hospital,
            super::facility::FacilityCategory::Clinic => Category::Clinic,
        }
    }
}

/// Registro N:N ligando um usuário a uma entidade gerenciável.
///
/// Linhas são criadas apenas pela fase de "add" da reconciliação e
/// removidas apenas pela fase de "remove"; nunca alteradas in place.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ManageAssignment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub user_id: String,
    pub entity_id: String,
    pub created_at: Option<BsonDateTime>,
    pub updated_at: Option<BsonDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("hospital"), Some(Category::Hospital));
        assert_eq!(Category::parse("clinic"), Some(Category::Clinic));
        assert_eq!(Category::parse("pharmacy"), Some(Category::Pharmacy));
        assert_eq!(Category::parse("Hospital"), None);
        assert_eq!(Category::parse(""), None);
    }

    #[test]
    fn test_assignment_collections_are_distinct() {
        let names: std::collections::HashSet<_> = Category::ALL
            .iter()
            .map(|c| c.assignment_collection())
            .collect();
        assert_eq!(names.len(), 3);
    }
}
