// ==================== FACILITIES (HOSPITALS & CLINICS) ====================
// Hospitais e clínicas compartilham a collection `facilities`, cada
// documento com o campo `category` explícito.

use crate::{
    database::MongoDB,
    models::{Facility, FacilityCategory, GeoPoint},
    services::geocode_service,
    utils::error::AppError,
};
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

// ==================== REQUEST/RESPONSE MODELS ====================

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ListFacilitiesParams {
    pub q: Option<String>,
    pub category: Option<FacilityCategory>,
    pub city: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FacilitiesResponse {
    pub success: bool,
    pub facilities: Vec<Facility>,
    pub total: u64,
    pub page: i64,
    pub pages: u64,
}

#[derive(Debug, Serialize)]
pub struct FacilityResponse {
    pub success: bool,
    pub facility: Facility,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateFacilityRequest {
    pub title: String,
    pub category: FacilityCategory,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateFacilityRequest {
    pub title: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

// ==================== QUERY BUILDING ====================

/// Monta o filtro de listagem: regex case-insensitive sobre título e
/// cidade, igualdade sobre categoria, sempre excluindo soft-deleted.
pub fn build_listing_filter(params: &ListFacilitiesParams) -> Document {
    let mut filter = doc! { "deleted_at": Bson::Null };

    if let Some(q) = params.q.as_deref().filter(|s| !s.trim().is_empty()) {
        filter.insert(
            "title",
            doc! { "$regex": regex_escape(q.trim()), "$options": "i" },
        );
    }

    if let Some(category) = params.category {
        filter.insert("category", category.as_str());
    }

    if let Some(city) = params.city.as_deref().filter(|s| !s.trim().is_empty()) {
        filter.insert(
            "city",
            doc! { "$regex": regex_escape(city.trim()), "$options": "i" },
        );
    }

    filter
}

/// Entrada do usuário vai direto para $regex: escapa os metacaracteres.
pub fn regex_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Normaliza page/limit: página mínima 1, limite entre 1 e MAX_PAGE_SIZE.
pub fn normalize_pagination(page: Option<i64>, limit: Option<i64>) -> (i64, i64, u64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let skip = ((page - 1) * limit) as u64;
    (page, limit, skip)
}

// ==================== SERVICE FUNCTIONS ====================

pub async fn list_facilities(
    db: &MongoDB,
    params: &ListFacilitiesParams,
) -> Result<FacilitiesResponse, AppError> {
    let collection = db.collection::<Facility>("facilities");

    let filter = build_listing_filter(params);
    let (page, limit, skip) = normalize_pagination(params.page, params.limit);

    let total = collection.count_documents(filter.clone()).await?;

    let options = mongodb::options::FindOptions::builder()
        .sort(doc! { "title": 1 })
        .skip(skip)
        .limit(limit)
        .build();

    let mut cursor = collection.find(filter).with_options(options).await?;

    let mut facilities = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(facility) => facilities.push(facility),
            Err(e) => log::error!("Error reading facility: {}", e),
        }
    }

    let pages = (total + limit as u64 - 1) / limit as u64;

    Ok(FacilitiesResponse {
        success: true,
        facilities,
        total,
        page,
        pages,
    })
}

pub async fn get_facility(db: &MongoDB, facility_id: &str) -> Result<FacilityResponse, AppError> {
    let collection = db.collection::<Facility>("facilities");

    let facility = collection
        .find_one(doc! { "facility_id": facility_id, "deleted_at": Bson::Null })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Facility {} not found", facility_id)))?;

    Ok(FacilityResponse {
        success: true,
        facility,
    })
}

pub async fn create_facility(
    db: &MongoDB,
    request: CreateFacilityRequest,
) -> Result<FacilityResponse, AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let location = resolve_location(request.location, request.address.as_deref()).await;

    let now = DateTime::now();
    let facility = Facility {
        _id: None,
        facility_id: ObjectId::new().to_hex(),
        title: request.title.trim().to_string(),
        category: request.category,
        address: request.address,
        city: request.city,
        phone: request.phone,
        website: request.website,
        description: request.description,
        location,
        created_at: Some(now),
        updated_at: Some(now),
        deleted_at: None,
    };

    let collection = db.collection::<Facility>("facilities");
    collection.insert_one(&facility).await?;

    log::info!(
        "✅ Facility created: {} [{}] {}",
        facility.facility_id,
        facility.category.as_str(),
        facility.title
    );

    Ok(FacilityResponse {
        success: true,
        facility,
    })
}

pub async fn update_facility(
    db: &MongoDB,
    facility_id: &str,
    request: UpdateFacilityRequest,
) -> Result<FacilityResponse, AppError> {
    let collection = db.collection::<Facility>("facilities");

    let mut set = doc! { "updated_at": DateTime::now() };

    if let Some(title) = &request.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title cannot be empty".to_string()));
        }
        set.insert("title", title.trim());
    }
    if let Some(address) = &request.address {
        set.insert("address", address);
    }
    if let Some(city) = &request.city {
        set.insert("city", city);
    }
    if let Some(phone) = &request.phone {
        set.insert("phone", phone);
    }
    if let Some(website) = &request.website {
        set.insert("website", website);
    }
    if let Some(description) = &request.description {
        set.insert("description", description);
    }

    // Endereço mudou sem coordenadas novas: re-geocodifica best-effort
    let location = match (&request.location, &request.address) {
        (Some(loc), _) => Some(loc.clone()),
        (None, Some(address)) => geocode_service::geocode_address(address).await.ok(),
        (None, None) => None,
    };
    if let Some(loc) = location {
        set.insert(
            "location",
            mongodb::bson::to_bson(&loc).map_err(|e| AppError::Database(e.to_string()))?,
        );
    }

    let result = collection
        .update_one(
            doc! { "facility_id": facility_id, "deleted_at": Bson::Null },
            doc! { "$set": set },
        )
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound(format!(
            "Facility {} not found",
            facility_id
        )));
    }

    log::info!("🔧 Facility {} updated", facility_id);

    get_facility(db, facility_id).await
}

pub async fn delete_facility(db: &MongoDB, facility_id: &str) -> Result<DeleteResponse, AppError> {
    let collection = db.collection::<Facility>("facilities");

    let result = collection
        .update_one(
            doc! { "facility_id": facility_id, "deleted_at": Bson::Null },
            doc! { "$set": {
                "deleted_at": DateTime::now(),
                "updated_at": DateTime::now(),
            } },
        )
        .await?;

    if result.modified_count == 0 {
        return Err(AppError::NotFound(format!(
            "Facility {} not found",
            facility_id
        )));
    }

    log::info!("🗑️  Facility {} soft-deleted", facility_id);

    Ok(DeleteResponse {
        success: true,
        message: "Facility deleted".to_string(),
    })
}

/// Coordenadas explícitas ganham; sem elas, tenta geocodificar o endereço.
/// Falha de geocodificação deixa o campo vazio.
async fn resolve_location(explicit: Option<GeoPoint>, address: Option<&str>) -> Option<GeoPoint> {
    if explicit.is_some() {
        return explicit;
    }

    let address = address?;
    match geocode_service::geocode_address(address).await {
        Ok(point) => Some(point),
        Err(e) => {
            log::warn!("⚠️ Geocoding skipped for '{}': {}", address, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(
        q: Option<&str>,
        category: Option<FacilityCategory>,
        city: Option<&str>,
    ) -> ListFacilitiesParams {
        ListFacilitiesParams {
            q: q.map(String::from),
            category,
            city: city.map(String::from),
            page: None,
            limit: None,
        }
    }

    #[test]
    fn test_filter_defaults_to_soft_delete_guard() {
        let filter = build_listing_filter(&params(None, None, None));
        assert_eq!(filter.len(), 1);
        assert!(filter.contains_key("deleted_at"));
    }

    #[test]
    fn test_filter_title_regex_is_case_insensitive() {
        let filter = build_listing_filter(&params(Some("santa casa"), None, None));
        let title = filter.get_document("title").unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), "santa casa");
        assert_eq!(title.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_filter_category_is_exact_match() {
        let filter = build_listing_filter(&params(None, Some(FacilityCategory::Clinic), None));
        assert_eq!(filter.get_str("category").unwrap(), "clinic");
    }

    #[test]
    fn test_filter_blank_q_is_ignored() {
        let filter = build_listing_filter(&params(Some("   "), None, None));
        assert!(!filter.contains_key("title"));
    }

    #[test]
    fn test_regex_metacharacters_are_escaped() {
        let filter = build_listing_filter(&params(Some("St. Mary (Unit 2)"), None, None));
        let title = filter.get_document("title").unwrap();
        assert_eq!(
            title.get_str("$regex").unwrap(),
            "St\\. Mary \\(Unit 2\\)"
        );
    }

    #[test]
    fn test_pagination_defaults() {
        let (page, limit, skip) = normalize_pagination(None, None);
        assert_eq!((page, limit, skip), (1, DEFAULT_PAGE_SIZE, 0));
    }

    #[test]
    fn test_pagination_clamps_bad_input() {
        let (page, limit, _) = normalize_pagination(Some(-3), Some(0));
        assert_eq!((page, limit), (1, 1));

        let (_, limit, _) = normalize_pagination(Some(1), Some(10_000));
        assert_eq!(limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_pagination_skip() {
        let (_, _, skip) = normalize_pagination(Some(3), Some(20));
        assert_eq!(skip, 40);
    }
}
