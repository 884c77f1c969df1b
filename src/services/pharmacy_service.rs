// ==================== PHARMACIES ====================
// Farmácias têm collection própria; a listagem usa o mesmo esquema de
// paginação e filtros das facilities.

use crate::{
    database::MongoDB,
    models::{GeoPoint, Pharmacy},
    services::facility_service::{normalize_pagination, regex_escape},
    services::geocode_service,
    utils::error::AppError,
};
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use serde::{Deserialize, Serialize};

// ==================== REQUEST/RESPONSE MODELS ====================

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ListPharmaciesParams {
    pub q: Option<String>,
    pub city: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PharmaciesResponse {
    pub success: bool,
    pub pharmacies: Vec<Pharmacy>,
    pub total: u64,
    pub page: i64,
    pub pages: u64,
}

#[derive(Debug, Serialize)]
pub struct PharmacyResponse {
    pub success: bool,
    pub pharmacy: Pharmacy,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreatePharmacyRequest {
    pub title: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdatePharmacyRequest {
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

pub fn build_listing_filter(params: &ListPharmaciesParams) -> Document {
    let mut filter = doc! { "deleted_at": Bson::Null };

    if let Some(q) = params.q.as_deref().filter(|s| !s.trim().is_empty()) {
        filter.insert(
            "title",
            doc! { "$regex": regex_escape(q.trim()), "$options": "i" },
        );
    }

    if let Some(city) = params.city.as_deref().filter(|s| !s.trim().is_empty()) {
        filter.insert(
            "city",
            doc! { "$regex": regex_escape(city.trim()), "$options": "i" },
        );
    }

    filter
}

// ==================== SERVICE FUNCTIONS ====================

pub async fn list_pharmacies(
    db: &MongoDB,
    params: &ListPharmaciesParams,
) -> Result<PharmaciesResponse, AppError> {
    let collection = db.collection::<Pharmacy>("pharmacies");

    let filter = build_listing_filter(params);
    let (page, limit, skip) = normalize_pagination(params.page, params.limit);

    let total = collection.count_documents(filter.clone()).await?;

    let options = mongodb::options::FindOptions::builder()
        .sort(doc! { "title": 1 })
        .skip(skip)
        .limit(limit)
        .build();

    let mut cursor = collection.find(filter).with_options(options).await?;

    let mut pharmacies = Vec::new();
    while let Some(result) = cursor.next().await {
        match result {
            Ok(pharmacy) => pharmacies.push(pharmacy),
            Err(e) => log::error!("Error reading pharmacy: {}", e),
        }
    }

    let pages = (total + limit as u64 - 1) / limit as u64;

    Ok(PharmaciesResponse {
        success: true,
        pharmacies,
        total,
        page,
        pages,
    })
}

pub async fn get_pharmacy(db: &MongoDB, pharmacy_id: &str) -> Result<PharmacyResponse, AppError> {
    let collection = db.collection::<Pharmacy>("pharmacies");

    let pharmacy = collection
        .find_one(doc! { "pharmacy_id": pharmacy_id, "deleted_at": Bson::Null })
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pharmacy {} not found", pharmacy_id)))?;

    Ok(PharmacyResponse {
        success: true,
        pharmacy,
    })
}

pub async fn create_pharmacy(
    db: &MongoDB,
    request: CreatePharmacyRequest,
) -> Result<PharmacyResponse, AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let location = match (request.location, request.address.as_deref()) {
        (Some(loc), _) => Some(loc),
        (None, Some(address)) => geocode_service::geocode_address(address).await.ok(),
        (None, None) => None,
    };

    let now = DateTime::now();
    let pharmacy = Pharmacy {
        _id: None,
        pharmacy_id: ObjectId::new().to_hex(),
        title: request.title.trim().to_string(),
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

    let collection = db.collection::<Pharmacy>("pharmacies");
    collection.insert_one(&pharmacy).await?;

    log::info!("✅ Pharmacy created: {} {}", pharmacy.pharmacy_id, pharmacy.title);

    Ok(PharmacyResponse {
        success: true,
        pharmacy,
    })
}

pub async fn update_pharmacy(
    db: &MongoDB,
    pharmacy_id: &str,
    request: UpdatePharmacyRequest,
) -> Result<PharmacyResponse, AppError> {
    let collection = db.collection::<Pharmacy>("pharmacies");

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
            doc! { "pharmacy_id": pharmacy_id, "deleted_at": Bson::Null },
            doc! { "$set": set },
        )
        .await?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound(format!(
            "Pharmacy {} not found",
            pharmacy_id
        )));
    }

    log::info!("🔧 Pharmacy {} updated", pharmacy_id);

    get_pharmacy(db, pharmacy_id).await
}

pub async fn delete_pharmacy(db: &MongoDB, pharmacy_id: &str) -> Result<DeleteResponse, AppError> {
    let collection = db.collection::<Pharmacy>("pharmacies");

    let result = collection
        .update_one(
            doc! { "pharmacy_id": pharmacy_id, "deleted_at": Bson::Null },
            doc! { "$set": {
                "deleted_at": DateTime::now(),
                "updated_at": DateTime::now(),
            } },
        )
        .await?;

    if result.modified_count == 0 {
        return Err(AppError::NotFound(format!(
            "Pharmacy {} not found",
            pharmacy_id
        )));
    }

    log::info!("🗑️  Pharmacy {} soft-deleted", pharmacy_id);

    Ok(DeleteResponse {
        success: true,
        message: "Pharmacy deleted".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_city_and_title() {
        let params = ListPharmaciesParams {
            q: Some("droga".into()),
            city: Some("Recife".into()),
            page: None,
            limit: None,
        };

        let filter = build_listing_filter(&params);
        assert!(filter.contains_key("title"));
        assert!(filter.contains_key("city"));
        assert!(filter.contains_key("deleted_at"));
    }
}
