use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "MediFind API - Healthcare Facility Directory",
        version = "1.0.0",
        description = "API documentation for MediFind, a directory of hospitals, clinics and pharmacies. \n\n**Authentication:** Account and admin endpoints require a JWT Bearer token.\n\n**Features:**\n- Public facility and pharmacy search with pagination\n- Account registration with email verification\n- Admin CRUD on listings\n- Manager assignment reconciliation with automatic role derivation\n- Address geocoding\n- Health monitoring and metrics",
        contact(
            name = "MediFind Team",
            email = "support@medifind.example"
        )
    ),
    paths(
        // Auth endpoints
        crate::api::auth::register,
        crate::api::auth::confirm,
        crate::api::auth::login,
        crate::api::auth::verify_token,

        // Listings
        crate::api::facilities::list_facilities,
        crate::api::facilities::create_facility,
        crate::api::pharmacies::list_pharmacies,

        // Admin
        crate::api::manage::update_managers,
        crate::api::users::list_users,

        // External
        crate::api::external::geocode,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::AuthResponse,
            crate::services::auth_service::UserInfo,
            crate::services::auth_service::MessageResponse,

            // Listings
            crate::services::facility_service::CreateFacilityRequest,
            crate::services::facility_service::UpdateFacilityRequest,
            crate::services::pharmacy_service::CreatePharmacyRequest,
            crate::services::pharmacy_service::UpdatePharmacyRequest,
            crate::models::facility::FacilityCategory,
            crate::models::facility::GeoPoint,

            // Managers
            crate::services::manage_service::ReconcileRequest,
            crate::services::manage_service::ReconcileResponse,
            crate::models::assignment::Category,
            crate::models::user::Role,

            // Health & Metrics
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Account registration, email verification and JWT session endpoints."),
        (name = "Facilities", description = "Hospital and clinic listings: public search plus admin/manager CRUD."),
        (name = "Pharmacies", description = "Pharmacy listings: public search plus admin/manager CRUD."),
        (name = "Managers", description = "Admin endpoints that assign manageable listings to users and recompute roles."),
        (name = "Users", description = "Admin user directory."),
        (name = "External", description = "Outbound integrations (address geocoding)."),
        (name = "Health", description = "Health check and system metrics endpoints for monitoring service status."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Enter your JWT token"))
                        .build(),
                ),
            );
        }
    }
}
