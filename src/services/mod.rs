pub mod auth_service;
pub mod facility_service;
pub mod geocode_service;
pub mod mailer_service;
pub mod manage_service;
pub mod pharmacy_service;
pub mod user_service;
