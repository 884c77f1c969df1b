mod api;
mod database;
mod middleware;
mod models;
mod seeds;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Get configuration from environment
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3002".to_string());
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    log::info!("🚀 Starting MediFind Service...");
    log::info!("📊 Database: {}", database_url);

    // Initialize MongoDB connection
    let db = database::MongoDB::new(&database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db_data = web::Data::new(db.clone());

    log::info!("✅ MongoDB connected successfully");

    // 🌱 Seed initial admin account (if none exists)
    seeds::admin_seed::seed_initial_admin(&db).await;

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin("http://localhost:3000") // Frontend Web
            .allowed_origin("http://127.0.0.1:3000")
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .wrap(cors)
            .wrap(middleware::RateLimit)
            .wrap(Logger::default())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Metrics
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            // Auth endpoints
            .service(
                web::scope("/api/v1/auth")
                    .route("/register", web::post().to(api::auth::register))
                    .route("/confirm", web::get().to(api::auth::confirm))
                    .route("/login", web::post().to(api::auth::login))
                    .route("/refresh", web::post().to(api::auth::refresh_token))
                    .route("/verify", web::get().to(api::auth::verify_token))
                    .service(
                        web::resource("/me")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route(web::get().to(api::auth::get_me)),
                    )
                    .service(
                        web::resource("/delete-account")
                            .wrap(middleware::auth::AuthMiddleware)
                            .route(web::delete().to(api::auth::delete_account)),
                    ),
            )
            // ==================== PUBLIC LISTINGS (READ ONLY) ====================
            .service(
                web::scope("/api/v1/facilities")
                    .route("", web::get().to(api::facilities::list_facilities))
                    .route("/{facility_id}", web::get().to(api::facilities::get_facility)),
            )
            .service(
                web::scope("/api/v1/pharmacies")
                    .route("", web::get().to(api::pharmacies::list_pharmacies))
                    .route("/{pharmacy_id}", web::get().to(api::pharmacies::get_pharmacy)),
            )
            // ==================== ADMIN CONSOLE (JWT) ====================
            // Escritas de listagem vivem no console; managers só passam
            // no gate por-handler das entidades que lhes foram atribuídas.
            .service(
                web::scope("/api/v1/admin")
                    .wrap(middleware::auth::AuthMiddleware)
                    // Facilities CRUD
                    .route("/facilities", web::post().to(api::facilities::create_facility))
                    .route(
                        "/facilities/{facility_id}",
                        web::put().to(api::facilities::update_facility),
                    )
                    .route(
                        "/facilities/{facility_id}",
                        web::delete().to(api::facilities::delete_facility),
                    )
                    // Pharmacies CRUD
                    .route("/pharmacies", web::post().to(api::pharmacies::create_pharmacy))
                    .route(
                        "/pharmacies/{pharmacy_id}",
                        web::put().to(api::pharmacies::update_pharmacy),
                    )
                    .route(
                        "/pharmacies/{pharmacy_id}",
                        web::delete().to(api::pharmacies::delete_pharmacy),
                    )
                    // Manager assignments (reconciliation + role derivation)
                    .route("/managers", web::post().to(api::manage::update_managers))
                    .route(
                        "/managers/{user_id}",
                        web::get().to(api::manage::get_user_assignments),
                    )
                    // User directory
                    .route("/users", web::get().to(api::users::list_users))
                    .route("/users/{user_id}", web::get().to(api::users::get_user))
                    .route("/users/{user_id}", web::delete().to(api::users::delete_user)),
            )
            // ==================== EXTERNAL APIs ====================
            .service(
                web::scope("/api/v1/external")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("/geocode", web::get().to(api::external::geocode)),
            )
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
