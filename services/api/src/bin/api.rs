//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{clock::SchoolClock, db::DbAdapter},
    config::Config,
    error::ApiError,
    web::{admin, require_identity, rest::ApiDoc, state::AppState, student, teacher},
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone(), config.school_utc_offset));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Build the Shared AppState ---
    let clock = Arc::new(SchoolClock::new(config.school_utc_offset));
    let app_state = AppState::new(config.clone(), db_adapter, clock);

    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>().unwrap())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    // Every route is role-scoped; identity headers are required throughout.
    let routes = Router::new()
        .route("/student/agenda", get(student::agenda_handler))
        .route("/student/sections/{id}/wave", post(student::wave_handler))
        .route(
            "/student/sections/{id}/check-in",
            post(student::check_in_handler),
        )
        .route(
            "/student/sections/{id}/check-out",
            post(student::check_out_handler),
        )
        .route("/teacher/agenda", get(teacher::agenda_handler))
        .route(
            "/teacher/sections/{id}/attendance",
            post(teacher::save_attendance_handler),
        )
        .route("/admin/calendar", get(admin::calendar_range_handler))
        .route("/admin/calendar/import", post(admin::import_calendar_handler))
        .route(
            "/admin/calendar/{date}/day-off",
            post(admin::mark_day_off_handler).delete(admin::unmark_day_off_handler),
        )
        .route(
            "/admin/sections/{id}/enrollments",
            post(admin::enroll_students_handler),
        )
        .route(
            "/admin/sections/{id}/enrollments/{student_id}",
            delete(admin::withdraw_student_handler),
        )
        .layer(axum_middleware::from_fn(require_identity));

    let api_router = Router::new()
        .merge(routes)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
