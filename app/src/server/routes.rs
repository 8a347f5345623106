//! Router configuration for the booking backend.
//!
//! Builds the complete Axum router with all endpoints.

use super::state::AppState;
use crate::api::{admin, bookings, movies, uploads};
use crate::auth::handlers as auth;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, request::Parts},
    routing::{get, patch, post},
};
use marquee_web::{correlation_id_layer, handlers::{health_check, readiness_check}};
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// CORS for the configured front end plus Vercel preview deployments,
/// with credentials so the session cookie travels.
fn cors_layer(client_url: &str) -> CorsLayer {
    let client_origin = client_url.trim_end_matches('/').to_string();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _: &Parts| {
            origin.to_str().is_ok_and(|origin| {
                origin == client_origin || (origin.starts_with("https://") && origin.ends_with(".vercel.app"))
            })
        }))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

fn auth_routes(upload_limit: DefaultBodyLimit) -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/avatar", post(auth::upload_avatar).layer(upload_limit))
}

/// Build the complete Axum router.
///
/// - `/health`, `/ready`
/// - `/api/auth/*`, aliased at `/api/users/*`
/// - `/api/movies`, `/api/bookings`, `/api/admin`, `/api/uploads`
/// - `/uploads/*` served from the upload directory
pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.uploads.max_bytes() + MULTIPART_OVERHEAD);

    let movie_routes = Router::new()
        .route("/", get(movies::list_movies).post(movies::create_movie))
        .route(
            "/:id",
            get(movies::get_movie)
                .patch(movies::update_movie)
                .delete(movies::delete_movie),
        );

    let booking_routes = Router::new()
        .route("/", get(bookings::my_bookings).post(bookings::create_booking))
        .route("/all", get(bookings::all_bookings))
        .route("/movie/:movie_id", get(bookings::taken_seats))
        .route(
            "/:id",
            get(bookings::get_booking).patch(bookings::update_booking),
        );

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/:id/role", patch(admin::set_user_role));

    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api/auth", auth_routes(upload_limit))
        .nest("/api/users", auth_routes(upload_limit))
        .nest("/api/movies", movie_routes)
        .nest("/api/bookings", booking_routes)
        .nest("/api/admin", admin_routes)
        .route("/api/uploads", post(uploads::upload).layer(upload_limit))
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .layer(cors_layer(&state.client_url))
        .with_state(state)
}
