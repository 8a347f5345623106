//! Application state for the booking HTTP server.
//!
//! Contains all shared resources needed by HTTP handlers:
//! - Auth and role services (sessions, accounts)
//! - Catalog, booking, and upload services
//! - The readiness probe for `/ready`

use crate::services::{BookingService, CatalogService, UploadService};
use axum::extract::FromRef;
use marquee_auth::{AuthService, RoleService, SessionCookie};
use marquee_web::ReadinessProbe;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Registration, login, and token verification
    pub auth: AuthService,
    /// Admin user management
    pub roles: RoleService,
    /// Session cookie policy
    pub cookie: SessionCookie,
    /// Movie catalog
    pub catalog: CatalogService,
    /// Seat availability and bookings
    pub bookings: BookingService,
    /// File uploads
    pub uploads: UploadService,
    /// Backend health for `/ready`
    pub readiness: Arc<dyn ReadinessProbe>,
    /// Front-end origin, target of `/me?redirect=1`
    pub client_url: String,
}

impl FromRef<AppState> for Arc<dyn ReadinessProbe> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.readiness)
    }
}
