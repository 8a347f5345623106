//! Application assembly: storage resources, then services, then state.
//!
//! ```rust,ignore
//! let config = Config::from_env();
//! let resources = Resources::from_config(&config, Arc::new(SystemClock)).await?;
//! let app = build_router(app_state(&config, &resources));
//! ```

pub mod resources;

pub use resources::Resources;

use crate::config::Config;
use crate::server::AppState;
use crate::services::{BookingService, CatalogService, UploadService};
use marquee_auth::{AuthService, RoleService, SessionCookie};
use std::sync::Arc;

/// Wire services over `resources` according to `config`.
#[must_use]
pub fn app_state(config: &Config, resources: &Resources) -> AppState {
    let session = config.session_config();
    let clock = Arc::clone(&resources.clock);

    AppState {
        auth: AuthService::new(Arc::clone(&resources.users), &session, Arc::clone(&clock)),
        roles: RoleService::new(Arc::clone(&resources.users), Arc::clone(&clock)),
        cookie: SessionCookie::from_config(&session),
        catalog: CatalogService::new(Arc::clone(&resources.movies), Arc::clone(&clock)),
        bookings: BookingService::new(
            Arc::clone(&resources.movies),
            Arc::clone(&resources.bookings),
            Arc::clone(&clock),
            config.hall_layout(),
        ),
        uploads: UploadService::new(config.uploads.dir.clone(), config.uploads.max_bytes, clock),
        readiness: Arc::clone(&resources.readiness),
        client_url: config.server.client_url.clone(),
    }
}
