//! HTTP side of authentication.
//!
//! Account logic lives in `marquee-auth`; this module exposes it over HTTP
//! and turns session tokens into a [`Principal`](marquee_auth::Principal).

pub mod handlers;
pub mod middleware;

pub use middleware::SessionUser;
