//! # Marquee Authentication & Authorization
//!
//! Accounts, roles, and stateless sessions for the booking backend.
//!
//! ## Features
//!
//! - **Passwords**: Argon2id PHC hashes ([`password`])
//! - **Sessions**: HS256 JWTs carrying `{sub, email, role}` ([`token`]),
//!   delivered in an `HttpOnly` cookie ([`cookie`])
//! - **Principal**: the verified caller passed into every service call ([`state`])
//! - **Storage**: [`UserRepository`] with in-memory and `PostgreSQL` ([`stores`])
//! - **Roles**: admin-only user search and role changes ([`roles`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use marquee_auth::{AuthService, SessionConfig, stores::InMemoryUserRepository};
//!
//! let auth = AuthService::new(Arc::new(InMemoryUserRepository::new()), &SessionConfig::new("secret"), clock);
//! auth.register("fan@example.com", "hunter2", None).await?;
//! let (user, token) = auth.login("fan@example.com", "hunter2").await?;
//! let principal = auth.verify(&token.token)?;
//! assert_eq!(principal.id, user.user_id);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod config;
pub mod cookie;
pub mod error;
pub mod password;
pub mod providers;
pub mod roles;
pub mod service;
pub mod state;
pub mod stores;
pub mod token;
pub mod utils;

// Re-export main types for convenience
pub use config::SessionConfig;
pub use cookie::SessionCookie;
pub use error::{AuthError, Result};
pub use providers::{User, UserProfile, UserRepository};
pub use roles::RoleService;
pub use service::AuthService;
pub use state::{Principal, Role, UserId};
pub use token::{SessionToken, SessionTokens};
