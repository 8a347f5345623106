//! Error types for authentication and authorization operations.

use thiserror::Error;

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for accounts, sessions, and role checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Input Errors
    // ═══════════════════════════════════════════════════════════

    /// A request field is missing or malformed.
    #[error("{0}")]
    InvalidInput(String),

    /// Role string is neither `Guest` nor `Admin`.
    #[error("invalid role")]
    InvalidRole(String),

    /// Email is already registered.
    #[error("User already exists")]
    EmailTaken,

    // ═══════════════════════════════════════════════════════════
    // Authentication Errors
    // ═══════════════════════════════════════════════════════════

    /// Unknown email or wrong password. Both cases share one message.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No session token was presented.
    #[error("Authentication required")]
    Unauthenticated,

    /// Token is malformed or its signature does not verify.
    #[error("Invalid session token")]
    InvalidToken,

    /// Token signature is valid but it has expired.
    #[error("Session has expired")]
    SessionExpired,

    // ═══════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════

    /// Principal lacks the required role.
    #[error("Insufficient permissions: {required}")]
    InsufficientPermissions {
        /// Required role that was missing
        required: String,
    },

    /// User does not exist.
    #[error("User not found")]
    UserNotFound,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Password hashing or token signing failed.
    #[error("Internal error: {0}")]
    InternalError(String),
}
