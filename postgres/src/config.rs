use serde::{Deserialize, Serialize};

/// Connection pool settings.
///
/// Timeouts are in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Connection URL
    pub url: String,
    /// Upper bound on pooled connections
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// How long to wait for a connection from the pool
    pub connect_timeout: u64,
    /// Idle time before a pooled connection is closed
    pub idle_timeout: u64,
}

impl PostgresConfig {
    /// Default pool settings for `url`.
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout: 30,
            idle_timeout: 600,
        }
    }
}
