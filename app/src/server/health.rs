//! Readiness probe for the `PostgreSQL` backend.
//!
//! Liveness (`/health`) and the in-memory probe come from `marquee-web`.

use async_trait::async_trait;
use marquee_postgres::PgPool;
use marquee_web::ReadinessProbe;

/// Ready while `SELECT 1` succeeds.
#[derive(Clone)]
pub struct PostgresProbe {
    pool: PgPool,
}

impl PostgresProbe {
    /// Probe the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadinessProbe for PostgresProbe {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn check(&self) -> Result<(), String> {
        marquee_postgres::ping(&self.pool).await.map_err(|e| e.to_string())
    }
}
