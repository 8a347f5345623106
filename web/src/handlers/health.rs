//! Liveness and readiness endpoints.

use async_trait::async_trait;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;

/// A dependency the service needs before it can take traffic.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Name reported in the readiness body, e.g. `"postgres"`.
    fn name(&self) -> &'static str;

    /// `Err` carries a short reason, logged and reported.
    async fn check(&self) -> Result<(), String>;
}

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"`
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
}

/// `GET /health`: the process is up. Checks no dependencies.
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Readiness response.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Whether traffic should be routed here
    pub ready: bool,
    /// Probe name
    pub component: &'static str,
    /// Failure reason, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /ready`: 200 when the probe passes, 503 otherwise.
pub async fn readiness_check(
    State(probe): State<Arc<dyn ReadinessProbe>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    match probe.check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                component: probe.name(),
                error: None,
            }),
        ),
        Err(reason) => {
            tracing::warn!(component = probe.name(), %reason, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    ready: false,
                    component: probe.name(),
                    error: Some(reason),
                }),
            )
        },
    }
}

/// Probe that is always ready; used when nothing external is required.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReady;

#[async_trait]
impl ReadinessProbe for AlwaysReady {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn check(&self) -> Result<(), String> {
        Ok(())
    }
}
