//! Health and readiness handlers

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: citegraph_common::VERSION,
    })
}

/// Readiness probe; the service holds no external connections at rest
pub async fn ready() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ready",
        version: citegraph_common::VERSION,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let response = health().await;
        assert_eq!(response.0.status, "ok");
    }
}
