//! Clustering handler

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use citegraph_common::{errors::Result, model::ResearchGraph};
use citegraph_engine::{ClusterRequest, ClusteringEngine, ClusteringReport};

#[derive(Debug, Serialize)]
pub struct ClusterResponse {
    pub graph: ResearchGraph,
    pub report: ClusteringReport,
}

/// Cluster a graph's papers; overwrites any previous assignment
pub async fn cluster(
    State(state): State<AppState>,
    Path(graph_id): Path<Uuid>,
    Json(request): Json<ClusterRequest>,
) -> Result<Json<ClusterResponse>> {
    let handle = state.registry.get(graph_id).await?;
    let mut graph = handle.lock().await;

    let report = ClusteringEngine::new().cluster(&mut graph, &request);

    Ok(Json(ClusterResponse {
        graph: graph.clone(),
        report,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::graphs::{build_graph, BuildGraphRequest};
    use crate::test_support::mock_state;
    use citegraph_common::errors::AppError;
    use serde_json::json;

    #[tokio::test]
    async fn test_cluster_assigns_every_node() {
        let state = mock_state();
        let request: BuildGraphRequest = serde_json::from_value(json!({
            "papers": [{"title": "Paper One"}],
        }))
        .unwrap();
        let (_, response) = build_graph(State(state.clone()), Json(request))
            .await
            .unwrap();

        let cluster_request: ClusterRequest =
            serde_json::from_value(json!({"method": "citations"})).unwrap();
        let response = cluster(
            State(state),
            Path(response.0.graph_id),
            Json(cluster_request),
        )
        .await
        .unwrap();

        assert!(response
            .0
            .graph
            .nodes
            .iter()
            .all(|n| n.cluster_id.is_some()));
        assert!(!response.0.report.cluster_sizes.is_empty());
    }

    #[tokio::test]
    async fn test_cluster_unknown_graph_not_found() {
        let state = mock_state();
        let request: ClusterRequest =
            serde_json::from_value(json!({"method": "content"})).unwrap();

        let err = cluster(State(state), Path(Uuid::new_v4()), Json(request))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GraphNotFound { .. }));
    }
}
