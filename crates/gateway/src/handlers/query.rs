//! Graph query handlers: filter, path, visualize

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use citegraph_common::{
    errors::{AppError, Result},
    model::ResearchGraph,
};
use citegraph_engine::query::{
    apply_visual_encoding, filter_graph, shortest_path, FilterPredicate, PathResult,
    VisualEncoding,
};

/// Filter request; predicates are AND-combined
#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub filters: Vec<FilterPredicate>,

    /// Accepted for wire compatibility; only "AND" is supported
    #[serde(default = "default_logic")]
    pub logic: String,
}

fn default_logic() -> String {
    "AND".to_string()
}

#[derive(Debug, Serialize)]
pub struct FilterResponse {
    pub filtered_graph: ResearchGraph,
    pub match_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct PathRequest {
    pub source_id: Uuid,
    pub target_id: Uuid,
}

#[derive(Serialize)]
pub struct PathResponse {
    /// Zero or one path; alternatives are never returned
    pub paths: Vec<PathResult>,
}

#[derive(Serialize)]
pub struct VisualizeResponse {
    pub styled_graph: ResearchGraph,
}

/// Filter a graph into a derived subset
pub async fn filter(
    State(state): State<AppState>,
    Path(graph_id): Path<Uuid>,
    Json(request): Json<FilterRequest>,
) -> Result<Json<FilterResponse>> {
    if !request.logic.eq_ignore_ascii_case("AND") {
        return Err(AppError::Validation {
            message: format!("Unsupported filter logic '{}'; only AND is implemented", request.logic),
            field: Some("logic".to_string()),
        });
    }

    let handle = state.registry.get(graph_id).await?;
    let graph = handle.lock().await;
    let filtered = filter_graph(&graph, &request.filters);

    tracing::info!(
        graph_id = %graph_id,
        predicates = request.filters.len(),
        matches = filtered.nodes.len(),
        "Graph filtered"
    );

    Ok(Json(FilterResponse {
        match_count: filtered.nodes.len(),
        filtered_graph: filtered,
    }))
}

/// Find one shortest path between two papers
pub async fn find_path(
    State(state): State<AppState>,
    Path(graph_id): Path<Uuid>,
    Json(request): Json<PathRequest>,
) -> Result<Json<PathResponse>> {
    let handle = state.registry.get(graph_id).await?;
    let graph = handle.lock().await;

    let paths = shortest_path(&graph, request.source_id, request.target_id)
        .into_iter()
        .collect();

    Ok(Json(PathResponse { paths }))
}

/// Apply visual encodings in place
pub async fn visualize(
    State(state): State<AppState>,
    Path(graph_id): Path<Uuid>,
    Json(encoding): Json<VisualEncoding>,
) -> Result<Json<VisualizeResponse>> {
    let handle = state.registry.get(graph_id).await?;
    let mut graph = handle.lock().await;

    apply_visual_encoding(&mut graph, &encoding);

    Ok(Json(VisualizeResponse {
        styled_graph: graph.clone(),
    }))
}
