//! Graph lifecycle handlers: build, get, list, delete

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use validator::Validate;

use crate::registry::GraphSummary;
use crate::AppState;
use citegraph_common::{
    errors::{AppError, Result},
    metrics::record_build,
    model::{PaperRecord, ResearchGraph},
};
use citegraph_engine::{CitationNetworkBuilder, GraphAssembler, NetworkOptions, QueryPaper};

/// Request to build a citation graph
#[derive(Debug, Deserialize, Validate)]
pub struct BuildGraphRequest {
    /// Graph display name
    #[serde(default)]
    pub name: Option<String>,

    /// Papers to build from
    #[validate(length(min = 1, max = 50))]
    pub papers: Vec<PaperInput>,

    /// Cap on the reviewed-paper set; falls back to configuration
    #[serde(default)]
    pub max_reviewed: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct PaperInput {
    #[validate(length(min = 1, max = 1000))]
    pub title: String,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(rename = "abstract", default)]
    pub abstract_text: String,

    #[serde(default)]
    pub full_text: Option<String>,

    #[serde(default)]
    pub year: Option<i32>,

    /// Known bibliographic-source id, used as a resolution hint
    #[serde(default)]
    pub external_id: Option<String>,
}

/// Response after building a graph
#[derive(Debug, Serialize)]
pub struct BuildGraphResponse {
    pub graph_id: Uuid,
    pub graph: ResearchGraph,
    pub stats: BuildStats,
}

#[derive(Debug, Serialize)]
pub struct BuildStats {
    pub total_papers: usize,
    pub input_papers: usize,
    pub reviewed_papers: usize,
    pub total_citations: usize,
}

#[derive(Serialize)]
pub struct GraphListResponse {
    pub graphs: Vec<GraphSummary>,
}

/// Build a citation graph from caller-supplied papers
pub async fn build_graph(
    State(state): State<AppState>,
    Json(request): Json<BuildGraphRequest>,
) -> Result<(StatusCode, Json<BuildGraphResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;
    for paper in &request.papers {
        paper.validate().map_err(|e| AppError::Validation {
            message: e.to_string(),
            field: Some("papers".to_string()),
        })?;
    }

    let started = Instant::now();

    let records: Vec<PaperRecord> = request.papers.iter().map(to_record).collect();
    let queries: Vec<QueryPaper> = request
        .papers
        .iter()
        .map(|paper| QueryPaper {
            title: paper.title.clone(),
            external_id: paper.external_id.clone(),
        })
        .collect();

    let mut options = NetworkOptions::from_config(&state.config.builder, &state.config.source);
    if let Some(max_reviewed) = request.max_reviewed {
        options = options.with_max_reviewed(max_reviewed);
    }

    tracing::info!(papers = queries.len(), max_reviewed = options.max_reviewed, "Building graph");

    let builder = CitationNetworkBuilder::new(state.adapter.clone(), options);
    let network = builder.build(&queries, CancellationToken::new()).await;

    let name = request.name.unwrap_or_else(|| "Untitled Graph".to_string());
    let graph = GraphAssembler::default().assemble(&name, &records, &network);

    record_build(
        started.elapsed().as_secs_f64(),
        graph.nodes.len(),
        graph.edges.len(),
    );

    let stats = BuildStats {
        total_papers: graph.nodes.len(),
        input_papers: records.len(),
        reviewed_papers: graph.nodes.len().saturating_sub(records.len()),
        total_citations: graph.edges.len(),
    };

    let response = BuildGraphResponse {
        graph_id: graph.id,
        graph: graph.clone(),
        stats,
    };
    state.registry.insert(graph).await;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a graph by id
pub async fn get_graph(
    State(state): State<AppState>,
    Path(graph_id): Path<Uuid>,
) -> Result<Json<ResearchGraph>> {
    let handle = state.registry.get(graph_id).await?;
    let graph = handle.lock().await;
    Ok(Json(graph.clone()))
}

/// List all registered graphs
pub async fn list_graphs(State(state): State<AppState>) -> Json<GraphListResponse> {
    Json(GraphListResponse {
        graphs: state.registry.list().await,
    })
}

/// Delete a graph
pub async fn delete_graph(
    State(state): State<AppState>,
    Path(graph_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.registry.remove(graph_id).await?;
    tracing::info!(graph_id = %graph_id, "Graph deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn to_record(paper: &PaperInput) -> PaperRecord {
    let mut external_ids = BTreeMap::new();
    if let Some(id) = &paper.external_id {
        external_ids.insert("semantic_scholar".to_string(), id.clone());
    }
    PaperRecord {
        id: paper
            .external_id
            .clone()
            .unwrap_or_else(|| slug(&paper.title)),
        title: paper.title.clone(),
        authors: paper.authors.clone(),
        abstract_text: paper.abstract_text.clone(),
        full_text: paper.full_text.clone(),
        year: paper.year,
        external_ids,
    }
}

fn slug(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
