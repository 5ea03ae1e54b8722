//! Graph registry
//!
//! An explicit key-value store of assembled graphs, owned by the service.
//! Each graph sits behind its own `tokio::sync::Mutex`: whichever operation
//! (filter, visualize, cluster) holds the lock has exclusive access for the
//! duration, which is the only synchronization the engine assumes.

use chrono::{DateTime, Utc};
use citegraph_common::errors::{AppError, Result};
use citegraph_common::metrics::record_registry_size;
use citegraph_common::model::ResearchGraph;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Shared handle to a registered graph
pub type GraphHandle = Arc<Mutex<ResearchGraph>>;

/// In-memory graph store keyed by graph id.
#[derive(Default)]
pub struct GraphRegistry {
    graphs: RwLock<HashMap<Uuid, GraphHandle>>,
}

/// Listing entry for a registered graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphSummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub node_count: usize,
    pub edge_count: usize,
}

impl GraphRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a graph, returning its id.
    pub async fn insert(&self, graph: ResearchGraph) -> Uuid {
        let id = graph.id;
        let mut graphs = self.graphs.write().await;
        graphs.insert(id, Arc::new(Mutex::new(graph)));
        record_registry_size(graphs.len());
        id
    }

    /// Fetch a graph handle; unknown ids surface as a not-found condition.
    pub async fn get(&self, id: Uuid) -> Result<GraphHandle> {
        self.graphs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::GraphNotFound { id: id.to_string() })
    }

    /// Drop a graph from the registry.
    pub async fn remove(&self, id: Uuid) -> Result<()> {
        let mut graphs = self.graphs.write().await;
        let removed = graphs.remove(&id);
        record_registry_size(graphs.len());
        removed
            .map(|_| ())
            .ok_or_else(|| AppError::GraphNotFound { id: id.to_string() })
    }

    /// Summaries of every registered graph.
    pub async fn list(&self) -> Vec<GraphSummary> {
        let handles: Vec<GraphHandle> = self.graphs.read().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let graph = handle.lock().await;
            summaries.push(GraphSummary {
                id: graph.id,
                name: graph.name.clone(),
                created_at: graph.created_at,
                node_count: graph.nodes.len(),
                edge_count: graph.edges.len(),
            });
        }
        summaries.sort_by_key(|s| s.created_at);
        summaries
    }

    pub async fn len(&self) -> usize {
        self.graphs.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let registry = GraphRegistry::new();
        let graph = ResearchGraph::new("g");
        let id = registry.insert(graph).await;

        assert_eq!(registry.len().await, 1);
        let handle = registry.get(id).await.unwrap();
        assert_eq!(handle.lock().await.name, "g");

        registry.remove(id).await.unwrap();
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let registry = GraphRegistry::new();
        let missing = Uuid::new_v4();

        let err = registry.get(missing).await.unwrap_err();
        assert!(matches!(err, AppError::GraphNotFound { .. }));

        let err = registry.remove(missing).await.unwrap_err();
        assert!(matches!(err, AppError::GraphNotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_summaries() {
        let registry = GraphRegistry::new();
        registry.insert(ResearchGraph::new("first")).await;
        registry.insert(ResearchGraph::new("second")).await;

        let summaries = registry.list().await;
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].node_count, 0);
    }
}
