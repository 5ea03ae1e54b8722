//! CiteGraph API Gateway
//!
//! The entry point for all external API requests. Handles:
//! - Graph build / query / clustering routing
//! - The graph registry (one lock per graph id)
//! - Rate limiting
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;
mod registry;

use axum::{
    routing::{delete, get, post},
    Router,
};
use citegraph_common::{
    config::AppConfig,
    metrics,
    source::{SemanticScholarAdapter, SourceAdapter},
};
use metrics_exporter_prometheus::PrometheusBuilder;
use registry::GraphRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, Level};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<GraphRegistry>,
    pub adapter: Arc<dyn SourceAdapter>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // Initialize tracing
    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .init();
    }

    info!("Starting CiteGraph API Gateway v{}", citegraph_common::VERSION);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port > 0 {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], config.observability.metrics_port))
            .install()?;
        info!(port = config.observability.metrics_port, "Metrics exporter listening");
    }

    let config = Arc::new(config);

    // Create app state
    let state = AppState {
        config: config.clone(),
        registry: Arc::new(GraphRegistry::new()),
        adapter: Arc::new(SemanticScholarAdapter::new(&config.source)),
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // API routes
    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Graph lifecycle
        .route("/graphs/build", post(handlers::graphs::build_graph))
        .route("/graphs", get(handlers::graphs::list_graphs))
        .route("/graphs/{id}", get(handlers::graphs::get_graph))
        .route("/graphs/{id}", delete(handlers::graphs::delete_graph))
        // Query operations
        .route("/graphs/{id}/filter", post(handlers::query::filter))
        .route("/graphs/{id}/path", post(handlers::query::find_path))
        .route("/graphs/{id}/visualize", post(handlers::query::visualize))
        // Clustering
        .route("/graphs/{id}/cluster", post(handlers::cluster::cluster));

    // Inbound rate limiting
    let rate_limit = &state.config.rate_limit;
    let limiter = middleware::rate_limit::create_rate_limiter(
        rate_limit.requests_per_second,
        rate_limit.burst,
    );
    let rate_limit_enabled = rate_limit.enabled;

    // Compose the app
    let mut app = Router::new()
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id);

    if rate_limit_enabled {
        app = app.layer(axum::middleware::from_fn(
            move |request: axum::extract::Request, next: axum::middleware::Next| {
                let limiter = limiter.clone();
                async move {
                    middleware::rate_limit::rate_limit_middleware(request, next, limiter).await
                }
            },
        ));
    }

    app.with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use citegraph_common::source::mock::{record, MockSourceAdapter};

    /// State backed by a fixture adapter: P1 cites P2 and P3, P2 cites P3.
    pub fn mock_state() -> AppState {
        let adapter = MockSourceAdapter::new()
            .with_paper(record("p1", "Paper One", 10))
            .with_paper(record("p2", "Paper Two", 8))
            .with_paper(record("p3", "Paper Three", 6))
            .with_references("p1", &["p2", "p3"])
            .with_references("p2", &["p3"]);

        AppState {
            config: Arc::new(AppConfig::default()),
            registry: Arc::new(GraphRegistry::new()),
            adapter: Arc::new(adapter),
        }
    }

    #[test]
    fn test_router_builds() {
        let _router = create_router(mock_state());
    }
}
