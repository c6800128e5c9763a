//! HTTP server exposing the shared graph

use super::handler::{create_edge_handler, create_node_handler, get_node_handler, status_handler};
use crate::config::HttpConfig;
use crate::graph::SharedGraph;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Build the API router over `graph`
pub fn router(graph: SharedGraph) -> Router {
    Router::new()
        .route("/nodes/:id", get(get_node_handler))
        .route("/nodes", post(create_node_handler))
        .route("/edges", post(create_edge_handler))
        .route("/status", get(status_handler))
        .layer(CorsLayer::permissive())
        .with_state(graph)
}

/// HTTP server managing the graph API
pub struct HttpServer {
    graph: SharedGraph,
    config: HttpConfig,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(graph: SharedGraph, config: HttpConfig) -> Self {
        Self { graph, config }
    }

    /// Serve until `shutdown` resolves
    pub async fn start<F>(&self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.graph.clone());

        let addr = self.config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!("Graph API available at http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}
