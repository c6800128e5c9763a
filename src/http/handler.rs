//! HTTP handlers for the graph API

use crate::graph::{Edge, GraphError, Node, PropertyContainer, PropertyMap, SharedGraph};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// Request for creating a node
#[derive(Debug, Deserialize)]
pub struct CreateNodeRequest {
    pub id: String,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// Request for creating an edge
#[derive(Debug, Deserialize)]
pub struct CreateEdgeRequest {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub relation: String,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// Outgoing edge as seen from its start node
#[derive(Debug, Serialize)]
pub struct EdgeResponse {
    pub end: String,
    pub relation: String,
    pub properties: PropertyMap,
}

impl From<&Edge> for EdgeResponse {
    fn from(edge: &Edge) -> Self {
        Self {
            end: edge.end().to_string(),
            relation: edge.relation().to_string(),
            properties: edge.properties().clone(),
        }
    }
}

/// Node with its outgoing edges
#[derive(Debug, Serialize)]
pub struct NodeResponse {
    pub id: String,
    pub properties: PropertyMap,
    pub edges: Vec<EdgeResponse>,
}

impl From<&Node> for NodeResponse {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id().to_string(),
            properties: node.properties().clone(),
            edges: node.edges().iter().map(EdgeResponse::from).collect(),
        }
    }
}

fn not_found(err: GraphError) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": err.to_string() }))).into_response()
}

/// Handler for fetching a node
pub async fn get_node_handler(
    State(graph): State<SharedGraph>,
    Path(id): Path<String>,
) -> Response {
    let graph = graph.read().await;
    match graph.find_node(&id) {
        Ok(node) => Json(NodeResponse::from(node)).into_response(),
        Err(e) => not_found(e),
    }
}

/// Handler for creating a node; an existing ID is left untouched
pub async fn create_node_handler(
    State(graph): State<SharedGraph>,
    Json(payload): Json<CreateNodeRequest>,
) -> Response {
    let mut graph = graph.write().await;
    if graph.add_node(payload.id.as_str(), payload.properties) {
        debug!("Created node {} via HTTP", payload.id);
        (
            StatusCode::CREATED,
            Json(json!({ "status": "success", "message": "Node created" })),
        )
            .into_response()
    } else {
        (
            StatusCode::OK,
            Json(json!({
                "status": "exists",
                "message": format!("Node {} already exists", payload.id),
            })),
        )
            .into_response()
    }
}

/// Handler for creating an edge
pub async fn create_edge_handler(
    State(graph): State<SharedGraph>,
    Json(payload): Json<CreateEdgeRequest>,
) -> Response {
    let mut graph = graph.write().await;
    match graph.add_edge(
        &payload.start,
        &payload.end,
        payload.relation,
        payload.properties,
    ) {
        Ok(()) => (
            StatusCode::CREATED,
            Json(json!({ "status": "success", "message": "Edge created" })),
        )
            .into_response(),
        Err(e) => not_found(e),
    }
}

/// Handler for system status
pub async fn status_handler(State(graph): State<SharedGraph>) -> impl IntoResponse {
    let graph = graph.read().await;
    Json(json!({
        "status": "healthy",
        "version": crate::VERSION,
        "nodes": graph.node_count(),
        "edges": graph.edge_count(),
    }))
}
