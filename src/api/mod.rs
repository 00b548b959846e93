//! HTTP surface: relay upgrade routes, system endpoints, OpenAPI document.

pub mod system;

use axum::Router;
use axum::routing::get;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the HTTP endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(system::health_handler),
    components(schemas(system::HealthResponse)),
    tags((name = "System", description = "Service health"))
)]
pub struct ApiDoc;

/// Builds the complete router: WebSocket upgrade at `/` and `/ws`, plus
/// system routes.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .merge(system::routes())
}
