use std::net::SocketAddr;

use axum::routing::{delete, get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::routes::{agents, tools};
use crate::SharedContext;

pub fn router(ctx: SharedContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/tools", get(tools::list_tools))
        .route("/api/tools/", get(tools::list_tools))
        .route("/api/tools/categories", get(tools::tools_by_category))
        .route("/api/tools/execute", post(tools::execute_tool))
        .route("/api/tools/schema/:tool_name", get(tools::tool_schema))
        .route(
            "/api/tools/agents",
            get(agents::list_agents).post(agents::create_agent),
        )
        .route(
            "/api/tools/agents/:name/analyze",
            post(agents::analyze_with_agent),
        )
        .route("/api/tools/agents/:name", delete(agents::delete_agent))
        .route(
            "/api/tools/portfolio/decisions",
            post(agents::portfolio_decisions),
        )
        .with_state(ctx)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str {
    "ok"
}

/// Serve until `shutdown` is cancelled.
pub async fn serve(
    ctx: SharedContext,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Tradekit listening");

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
