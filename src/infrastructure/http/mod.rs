pub mod request_id;

pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::controllers::{episode::EpisodeController, health};
use crate::domain::pipeline::PipelineDriver;
use crate::infrastructure::config::Config;

/// All routes, wired to `driver`
pub fn build_router(driver: Arc<PipelineDriver>) -> Router {
    let episode_controller = Arc::new(EpisodeController::new(driver.clone()));

    let episode_routes = Router::new()
        .route("/api/episodes/:date", get(EpisodeController::get_status))
        .route("/api/episodes/:date/audio", post(EpisodeController::start_audio))
        .route("/api/episodes/:date/merge", post(EpisodeController::merge))
        .with_state(episode_controller);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(driver)
        .merge(episode_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_id_middleware)),
        )
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    config: &Config,
    driver: Arc<PipelineDriver>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(driver);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
