use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cache::{self, FeedCache};
use crate::client::AtClient;
use crate::config::Config;
use crate::error::{FeedError, ServerError};
use crate::handlers;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub client: AtClient,
    pub cache: Arc<dyn FeedCache>,
    pub record_limit: u32,
}

impl AppState {
    pub fn new(client: AtClient, cache: Arc<dyn FeedCache>, record_limit: u32) -> Self {
        Self {
            client,
            cache,
            record_limit,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, FeedError> {
        let client = AtClient::new(&config.appview_url, &config.plc_url)?;
        Ok(Self::new(
            client,
            cache::from_config(config),
            config.record_limit,
        ))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/{actor}", get(handlers::actor_feed))
        .route("/{actor}/{collection}", get(handlers::collection_feed))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(state: AppState, addr: SocketAddr) -> Result<(), ServerError> {
    let app = router(state);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind { addr, source: e })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Serve { source: e })?;

    Ok(())
}
