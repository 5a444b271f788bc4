//! Core library for the lanternfly image gallery: object store access, upload
//! naming and validation, and the HTTP routes serving them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod images;
pub mod middleware;
pub mod models;
pub mod storage;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use handlers::routes::create_routes;
pub use images::{Clock, FixedClock, ImageService, ImageUpload, SystemClock};
pub use storage::{ContainerClient, ImageStore, StoreError, StoredObject};

use axum::{extract::DefaultBodyLimit, Router};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub images: ImageService,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn ImageStore>) -> Self {
        Self {
            app_name: "Lanternfly Gallery".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            images: ImageService::new(store),
            max_upload_bytes: config::settings::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.images = self.images.with_clock(clock);
        self
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    let limit = state.max_upload_bytes;

    Router::new()
        .merge(create_routes())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(middleware::logging::logging_layer())
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

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
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
