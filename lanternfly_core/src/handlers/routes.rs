//! Route table for the gallery API and landing page

use axum::{
    response::Html,
    routing::{get, post},
    Router,
};

use super::{
    health::handle_health,
    images::{list_gallery, upload_image},
};
use crate::{error::AppError, AppState};

const INDEX_HTML: &str = include_str!("../../templates/index.html");

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handle_index))
        .nest("/api/v1", api_routes())
        .fallback(handle_not_found)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_image))
        .route("/gallery", get(list_gallery))
        .route("/health", get(handle_health))
}

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn handle_not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}
