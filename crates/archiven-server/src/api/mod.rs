pub mod files;
pub mod schemas;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use archiven_core::ArchiveService;

/// multipart の境界やヘッダー分の余裕
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// ハンドラ間で共有する状態
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ArchiveService>,
    /// `download_url` の組み立てに使うベース URL（末尾スラッシュなし）
    pub public_url: Arc<str>,
}

impl AppState {
    pub fn new(service: ArchiveService, public_url: &str) -> Self {
        Self {
            service: Arc::new(service),
            public_url: Arc::from(public_url.trim_end_matches('/')),
        }
    }

    pub(crate) fn download_url(&self, id: &str) -> String {
        format!("{}/files/{id}/download", self.public_url)
    }
}

/// Build the router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.service.policy().max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/files", post(files::upload).get(files::list))
        .route("/files/{id}", get(files::get_file))
        .route("/files/{id}/download", get(files::download))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
