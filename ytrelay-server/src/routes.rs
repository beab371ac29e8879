use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use ytrelay_api::api::DownloadResponse;

use crate::error::RelayError;
use crate::process::ExternalTool;
use crate::submission::Submission;

/// Read only configuration shared by all requests.
#[derive(Debug, Clone)]
pub struct AppState {
    pub tool: Arc<ExternalTool>,
    pub upload_dir: Arc<PathBuf>,
}

/// All routes, with static assets as the fallback.
///
/// `max_upload_bytes` of `None` lifts the request body limit entirely.
pub fn routes(state: AppState, static_dir: PathBuf, max_upload_bytes: Option<usize>) -> Router {
    let body_limit = match max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/download", post(download))
        .route("/health", get(|| async { "OK" }))
        .fallback_service(ServeDir::new(static_dir))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn download(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<DownloadResponse>), RelayError> {
    let id = fastrand::u64(..);
    log::info!(id; "received submission");

    let submission = Submission::from_multipart(id, &state.upload_dir, multipart?).await?;
    log::debug!(id, argument:debug = submission.argument(); "submission validated");

    // Detached, so a client hanging up neither kills the tool nor removes its input early.
    let tool = Arc::clone(&state.tool);
    let run = tokio::spawn(async move {
        let result = tool.run(id, submission.argument()).await;
        submission.finish(id).await;
        result
    });
    let output = run.await??;

    let status = if output.success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(DownloadResponse::from(output))))
}
