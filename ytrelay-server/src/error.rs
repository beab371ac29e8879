use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ytrelay_api::api::{DownloadResponse, ErrorResponse, NO_INPUT};

/// Everything that keeps a submission from producing a regular tool result.
///
/// A tool exiting with a nonzero code is *not* an error here, see [`crate::process::ToolOutput`].
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("No input provided")]
    NoInput,
    #[error("not a multipart request: {}", .0.body_text())]
    NotMultipart(#[from] MultipartRejection),
    #[error("malformed multipart body: {}", .0.body_text())]
    Multipart(#[from] MultipartError),
    #[error("failed to store upload: {0}")]
    Upload(#[source] std::io::Error),
    #[error("failed to start external tool: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("relay task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::NoInput => StatusCode::BAD_REQUEST,
            RelayError::NotMultipart(rejection) => rejection.status(),
            RelayError::Multipart(e) => e.status(),
            RelayError::Upload(_) | RelayError::Spawn(_) | RelayError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            RelayError::NoInput => (
                status,
                Json(ErrorResponse {
                    error: String::from(NO_INPUT),
                }),
            )
                .into_response(),
            RelayError::NotMultipart(_) | RelayError::Multipart(_) => (
                status,
                Json(ErrorResponse {
                    error: self.to_string(),
                }),
            )
                .into_response(),
            RelayError::Upload(_) | RelayError::Spawn(_) | RelayError::Task(_) => (
                status,
                Json(DownloadResponse::Error {
                    error: self.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_input_is_a_client_error() {
        let error = RelayError::NoInput;
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), NO_INPUT);
    }

    #[test]
    fn spawn_failure_is_a_server_error() {
        let error = RelayError::Spawn(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error.to_string().starts_with("failed to start external tool"));
    }
}
