use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use std::path::PathBuf;
use thiserror::Error as ThisError;
use tokio::task::JoinError;
use tracing::{error, warn};

#[derive(Debug, ThisError)]
pub enum PortalError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Multipart request rejected: {0}")]
    MultipartRejected(#[from] MultipartRejection),

    #[error("Bad upload: {0}")]
    BadUpload(String),

    #[error("Document {0} not found")]
    DocumentNotFound(i64),

    #[error("File missing from server storage: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("Blocking task failed: {0}")]
    Task(#[from] JoinError),

    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),
}

impl IntoResponse for PortalError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            PortalError::BadUpload(reason) => {
                let status = StatusCode::BAD_REQUEST;
                let body = ApiErrorBody {
                    code: "BAD_UPLOAD".to_string(),
                    message: reason,
                };
                (status, body)
            }
            err @ (PortalError::Multipart(_) | PortalError::MultipartRejected(_)) => {
                warn!(error = %err, "rejecting malformed multipart upload");
                let status = StatusCode::BAD_REQUEST;
                let body = ApiErrorBody {
                    code: "BAD_UPLOAD".to_string(),
                    message: "Please upload a valid PDF file.".to_string(),
                };
                (status, body)
            }
            PortalError::DocumentNotFound(_) => {
                let status = StatusCode::NOT_FOUND;
                let body = ApiErrorBody {
                    code: "NOT_FOUND".to_string(),
                    message: "Document not found".to_string(),
                };
                (status, body)
            }
            PortalError::FileMissing(path) => {
                error!(path = %path.display(), "file not found at path");
                let status = StatusCode::NOT_FOUND;
                let body = ApiErrorBody {
                    code: "FILE_MISSING".to_string(),
                    message: "File missing from server storage.".to_string(),
                };
                (status, body)
            }
            err @ (PortalError::DatabaseError(_)
            | PortalError::Io(_)
            | PortalError::Task(_)
            | PortalError::Config(_)) => {
                error!(error = %err, "request failed");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                };
                (status, body)
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: PortalError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        (status, serde_json::from_slice(&body).expect("body was not json"))
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let (status, body) = render(PortalError::DocumentNotFound(7)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn bad_upload_echoes_reason() {
        let (status, body) =
            render(PortalError::BadUpload("Only PDF files are allowed!".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Only PDF files are allowed!");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let io = std::io::Error::other("disk on fire");
        let (status, body) = render(PortalError::Io(io)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert!(!body.to_string().contains("disk on fire"));
    }
}
