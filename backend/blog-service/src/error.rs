/// Error types for Blog Service
///
/// A missing record and a record the viewer may not see are both `NotFound`,
/// so callers cannot tell hidden posts from absent ones. Ownership failures
/// are not errors at all; they are redirects decided by the ownership policy.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::render::Template;

/// Result type for blog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Record absent or not visible to the viewer
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Rendering backend failed
    #[error("Render error: {0}")]
    Render(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    /// Static error page shown for this error
    pub fn template(&self) -> Template {
        match self {
            AppError::NotFound(_) => Template::NotFound,
            _ => Template::ServerError,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Render(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        // 404 bodies stay generic: the reason a post is missing is not disclosed
        let message = match self {
            AppError::NotFound(_) => "Not found".to_string(),
            _ => "Internal server error".to_string(),
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "template": self.template().name(),
        }))
    }
}
