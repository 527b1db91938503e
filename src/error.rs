use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failures of calls against the image API, plus client-side form validation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Authentication failed: {}", detail_or(.0, "unauthorized"))]
    Auth(Option<String>),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {}", detail_or(.0, "already exists"))]
    Conflict(Option<String>),

    #[error("Not found: {}", detail_or(.0, "no such resource"))]
    NotFound(Option<String>),

    #[error("Server error {status}: {}", detail_or(.detail, "no detail"))]
    Server { status: u16, detail: Option<String> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response body from {status}: {source}")]
    Decode {
        status: u16,
        #[source]
        source: reqwest::Error,
    },
}

fn detail_or<'a>(detail: &'a Option<String>, fallback: &'a str) -> &'a str {
    detail.as_deref().unwrap_or(fallback)
}

impl ClientError {
    /// Message to show next to a form: the backend's own wording when it sent
    /// one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Auth(Some(msg))
            | ClientError::Conflict(Some(msg))
            | ClientError::NotFound(Some(msg))
            | ClientError::Server {
                detail: Some(msg), ..
            } => msg.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Upload error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Multipart(e) => {
                tracing::warn!("Multipart error: {}", e);
                (e.status(), "Could not read upload".to_string())
            }
        };

        (status, message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
