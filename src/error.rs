use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

/// Request failures that are answered with an HTTP error status.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0} not set")]
    ConfigMissing(&'static str),

    #[error("push failed")]
    Upstream(anyhow::Error),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid request body")]
    InvalidBody(#[source] serde_json::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::ConfigMissing(_) | Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match &self {
            Self::Upstream(e) => error!("push error: {:#}", e),
            Self::InvalidBody(e) => error!("webhook body rejected: {}", e),
            _ => {}
        }
        (self.status(), self.to_string()).into_response()
    }
}
