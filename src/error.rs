use crate::adapters::transport::TransportError;
use crate::api::schemas::ingest::IngestResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Must have even byte slice")]
    InvalidEncoding,
    #[error("{0}")]
    Format(String),
    #[error("Mandatory field is empty")]
    Validation,
    #[error("No parser found for extension")]
    NoParserFound,
    #[error("Failed to read request body: {0}")]
    BodyRead(String),
    #[error("Invalid attachment encoding: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Failed to fetch roster: {0}")]
    Roster(#[source] TransportError),
    #[error("Failed to upload attachment: {0}")]
    Upload(#[source] TransportError),
    #[error("Failed to send message: {0}")]
    Send(#[source] TransportError),
    #[error("Too many batches in flight")]
    Busy,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Whether the error was raised before any resolution or send attempt.
    #[must_use]
    pub const fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidEncoding | Self::Format(_) | Self::Validation | Self::NoParserFound | Self::BodyRead(_)
        )
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        if self.is_parse_error() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else if matches!(self, Self::Busy) {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Error delivering batch");
        } else {
            tracing::warn!(error = %self, "Rejected batch");
        }

        (status, Json(IngestResponse::error(self.to_string()))).into_response()
    }
}
