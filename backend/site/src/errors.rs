//! Application-wide error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use campaign_ledger::LedgerError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Too many open donation sessions")]
    SessionLimit,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SiteError>;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl SiteError {
    pub fn status(&self) -> StatusCode {
        match self {
            SiteError::Ledger(LedgerError::InvalidAmount) => StatusCode::UNPROCESSABLE_ENTITY,
            SiteError::Ledger(LedgerError::CampaignNotFound(_)) | SiteError::SessionNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SiteError::Ledger(
                LedgerError::InvalidTransition { .. } | LedgerError::CampaignClosed(_),
            ) => StatusCode::CONFLICT,
            SiteError::SessionLimit => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
