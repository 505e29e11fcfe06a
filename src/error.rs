use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::ApiResponse;

/// Failures a webhook or download request can report back to the caller.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No data received")]
    EmptyPayload,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("No stocks found in alert")]
    NoStocks,

    #[error("{0}")]
    Workbook(String),

    #[error("Excel file not found")]
    WorkbookMissing,

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::EmptyPayload
            | AppError::InvalidPayload(_)
            | AppError::NoStocks
            | AppError::Workbook(_) => StatusCode::BAD_REQUEST,
            AppError::WorkbookMissing => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Workbook(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ApiResponse::error(self.to_string()))).into_response()
    }
}
