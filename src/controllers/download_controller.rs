use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{AppState, error::AppError, services::workbook_writer::XLSX_MIME};

// GET /download
pub async fn get_download(State(state): State<AppState>) -> Response {
    // held so a concurrent webhook cannot rewrite the file mid-read
    let writer = state.workbook.lock().await;
    let path = writer.path().to_path_buf();

    if !path.exists() {
        return AppError::WorkbookMissing.into_response();
    }

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!("failed to read {}: {e}", path.display());
            return AppError::Internal(e.to_string()).into_response();
        }
    };
    drop(writer);

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook.xlsx".to_string());

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
