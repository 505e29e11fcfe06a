use serde_json::Value;

use crate::{
    AppState,
    error::AppError,
    models::ApiResponse,
    services::{normalizer, uploader::UploadOutcome},
};

/// Normalize the alert, write it as the next iteration and sync the workbook.
///
/// The workbook lock is held until the upload finishes, so concurrent
/// deliveries are processed one at a time in arrival order.
pub async fn process_alert(state: &AppState, payload: &Value) -> Result<ApiResponse, AppError> {
    tracing::info!("received chartink alert");
    tracing::debug!("raw alert: {payload}");

    let alert = normalizer::normalize(payload);
    if alert.symbols.is_empty() {
        tracing::error!("no stocks found in alert");
        return Err(AppError::NoStocks);
    }
    tracing::info!("extracted {} stocks: {}", alert.symbols.len(), alert.symbols.join(", "));

    let mut guard = state.workbook.clone().lock_owned().await;
    let (guard, written) = tokio::task::spawn_blocking(move || {
        let written = guard.append_alert(&alert).map(|w| (w, alert.symbols));
        (guard, written)
    })
    .await?;
    let (written, symbols) = written?;

    let file_name = guard
        .path()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook.xlsx".to_string());

    match state.uploader.upload(&file_name, written.bytes).await {
        UploadOutcome::Skipped { reason } => tracing::debug!("upload skipped: {reason}"),
        UploadOutcome::Failed { reason } => tracing::warn!("upload failed, alert still accepted: {reason}"),
        _ => {}
    }
    drop(guard);

    tracing::info!("processed alert: iteration {} ({} rows)", written.iteration, written.rows);
    Ok(ApiResponse::success(symbols, written.iteration))
}
