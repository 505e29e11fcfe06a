use axum::{
    Json,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::models::ApiResponse;

pub async fn home() -> impl IntoResponse {
    Json(json!({
        "status": "online",
        "service": "Chartink Webhook Server",
        "endpoints": {
            "webhook": "/webhook (POST) - Receive Chartink alerts",
            "download": "/download (GET) - Download Excel file"
        }
    }))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ApiResponse::error("Not found")))
}
