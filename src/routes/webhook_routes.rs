use axum::{Router, routing::{get, post}};
use crate::{AppState, controllers::{download_controller, webhook_controller}};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/webhook", post(webhook_controller::post_webhook))
        .route("/download", get(download_controller::get_download))
}
