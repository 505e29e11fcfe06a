//! Library entrypoint for the Chartink webhook bridge.
//!
//! Split from `main.rs` so integration tests under `tests/` can build the
//! router and state directly.

use std::sync::Arc;

use tokio::sync::Mutex;

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub mod controllers;
pub mod routes;

use services::{uploader::DriveUploader, workbook_writer::WorkbookWriter};

#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub workbook: Arc<Mutex<WorkbookWriter>>,
    pub uploader: Arc<DriveUploader>,
}

impl AppState {
    pub fn new(settings: config::Settings, uploader: DriveUploader) -> Self {
        let workbook = WorkbookWriter::open(settings.workbook_path.clone());
        Self {
            settings,
            workbook: Arc::new(Mutex::new(workbook)),
            uploader: Arc::new(uploader),
        }
    }

    pub fn from_settings(settings: config::Settings) -> Self {
        let uploader = DriveUploader::from_settings(&settings);
        Self::new(settings, uploader)
    }
}
