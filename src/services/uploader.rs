use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::drive::{DriveApi, DriveError, GoogleDriveClient};
use super::workbook_writer::XLSX_MIME;
use crate::config::Settings;

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Created { file_id: String },
    Updated { file_id: String },

    // uploads unavailable, nothing attempted
    Skipped { reason: String },

    // attempted and failed
    Failed { reason: String },
}

/// Best-effort sync of the workbook to a Drive folder.
///
/// Holds no client at all when uploads are disabled or the credentials could
/// not be loaded; every call then reports [`UploadOutcome::Skipped`].
pub struct DriveUploader {
    api: Option<Arc<dyn DriveApi>>,
    unavailable_reason: String,
    folder_name: String,
    folder_id: Mutex<Option<String>>,
    file_ids: Mutex<HashMap<String, String>>,
}

impl DriveUploader {
    pub fn new(api: Arc<dyn DriveApi>, folder_name: impl Into<String>) -> Self {
        Self {
            api: Some(api),
            unavailable_reason: String::new(),
            folder_name: folder_name.into(),
            folder_id: Mutex::new(None),
            file_ids: Mutex::new(HashMap::new()),
        }
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            api: None,
            unavailable_reason: reason.into(),
            folder_name: String::new(),
            folder_id: Mutex::new(None),
            file_ids: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        if !settings.drive_enabled {
            return Self::disabled("Google Drive disabled by configuration");
        }

        let path = &settings.drive_credentials_file;
        if !path.exists() {
            tracing::warn!("{} not found. Google Drive disabled.", path.display());
            return Self::disabled(format!("{} not found", path.display()));
        }

        match GoogleDriveClient::from_credentials_file(path) {
            Ok(client) => {
                tracing::info!("Google Drive API initialized");
                Self::new(Arc::new(client), settings.drive_folder_name.clone())
            }
            Err(e) => {
                tracing::warn!("error initializing Google Drive: {e}");
                Self::disabled(e.to_string())
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.api.is_some()
    }

    /// Id recorded for `file_name` by the last successful upload.
    pub async fn known_file_id(&self, file_name: &str) -> Option<String> {
        self.file_ids.lock().await.get(file_name).cloned()
    }

    /// Find or create the target folder; the id is cached for the process lifetime.
    pub async fn ensure_folder(&self, api: &dyn DriveApi) -> Result<String, DriveError> {
        let mut cached = self.folder_id.lock().await;
        if let Some(id) = cached.as_ref() {
            return Ok(id.clone());
        }

        let id = match api.find_folder(&self.folder_name).await? {
            Some(id) => {
                tracing::info!("found existing folder: {}", self.folder_name);
                id
            }
            None => {
                let id = api.create_folder(&self.folder_name).await?;
                tracing::info!("created new folder: {}", self.folder_name);
                id
            }
        };

        *cached = Some(id.clone());
        Ok(id)
    }

    async fn try_upload(&self, api: &dyn DriveApi, file_name: &str, bytes: Vec<u8>) -> Result<UploadOutcome, DriveError> {
        let folder_id = self.ensure_folder(api).await?;

        let outcome = match api.find_file(file_name, &folder_id).await? {
            Some(existing) => {
                let file_id = api.update_file(&existing, XLSX_MIME, bytes).await?;
                UploadOutcome::Updated { file_id }
            }
            None => {
                let file_id = api.create_file(file_name, &folder_id, XLSX_MIME, bytes).await?;
                UploadOutcome::Created { file_id }
            }
        };

        if let UploadOutcome::Created { file_id } | UploadOutcome::Updated { file_id } = &outcome {
            self.file_ids
                .lock()
                .await
                .insert(file_name.to_string(), file_id.clone());
        }
        Ok(outcome)
    }

    /// Create or replace `file_name` in the folder. Never fails the caller.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> UploadOutcome {
        let Some(api) = self.api.as_deref() else {
            return UploadOutcome::Skipped {
                reason: self.unavailable_reason.clone(),
            };
        };

        match self.try_upload(api, file_name, bytes).await {
            Ok(outcome) => {
                match &outcome {
                    UploadOutcome::Created { .. } => tracing::info!("uploaded new file to Google Drive: {file_name}"),
                    UploadOutcome::Updated { .. } => tracing::info!("updated file in Google Drive: {file_name}"),
                    _ => {}
                }
                outcome
            }
            Err(e) => {
                tracing::error!("error uploading {file_name} to Google Drive: {e}");
                UploadOutcome::Failed { reason: e.to_string() }
            }
        }
    }
}
