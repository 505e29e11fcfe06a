use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chartink_bridge::services::{
    drive::{DriveApi, DriveError},
    uploader::{DriveUploader, UploadOutcome},
};

#[derive(Default)]
struct FakeDrive {
    folders: Mutex<HashMap<String, String>>,
    // (name, folder) -> (id, contents)
    files: Mutex<HashMap<(String, String), (String, Vec<u8>)>>,
    calls: Mutex<Vec<String>>,
    fail_uploads: bool,
}

impl FakeDrive {
    fn log(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DriveApi for FakeDrive {
    async fn find_folder(&self, name: &str) -> Result<Option<String>, DriveError> {
        self.log("find_folder");
        Ok(self.folders.lock().unwrap().get(name).cloned())
    }

    async fn create_folder(&self, name: &str) -> Result<String, DriveError> {
        self.log("create_folder");
        let id = format!("folder-{name}");
        self.folders.lock().unwrap().insert(name.to_string(), id.clone());
        Ok(id)
    }

    async fn find_file(&self, name: &str, folder_id: &str) -> Result<Option<String>, DriveError> {
        self.log("find_file");
        let files = self.files.lock().unwrap();
        Ok(files
            .get(&(name.to_string(), folder_id.to_string()))
            .map(|(id, _)| id.clone()))
    }

    async fn create_file(
        &self,
        name: &str,
        folder_id: &str,
        _mime: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DriveError> {
        self.log("create_file");
        if self.fail_uploads {
            return Err(DriveError::Api { status: 403, body: "quota".into() });
        }
        let id = format!("file-{name}");
        self.files
            .lock()
            .unwrap()
            .insert((name.to_string(), folder_id.to_string()), (id.clone(), bytes));
        Ok(id)
    }

    async fn update_file(&self, file_id: &str, _mime: &str, bytes: Vec<u8>) -> Result<String, DriveError> {
        self.log("update_file");
        let mut files = self.files.lock().unwrap();
        for (id, contents) in files.values_mut() {
            if id == file_id {
                *contents = bytes;
                return Ok(id.clone());
            }
        }
        Err(DriveError::Api { status: 404, body: "missing".into() })
    }
}

#[tokio::test]
async fn disabled_uploader_skips() {
    let uploader = DriveUploader::disabled("credentials.json not found");
    assert!(!uploader.is_available());

    let outcome = uploader.upload("Chartink_Workflow.xlsx", vec![1, 2, 3]).await;
    assert_eq!(
        outcome,
        UploadOutcome::Skipped { reason: "credentials.json not found".into() }
    );
}

#[tokio::test]
async fn first_upload_creates_folder_and_file() {
    let drive = Arc::new(FakeDrive::default());
    let uploader = DriveUploader::new(drive.clone(), "Chartink_Data");

    let outcome = uploader.upload("Chartink_Workflow.xlsx", b"v1".to_vec()).await;
    assert_eq!(
        outcome,
        UploadOutcome::Created { file_id: "file-Chartink_Workflow.xlsx".into() }
    );
    assert_eq!(
        drive.calls(),
        vec!["find_folder", "create_folder", "find_file", "create_file"]
    );
    assert_eq!(
        uploader.known_file_id("Chartink_Workflow.xlsx").await,
        Some("file-Chartink_Workflow.xlsx".into())
    );
}

#[tokio::test]
async fn second_upload_replaces_content_and_reuses_folder() {
    let drive = Arc::new(FakeDrive::default());
    let uploader = DriveUploader::new(drive.clone(), "Chartink_Data");

    uploader.upload("Chartink_Workflow.xlsx", b"v1".to_vec()).await;
    let outcome = uploader.upload("Chartink_Workflow.xlsx", b"v2".to_vec()).await;

    assert_eq!(
        outcome,
        UploadOutcome::Updated { file_id: "file-Chartink_Workflow.xlsx".into() }
    );
    // folder id is cached after the first call
    assert_eq!(
        drive.calls(),
        vec!["find_folder", "create_folder", "find_file", "create_file", "find_file", "update_file"]
    );

    let files = drive.files.lock().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files.values().next().unwrap().1, b"v2".to_vec());
}

#[tokio::test]
async fn existing_folder_is_found_not_created() {
    let drive = Arc::new(FakeDrive::default());
    drive
        .folders
        .lock()
        .unwrap()
        .insert("Chartink_Data".into(), "abc123".into());
    let uploader = DriveUploader::new(drive.clone(), "Chartink_Data");

    let folder = uploader.ensure_folder(drive.as_ref()).await.unwrap();
    assert_eq!(folder, "abc123");
    assert_eq!(drive.calls(), vec!["find_folder"]);
}

#[tokio::test]
async fn remote_failure_degrades_to_failed_outcome() {
    let drive = Arc::new(FakeDrive {
        fail_uploads: true,
        ..FakeDrive::default()
    });
    let uploader = DriveUploader::new(drive.clone(), "Chartink_Data");

    let outcome = uploader.upload("Chartink_Workflow.xlsx", b"v1".to_vec()).await;
    assert!(matches!(outcome, UploadOutcome::Failed { ref reason } if reason.contains("403")));
    assert_eq!(uploader.known_file_id("Chartink_Workflow.xlsx").await, None);
}
