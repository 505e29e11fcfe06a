use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

// refresh a minute before Google says the token expires
const TOKEN_SLACK: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("credentials: {0}")]
    Credentials(String),

    #[error("token exchange failed: {0}")]
    Auth(String),

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("drive api returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// The slice of the Drive v3 API the uploader needs.
#[async_trait]
pub trait DriveApi: Send + Sync {
    async fn find_folder(&self, name: &str) -> Result<Option<String>, DriveError>;

    async fn create_folder(&self, name: &str) -> Result<String, DriveError>;

    async fn find_file(&self, name: &str, folder_id: &str) -> Result<Option<String>, DriveError>;

    async fn create_file(
        &self,
        name: &str,
        folder_id: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DriveError>;

    async fn update_file(&self, file_id: &str, mime: &str, bytes: Vec<u8>) -> Result<String, DriveError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, DriveError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DriveError::Credentials(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, DriveError> {
        serde_json::from_str(raw).map_err(|e| DriveError::Credentials(e.to_string()))
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Deserialize)]
struct FileRef {
    id: String,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Escape a value for use inside a single-quoted Drive query literal.
pub fn quote_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

pub struct GoogleDriveClient {
    http: Client,
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleDriveClient {
    pub fn new(key: ServiceAccountKey) -> Result<Self, DriveError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| DriveError::Credentials(format!("private_key: {e}")))?;

        Ok(Self {
            http: Client::new(),
            key,
            signing_key,
            token: Mutex::new(None),
        })
    }

    pub fn from_credentials_file(path: &Path) -> Result<Self, DriveError> {
        Self::new(ServiceAccountKey::from_file(path)?)
    }

    async fn access_token(&self) -> Result<String, DriveError> {
        let mut cached = self.token.lock().await;
        if let Some(t) = cached.as_ref()
            && Instant::now() < t.expires_at
        {
            return Ok(t.value.clone());
        }

        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: DRIVE_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| DriveError::Auth(e.to_string()))?;

        let res = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(DriveError::Auth(format!("{status} {body}")));
        }

        let token = res.json::<TokenResponse>().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_SLACK);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }

    async fn check(res: reqwest::Response) -> Result<reqwest::Response, DriveError> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        Err(DriveError::Api { status, body })
    }

    async fn first_match(&self, query: String) -> Result<Option<String>, DriveError> {
        let token = self.access_token().await?;
        let res = self
            .http
            .get(FILES_URL)
            .bearer_auth(token)
            .query(&[("q", query.as_str()), ("fields", "files(id, name)")])
            .send()
            .await?;

        let list = Self::check(res).await?.json::<FileList>().await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn create_metadata(&self, body: serde_json::Value) -> Result<String, DriveError> {
        let token = self.access_token().await?;
        let res = self
            .http
            .post(FILES_URL)
            .bearer_auth(token)
            .query(&[("fields", "id")])
            .json(&body)
            .send()
            .await?;

        Ok(Self::check(res).await?.json::<FileRef>().await?.id)
    }
}

#[async_trait]
impl DriveApi for GoogleDriveClient {
    async fn find_folder(&self, name: &str) -> Result<Option<String>, DriveError> {
        let q = format!(
            "name='{}' and mimeType='{FOLDER_MIME}' and trashed=false",
            quote_query(name)
        );
        self.first_match(q).await
    }

    async fn create_folder(&self, name: &str) -> Result<String, DriveError> {
        self.create_metadata(json!({ "name": name, "mimeType": FOLDER_MIME }))
            .await
    }

    async fn find_file(&self, name: &str, folder_id: &str) -> Result<Option<String>, DriveError> {
        let q = format!(
            "name='{}' and '{}' in parents and trashed=false",
            quote_query(name),
            quote_query(folder_id)
        );
        self.first_match(q).await
    }

    async fn create_file(
        &self,
        name: &str,
        folder_id: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DriveError> {
        let id = self
            .create_metadata(json!({ "name": name, "parents": [folder_id], "mimeType": mime }))
            .await?;
        self.update_file(&id, mime, bytes).await
    }

    async fn update_file(&self, file_id: &str, mime: &str, bytes: Vec<u8>) -> Result<String, DriveError> {
        let token = self.access_token().await?;
        let res = self
            .http
            .patch(format!("{UPLOAD_URL}/{file_id}"))
            .bearer_auth(token)
            .query(&[("uploadType", "media"), ("fields", "id")])
            .header(reqwest::header::CONTENT_TYPE, mime)
            .body(bytes)
            .send()
            .await?;

        Ok(Self::check(res).await?.json::<FileRef>().await?.id)
    }
}
