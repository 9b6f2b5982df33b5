//! Uploads certificates and brochures to object storage.

use std::path::Path;

use chrono::Utc;

use crate::config::StorageConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::models::DocumentKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub url: String,
}

pub struct BlobStorage {
    client: reqwest::Client,
    config: StorageConfig,
}

impl BlobStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub async fn upload(&self, path: &Path, kind: DocumentKind) -> TrackerResult<UploadedDocument> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| TrackerError::Upload(format!("not a file: {}", path.display())))?;
        let bytes = tokio::fs::read(path).await?;
        let object = object_name(kind, Utc::now().timestamp_millis(), file_name);

        let response = self
            .client
            .post(format!(
                "{}/storage/v1/object/{}/{}",
                self.config.base_url, self.config.bucket, object
            ))
            .bearer_auth(&self.config.api_key)
            .header("apikey", &self.config.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type(file_name))
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, object = %object, "document upload rejected");
            return Err(TrackerError::Upload(format!("{status}: {body}")));
        }

        tracing::info!(object = %object, "document uploaded");
        Ok(UploadedDocument {
            url: public_url(&self.config, &object),
        })
    }
}

fn object_name(kind: DocumentKind, millis: i64, file_name: &str) -> String {
    let file_name: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    format!("{}-{millis}-{file_name}", kind.folder())
}

fn public_url(config: &StorageConfig, object: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}",
        config.base_url, config.bucket, object
    )
}

fn content_type(file_name: &str) -> &'static str {
    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
