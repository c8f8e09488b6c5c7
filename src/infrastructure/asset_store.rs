//! Asset store adapter - remote uploads with a local media-dir fallback
//!
//! Implements both storage ports: binary asset uploads and the experience
//! JSON handoff. When no store URL is configured, every upload reports
//! `NotConfigured` and callers use the local fallback path; a failed local
//! write is logged and the path returned anyway, keeping the fallback
//! contract infallible.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::application::ports::outbound::{
    AssetStoreError, AssetStorePort, ExperienceStoreError, ExperienceStorePort,
};
use crate::domain::value_objects::StoryExperience;

/// HTTP asset store client plus local media directory
pub struct HttpAssetStore {
    client: Client,
    base_url: Option<String>,
    media_dir: PathBuf,
}

impl HttpAssetStore {
    pub fn new(base_url: Option<String>, media_dir: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
            media_dir: PathBuf::from(media_dir),
        }
    }

    fn local_path(&self, name: &str) -> PathBuf {
        self.media_dir.join(name)
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

#[async_trait]
impl AssetStorePort for HttpAssetStore {
    async fn upload(
        &self,
        bytes: &[u8],
        content_type: &str,
        name: &str,
    ) -> Result<String, AssetStoreError> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or(AssetStoreError::NotConfigured)?;

        let response = self
            .client
            .post(format!("{base_url}/assets"))
            .query(&[("name", name)])
            .header("content-type", content_type)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| AssetStoreError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AssetStoreError::Rejected(format!("{status}: {body}")));
        }

        let upload: UploadResponse = response
            .json()
            .await
            .map_err(|e| AssetStoreError::Upload(e.to_string()))?;
        Ok(upload.url)
    }

    async fn store_local(&self, bytes: &[u8], name: &str) -> String {
        let path = self.local_path(name);
        if let Err(error) = write_media_file(&path, bytes).await {
            tracing::warn!(
                path = %path.display(),
                error = %error,
                "failed to write local media file"
            );
        }
        format!("file://{}", path.display())
    }
}

async fn write_media_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}

#[async_trait]
impl ExperienceStorePort for HttpAssetStore {
    async fn save(&self, experience: &StoryExperience) -> Result<(), ExperienceStoreError> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or(ExperienceStoreError::NotConfigured)?;

        let response = self
            .client
            .post(format!("{base_url}/experiences"))
            .json(experience)
            .send()
            .await
            .map_err(|e| ExperienceStoreError::Store(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExperienceStoreError::Store(format!("{status}: {body}")));
        }

        Ok(())
    }
}
