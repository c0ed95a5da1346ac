//! Template overlay loading
//!
//! Overlays are referenced by the path in the template definition and
//! resolved either against a local directory or an HTTP origin.

use std::future::Future;
use std::path::PathBuf;

use image::RgbaImage;

use super::error::{BoothError, Result};

/// Loads template overlay images
pub trait AssetLoader: Send + Sync {
    fn load(&self, path: &str) -> impl Future<Output = Result<RgbaImage>> + Send;
}

fn decode(path: &str, bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| BoothError::Asset {
            path: path.to_string(),
            reason: e.to_string(),
        })
}

/// Resolves overlay paths against a directory (usually the server's `public/`)
#[derive(Debug, Clone)]
pub struct DirAssetLoader {
    root: PathBuf,
}

impl DirAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetLoader for DirAssetLoader {
    async fn load(&self, path: &str) -> Result<RgbaImage> {
        let full = self.root.join(path.trim_start_matches('/'));
        let bytes = tokio::fs::read(&full).await.map_err(|e| BoothError::Asset {
            path: full.display().to_string(),
            reason: e.to_string(),
        })?;
        decode(path, &bytes)
    }
}

/// Fetches overlays over HTTP relative to a base URL
#[derive(Debug, Clone)]
pub struct HttpAssetLoader {
    client: reqwest::Client,
    base: String,
}

impl HttpAssetLoader {
    pub fn new(client: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.base.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        }
    }
}

impl AssetLoader for HttpAssetLoader {
    async fn load(&self, path: &str) -> Result<RgbaImage> {
        let url = self.url_for(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| BoothError::Asset {
                path: url.clone(),
                reason: e.to_string(),
            })?;
        let bytes = response.bytes().await.map_err(|e| BoothError::Asset {
            path: url.clone(),
            reason: e.to_string(),
        })?;
        decode(&url, &bytes)
    }
}

/// Load an overlay, logging and swallowing failures
pub async fn load_overlay<L: AssetLoader>(loader: &L, path: &str) -> Option<RgbaImage> {
    match loader.load(path).await {
        Ok(img) => {
            tracing::debug!(path, width = img.width(), height = img.height(), "Overlay loaded");
            Some(img)
        }
        Err(e) => {
            tracing::warn!(path, error = %e, "Template image failed to load, continuing without it");
            None
        }
    }
}
