//! Session upload
//!
//! Raw shots and the collage are JPEG-encoded and posted to the save
//! endpoint as one multipart form.

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, RgbaImage};
use reqwest::multipart::{Form, Part};

use super::error::{BoothError, Result};
use crate::api::{SaveResponse, COLLAGE_FIELD};
use crate::settings::BoothConfig;

/// JPEG quality for every uploaded image
pub const JPEG_QUALITY: u8 = 90;

/// Encode to JPEG, flattening alpha onto black
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let flattened = RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let scale = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        Rgb([scale(r), scale(g), scale(b)])
    });

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(&flattened)?;
    Ok(bytes)
}

/// Join a possibly relative URL onto an origin
pub fn resolve_url(url: &str, origin: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else if url.starts_with('/') {
        format!("{}{}", origin.trim_end_matches('/'), url)
    } else {
        format!("{}/{}", origin.trim_end_matches('/'), url)
    }
}

/// Absolute link for the QR code: server-absolute URLs pass through, relative
/// paths are prefixed with the public base when set, else the kiosk origin
pub fn resolve_collage_url(collage_url: &str, public_base: Option<&str>, origin: &str) -> String {
    let base = public_base
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(origin);
    resolve_url(collage_url, base)
}

/// One encoded file of the upload form
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Encoded form contents, in submission order
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub parts: Vec<UploadPart>,
}

impl UploadPayload {
    /// Encode shots as `raw1..rawN` followed by `collage`
    pub fn encode(shots: &[RgbaImage], collage: &RgbaImage) -> Result<Self> {
        let mut parts = Vec::with_capacity(shots.len() + 1);
        for (i, shot) in shots.iter().enumerate() {
            let field = format!("raw{}", i + 1);
            parts.push(UploadPart {
                file_name: format!("{}.jpg", field),
                field,
                bytes: encode_jpeg(shot, JPEG_QUALITY)?,
            });
        }
        parts.push(UploadPart {
            field: COLLAGE_FIELD.to_string(),
            file_name: format!("{}.jpg", COLLAGE_FIELD),
            bytes: encode_jpeg(collage, JPEG_QUALITY)?,
        });
        Ok(Self { parts })
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.field.as_str()).collect()
    }

    fn into_form(self) -> Result<Form> {
        let mut form = Form::new();
        for part in self.parts {
            let file = Part::bytes(part.bytes)
                .file_name(part.file_name)
                .mime_str("image/jpeg")?;
            form = form.part(part.field, file);
        }
        Ok(form)
    }
}

/// Posts sessions to the configured save endpoint
#[derive(Debug, Clone)]
pub struct UploadClient {
    client: reqwest::Client,
    endpoint: String,
}

impl UploadClient {
    /// `origin` stands in for the page origin relative URLs are resolved against
    pub fn new(client: reqwest::Client, config: &BoothConfig, origin: &str) -> Self {
        Self {
            client,
            endpoint: resolve_url(&config.save_api_url, origin),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload one session. Returns the server's collage path, if it sent one.
    pub async fn upload(&self, payload: UploadPayload) -> Result<Option<String>> {
        tracing::info!(endpoint = %self.endpoint, fields = ?payload.field_names(), "Uploading session");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(payload.into_form()?)
            .send()
            .await?;

        let status = response.status();
        tracing::info!(status = %status, "Upload response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Upload failed");
            return Err(BoothError::UploadRejected {
                status: status.as_u16(),
                body,
            });
        }

        let saved: SaveResponse = response.json().await?;
        tracing::info!(session_id = %saved.session_id, "Saved session");
        if saved.collage_url.is_none() {
            tracing::warn!("No collageUrl in response");
        }
        Ok(saved.collage_url)
    }
}
