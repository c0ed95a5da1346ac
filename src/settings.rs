//! Settings management for the photobooth
//!
//! Handles loading of the kiosk `config.json` document (capture geometry,
//! countdown timing, collage templates, upload target) and the upload
//! server's own settings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Per-file upload limit enforced by the server (10 MiB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Largest photo or template edge accepted, in pixels
pub const MAX_IMAGE_EDGE: u32 = 8192;

/// Largest requested QR edge, in pixels
pub const MAX_QR_SIZE: u32 = 4096;

/// Largest QR quiet zone, in modules
pub const MAX_QR_MARGIN: u32 = 64;

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to fetch config: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Capture geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Width of each cropped shot, also the width shots are drawn at in a slot
    #[serde(rename = "photoWidth", default = "default_photo_width")]
    pub photo_width: u32,

    /// Height of each cropped shot
    #[serde(rename = "photoHeight", default = "default_photo_height")]
    pub photo_height: u32,

    /// Shots per session
    #[serde(rename = "totalShots", default = "default_total_shots")]
    pub total_shots: usize,
}

impl CaptureSettings {
    /// Width / height of the target crop
    pub fn aspect(&self) -> f64 {
        self.photo_width as f64 / self.photo_height as f64
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            photo_width: default_photo_width(),
            photo_height: default_photo_height(),
            total_shots: default_total_shots(),
        }
    }
}

/// Countdown timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountdownSettings {
    /// First number shown when a countdown starts
    #[serde(default = "default_countdown_seconds")]
    pub seconds: u32,

    /// Interval between countdown ticks in milliseconds
    #[serde(rename = "stepMs", default = "default_step_ms")]
    pub step_ms: u64,
}

impl Default for CountdownSettings {
    fn default() -> Self {
        Self {
            seconds: default_countdown_seconds(),
            step_ms: default_step_ms(),
        }
    }
}

/// Position inside a template where a shot is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub x: i64,
    pub y: i64,
}

/// A collage layout: overlay image plus the slots shots are drawn into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    /// Overlay image, resolved by the asset loader
    pub file: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

/// QR rendering options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrSettings {
    /// Minimum rendered edge length in pixels
    #[serde(default = "default_qr_size")]
    pub size: u32,
    /// Quiet zone, in modules
    #[serde(default = "default_qr_margin")]
    pub margin: u32,
}

impl Default for QrSettings {
    fn default() -> Self {
        Self {
            size: default_qr_size(),
            margin: default_qr_margin(),
        }
    }
}

/// Kiosk configuration document (`config.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoothConfig {
    /// Title shown by the kiosk front-end
    #[serde(rename = "siteName", default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,

    #[serde(default)]
    pub capture: CaptureSettings,

    #[serde(default)]
    pub countdown: CountdownSettings,

    #[serde(default)]
    pub templates: Vec<Template>,

    /// Upload endpoint, absolute or relative to the config origin
    #[serde(rename = "saveApiUrl", default = "default_save_api_url")]
    pub save_api_url: String,

    /// Base used to turn a relative collage path into an absolute link
    #[serde(rename = "publicBaseUrl", default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,

    #[serde(default)]
    pub qr: QrSettings,
}

fn default_photo_width() -> u32 {
    600
}

fn default_photo_height() -> u32 {
    400
}

fn default_total_shots() -> usize {
    3
}

fn default_countdown_seconds() -> u32 {
    3
}

fn default_step_ms() -> u64 {
    500
}

fn default_save_api_url() -> String {
    "/api/save".to_string()
}

fn default_qr_size() -> u32 {
    300
}

fn default_qr_margin() -> u32 {
    4
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            site_name: None,
            capture: CaptureSettings::default(),
            countdown: CountdownSettings::default(),
            templates: Vec::new(),
            save_api_url: default_save_api_url(),
            public_base_url: None,
            qr: QrSettings::default(),
        }
    }
}

impl BoothConfig {
    /// Parse and validate a config document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config from a local file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        tracing::info!(path = %path.display(), templates = config.templates.len(), "Loaded booth config");
        Ok(config)
    }

    /// Fetch the config document over HTTP
    pub async fn fetch(url: &str) -> Result<Self, ConfigError> {
        let response = reqwest::get(url).await?.error_for_status()?;
        let body = response.text().await?;
        let config = Self::from_json(&body)?;
        tracing::info!(url = %url, templates = config.templates.len(), "Fetched booth config");
        Ok(config)
    }

    /// Reject documents the capture pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.photo_width == 0 || self.capture.photo_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "photo size must be non-zero, got {}x{}",
                self.capture.photo_width, self.capture.photo_height
            )));
        }
        if self.capture.photo_width > MAX_IMAGE_EDGE || self.capture.photo_height > MAX_IMAGE_EDGE {
            return Err(ConfigError::Invalid(format!(
                "photo size {}x{} exceeds {} px",
                self.capture.photo_width, self.capture.photo_height, MAX_IMAGE_EDGE
            )));
        }
        if self.capture.total_shots == 0 {
            return Err(ConfigError::Invalid("totalShots must be at least 1".to_string()));
        }
        if self.countdown.step_ms == 0 {
            return Err(ConfigError::Invalid("countdown.stepMs must be at least 1".to_string()));
        }
        if self.qr.size == 0 || self.qr.size > MAX_QR_SIZE {
            return Err(ConfigError::Invalid(format!(
                "qr.size must be between 1 and {}, got {}",
                MAX_QR_SIZE, self.qr.size
            )));
        }
        if self.qr.margin > MAX_QR_MARGIN {
            return Err(ConfigError::Invalid(format!(
                "qr.margin must be at most {}, got {}",
                MAX_QR_MARGIN, self.qr.margin
            )));
        }
        for (index, template) in self.templates.iter().enumerate() {
            if template.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("template {} has no name", index)));
            }
            if template.file.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "template '{}' has no overlay file",
                    template.name
                )));
            }
            if template.width == 0 || template.height == 0 {
                return Err(ConfigError::Invalid(format!(
                    "template '{}' has zero size {}x{}",
                    template.name, template.width, template.height
                )));
            }
            if template.width > MAX_IMAGE_EDGE || template.height > MAX_IMAGE_EDGE {
                return Err(ConfigError::Invalid(format!(
                    "template '{}' size {}x{} exceeds {} px",
                    template.name, template.width, template.height, MAX_IMAGE_EDGE
                )));
            }
        }
        Ok(())
    }

    /// Title for the kiosk window, falling back to the crate name
    pub fn title(&self) -> &str {
        self.site_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Photobooth")
    }
}

/// Upload server settings
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Listen port (`PORT`, default 3000)
    pub port: u16,
    /// Root of `raw/` and `collage/`, served under `/photos`
    pub photos_dir: PathBuf,
    /// Kiosk front-end and `config.json`
    pub public_dir: PathBuf,
    /// Per-file limit in bytes
    pub max_file_bytes: usize,
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            photos_dir: PathBuf::from("photos"),
            public_dir: PathBuf::from("public"),
            max_file_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerSettings {
    /// Defaults with the port taken from `PORT`
    pub fn from_env() -> Self {
        let port = match std::env::var("PORT") {
            Ok(value) => Self::parse_port(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "Ignoring invalid PORT, using default");
                default_port()
            }),
            Err(_) => default_port(),
        };
        Self {
            port,
            ..Self::default()
        }
    }

    fn parse_port(value: &str) -> Option<u16> {
        value.trim().parse().ok()
    }
}
