//! Photobooth Library
//!
//! A kiosk photobooth: countdown capture from a camera feed, templated
//! collages, and an upload server that hands results back via QR code.

pub mod api;
pub mod booth;
pub mod settings;
pub mod telemetry;

// Re-export commonly used types
pub use api::{run_server, PhotoStore, SaveResponse};
pub use booth::{BoothError, Photobooth, Screen, TemplateClick, TriggerOutcome};
pub use settings::{BoothConfig, ConfigError, ServerSettings, Template};
