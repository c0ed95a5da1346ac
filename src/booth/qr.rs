//! QR code for the result screen

use image::{Rgba, RgbaImage};
use qrcode::{Color, QrCode};

use crate::settings::QrSettings;

/// Module colour
pub const QR_DARK: Rgba<u8> = Rgba([0xFF, 0xFF, 0xFF, 0xFF]);
/// Background colour
pub const QR_LIGHT: Rgba<u8> = Rgba([0x2C, 0x2C, 0x2C, 0xFF]);

/// Pixels per module when `size` is too small to fit the code
const FALLBACK_SCALE: u32 = 4;

/// Refuse to allocate beyond this edge length
const MAX_EDGE: u32 = 8192;

#[derive(Debug, Clone)]
pub struct QrRenderer {
    size: u32,
    margin: u32,
}

impl QrRenderer {
    pub fn new(settings: &QrSettings) -> Self {
        Self {
            size: settings.size,
            margin: settings.margin,
        }
    }

    /// Render `url` as a square image. Returns `None` if the data cannot be
    /// encoded.
    pub fn render(&self, url: &str) -> Option<RgbaImage> {
        let code = match QrCode::new(url.as_bytes()) {
            Ok(code) => code,
            Err(e) => {
                tracing::error!(error = %e, "QR encoding failed");
                return None;
            }
        };

        let modules = code.width() as u32;
        let colors = code.to_colors();
        let total = modules.saturating_add(self.margin.saturating_mul(2));

        // Fill the requested size exactly when it fits, like a canvas `width`
        let edge = if self.size >= total {
            self.size
        } else {
            total.saturating_mul(FALLBACK_SCALE)
        };
        if edge > MAX_EDGE {
            tracing::error!(edge, "QR image too large, skipping");
            return None;
        }

        let image = RgbaImage::from_fn(edge, edge, |px, py| {
            let mx = (px as u64 * total as u64 / edge as u64) as u32;
            let my = (py as u64 * total as u64 / edge as u64) as u32;
            let inside = mx >= self.margin
                && my >= self.margin
                && mx < self.margin + modules
                && my < self.margin + modules;
            if inside {
                let index = ((my - self.margin) * modules + (mx - self.margin)) as usize;
                if colors[index] == Color::Dark {
                    return QR_DARK;
                }
            }
            QR_LIGHT
        });

        tracing::info!(url, edge, modules, "QR rendered");
        Some(image)
    }
}
