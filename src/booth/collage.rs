//! Collage compositing
//!
//! Shots are drawn into their template slots first, the template overlay
//! goes on top, so opaque overlay pixels always win.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use super::assets::{load_overlay, AssetLoader};
use super::error::{BoothError, Result};
use crate::settings::{BoothConfig, CaptureSettings, Template};

/// Draw shots and overlay onto a fresh transparent canvas of the template's size.
/// Shots without a matching slot are skipped.
pub fn compose(
    template: &Template,
    shots: &[RgbaImage],
    capture: &CaptureSettings,
    overlay: Option<&RgbaImage>,
) -> RgbaImage {
    let mut canvas = RgbaImage::new(template.width, template.height);

    for (shot, slot) in shots.iter().zip(&template.slots) {
        if shot.dimensions() == (capture.photo_width, capture.photo_height) {
            imageops::overlay(&mut canvas, shot, slot.x, slot.y);
        } else {
            let scaled = imageops::resize(
                shot,
                capture.photo_width,
                capture.photo_height,
                FilterType::Triangle,
            );
            imageops::overlay(&mut canvas, &scaled, slot.x, slot.y);
        }
    }

    if let Some(overlay) = overlay {
        if overlay.dimensions() == (template.width, template.height) {
            imageops::overlay(&mut canvas, overlay, 0, 0);
        } else {
            let scaled = imageops::resize(overlay, template.width, template.height, FilterType::Triangle);
            imageops::overlay(&mut canvas, &scaled, 0, 0);
        }
    }

    canvas
}

/// Build the final collage for a confirmed template.
///
/// Fails unless every configured shot has been captured. A missing overlay
/// image is logged and the collage is produced without it.
pub async fn build_collage<L: AssetLoader>(
    config: &BoothConfig,
    template_index: usize,
    shots: &[RgbaImage],
    loader: &L,
) -> Result<RgbaImage> {
    let template = config
        .templates
        .get(template_index)
        .ok_or(BoothError::InvalidTemplate(template_index))?;

    let total = config.capture.total_shots;
    if shots.len() != total {
        return Err(BoothError::CaptureIncomplete {
            captured: shots.len(),
            total,
        });
    }

    tracing::info!(template = %template.name, shots = shots.len(), "Building collage");
    let overlay = load_overlay(loader, &template.file).await;
    let collage = compose(template, shots, &config.capture, overlay.as_ref());
    tracing::info!(
        width = collage.width(),
        height = collage.height(),
        overlay = overlay.is_some(),
        "Collage done"
    );
    Ok(collage)
}
