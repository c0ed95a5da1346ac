//! Camera preview and shot capture
//!
//! The live feed is shown mirrored (selfie view) while shots are stored
//! unmirrored and center-cropped to the configured photo aspect ratio.

use std::time::{Duration, Instant};

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::error::{BoothError, Result};
use super::session::{FrozenFrame, Session};
use crate::settings::CaptureSettings;

/// Width of the preview surface; height follows the stream's aspect ratio
pub const DISPLAY_WIDTH: u32 = 1000;

/// How long a just-captured frame replaces the live preview
pub const FREEZE_DURATION: Duration = Duration::from_millis(1000);

/// Prompt shown while idle with shots remaining
pub const PRESS_TO_START: &str = "PRESS TO START";

/// A provider of video frames (webcam, capture card, test pattern)
pub trait FrameSource: Send {
    /// Acquire the stream. Called once on activation.
    fn open(&mut self) -> Result<()>;

    /// Native frame size, `None` until the stream reports it
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// Latest frame, `None` when no frame is available yet
    fn frame(&mut self) -> Option<RgbaImage>;
}

/// Frame source that always yields the same image
#[derive(Debug, Clone)]
pub struct StillFrameSource {
    image: RgbaImage,
}

impl StillFrameSource {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }
}

impl FrameSource for StillFrameSource {
    fn open(&mut self) -> Result<()> {
        if self.image.width() == 0 || self.image.height() == 0 {
            return Err(BoothError::CameraUnavailable("empty still image".to_string()));
        }
        Ok(())
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        Some(self.image.dimensions())
    }

    fn frame(&mut self) -> Option<RgbaImage> {
        Some(self.image.clone())
    }
}

/// Source rectangle of a capture crop, in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest centered rectangle of the target aspect ratio inside the source
pub fn compute_crop(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> CropRect {
    let target_aspect = target_w as f64 / target_h as f64;
    let source_aspect = src_w as f64 / src_h as f64;

    if source_aspect > target_aspect {
        // Too wide: crop the sides
        let width = ((src_h as f64 * target_aspect).round() as u32).clamp(1, src_w);
        CropRect {
            x: (src_w - width) / 2,
            y: 0,
            width,
            height: src_h,
        }
    } else {
        // Too tall: crop top and bottom
        let height = ((src_w as f64 / target_aspect).round() as u32).clamp(1, src_h);
        CropRect {
            x: 0,
            y: (src_h - height) / 2,
            width: src_w,
            height,
        }
    }
}

/// Horizontal alignment of overlay text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// Vertical anchor of overlay text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBaseline {
    Top,
    Middle,
    Bottom,
}

/// Text the front-end draws over the preview
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayText {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_px: f32,
    /// White with this alpha
    pub alpha: f32,
    pub align: TextAlign,
    pub baseline: TextBaseline,
}

/// One rendered preview frame
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub image: RgbaImage,
    pub overlays: Vec<OverlayText>,
    pub frozen: bool,
}

/// Owns the frame source and the preview surface geometry
pub struct CameraCapture<S> {
    source: S,
    active: bool,
    display_width: u32,
    display_height: u32,
}

impl<S: FrameSource> CameraCapture<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            active: false,
            display_width: 0,
            display_height: 0,
        }
    }

    /// Acquire the stream and size the preview. Re-activating an active
    /// camera is a no-op.
    pub fn activate(&mut self) -> Result<()> {
        if self.active {
            tracing::debug!("Camera already active");
            return Ok(());
        }

        tracing::info!("Requesting camera");
        self.source.open()?;
        self.active = true;
        self.refresh_display_size();
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn display_size(&self) -> (u32, u32) {
        (self.display_width, self.display_height)
    }

    fn refresh_display_size(&mut self) {
        match self.source.dimensions() {
            Some((w, h)) if w > 0 && h > 0 => {
                let height = ((DISPLAY_WIDTH as f64 * h as f64 / w as f64).round() as u32).max(1);
                if (self.display_width, self.display_height) != (DISPLAY_WIDTH, height) {
                    tracing::info!(width = w, height = h, display_height = height, "Camera metadata");
                }
                self.display_width = DISPLAY_WIDTH;
                self.display_height = height;
            }
            _ => tracing::warn!("Video metadata not ready"),
        }
    }

    /// Live frame scaled to the preview surface and mirrored
    fn mirrored_preview(&mut self) -> Option<RgbaImage> {
        let frame = self.source.frame()?;
        if frame.width() == 0 || frame.height() == 0 {
            return None;
        }
        let mut scaled = imageops::resize(
            &frame,
            self.display_width,
            self.display_height,
            FilterType::Triangle,
        );
        imageops::flip_horizontal_in_place(&mut scaled);
        Some(scaled)
    }

    /// Render the preview for `now`
    pub fn render(&mut self, now: Instant, session: &Session, total_shots: usize) -> PreviewFrame {
        if self.active && self.display_width == 0 {
            self.refresh_display_size();
        }
        let (cw, ch) = (self.display_width, self.display_height);

        if cw == 0 || ch == 0 {
            return PreviewFrame {
                image: RgbaImage::new(cw, ch),
                overlays: Vec::new(),
                frozen: false,
            };
        }

        if let Some(frozen) = session.frozen_at(now) {
            let image = if frozen.dimensions() == (cw, ch) {
                frozen.clone()
            } else {
                imageops::resize(frozen, cw, ch, FilterType::Triangle)
            };
            return PreviewFrame {
                image,
                overlays: Vec::new(),
                frozen: true,
            };
        }

        let image = self
            .mirrored_preview()
            .unwrap_or_else(|| RgbaImage::from_pixel(cw, ch, Rgba([0, 0, 0, 255])));

        PreviewFrame {
            image,
            overlays: overlays_for(session, total_shots, cw as f32, ch as f32),
            frozen: false,
        }
    }

    /// Crop the current frame into a new shot and start the freeze preview
    pub fn capture_shot(
        &mut self,
        now: Instant,
        session: &mut Session,
        capture: &CaptureSettings,
    ) -> Result<()> {
        if session.shots.len() >= capture.total_shots {
            return Err(BoothError::ShotLimit {
                total: capture.total_shots,
            });
        }

        let frame = match self.source.frame() {
            Some(f) if f.width() > 0 && f.height() > 0 => f,
            _ => return Err(BoothError::FrameUnavailable),
        };

        let (target_w, target_h) = (capture.photo_width, capture.photo_height);
        let crop = compute_crop(frame.width(), frame.height(), target_w, target_h);
        let cropped = imageops::crop_imm(&frame, crop.x, crop.y, crop.width, crop.height).to_image();
        let shot = imageops::resize(&cropped, target_w, target_h, FilterType::Triangle);
        session.shots.push(shot);
        tracing::info!(total = session.shots.len(), ?crop, "Shot captured");

        let (cw, ch) = (self.display_width, self.display_height);
        if cw > 0 && ch > 0 {
            let mut freeze = imageops::resize(&frame, cw, ch, FilterType::Triangle);
            imageops::flip_horizontal_in_place(&mut freeze);
            session.frozen = Some(FrozenFrame {
                image: freeze,
                until: now + FREEZE_DURATION,
            });
        }

        Ok(())
    }
}

fn overlays_for(session: &Session, total_shots: usize, cw: f32, ch: f32) -> Vec<OverlayText> {
    let mut overlays = Vec::new();
    let shots_remaining = session.shots_remaining(total_shots);

    if shots_remaining {
        overlays.push(OverlayText {
            text: format!("{}/{}", session.shot_index + 1, total_shots),
            x: 40.0,
            y: 30.0,
            font_px: cw * 0.04,
            alpha: 0.85,
            align: TextAlign::Left,
            baseline: TextBaseline::Top,
        });
    }

    if session.is_counting_down() {
        overlays.push(OverlayText {
            text: session.countdown_text.clone(),
            x: cw / 2.0,
            y: ch / 2.0,
            font_px: cw * 0.2,
            alpha: 0.4,
            align: TextAlign::Center,
            baseline: TextBaseline::Middle,
        });
    } else if shots_remaining {
        overlays.push(OverlayText {
            text: PRESS_TO_START.to_string(),
            x: cw / 2.0,
            y: ch - 60.0,
            font_px: cw * 0.04,
            alpha: 0.7,
            align: TextAlign::Center,
            baseline: TextBaseline::Bottom,
        });
    }

    overlays
}
