//! Per-kiosk session state
//!
//! One `Session` lives behind a mutex in [`super::Photobooth`]; the preview
//! renderer and the countdown task both read and mutate it.

use std::time::Instant;

use image::RgbaImage;

use super::selector::{TemplatePreview, TemplateSelection};

/// Which screen the kiosk is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Live preview, waiting for / running countdowns
    #[default]
    Idle,
    /// All shots taken, choosing a template
    TemplateSelect,
    /// Collage built, upload and QR
    Result,
}

/// Last captured frame, shown instead of the live preview until `until`
#[derive(Debug, Clone)]
pub struct FrozenFrame {
    pub image: RgbaImage,
    pub until: Instant,
}

#[derive(Debug, Default)]
pub struct Session {
    pub screen: Screen,
    /// Shots completed so far, 0..=total
    pub shot_index: usize,
    /// "", a digit string, or the smile cue
    pub countdown_text: String,
    pub frozen: Option<FrozenFrame>,
    /// Cropped, unmirrored shots in capture order
    pub shots: Vec<RgbaImage>,
    pub previews: Vec<TemplatePreview>,
    pub selection: TemplateSelection,
    pub collage: Option<RgbaImage>,
    pub qr: Option<RgbaImage>,
    pub collage_url: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_counting_down(&self) -> bool {
        !self.countdown_text.is_empty()
    }

    pub fn shots_remaining(&self, total: usize) -> bool {
        self.shot_index < total
    }

    /// Frozen frame, if its display window is still open at `now`
    pub fn frozen_at(&self, now: Instant) -> Option<&RgbaImage> {
        self.frozen
            .as_ref()
            .filter(|f| now < f.until)
            .map(|f| &f.image)
    }

    /// Forget captured shots so a fresh round can start from the idle screen
    pub fn reset_shots(&mut self) {
        self.shot_index = 0;
        self.shots.clear();
        self.frozen = None;
    }

    /// Full reset when leaving the result screen
    pub fn reset(&mut self) {
        self.reset_shots();
        self.countdown_text.clear();
        self.selection.clear();
        self.previews.clear();
        self.collage = None;
        self.qr = None;
        self.collage_url = None;
        self.screen = Screen::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_frozen_window() {
        let now = Instant::now();
        let mut session = Session::new();
        assert!(session.frozen_at(now).is_none());

        session.frozen = Some(FrozenFrame {
            image: RgbaImage::new(2, 2),
            until: now + Duration::from_millis(1000),
        });
        assert!(session.frozen_at(now).is_some());
        assert!(session.frozen_at(now + Duration::from_millis(999)).is_some());
        assert!(session.frozen_at(now + Duration::from_millis(1000)).is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = Session::new();
        session.screen = Screen::Result;
        session.shot_index = 3;
        session.countdown_text = "2".to_string();
        session.shots = vec![RgbaImage::new(1, 1); 3];
        session.qr = Some(RgbaImage::new(1, 1));
        session.collage_url = Some("http://x".to_string());

        session.reset();
        assert_eq!(session.screen, Screen::Idle);
        assert_eq!(session.shot_index, 0);
        assert!(!session.is_counting_down());
        assert!(session.shots.is_empty());
        assert!(session.qr.is_none());
        assert!(session.collage_url.is_none());

        // idempotent
        session.reset();
        assert_eq!(session.shot_index, 0);
    }
}
