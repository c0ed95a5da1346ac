//! Template selection grid
//!
//! Every configured template gets a preview with the session's shots
//! already in place. Picking one takes two clicks: select, then confirm.

use futures_util::future::join_all;
use image::RgbaImage;

use super::assets::{load_overlay, AssetLoader};
use super::collage::compose;
use super::error::{BoothError, Result};
use crate::settings::BoothConfig;

/// Rendered grid entry
#[derive(Debug, Clone)]
pub struct TemplatePreview {
    pub index: usize,
    pub name: String,
    pub image: RgbaImage,
    pub overlay_loaded: bool,
}

/// Render a preview for every template. Overlay loads run concurrently and
/// individual failures only drop that overlay.
pub async fn render_previews<L: AssetLoader>(
    config: &BoothConfig,
    shots: &[RgbaImage],
    loader: &L,
) -> Vec<TemplatePreview> {
    tracing::info!(templates = config.templates.len(), "Populating template screen");

    let renders = config.templates.iter().enumerate().map(|(index, template)| async move {
        let overlay = load_overlay(loader, &template.file).await;
        TemplatePreview {
            index,
            name: template.name.clone(),
            image: compose(template, shots, &config.capture, overlay.as_ref()),
            overlay_loaded: overlay.is_some(),
        }
    });

    let previews = join_all(renders).await;
    tracing::info!("All templates rendered");
    previews
}

/// Result of clicking a grid entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Highlighted, waiting for a second click
    Selected(usize),
    /// Second click on the highlighted entry
    Confirmed(usize),
}

/// Two-click selection state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateSelection {
    selected: Option<usize>,
}

impl TemplateSelection {
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Handle a click on entry `index` of a grid with `count` entries
    pub fn click(&mut self, index: usize, count: usize) -> Result<SelectionOutcome> {
        if index >= count {
            return Err(BoothError::InvalidTemplate(index));
        }

        if self.selected == Some(index) {
            tracing::info!(index, "Template confirmed");
            self.selected = None;
            Ok(SelectionOutcome::Confirmed(index))
        } else {
            tracing::info!(index, previous = ?self.selected, "Template selected");
            self.selected = Some(index);
            Ok(SelectionOutcome::Selected(index))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{CaptureSettings, Slot, Template};
    use image::Rgba;

    #[test]
    fn test_two_clicks_confirm() {
        let mut selection = TemplateSelection::default();
        assert_eq!(selection.click(1, 3).unwrap(), SelectionOutcome::Selected(1));
        assert_eq!(selection.selected(), Some(1));
        assert_eq!(selection.click(1, 3).unwrap(), SelectionOutcome::Confirmed(1));
        assert_eq!(selection.selected(), None);
    }

    #[test]
    fn test_switching_selection_never_confirms() {
        let mut selection = TemplateSelection::default();
        assert_eq!(selection.click(0, 3).unwrap(), SelectionOutcome::Selected(0));
        assert_eq!(selection.click(2, 3).unwrap(), SelectionOutcome::Selected(2));
        assert_eq!(selection.click(0, 3).unwrap(), SelectionOutcome::Selected(0));
        assert_eq!(selection.click(0, 3).unwrap(), SelectionOutcome::Confirmed(0));
    }

    #[test]
    fn test_out_of_range_click() {
        let mut selection = TemplateSelection::default();
        selection.click(0, 1).unwrap();
        assert!(matches!(selection.click(5, 1), Err(BoothError::InvalidTemplate(5))));
        assert_eq!(selection.selected(), Some(0));
    }

    struct OnlyStrip;

    impl AssetLoader for OnlyStrip {
        async fn load(&self, path: &str) -> Result<RgbaImage> {
            if path == "strip.png" {
                Ok(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])))
            } else {
                Err(BoothError::Asset {
                    path: path.to_string(),
                    reason: "not found".to_string(),
                })
            }
        }
    }

    #[tokio::test]
    async fn test_previews_tolerate_missing_overlay() {
        let template = |name: &str, file: &str| Template {
            name: name.to_string(),
            file: file.to_string(),
            width: 20,
            height: 10,
            slots: vec![Slot { x: 0, y: 0 }],
        };
        let config = BoothConfig {
            capture: CaptureSettings {
                photo_width: 10,
                photo_height: 10,
                total_shots: 1,
            },
            templates: vec![template("Strip", "strip.png"), template("Gone", "missing.png")],
            ..BoothConfig::default()
        };
        let shots = vec![RgbaImage::from_pixel(10, 10, Rgba([0, 255, 0, 255]))];

        let previews = render_previews(&config, &shots, &OnlyStrip).await;
        assert_eq!(previews.len(), 2);
        assert!(previews[0].overlay_loaded);
        assert_eq!(previews[0].image.get_pixel(5, 5), &Rgba([255, 0, 0, 255]));
        assert!(!previews[1].overlay_loaded);
        assert_eq!(previews[1].image.get_pixel(5, 5), &Rgba([0, 255, 0, 255]));
        assert_eq!(previews[1].name, "Gone");
    }
}
