//! Kiosk capture pipeline
//!
//! Drives one photobooth session: live preview, countdown and capture for
//! each shot, template selection, collage compositing, upload and the QR
//! hand-off. A front-end feeds clicks in and draws what comes out.

pub mod assets;
pub mod camera;
pub mod collage;
pub mod countdown;
pub mod error;
pub mod qr;
pub mod selector;
pub mod session;
pub mod upload;

use std::sync::Arc;
use std::time::Instant;

use image::RgbaImage;
use parking_lot::Mutex;

pub use assets::{AssetLoader, DirAssetLoader, HttpAssetLoader};
pub use camera::{CameraCapture, FrameSource, PreviewFrame, StillFrameSource};
pub use countdown::{CountdownPlan, CountdownStep};
pub use error::{BoothError, Result};
pub use qr::QrRenderer;
pub use selector::{SelectionOutcome, TemplatePreview};
pub use session::{Screen, Session};
pub use upload::{resolve_collage_url, UploadClient, UploadPayload};

use crate::settings::BoothConfig;

/// Why a trigger did not start a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    CameraNotReady,
    CountdownRunning,
    NotIdle,
}

/// What a trigger on the idle screen did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Ignored(IgnoredReason),
    /// Shot taken, more to go; carries the number of shots taken so far
    ShotTaken(usize),
    /// Last shot taken, template grid populated
    CaptureComplete,
}

/// Result of a click on the template grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateClick {
    Selected(usize),
    /// Collage built and uploaded; `qr_url` is the link encoded in the QR
    /// code, `None` when the server returned no collage path
    Confirmed { index: usize, qr_url: Option<String> },
}

/// One kiosk: configuration, camera, session state and the upload target
pub struct Photobooth<S, L> {
    config: Arc<BoothConfig>,
    camera: Mutex<CameraCapture<S>>,
    session: Arc<Mutex<Session>>,
    assets: L,
    uploader: UploadClient,
    qr: QrRenderer,
    plan: CountdownPlan,
    origin: String,
}

impl<S: FrameSource, L: AssetLoader> Photobooth<S, L> {
    /// `origin` is the base that relative URLs (save endpoint, collage path)
    /// resolve against, normally where the config was served from
    pub fn new(
        config: Arc<BoothConfig>,
        source: S,
        assets: L,
        client: reqwest::Client,
        origin: impl Into<String>,
    ) -> Self {
        let origin = origin.into();
        Self {
            uploader: UploadClient::new(client, &config, &origin),
            qr: QrRenderer::new(&config.qr),
            plan: CountdownPlan::new(&config.countdown),
            camera: Mutex::new(CameraCapture::new(source)),
            session: Arc::new(Mutex::new(Session::new())),
            config,
            assets,
            origin,
        }
    }

    pub fn config(&self) -> &BoothConfig {
        &self.config
    }

    /// Shared handle on the session, for front-ends that render from it
    pub fn session(&self) -> Arc<Mutex<Session>> {
        Arc::clone(&self.session)
    }

    pub fn screen(&self) -> Screen {
        self.session.lock().screen
    }

    pub fn shots_taken(&self) -> usize {
        self.session.lock().shot_index
    }

    pub fn countdown_text(&self) -> String {
        self.session.lock().countdown_text.clone()
    }

    pub fn qr_image(&self) -> Option<RgbaImage> {
        self.session.lock().qr.clone()
    }

    pub fn previews(&self) -> Vec<TemplatePreview> {
        self.session.lock().previews.clone()
    }

    pub fn collage(&self) -> Option<RgbaImage> {
        self.session.lock().collage.clone()
    }

    /// Acquire the camera. Safe to call again once it is running.
    pub fn start_camera(&self) -> Result<()> {
        self.camera.lock().activate().map_err(|e| {
            tracing::error!(error = %e, "Camera failed");
            e
        })
    }

    /// Preview frame for `now`
    pub fn render_preview(&self, now: Instant) -> PreviewFrame {
        let mut camera = self.camera.lock();
        let session = self.session.lock();
        camera.render(now, &session, self.config.capture.total_shots)
    }

    fn now() -> Instant {
        tokio::time::Instant::now().into_std()
    }

    /// Idle-screen click: run one countdown and capture one shot.
    ///
    /// Completes when the freeze preview ends. Clicks while a countdown is
    /// running are ignored.
    pub async fn trigger(&self) -> Result<TriggerOutcome> {
        let total = self.config.capture.total_shots;

        {
            if !self.camera.lock().is_active() {
                tracing::warn!("Camera not ready yet, ignoring trigger");
                return Ok(TriggerOutcome::Ignored(IgnoredReason::CameraNotReady));
            }

            let mut session = self.session.lock();
            if session.screen != Screen::Idle {
                return Ok(TriggerOutcome::Ignored(IgnoredReason::NotIdle));
            }
            // The freeze hold after a capture still belongs to that countdown
            if session.is_counting_down() || session.frozen_at(Self::now()).is_some() {
                tracing::debug!("Countdown running, ignoring trigger");
                return Ok(TriggerOutcome::Ignored(IgnoredReason::CountdownRunning));
            }
            if session.shot_index >= total {
                tracing::info!("All shots already taken, starting over");
                session.reset_shots();
            }
            // Claim the countdown before the first await
            session.countdown_text = self.plan.initial_text().to_string();
            tracing::info!(shots_taken = session.shot_index, "Countdown started");
        }

        for step in self.plan.steps() {
            match step {
                CountdownStep::Show(text) => {
                    self.session.lock().countdown_text = text.clone();
                }
                CountdownStep::Wait(delay) => tokio::time::sleep(*delay).await,
                CountdownStep::Capture => {
                    let mut camera = self.camera.lock();
                    let mut session = self.session.lock();
                    if let Err(e) = camera.capture_shot(Self::now(), &mut session, &self.config.capture) {
                        tracing::error!(error = %e, "Capture failed, countdown aborted");
                        session.countdown_text.clear();
                        return Err(e);
                    }
                }
                CountdownStep::Advance => {
                    let shots = {
                        let mut session = self.session.lock();
                        session.shot_index += 1;
                        tracing::info!(shots_taken = session.shot_index, "Shot complete");
                        if session.shot_index < total {
                            return Ok(TriggerOutcome::ShotTaken(session.shot_index));
                        }
                        // Leave Idle before the previews render so no trigger can restart the round
                        tracing::info!("Reached total shots, going to template selection");
                        session.selection.clear();
                        session.previews.clear();
                        session.screen = Screen::TemplateSelect;
                        session.shots.clone()
                    };

                    let previews = selector::render_previews(&self.config, &shots, &self.assets).await;

                    let mut session = self.session.lock();
                    if session.screen == Screen::TemplateSelect {
                        session.previews = previews;
                    }
                    return Ok(TriggerOutcome::CaptureComplete);
                }
            }
        }

        // Every plan ends in Advance
        Ok(TriggerOutcome::ShotTaken(self.shots_taken()))
    }

    /// Click on template `index` of the selection grid. The confirming click
    /// builds the collage, uploads the session and renders the QR code.
    pub async fn click_template(&self, index: usize) -> Result<TemplateClick> {
        let shots = {
            let mut session = self.session.lock();
            if session.screen != Screen::TemplateSelect {
                return Err(BoothError::WrongScreen(session.screen));
            }
            let count = self.config.templates.len();
            match session.selection.click(index, count)? {
                SelectionOutcome::Selected(i) => return Ok(TemplateClick::Selected(i)),
                SelectionOutcome::Confirmed(_) => {}
            }
            session.screen = Screen::Result;
            session.shots.clone()
        };

        let collage = collage::build_collage(&self.config, index, &shots, &self.assets).await?;
        self.session.lock().collage = Some(collage.clone());

        let payload = UploadPayload::encode(&shots, &collage)?;
        let collage_url = match self.uploader.upload(payload).await? {
            Some(url) => url,
            None => return Ok(TemplateClick::Confirmed { index, qr_url: None }),
        };

        let absolute = resolve_collage_url(
            &collage_url,
            self.config.public_base_url.as_deref(),
            &self.origin,
        );
        tracing::info!(url = %absolute, "QR absolute URL");
        let qr = self.qr.render(&absolute);

        let mut session = self.session.lock();
        session.qr = qr;
        session.collage_url = Some(absolute.clone());
        Ok(TemplateClick::Confirmed {
            index,
            qr_url: Some(absolute),
        })
    }

    /// Back button on the result screen: clear the session, keep the camera
    pub fn back_to_idle(&self) {
        tracing::info!("Result to idle");
        self.session.lock().reset();
    }
}
