//! End-to-end kiosk flow: countdown capture, template selection, upload to a
//! live server and the QR hand-off.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use photobooth::booth::{
    AssetLoader, BoothError, DirAssetLoader, HttpAssetLoader, IgnoredReason, Photobooth, Screen,
    StillFrameSource, TemplateClick, TriggerOutcome,
};
use photobooth::settings::{
    BoothConfig, CaptureSettings, ConfigError, CountdownSettings, ServerSettings, Slot, Template,
    MAX_UPLOAD_BYTES,
};
use tempfile::TempDir;

fn template(name: &str, file: &str) -> Template {
    Template {
        name: name.to_string(),
        file: file.to_string(),
        width: 140,
        height: 60,
        slots: vec![Slot { x: 10, y: 10 }, Slot { x: 70, y: 10 }],
    }
}

fn config(total_shots: usize, step_ms: u64) -> BoothConfig {
    BoothConfig {
        capture: CaptureSettings {
            photo_width: 60,
            photo_height: 40,
            total_shots,
        },
        countdown: CountdownSettings {
            seconds: 3,
            step_ms,
        },
        templates: vec![
            template("Framed", "templates/frame.png"),
            template("Missing overlay", "templates/missing.png"),
        ],
        ..BoothConfig::default()
    }
}

/// Public dir with one real overlay: an opaque border around a clear middle
fn public_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let templates = dir.path().join("public").join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    let overlay = RgbaImage::from_fn(140, 60, |x, y| {
        if x < 5 || y < 5 || x >= 135 || y >= 55 {
            Rgba([200, 30, 30, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    overlay.save(templates.join("frame.png")).unwrap();
    dir
}

fn camera_frame() -> StillFrameSource {
    StillFrameSource::new(RgbaImage::from_pixel(160, 90, Rgba([20, 120, 220, 255])))
}

fn booth(
    config: BoothConfig,
    dir: &Path,
    origin: &str,
) -> Photobooth<StillFrameSource, DirAssetLoader> {
    Photobooth::new(
        Arc::new(config),
        camera_frame(),
        DirAssetLoader::new(dir.join("public")),
        reqwest::Client::new(),
        origin,
    )
}

async fn spawn_server(dir: &Path) -> SocketAddr {
    let settings = ServerSettings {
        port: 0,
        photos_dir: dir.join("photos"),
        public_dir: dir.join("public"),
        max_file_bytes: MAX_UPLOAD_BYTES,
    };
    let app = photobooth::api::build_app(&settings).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test(start_paused = true)]
async fn test_capture_round_reaches_template_select() {
    let dir = public_dir();
    let booth = booth(config(2, 500), dir.path(), "http://127.0.0.1:9");

    assert_eq!(
        booth.trigger().await.unwrap(),
        TriggerOutcome::Ignored(IgnoredReason::CameraNotReady)
    );

    booth.start_camera().unwrap();
    assert_eq!(booth.trigger().await.unwrap(), TriggerOutcome::ShotTaken(1));
    assert_eq!(booth.screen(), Screen::Idle);
    assert_eq!(booth.countdown_text(), "");

    assert_eq!(booth.trigger().await.unwrap(), TriggerOutcome::CaptureComplete);
    assert_eq!(booth.screen(), Screen::TemplateSelect);
    assert_eq!(booth.shots_taken(), 2);

    let previews = booth.previews();
    assert_eq!(previews.len(), 2);
    assert!(previews[0].overlay_loaded);
    assert!(!previews[1].overlay_loaded);
    assert_eq!(previews[0].image.dimensions(), (140, 60));
    // border from the overlay, shot inside the first slot
    assert_eq!(previews[0].image.get_pixel(0, 0), &Rgba([200, 30, 30, 255]));
    assert_eq!(previews[0].image.get_pixel(20, 20).0[3], 255);

    assert_eq!(
        booth.trigger().await.unwrap(),
        TriggerOutcome::Ignored(IgnoredReason::NotIdle)
    );
}

#[tokio::test(start_paused = true)]
async fn test_trigger_ignored_while_countdown_runs() {
    let dir = public_dir();
    let booth = booth(config(3, 500), dir.path(), "http://127.0.0.1:9");
    booth.start_camera().unwrap();

    let (first, during) = tokio::join!(booth.trigger(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let ticking = (booth.countdown_text(), booth.trigger().await.unwrap());

        // past the capture, inside the freeze hold
        tokio::time::sleep(Duration::from_millis(1700)).await;
        let frozen = (booth.countdown_text(), booth.trigger().await.unwrap());
        (ticking, frozen)
    });

    assert_eq!(first.unwrap(), TriggerOutcome::ShotTaken(1));
    let (ticking, frozen) = during;
    assert_eq!(ticking.0, "3");
    assert_eq!(
        ticking.1,
        TriggerOutcome::Ignored(IgnoredReason::CountdownRunning)
    );
    assert_eq!(frozen.0, "");
    assert_eq!(
        frozen.1,
        TriggerOutcome::Ignored(IgnoredReason::CountdownRunning)
    );
    assert_eq!(booth.shots_taken(), 1);

    // the hold is over once the first trigger returned
    assert_eq!(booth.trigger().await.unwrap(), TriggerOutcome::ShotTaken(2));
}

#[tokio::test]
async fn test_confirmed_template_uploads_and_renders_qr() {
    let dir = public_dir();
    let addr = spawn_server(dir.path()).await;
    let origin = format!("http://{}", addr);
    let booth = booth(config(2, 10), dir.path(), &origin);
    booth.start_camera().unwrap();

    assert_eq!(booth.trigger().await.unwrap(), TriggerOutcome::ShotTaken(1));
    assert_eq!(booth.trigger().await.unwrap(), TriggerOutcome::CaptureComplete);

    assert_eq!(booth.click_template(0).await.unwrap(), TemplateClick::Selected(0));
    assert_eq!(booth.click_template(1).await.unwrap(), TemplateClick::Selected(1));
    assert_eq!(booth.screen(), Screen::TemplateSelect);

    let qr_url = match booth.click_template(1).await.unwrap() {
        TemplateClick::Confirmed { index, qr_url } => {
            assert_eq!(index, 1);
            qr_url.unwrap()
        }
        other => panic!("expected confirmation, got {:?}", other),
    };
    assert!(qr_url.starts_with(&format!("{}/photos/collage/session_", origin)));
    assert!(qr_url.ends_with("_collage.jpg"));

    assert_eq!(booth.screen(), Screen::Result);
    assert_eq!(booth.collage().unwrap().dimensions(), (140, 60));
    assert_eq!(booth.qr_image().unwrap().dimensions(), (300, 300));

    let response = reqwest::get(&qr_url).await.unwrap();
    assert!(response.status().is_success());
    let jpeg = response.bytes().await.unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

    let raws = std::fs::read_dir(dir.path().join("photos").join("raw"))
        .unwrap()
        .count();
    assert_eq!(raws, 2);

    booth.back_to_idle();
    assert_eq!(booth.screen(), Screen::Idle);
    assert_eq!(booth.shots_taken(), 0);
    assert_eq!(booth.countdown_text(), "");
    assert!(booth.qr_image().is_none());
    assert!(booth.previews().is_empty());
}

#[tokio::test]
async fn test_rejected_upload_is_reported() {
    let dir = public_dir();
    let addr = spawn_server(dir.path()).await;
    let config = BoothConfig {
        save_api_url: "/api/missing".to_string(),
        ..config(1, 10)
    };
    let booth = booth(config, dir.path(), &format!("http://{}", addr));
    booth.start_camera().unwrap();

    assert_eq!(booth.trigger().await.unwrap(), TriggerOutcome::CaptureComplete);
    booth.click_template(0).await.unwrap();
    let err = booth.click_template(0).await.unwrap_err();
    match err {
        photobooth::BoothError::UploadRejected { status, .. } => {
            assert!((400..500).contains(&status), "status {}", status)
        }
        other => panic!("expected a rejected upload, got {:?}", other),
    }

    // the collage survives for a retry from the result screen
    assert_eq!(booth.screen(), Screen::Result);
    assert!(booth.collage().is_some());
    assert!(booth.qr_image().is_none());
}

/// Overlay store that takes five seconds to answer, then fails
struct SlowLoader;

impl AssetLoader for SlowLoader {
    async fn load(&self, path: &str) -> photobooth::booth::Result<RgbaImage> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Err(BoothError::Asset {
            path: path.to_string(),
            reason: "timed out".to_string(),
        })
    }
}

#[tokio::test(start_paused = true)]
async fn test_round_not_restarted_while_previews_render() {
    let booth = Photobooth::new(
        Arc::new(config(1, 500)),
        camera_frame(),
        SlowLoader,
        reqwest::Client::new(),
        "http://127.0.0.1:9",
    );
    booth.start_camera().unwrap();

    let (first, (state, second)) = tokio::join!(booth.trigger(), async {
        // the single shot advances at 2750 ms, overlays are still loading
        tokio::time::sleep(Duration::from_millis(2850)).await;
        let state = (booth.screen(), booth.shots_taken());
        (state, booth.trigger().await.unwrap())
    });

    assert_eq!(first.unwrap(), TriggerOutcome::CaptureComplete);
    assert_eq!(state, (Screen::TemplateSelect, 1));
    assert_eq!(second, TriggerOutcome::Ignored(IgnoredReason::NotIdle));
    assert_eq!(booth.screen(), Screen::TemplateSelect);
    assert_eq!(booth.shots_taken(), 1);
    assert_eq!(booth.previews().len(), 2);
}

#[tokio::test]
async fn test_config_fetched_from_server() {
    let dir = public_dir();
    let public = dir.path().join("public");
    std::fs::write(
        public.join("config.json"),
        r#"{
            "siteName": "Garden Party",
            "capture": { "totalShots": 2 },
            "templates": [
                { "name": "Framed", "file": "templates/frame.png", "width": 140, "height": 60,
                  "slots": [ { "x": 10, "y": 10 }, { "x": 70, "y": 10 } ] }
            ]
        }"#,
    )
    .unwrap();
    std::fs::write(public.join("broken.json"), "{ \"capture\": ").unwrap();
    let addr = spawn_server(dir.path()).await;

    let config = BoothConfig::fetch(&format!("http://{}/config.json", addr))
        .await
        .unwrap();
    assert_eq!(config.title(), "Garden Party");
    assert_eq!(config.capture.total_shots, 2);
    assert_eq!(config.templates[0].slots.len(), 2);
    assert_eq!(config.save_api_url, "/api/save");

    let missing = BoothConfig::fetch(&format!("http://{}/nope.json", addr)).await;
    assert!(matches!(missing, Err(ConfigError::Fetch(_))));

    let broken = BoothConfig::fetch(&format!("http://{}/broken.json", addr)).await;
    assert!(matches!(broken, Err(ConfigError::Parse(_))));
}

#[tokio::test]
async fn test_overlay_loaded_over_http() {
    let dir = public_dir();
    let addr = spawn_server(dir.path()).await;
    let loader = HttpAssetLoader::new(reqwest::Client::new(), format!("http://{}/", addr));

    let overlay = loader.load("/templates/frame.png").await.unwrap();
    assert_eq!(overlay.dimensions(), (140, 60));
    assert_eq!(overlay.get_pixel(0, 0), &Rgba([200, 30, 30, 255]));
    assert_eq!(overlay.get_pixel(70, 30).0[3], 0);

    let missing = loader.load("templates/missing.png").await;
    assert!(matches!(missing, Err(BoothError::Asset { .. })));
}
