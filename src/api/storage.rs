//! On-disk photo storage
//!
//! Raw shots go to `<root>/raw`, collages to `<root>/collage`. Files are
//! named after the session id so a collage can be matched to its raws.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

/// URL prefix the photo root is served under
pub const PHOTOS_ROUTE: &str = "/photos";

/// Writes uploaded images and hands out session ids
#[derive(Debug)]
pub struct PhotoStore {
    root: PathBuf,
    raw_dir: PathBuf,
    collage_dir: PathBuf,
    last_session_id: AtomicU64,
}

/// Files written for one upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub session_id: String,
    pub raw_paths: Vec<PathBuf>,
    pub collage_path: PathBuf,
    /// Public path of the collage, under [`PHOTOS_ROUTE`]
    pub collage_url: String,
}

impl PhotoStore {
    /// Create the store, making sure both directories exist
    pub fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        let raw_dir = root.join("raw");
        let collage_dir = root.join("collage");
        std::fs::create_dir_all(&raw_dir)?;
        std::fs::create_dir_all(&collage_dir)?;

        Ok(Self {
            root,
            raw_dir,
            collage_dir,
            last_session_id: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    pub fn collage_dir(&self) -> &Path {
        &self.collage_dir
    }

    /// Next session id: milliseconds since the epoch, bumped past the
    /// previous id when two uploads land in the same millisecond
    pub fn next_session_id(&self) -> String {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let mut previous = self.last_session_id.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(previous + 1);
            match self.last_session_id.compare_exchange_weak(
                previous,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate.to_string(),
                Err(actual) => previous = actual,
            }
        }
    }

    pub fn raw_filename(session_id: &str, position: usize) -> String {
        format!("session_{}_raw{}.jpg", session_id, position)
    }

    pub fn collage_filename(session_id: &str) -> String {
        format!("session_{}_collage.jpg", session_id)
    }

    /// Persist one session. `raws` holds the 1-based slot number of each
    /// raw shot that was uploaded.
    pub async fn save_session(
        &self,
        raws: &[(usize, Bytes)],
        collage: &Bytes,
    ) -> std::io::Result<StoredSession> {
        let session_id = self.next_session_id();

        let mut raw_paths = Vec::with_capacity(raws.len());
        for (position, data) in raws {
            let path = self.raw_dir.join(Self::raw_filename(&session_id, *position));
            tokio::fs::write(&path, data).await?;
            tracing::info!(path = %path.display(), bytes = data.len(), "Saved raw");
            raw_paths.push(path);
        }

        let collage_name = Self::collage_filename(&session_id);
        let collage_path = self.collage_dir.join(&collage_name);
        tokio::fs::write(&collage_path, collage).await?;
        tracing::info!(path = %collage_path.display(), bytes = collage.len(), "Saved collage");

        Ok(StoredSession {
            collage_url: format!("{}/collage/{}", PHOTOS_ROUTE, collage_name),
            session_id,
            raw_paths,
            collage_path,
        })
    }
}
