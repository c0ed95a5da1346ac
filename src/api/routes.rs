//! API route definitions

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use bytes::{Bytes, BytesMut};
use serde::Serialize;
use tower_http::services::ServeDir;

use super::storage::{PhotoStore, PHOTOS_ROUTE};
use super::types::{ApiError, SaveResponse, COLLAGE_FIELD, RAW_FIELDS};

/// Multipart framing allowance on top of the file payloads
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// State shared by all handlers
#[derive(Debug)]
pub struct AppState {
    pub store: PhotoStore,
    pub max_file_bytes: usize,
}

pub type SharedStateHandle = Arc<AppState>;

/// Create the router: upload API, photo retrieval and the kiosk front-end
pub fn create_router(state: SharedStateHandle, public_dir: &Path) -> Router {
    let body_limit = state.max_file_bytes * (RAW_FIELDS.len() + 1) + FORM_OVERHEAD_BYTES;
    let photos = ServeDir::new(state.store.root());

    Router::new()
        .route("/api/status", get(status_handler))
        .route("/api/save", post(save_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .nest_service(PHOTOS_ROUTE, photos)
        .fallback_service(ServeDir::new(public_dir))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    version: &'static str,
}

async fn status_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Files pulled out of one upload form
#[derive(Debug, Default)]
struct UploadForm {
    raws: [Option<Bytes>; RAW_FIELDS.len()],
    collage: Option<Bytes>,
}

impl UploadForm {
    fn received_fields(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = RAW_FIELDS
            .iter()
            .zip(&self.raws)
            .filter(|(_, data)| data.is_some())
            .map(|(name, _)| *name)
            .collect();
        if self.collage.is_some() {
            names.push(COLLAGE_FIELD);
        }
        names
    }
}

async fn save_handler(
    State(state): State<SharedStateHandle>,
    mut multipart: Multipart,
) -> Result<Json<SaveResponse>, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Malformed(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let slot = if name == COLLAGE_FIELD {
            &mut form.collage
        } else if let Some(index) = RAW_FIELDS.iter().position(|f| *f == name) {
            &mut form.raws[index]
        } else {
            tracing::warn!(field = %name, "Ignoring unexpected field");
            continue;
        };

        if slot.is_some() {
            return Err(ApiError::DuplicateField(name));
        }
        *slot = Some(read_limited(field, &name, state.max_file_bytes).await?);
    }

    tracing::info!(fields = ?form.received_fields(), "Received files");

    // Checked before anything touches the disk
    let collage = form.collage.ok_or(ApiError::MissingCollage)?;

    let raws: Vec<(usize, Bytes)> = form
        .raws
        .into_iter()
        .enumerate()
        .filter_map(|(index, data)| data.map(|d| (index + 1, d)))
        .collect();

    let stored = state.store.save_session(&raws, &collage).await?;

    Ok(Json(SaveResponse {
        ok: true,
        session_id: stored.session_id,
        collage_url: Some(stored.collage_url),
    }))
}

/// Buffer one file field, failing as soon as it grows past `limit`
async fn read_limited(mut field: Field<'_>, name: &str, limit: usize) -> Result<Bytes, ApiError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::Malformed(e.body_text()))?
    {
        if buffer.len() + chunk.len() > limit {
            return Err(ApiError::FileTooLarge {
                field: name.to_string(),
                limit,
            });
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}
