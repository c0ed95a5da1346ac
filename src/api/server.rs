//! Axum server setup and startup

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::routes::{create_router, AppState, SharedStateHandle};
use super::storage::PhotoStore;
use crate::settings::ServerSettings;

/// Open the photo store and build the shared handler state
pub fn create_shared_state(settings: &ServerSettings) -> std::io::Result<SharedStateHandle> {
    let store = PhotoStore::open(&settings.photos_dir)?;
    tracing::info!(
        raw = %store.raw_dir().display(),
        collage = %store.collage_dir().display(),
        "Photo directories ready"
    );
    Ok(Arc::new(AppState {
        store,
        max_file_bytes: settings.max_file_bytes,
    }))
}

/// Build the full application: routes plus CORS and request tracing
pub fn build_app(settings: &ServerSettings) -> std::io::Result<axum::Router> {
    let state = create_shared_state(settings)?;

    // Kiosks may load the front-end from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(create_router(state, &settings.public_dir)
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// Run the upload server until `shutdown` resolves
pub async fn run_server<F>(settings: ServerSettings, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = build_app(&settings)?;
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Photobooth server listening on http://localhost:{}", settings.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Server shutting down gracefully");
        })
        .await
}
