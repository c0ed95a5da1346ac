//! Upload server
//!
//! Accepts raw shots and the finished collage from a kiosk, stores them on
//! disk and serves them back under `/photos` so the QR link resolves.

pub mod routes;
pub mod server;
pub mod storage;
pub mod types;

pub use routes::{create_router, AppState, SharedStateHandle};
pub use server::{build_app, create_shared_state, run_server};
pub use storage::{PhotoStore, StoredSession, PHOTOS_ROUTE};
pub use types::{ApiError, SaveResponse, COLLAGE_FIELD, RAW_FIELDS};
