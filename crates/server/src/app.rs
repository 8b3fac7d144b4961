//! HTTP routes: event ingestion from the reader and the log page.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::response::Html;
use axum::routing::get;
use chrono::TimeDelta;
use storage::{EventKind, LogStore};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::ingest::{self, Clock};
use crate::render;

/// Body sent back to the reader for every accepted event.
pub const ACK: &str = "OK\r\n";

/// Shared state handed to every request.
pub struct AppState<S: LogStore> {
    pub store: Arc<S>,
    pub clock: Arc<dyn Clock>,
    pub clock_offset: TimeDelta,
}

impl<S: LogStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            clock_offset: self.clock_offset,
        }
    }
}

/// Build the router for the given state.
pub fn router<S: LogStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(show_log::<S>))
        .route("/add/{tag}/{action}", get(add_event::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn add_event<S: LogStore>(
    State(state): State<AppState<S>>,
    Path((tag, action)): Path<(String, String)>,
) -> Result<&'static str, ApiError> {
    // Each request gets its own connection on the blocking pool.
    tokio::task::spawn_blocking(move || {
        ingest::ingest(
            state.store.as_ref(),
            state.clock.as_ref(),
            state.clock_offset,
            &tag,
            &action,
        )
    })
    .await??;
    Ok(ACK)
}

async fn show_log<S: LogStore>(
    State(state): State<AppState<S>>,
) -> Result<Html<String>, ApiError> {
    let store = Arc::clone(&state.store);
    let records =
        tokio::task::spawn_blocking(move || ingest::read_log(store.as_ref())).await??;
    Ok(Html(render::log_page(&records, EventKind::describe)?))
}
