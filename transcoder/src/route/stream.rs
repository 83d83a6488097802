use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use api::request::StreamQuery;
use api::response::StreamStarted;

use crate::error::AppError;
use crate::result::Result;
use crate::route::AppState;
use crate::session::derive_id;

pub fn route() -> Router<AppState> {
    Router::new().route(api::path::STREAM, get(stream))
}

/// Starts transcoding `url` under an id derived from it. Asking again for a
/// feed that is already being transcoded returns the running session.
async fn stream(
    State(state): State<AppState>,
    Query(qry): Query<StreamQuery>,
) -> Result<Json<StreamStarted>> {
    let url = match qry.url {
        Some(url) if !url.is_empty() => url,
        _ => return Err(AppError::invalid_input("RTSP URL is required")),
    };
    let (message, session) = match state.session_manager.start(None, url.clone()).await {
        Ok(session) => ("Streaming started", session),
        Err(AppError::AlreadyActive(_)) => (
            "Streaming already started",
            state.session_manager.status(&derive_id(&url))?,
        ),
        Err(e) => return Err(e),
    };
    Ok(Json(StreamStarted {
        message: message.to_string(),
        session,
    }))
}
