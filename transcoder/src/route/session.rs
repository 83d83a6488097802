use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;

use api::request::CreateSession;
use api::response::Session;

use crate::error::AppError;
use crate::result::Result;
use crate::route::AppState;

pub fn route() -> Router<AppState> {
    Router::new()
        .route(api::path::SESSIONS, post(create).get(index))
        .route(&api::path::session("{id}"), get(show).delete(destroy))
}

async fn create(
    State(state): State<AppState>,
    req: std::result::Result<Json<CreateSession>, JsonRejection>,
) -> Result<(StatusCode, Json<Session>)> {
    let Json(req) = req.map_err(|e| AppError::invalid_input(e.body_text()))?;
    let session = state
        .session_manager
        .start(req.id, req.source_url)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn index(State(state): State<AppState>) -> Json<Vec<Session>> {
    Json(state.session_manager.list())
}

async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Session>> {
    Ok(Json(state.session_manager.status(&id)?))
}

async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>> {
    Ok(Json(state.session_manager.stop(&id).await?))
}
