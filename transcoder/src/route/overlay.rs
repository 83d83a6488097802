use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use http::StatusCode;
use serde_json::Value;
use uuid::Uuid;

use api::response::{Message, Overlay, OverlayCreated};

use crate::error::AppError;
use crate::overlay::{Document, REQUIRED_FIELDS};
use crate::result::Result;
use crate::route::AppState;

pub fn route() -> Router<AppState> {
    Router::new()
        .route(api::path::OVERLAYS, get(index).post(create))
        .route(&api::path::overlay("{id}"), put(update).delete(destroy))
}

fn document(body: std::result::Result<Json<Value>, JsonRejection>) -> Result<Document> {
    let Json(body) = body.map_err(|e| AppError::invalid_input(e.body_text()))?;
    match body {
        Value::Object(document) => Ok(document),
        _ => Err(AppError::invalid_input("Request body must be a JSON object")),
    }
}

fn overlay_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| AppError::invalid_input("Invalid overlay ID"))
}

async fn index(State(state): State<AppState>) -> Result<Json<Vec<Overlay>>> {
    Ok(Json(state.overlays.find_all().await?))
}

async fn create(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<OverlayCreated>)> {
    let mut fields = document(body)?;
    if let Some(field) = REQUIRED_FIELDS.iter().find(|f| !fields.contains_key(**f)) {
        return Err(AppError::invalid_input(format!("Missing field: {field}")));
    }
    fields.remove("_id");
    let id = state.overlays.insert(fields.clone()).await?;
    Ok((
        StatusCode::CREATED,
        Json(OverlayCreated {
            message: "Overlay created!".to_string(),
            overlay: Overlay {
                id: id.to_string(),
                fields,
            },
        }),
    ))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Message>> {
    let id = overlay_id(&id)?;
    let mut fields = document(body)?;
    fields.remove("_id");
    if state.overlays.update(id, fields).await? == 0 {
        return Err(AppError::not_found("Overlay not found"));
    }
    Ok(Json(Message {
        message: "Overlay updated!".to_string(),
    }))
}

async fn destroy(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Message>> {
    let id = overlay_id(&id)?;
    if state.overlays.delete(id).await? != 1 {
        return Err(AppError::not_found("Overlay not found"));
    }
    Ok(Json(Message {
        message: "Overlay deleted!".to_string(),
    }))
}
