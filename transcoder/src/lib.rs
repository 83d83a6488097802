use axum::extract::Request;
use axum::routing::get;
use axum::Router;

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Level};

use crate::config::Config;
use crate::overlay::MemOverlayStore;
use crate::route::AppState;
use crate::session::SessionManager;

pub mod config;

mod error;
mod hook;
mod r#macro;
mod metrics;
mod overlay;
mod result;
mod route;
mod session;

/// Serves the HTTP API on `listener` until `signal` resolves, then stops
/// every session that is still running.
pub async fn serve<F>(cfg: Config, listener: TcpListener, signal: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    metrics_register();
    let app_state = AppState {
        session_manager: Arc::new(SessionManager::new(cfg.clone()).await),
        overlays: Arc::new(MemOverlayStore::new()),
    };
    let output_root = app_state.session_manager.output().root().to_path_buf();
    let app = Router::new()
        .merge(crate::route::session::route())
        .merge(crate::route::stream::route())
        .merge(crate::route::overlay::route())
        .route(api::path::METRICS, get(metrics))
        .nest_service(api::path::STATIC, ServeDir::new(&output_root))
        .with_state(app_state.clone())
        .layer(if cfg.http.cors {
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
        })
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let span = info_span!(
                        "http_request",
                        uri = ?request.uri(),
                        method = ?request.method(),
                        span_id = tracing::field::Empty,
                    );
                    span.record(
                        "span_id",
                        span.id().unwrap_or(tracing::Id::from_u64(42)).into_u64(),
                    );
                    span
                })
                .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::INFO))
                .on_failure(tower_http::trace::DefaultOnFailure::new().level(Level::INFO)),
        );

    info!(root = %output_root.display(), "serving session output");
    axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await
        .unwrap_or_else(|e| error!("Application error: {e}"));
    app_state.session_manager.shutdown().await;
}

/// Registration is process wide; serving twice in one process keeps the
/// first registration.
fn metrics_register() {
    let _ = metrics::REGISTRY.register(Box::new(metrics::SESSION.clone()));
    let _ = metrics::REGISTRY.register(Box::new(metrics::STARTED.clone()));
    let _ = metrics::REGISTRY.register(Box::new(metrics::FAILED.clone()));
}

async fn metrics() -> result::Result<String> {
    Ok(metrics::ENCODER.encode_to_string(&metrics::REGISTRY.gather())?)
}
