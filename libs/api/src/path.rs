use crate::request::StreamQuery;

pub const METRICS: &str = "/metrics";
pub const SESSIONS: &str = "/api/sessions";
pub const OVERLAYS: &str = "/api/overlays";
pub const STREAM: &str = "/api/stream";
pub const STATIC: &str = "/static";

pub fn session(id: &str) -> String {
    format!("/api/sessions/{}", id)
}

pub fn overlay(id: &str) -> String {
    format!("/api/overlays/{}", id)
}

pub fn stream(qry: StreamQuery) -> String {
    let query = serde_html_form::to_string(qry).unwrap();
    format!("{}?{}", STREAM, query)
}

/// Manifest location of a session output directory, relative to the server root.
pub fn playlist(id: &str, key: &str, name: &str) -> String {
    format!("{}/{}/{}/{}", STATIC, id, key, name)
}
