use std::path::PathBuf;

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use uuid::Uuid;

pub use api::response::SessionState;

pub mod manager;
pub mod output;
pub mod registry;
pub mod supervisor;

pub use manager::SessionManager;
pub use output::OutputManager;
pub use registry::Registry;
pub use supervisor::{ProcessHandle, Supervisor};

const MAX_ID_LEN: usize = 64;
const DERIVED_ID_LEN: usize = 16;

/// One transcode attempt: a source URL, an encoder process and an output directory.
#[derive(Debug)]
pub struct StreamSession {
    pub id: String,
    /// Distinguishes this attempt from earlier or later sessions with the same id
    pub key: Uuid,
    pub source_url: String,
    pub output_path: PathBuf,
    pub playlist: String,
    pub state: SessionState,
    pub process: Option<ProcessHandle>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl StreamSession {
    pub fn info(&self) -> api::response::Session {
        api::response::Session {
            id: self.id.clone(),
            state: self.state,
            source_url: self.source_url.clone(),
            playlist: self.playlist.clone(),
            pid: self.process.as_ref().and_then(|p| p.pid()),
            started_at: self.started_at.timestamp_millis(),
            ended_at: self.ended_at.map(|t| t.timestamp_millis()),
            last_error: self.last_error.clone(),
        }
    }

    /// Moves into a terminal state and drops the process handle with it.
    pub(crate) fn terminate(&mut self, state: SessionState, error: Option<String>) {
        debug_assert!(state.is_terminal());
        self.state = state;
        self.process = None;
        self.ended_at = Some(Utc::now());
        self.last_error = match state {
            SessionState::Failed => Some(error.unwrap_or_else(|| "encoder failed".to_string())),
            _ => None,
        };
    }
}

/// Stream identifiers are used as directory names and URL path segments.
pub fn validate_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Identifier for callers that only know the source URL.
pub fn derive_id(source_url: &str) -> String {
    let digest = Md5::digest(source_url.as_bytes());
    let mut id: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    id.truncate(DERIVED_ID_LEN);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("cam1"));
        assert!(validate_id("front_door-2"));
        assert!(!validate_id(""));
        assert!(!validate_id("../etc"));
        assert!(!validate_id("cam 1"));
        assert!(!validate_id(&"a".repeat(65)));
    }

    #[test]
    fn test_derive_id_is_stable() {
        let a = derive_id("rtsp://host/feed");
        let b = derive_id("rtsp://host/feed");
        let c = derive_id("rtsp://host/other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(16, a.len());
        assert!(validate_id(&a));
    }

    #[test]
    fn test_state_classes() {
        assert!(SessionState::Starting.is_active());
        assert!(SessionState::Stopping.is_active());
        assert!(SessionState::Stopped.is_terminal());
        assert!(SessionState::Failed.is_terminal());
    }
}
