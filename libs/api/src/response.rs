use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

impl SessionState {
    /// Starting, Running and Stopping sessions own an encoder process.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionState::Starting | SessionState::Running | SessionState::Stopping
        )
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Starting => write!(f, "Starting"),
            SessionState::Running => write!(f, "Running"),
            SessionState::Stopping => write!(f, "Stopping"),
            SessionState::Stopped => write!(f, "Stopped"),
            SessionState::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for SessionState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Starting" => Ok(SessionState::Starting),
            "Running" => Ok(SessionState::Running),
            "Stopping" => Ok(SessionState::Stopping),
            "Stopped" => Ok(SessionState::Stopped),
            "Failed" => Ok(SessionState::Failed),
            _ => Err(()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub state: SessionState,
    pub source_url: String,
    /// URL path of the HLS manifest
    pub playlist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Milliseconds since epoch
    pub started_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StreamStarted {
    pub message: String,
    pub session: Session,
}

/// Overlay document as stored: a server assigned `_id` plus free-form fields.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Overlay {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OverlayCreated {
    pub message: String,
    pub overlay: Overlay,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Error {
    pub error: String,
}
