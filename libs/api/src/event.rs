use serde::{Deserialize, Serialize};

use crate::response::{Session, SessionState};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventBody {
    pub metrics: NodeMetrics,
    pub event: Event,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub enum Event {
    Session {
        r#type: SessionEventType,
        session: Session,
    },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionEventType {
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

impl From<SessionState> for SessionEventType {
    fn from(value: SessionState) -> Self {
        match value {
            SessionState::Starting => SessionEventType::Starting,
            SessionState::Running => SessionEventType::Running,
            SessionState::Stopping => SessionEventType::Stopping,
            SessionState::Stopped => SessionEventType::Stopped,
            SessionState::Failed => SessionEventType::Failed,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NodeMetrics {
    pub sessions: u64,
    pub started: u64,
    pub failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_serializes_like_state() {
        let r#type: SessionEventType = SessionState::Stopping.into();
        assert_eq!(SessionEventType::Stopping, r#type);
        assert_eq!("\"stopping\"", serde_json::to_string(&r#type).unwrap());
    }
}
