use super::Event;

impl From<Event> for api::event::Event {
    fn from(value: Event) -> Self {
        match value {
            Event::Session(session) => api::event::Event::Session {
                r#type: session.state.into(),
                session,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::event::SessionEventType;
    use api::response::{Session, SessionState};

    #[test]
    fn test_event_type_follows_state() {
        let session = Session {
            id: "cam1".to_string(),
            state: SessionState::Failed,
            source_url: "rtsp://host/feed".to_string(),
            playlist: "/static/cam1/k/stream.m3u8".to_string(),
            pid: None,
            started_at: 0,
            ended_at: Some(1),
            last_error: Some("encoder exited with code 1".to_string()),
        };
        let api::event::Event::Session { r#type, session } = Event::Session(session).into();
        assert_eq!(SessionEventType::Failed, r#type);
        assert_eq!("cam1", session.id);
    }
}
