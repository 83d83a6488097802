use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use api::response::Session;

use super::supervisor::{EncoderProcess, Reaped};
use super::{
    derive_id, validate_id, OutputManager, Registry, SessionState, StreamSession, Supervisor,
};
use crate::config::Config;
use crate::error::AppError;
use crate::hook::webhook::WebHook;
use crate::hook::{Event, EventHook};
use crate::result::Result;
use crate::{metrics, new_broadcast_channel};

enum StopProgress {
    Done(Session),
    /// Reap watch and whether this call moved the session to `Stopping`
    Waiting(Reaped, bool),
}

/// Entry point for everything that starts, stops or inspects a session.
#[derive(Clone)]
pub struct SessionManager {
    registry: Arc<Registry>,
    output: OutputManager,
    supervisor: Supervisor,
    event_sender: broadcast::Sender<Event>,
}

impl SessionManager {
    pub async fn new(cfg: Config) -> Self {
        let send = new_broadcast_channel!(16);
        let registry = Arc::new(Registry::with_events(send.clone()));
        for web_hook_url in cfg.webhook.webhooks.iter() {
            let webhook = WebHook::new(web_hook_url.clone());
            let recv = send.subscribe();
            tokio::spawn(async move {
                webhook.hook(recv).await;
            });
        }

        tokio::spawn(Self::evict_tick(
            Arc::downgrade(&registry),
            cfg.session.retention(),
            cfg.session.evict_interval(),
        ));

        SessionManager {
            registry,
            output: OutputManager::new(cfg.output.clone()),
            supervisor: Supervisor::new(cfg.encoder.clone(), &cfg.session),
            event_sender: send,
        }
    }

    /// Ends once the manager and every clone of it are gone.
    async fn evict_tick(registry: Weak<Registry>, retention: Duration, interval: Duration) {
        loop {
            tokio::time::sleep(interval).await;
            let Some(registry) = registry.upgrade() else {
                break;
            };
            for id in registry.evict_expired(retention) {
                info!(session = %id, "session evicted after {:?}", retention);
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_sender.subscribe()
    }

    pub fn output(&self) -> &OutputManager {
        &self.output
    }

    /// Provisions output, spawns the encoder and registers the session as
    /// `Starting`. The id is derived from the URL when the caller has none.
    pub async fn start(&self, id: Option<String>, source_url: String) -> Result<Session> {
        self.supervisor.validate_source(&source_url)?;
        let id = match id {
            Some(id) if !validate_id(&id) => {
                return Err(AppError::invalid_input(format!(
                    "invalid session id: {id:?}, expected [A-Za-z0-9_-]{{1,64}}"
                )));
            }
            Some(id) => id,
            None => derive_id(&source_url),
        };

        self.registry.reserve(&id)?;
        let result = self.launch(&id, source_url).await;
        if result.is_err() {
            self.registry.release(&id);
        }
        result
    }

    async fn launch(&self, id: &str, source_url: String) -> Result<Session> {
        let key = Uuid::new_v4();
        let output_path = self.output.provision(id, &key).await?;
        let playlist_path = self.output.playlist_path(&output_path);

        let mut session = StreamSession {
            id: id.to_string(),
            key,
            source_url,
            output_path: output_path.clone(),
            playlist: self.output.playlist_url(id, &key),
            state: SessionState::Starting,
            process: None,
            started_at: Utc::now(),
            ended_at: None,
            last_error: None,
        };

        let (handle, process) =
            match self
                .supervisor
                .start(&session.source_url, &output_path, &playlist_path)
            {
                Ok(started) => started,
                Err(e) => {
                    warn!(session = %id, "encoder spawn failed: {}", e);
                    if let Err(e) = self.output.purge(&output_path).await {
                        error!(session = %id, "purge after spawn failure: {}", e);
                    }
                    session.terminate(SessionState::Failed, Some(e.to_string()));
                    metrics::FAILED.inc();
                    let _ = self.registry.register(session);
                    return Err(e);
                }
            };

        session.process = Some(handle);
        let info = match self.registry.register(session) {
            Ok(info) => info,
            Err(e) => {
                // Unreachable while the reservation is held; never leave the encoder behind.
                drop(process);
                let _ = self.output.purge(&output_path).await;
                return Err(e);
            }
        };
        metrics::SESSION.inc();
        metrics::STARTED.inc();
        info!(session = %id, pid = info.pid, source = %info.source_url, "session starting");

        tokio::spawn(
            self.clone()
                .supervise(id.to_string(), key, output_path, process),
        );
        Ok(info)
    }

    /// Owns the encoder for the whole session and performs the terminal
    /// transition once it has been reaped.
    async fn supervise(
        self,
        id: String,
        key: Uuid,
        output_path: PathBuf,
        mut process: EncoderProcess,
    ) {
        let registry = self.registry.clone();
        let report = process
            .monitor(|| {
                match registry.transition(
                    &id,
                    &key,
                    &[SessionState::Starting],
                    SessionState::Running,
                ) {
                    Ok(_) => info!(session = %id, "session running"),
                    Err(e) => debug!(session = %id, "ready ignored: {}", e),
                }
            })
            .await;

        // Exit without a stop request still passes through Stopping.
        if self
            .registry
            .transition(
                &id,
                &key,
                &[SessionState::Starting, SessionState::Running],
                SessionState::Stopping,
            )
            .is_ok()
        {
            warn!(session = %id, "encoder exited on its own: {}", report.describe());
        }

        let (mut state, mut last_error) = if report.is_clean() {
            (SessionState::Stopped, None)
        } else {
            (SessionState::Failed, Some(report.describe()))
        };
        if let Err(e) = self.output.purge(&output_path).await {
            if state == SessionState::Stopped {
                state = SessionState::Failed;
                last_error = Some(e.to_string());
            }
        }

        let snapshot = match self.registry.update(&id, |session| {
            if session.key != key {
                return Err(AppError::not_found(format!("session {id} was replaced")));
            }
            session.terminate(state, last_error);
            Ok(session.info())
        }) {
            Ok(info) => {
                metrics::SESSION.dec();
                if state == SessionState::Failed {
                    metrics::FAILED.inc();
                    warn!(session = %id, error = ?info.last_error, "session failed");
                } else {
                    info!(session = %id, "session stopped");
                }
                Some(info)
            }
            Err(e) => {
                error!(session = %id, "terminal transition lost: {}", e);
                None
            }
        };

        // Wakes stop callers waiting on this session.
        process.finish(snapshot);
    }

    /// Stops the encoder (gracefully, then forcefully), purges the output and
    /// returns the terminal snapshot.
    ///
    /// The snapshot always belongs to the session this call stopped, even if
    /// a new session with the same id starts before the call returns.
    pub async fn stop(&self, id: &str) -> Result<Session> {
        let progress = self.registry.update(id, |session| {
            let requested = match session.state {
                SessionState::Starting | SessionState::Running => {
                    session.state = SessionState::Stopping;
                    true
                }
                SessionState::Stopping => false,
                SessionState::Stopped | SessionState::Failed => {
                    return Ok(StopProgress::Done(session.info()));
                }
            };
            Ok(match session.process.as_mut() {
                Some(handle) => {
                    handle.request_stop();
                    StopProgress::Waiting(handle.reaped(), requested)
                }
                None => StopProgress::Done(session.info()),
            })
        })?;

        match progress {
            StopProgress::Done(info) => Ok(info),
            StopProgress::Waiting(reaped, requested) => {
                if requested {
                    info!(session = %id, "session stopping");
                }
                match reaped.wait().await {
                    Some(info) => Ok(info),
                    None => self.status(id),
                }
            }
        }
    }

    /// Snapshot of one session; never waits on a running stop.
    pub fn status(&self, id: &str) -> Result<Session> {
        self.registry
            .lookup(id)
            .ok_or_else(|| AppError::not_found(format!("session {id} not found")))
    }

    pub fn list(&self) -> Vec<Session> {
        self.registry.list()
    }

    /// Stops every session that still owns an encoder.
    pub async fn shutdown(&self) {
        let ids = self.registry.active_ids();
        if ids.is_empty() {
            return;
        }
        info!("stopping {} sessions", ids.len());
        let mut stops = JoinSet::new();
        for id in ids {
            let manager = self.clone();
            stops.spawn(async move { (manager.stop(&id).await, id) });
        }
        while let Some(joined) = stops.join_next().await {
            match joined {
                Ok((Ok(_), _)) => {}
                Ok((Err(e), id)) => warn!(session = %id, "stop on shutdown failed: {}", e),
                Err(e) => error!("stop task failed: {}", e),
            }
        }
    }
}
