use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;

use api::response::{Session, SessionState};
use transcoder::config::{self, Config};

/// Writes a manifest, then idles until asked to stop.
pub const LIVE: &str = "trap 'exit 0' TERM; echo '#EXTM3U' > {playlist}; \
                        while :; do sleep 0.05; done";

/// Encoder replaced by a shell script; `{playlist}` and friends are
/// substituted as for the real encoder.
pub fn config(root: &Path, script: &str) -> Config {
    Config {
        encoder: config::Encoder {
            program: "sh".to_string(),
            args: Some(vec!["-c".to_string(), script.to_string()]),
            ..Default::default()
        },
        output: config::Output {
            root: root.to_path_buf(),
            playlist: "stream.m3u8".to_string(),
        },
        session: config::Session {
            stop_timeout_ms: 500,
            startup_grace_ms: 5_000,
            ready_poll_ms: 20,
            ..Default::default()
        },
        ..Default::default()
    }
}

pub struct Server {
    pub addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

impl Server {
    pub async fn start(cfg: Config) -> Self {
        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(transcoder::serve(cfg, listener, async move {
            let _ = stopped.await;
        }));
        Server {
            addr,
            stop: Some(stop),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Triggers graceful shutdown and waits for every session to be stopped.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .unwrap()
            .unwrap();
    }
}

pub async fn wait_for_state(server: &Server, id: &str, state: SessionState) -> Session {
    for _ in 0..250 {
        let res = reqwest::get(server.url(&api::path::session(id)))
            .await
            .unwrap();
        if res.status() == http::StatusCode::OK {
            let session = res.json::<Session>().await.unwrap();
            if session.state == state {
                return session;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("session {id} never reached {state}");
}

pub fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut d| d.next().is_none())
        .unwrap_or(true)
}
