use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub encoder: Encoder,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub session: Session,
    #[serde(default)]
    pub webhook: Webhook,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Http {
    #[serde(default = "default_http_listen")]
    pub listen: SocketAddr,
    #[serde(default = "default_true")]
    pub cors: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Log {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// External encoder invocation.
///
/// `args` overrides the built-in ffmpeg template. Every argument may contain
/// the placeholders `{input}`, `{output}`, `{playlist}`, `{segment}`,
/// `{hls_time}`, `{hls_list_size}`, `{codec}` and `{preset}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoder {
    #[serde(default = "default_encoder_program")]
    pub program: String,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default = "default_preset")]
    pub preset: String,
    /// Segment duration in seconds
    #[serde(default = "default_hls_time")]
    pub hls_time: u32,
    /// Segments kept in the rolling window
    #[serde(default = "default_hls_list_size")]
    pub hls_list_size: u32,
    /// Accepted source URL schemes
    #[serde(default = "default_schemes")]
    pub schemes: Vec<String>,
    /// Number of trailing stderr lines kept for error reports
    #[serde(default = "default_stderr_tail")]
    pub stderr_tail: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    #[serde(default = "default_output_root")]
    pub root: PathBuf,
    #[serde(default = "default_playlist")]
    pub playlist: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Wait for a graceful encoder exit before killing it
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
    /// A live encoder that has not written its manifest yet counts as running after this
    #[serde(default = "default_startup_grace_ms")]
    pub startup_grace_ms: u64,
    #[serde(default = "default_ready_poll_ms")]
    pub ready_poll_ms: u64,
    /// How long stopped and failed sessions stay queryable
    #[serde(default = "default_retention_ms")]
    pub retention_ms: u64,
    #[serde(default = "default_evict_interval_ms")]
    pub evict_interval_ms: u64,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Webhook {
    #[serde(default)]
    pub webhooks: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_http_listen() -> SocketAddr {
    SocketAddr::from_str(&format!(
        "0.0.0.0:{}",
        env::var("PORT").unwrap_or(String::from("5000"))
    ))
    .expect("invalid listen address")
}

fn default_log_level() -> String {
    env::var("LOG_LEVEL").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug".to_string()
        } else {
            "info".to_string()
        }
    })
}

fn default_encoder_program() -> String {
    "ffmpeg".to_string()
}

fn default_codec() -> String {
    "libx264".to_string()
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_hls_time() -> u32 {
    2
}

fn default_hls_list_size() -> u32 {
    3
}

fn default_schemes() -> Vec<String> {
    ["rtsp", "rtsps", "rtmp", "http", "https", "srt", "udp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_stderr_tail() -> usize {
    20
}

fn default_output_root() -> PathBuf {
    PathBuf::from("static")
}

fn default_playlist() -> String {
    "stream.m3u8".to_string()
}

fn default_stop_timeout_ms() -> u64 {
    5_000
}

fn default_startup_grace_ms() -> u64 {
    10_000
}

fn default_ready_poll_ms() -> u64 {
    200
}

fn default_retention_ms() -> u64 {
    60_000
}

fn default_evict_interval_ms() -> u64 {
    1_000
}

impl Default for Http {
    fn default() -> Self {
        Self {
            listen: default_http_listen(),
            cors: default_true(),
        }
    }
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self {
            program: default_encoder_program(),
            args: None,
            codec: default_codec(),
            preset: default_preset(),
            hls_time: default_hls_time(),
            hls_list_size: default_hls_list_size(),
            schemes: default_schemes(),
            stderr_tail: default_stderr_tail(),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self {
            root: default_output_root(),
            playlist: default_playlist(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            stop_timeout_ms: default_stop_timeout_ms(),
            startup_grace_ms: default_startup_grace_ms(),
            ready_poll_ms: default_ready_poll_ms(),
            retention_ms: default_retention_ms(),
            evict_interval_ms: default_evict_interval_ms(),
        }
    }
}

impl Session {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn startup_grace(&self) -> Duration {
        Duration::from_millis(self.startup_grace_ms)
    }

    pub fn ready_poll(&self) -> Duration {
        Duration::from_millis(self.ready_poll_ms.max(1))
    }

    pub fn retention(&self) -> Duration {
        Duration::from_millis(self.retention_ms)
    }

    pub fn evict_interval(&self) -> Duration {
        Duration::from_millis(self.evict_interval_ms.max(1))
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.encoder.program.trim().is_empty() {
            anyhow::bail!("encoder.program cannot be empty");
        }
        if self.encoder.hls_time == 0 {
            anyhow::bail!("encoder.hls_time must be greater than zero");
        }
        if self.encoder.schemes.is_empty() {
            anyhow::bail!("encoder.schemes cannot be empty");
        }
        if self.output.playlist.is_empty()
            || self.output.playlist.contains('/')
            || self.output.playlist.contains('\\')
        {
            anyhow::bail!("output.playlist must be a plain file name");
        }
        for webhook in self.webhook.webhooks.iter() {
            url::Url::parse(webhook)
                .map_err(|e| anyhow::anyhow!("webhook url error : {}: {}", webhook, e))?;
        }
        Ok(())
    }
}
