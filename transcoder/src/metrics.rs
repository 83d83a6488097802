use lazy_static::lazy_static;
use prometheus::{Gauge, IntCounter, Registry, TextEncoder};

lazy_static! {
    pub static ref SESSION: Gauge =
        Gauge::new("session", "sessions owning an encoder process").unwrap();
    pub static ref STARTED: IntCounter =
        IntCounter::new("session_started", "encoder processes spawned").unwrap();
    pub static ref FAILED: IntCounter =
        IntCounter::new("session_failed", "sessions ended in the failed state").unwrap();
    pub static ref REGISTRY: Registry =
        Registry::new_custom(Some("livehls".to_string()), None).unwrap();
    pub static ref ENCODER: TextEncoder = TextEncoder::new();
}
