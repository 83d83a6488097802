mod memory;

pub use memory::MemOverlayStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use api::response::Overlay;

use crate::result::Result;

pub type Document = Map<String, Value>;

/// Document collection holding overlay records.
///
/// `update` merges the given fields into the stored record, like a `$set`,
/// and reports how many records matched. `delete` reports how many records
/// were removed.
#[async_trait]
pub trait OverlayStore: Send + Sync {
    async fn insert(&self, record: Document) -> Result<Uuid>;

    async fn find_all(&self) -> Result<Vec<Overlay>>;

    async fn update(&self, id: Uuid, partial: Document) -> Result<u64>;

    async fn delete(&self, id: Uuid) -> Result<u64>;
}

pub const REQUIRED_FIELDS: [&str; 3] = ["text", "position", "size"];
