use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use api::response::Overlay;

use super::{Document, OverlayStore};
use crate::result::Result;

/// Keeps overlays in insertion order for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemOverlayStore {
    records: RwLock<Vec<(Uuid, Document)>>,
}

impl MemOverlayStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OverlayStore for MemOverlayStore {
    async fn insert(&self, mut record: Document) -> Result<Uuid> {
        let id = Uuid::new_v4();
        record.remove("_id");
        self.records.write().await.push((id, record));
        Ok(id)
    }

    async fn find_all(&self) -> Result<Vec<Overlay>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .map(|(id, fields)| Overlay {
                id: id.to_string(),
                fields: fields.clone(),
            })
            .collect())
    }

    async fn update(&self, id: Uuid, partial: Document) -> Result<u64> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|(key, _)| *key == id) {
            Some((_, fields)) => {
                for (name, value) in partial {
                    if name != "_id" {
                        fields.insert(name, value);
                    }
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|(key, _)| *key != id);
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find_all() {
        let store = MemOverlayStore::new();
        let a = store
            .insert(document(json!({"text": "a", "position": {"x": 1}, "size": 10})))
            .await
            .unwrap();
        let b = store
            .insert(document(json!({"text": "b", "position": {"x": 2}, "size": 12})))
            .await
            .unwrap();
        assert_ne!(a, b);

        let all = store.find_all().await.unwrap();
        assert_eq!(2, all.len());
        assert_eq!(a.to_string(), all[0].id);
        assert_eq!(json!("a"), all[0].fields["text"]);
        assert_eq!(json!("b"), all[1].fields["text"]);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemOverlayStore::new();
        let id = store
            .insert(document(json!({"text": "a", "position": "top", "size": 10})))
            .await
            .unwrap();

        let matched = store
            .update(id, document(json!({"text": "b", "color": "red"})))
            .await
            .unwrap();
        assert_eq!(1, matched);

        let overlay = &store.find_all().await.unwrap()[0];
        assert_eq!(id.to_string(), overlay.id);
        assert_eq!(json!("b"), overlay.fields["text"]);
        assert_eq!(json!("top"), overlay.fields["position"]);
        assert_eq!(json!("red"), overlay.fields["color"]);

        assert_eq!(
            0,
            store
                .update(Uuid::new_v4(), document(json!({"text": "c"})))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_delete_counts() {
        let store = MemOverlayStore::new();
        let id = store
            .insert(document(json!({"text": "a", "position": "top", "size": 10})))
            .await
            .unwrap();
        assert_eq!(1, store.delete(id).await.unwrap());
        assert_eq!(0, store.delete(id).await.unwrap());
        assert!(store.find_all().await.unwrap().is_empty());
    }
}
