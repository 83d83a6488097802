use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config;
use crate::error::AppError;
use crate::result::Result;

/// Owns session output directories: `<root>/<id>/<key>/`.
///
/// Individual segments are created and rotated by the encoder itself; this
/// type only creates a fresh directory before start and removes it after the
/// session has ended.
#[derive(Debug, Clone)]
pub struct OutputManager {
    root: PathBuf,
    playlist: String,
}

impl OutputManager {
    pub fn new(cfg: config::Output) -> Self {
        Self {
            root: cfg.root,
            playlist: cfg.playlist,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output_path(&self, id: &str, key: &Uuid) -> PathBuf {
        self.root.join(id).join(key.to_string())
    }

    pub fn playlist_path(&self, output_path: &Path) -> PathBuf {
        output_path.join(&self.playlist)
    }

    pub fn playlist_url(&self, id: &str, key: &Uuid) -> String {
        api::path::playlist(id, &key.to_string(), &self.playlist)
    }

    /// Creates an empty directory for the session. An existing directory at
    /// the same path is a collision, not something to reuse.
    pub async fn provision(&self, id: &str, key: &Uuid) -> Result<PathBuf> {
        let parent = self.root.join(id);
        tokio::fs::create_dir_all(&parent).await.map_err(|e| {
            AppError::storage_error(format!("create {}: {}", parent.display(), e))
        })?;
        let path = self.output_path(id, key);
        tokio::fs::create_dir(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                AppError::storage_error(format!("output {} already in use", path.display()))
            } else {
                AppError::storage_error(format!("create {}: {}", path.display(), e))
            }
        })?;
        debug!(session = %id, path = %path.display(), "output provisioned");
        Ok(path)
    }

    /// Removes every segment and manifest of a finished session. Purging a
    /// path that is already gone succeeds.
    pub async fn purge(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => debug!(path = %path.display(), "output purged"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %path.display(), "output purge failed: {}", e);
                return Err(AppError::storage_error(format!(
                    "purge {}: {}",
                    path.display(),
                    e
                )));
            }
        }
        // The per-id parent goes away once its last session is purged.
        if let Some(parent) = path.parent() {
            if parent.starts_with(&self.root) && parent != self.root {
                let _ = tokio::fs::remove_dir(parent).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(root: &Path) -> OutputManager {
        OutputManager::new(config::Output {
            root: root.to_path_buf(),
            playlist: "stream.m3u8".to_string(),
        })
    }

    #[tokio::test]
    async fn test_provision_fresh_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let output = manager(tmp.path());
        let key = Uuid::new_v4();

        let path = output.provision("cam1", &key).await.unwrap();
        assert!(path.is_dir());
        assert_eq!(tmp.path().join("cam1").join(key.to_string()), path);
        assert_eq!(
            format!("/static/cam1/{key}/stream.m3u8"),
            output.playlist_url("cam1", &key)
        );

        assert!(matches!(
            output.provision("cam1", &key).await,
            Err(AppError::StorageError(_))
        ));

        let other = output.provision("cam1", &Uuid::new_v4()).await.unwrap();
        assert_ne!(path, other);
    }

    #[tokio::test]
    async fn test_purge_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let output = manager(tmp.path());
        let key = Uuid::new_v4();

        let path = output.provision("cam1", &key).await.unwrap();
        std::fs::write(output.playlist_path(&path), "#EXTM3U\n").unwrap();
        std::fs::write(path.join("segment_000.ts"), [0u8; 188]).unwrap();

        output.purge(&path).await.unwrap();
        assert!(!path.exists());
        assert!(!tmp.path().join("cam1").exists());
        assert!(tmp.path().exists());

        output.purge(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_purge_keeps_sibling_sessions() {
        let tmp = tempfile::tempdir().unwrap();
        let output = manager(tmp.path());

        let a = output.provision("cam1", &Uuid::new_v4()).await.unwrap();
        let b = output.provision("cam1", &Uuid::new_v4()).await.unwrap();
        output.purge(&a).await.unwrap();
        assert!(b.is_dir());
    }

    #[tokio::test]
    async fn test_provision_unwritable_root() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();
        let output = manager(&file);

        assert!(matches!(
            output.provision("cam1", &Uuid::new_v4()).await,
            Err(AppError::StorageError(_))
        ));
    }
}
