use super::backend::StorageBackend;
use crate::error::{Result, SyncError};
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

/// Filesystem backend: one `<key>.json` file per collection under `root`.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn blob_filename(key: &str) -> String {
        format!("{}.json", key)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(SyncError::Io)?;
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.location(key);
        if !path.exists() {
            return Ok(None);
        }
        let blob = fs::read_to_string(path).map_err(SyncError::Io)?;
        Ok(Some(blob))
    }

    fn save(&self, key: &str, blob: &str) -> Result<()> {
        self.ensure_dir()?;

        let target_path = self.location(key);

        // Atomic write
        let tmp_path = self.root.join(format!(".{}-{}.tmp", key, Uuid::new_v4()));
        fs::write(&tmp_path, blob).map_err(SyncError::Io)?;
        fs::rename(&tmp_path, target_path).map_err(SyncError::Io)?;

        Ok(())
    }

    fn location(&self, key: &str) -> PathBuf {
        self.root.join(Self::blob_filename(key))
    }
}
