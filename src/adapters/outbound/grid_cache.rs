use crate::common::{DomainError, DomainResult};
use crate::domains::grid::GridCacheStore;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

/// Stores cell caches as files under a base directory.
pub struct FilesystemGridCache {
    base: PathBuf,
}

impl FilesystemGridCache {
    /// `base` falls back to `CROWD_CACHE_DIR`, then to the working directory.
    pub fn new(base: Option<PathBuf>) -> Self {
        let base = base.unwrap_or_else(|| match env::var("CROWD_CACHE_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => PathBuf::from("."),
        });
        Self { base }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }
}

impl GridCacheStore for FilesystemGridCache {
    fn load_cells(&self, name: &str) -> DomainResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DomainError::InfrastructureError(format!("{}", e))),
        }
    }

    fn save_cells(&self, name: &str, bytes: &[u8]) -> DomainResult<()> {
        if !self.base.exists() {
            fs::create_dir_all(&self.base).map_err(|e| DomainError::InfrastructureError(format!("{}", e)))?;
        }
        fs::write(self.path_for(name), bytes).map_err(|e| DomainError::InfrastructureError(format!("{}", e)))
    }
}

/// Process-local cache, handy when nothing should reach the disk.
#[derive(Default)]
pub struct MemoryGridCache {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryGridCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GridCacheStore for MemoryGridCache {
    fn load_cells(&self, name: &str) -> DomainResult<Option<Vec<u8>>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|e| DomainError::InfrastructureError(format!("{}", e)))?;
        Ok(blobs.get(name).cloned())
    }

    fn save_cells(&self, name: &str, bytes: &[u8]) -> DomainResult<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|e| DomainError::InfrastructureError(format!("{}", e)))?;
        blobs.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}
