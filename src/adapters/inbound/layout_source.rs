use crate::common::{DomainError, DomainResult};
use crate::domains::obstacles::{LayoutDocument, LayoutSource};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads JSON obstacle layouts from a directory.
pub struct FilesystemLayoutSource {
    base: PathBuf,
}

impl FilesystemLayoutSource {
    /// `base` falls back to `CROWD_DATA_DIR`, then `resources/layouts` when it
    /// exists, then the working directory.
    pub fn new(base: Option<PathBuf>) -> Self {
        let base = base.unwrap_or_else(|| {
            if let Ok(dir) = env::var("CROWD_DATA_DIR") {
                PathBuf::from(dir)
            } else {
                let default = Path::new("resources/layouts");
                if default.exists() {
                    default.to_path_buf()
                } else {
                    PathBuf::from(".")
                }
            }
        });
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl LayoutSource for FilesystemLayoutSource {
    fn load_layout(&self, name: &str) -> DomainResult<LayoutDocument> {
        let path = self.base.join(name);
        let json = fs::read_to_string(&path)
            .map_err(|e| DomainError::InfrastructureError(format!("{}: {}", path.display(), e)))?;
        LayoutDocument::from_json(&json)
    }
}
