use crate::common::DomainResult;

/// Port for persisting the grid's obstacle-relevance cache between runs.
pub trait GridCacheStore: Send + Sync {
    /// Raw cache bytes, or `None` when nothing was stored under `name`.
    fn load_cells(&self, name: &str) -> DomainResult<Option<Vec<u8>>>;
    fn save_cells(&self, name: &str, bytes: &[u8]) -> DomainResult<()>;
}
