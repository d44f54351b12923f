use super::layout::LayoutDocument;
use crate::common::DomainResult;

/// Port the scene depends on for reading obstacle layout documents.
/// Adapters provide filesystem or in-memory sources.
pub trait LayoutSource: Send + Sync {
    fn load_layout(&self, name: &str) -> DomainResult<LayoutDocument>;
}
