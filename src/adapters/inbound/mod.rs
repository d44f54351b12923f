pub mod layout_source;

pub use layout_source::*;
