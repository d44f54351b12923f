pub mod coordinate;
pub mod interval;
pub mod path;
pub mod segment;

pub use coordinate::*;
pub use interval::*;
pub use path::*;
pub use segment::*;
