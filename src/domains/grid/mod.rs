pub mod cache;
pub mod cell;
pub mod index;
pub mod ports;

pub use cell::*;
pub use index::*;
pub use ports::*;
