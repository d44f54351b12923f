pub mod layout;
pub mod obstacle;
pub mod ports;

pub use layout::*;
pub use obstacle::*;
pub use ports::*;
