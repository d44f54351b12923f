pub mod geometry;
pub mod grid;
pub mod logger;
pub mod obstacles;
pub mod planning;
pub mod scene;

pub use logger::*;
