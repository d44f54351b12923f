pub mod agent;
pub mod settings;
pub mod world;

pub use agent::*;
pub use settings::*;
pub use world::*;
