pub mod config;
pub mod errors;
pub mod tracker;

pub use config::*;
pub use errors::*;
pub use tracker::*;
