pub mod errors;
pub mod manager;

pub use errors::*;
pub use manager::*;
