pub mod apply;
pub mod errors;
pub mod validation;

pub use apply::*;
pub use errors::*;
pub use validation::*;
