pub use serde_with;

pub mod location;
pub mod matrix;
pub mod order;
pub mod plan;
pub mod route;
pub mod supplier;
