//! Data models for rides API entities

mod estimate;
mod product;

pub use estimate::*;
pub use product::*;
