//! Structural elements module

mod material;
mod section;

pub use material::{SpringKind, SpringMaterial};
pub use section::ElasticSection;
