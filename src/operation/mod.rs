mod builder;
mod shape;

pub use crate::document::{HttpMethod, ParamLocation};
pub use builder::{OperationModelBuilder, build_operations};
pub use shape::OperationShape;
