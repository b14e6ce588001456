pub mod definition;
pub mod examples;
pub mod loader;
pub mod validator;

pub use definition::*;
pub use examples::*;
pub use loader::load_document;
pub use validator::*;
