pub mod cache;
pub mod loader;
pub mod types;
pub mod validator;

pub use cache::{RegistryCache, RegistrySource};
pub use loader::*;
pub use types::*;
pub use validator::{is_enabled, validate_fragment, Rejection};
