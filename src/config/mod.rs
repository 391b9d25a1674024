pub mod registry;
pub mod types;
pub(crate) mod validators;

// Re-export all public types
pub use registry::HostRegistry;
pub use types::*;
