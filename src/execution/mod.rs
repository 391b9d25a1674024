pub mod executor;
pub mod normalizer;

pub use executor::{CommandExecutor, DEFAULT_MAX_OUTPUT_BYTES};
pub use normalizer::parse_records;
