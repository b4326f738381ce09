// Pinpoint Configuration System
// Layered configuration management

pub mod layered;
pub mod loader;
pub mod profile;
pub mod types;

pub use layered::LayeredConfig;
pub use loader::{ConfigLoader, parse_override};
pub use profile::{ConfigProfile, ConfigProfiles};
pub use types::*;
