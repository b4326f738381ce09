// Pinpoint State
// Key-value persistence for toolbar session state

pub mod database;
pub mod preferences;

pub use database::{KeyValueStore, MemoryStore, StateDb};
pub use preferences::{PreferencesStore, ToolbarPreferences};

/// State storage errors
#[derive(Debug, thiserror::Error)]
pub enum StateError {
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid stored value: {0}")]
  Serialization(#[from] serde_json::Error),
}
