// Pinpoint State Database
// SQLite and in-memory key-value stores

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::Mutex;

use crate::StateError;

/// String key-value storage shared by everything the toolbar persists.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
  async fn get(&self, key: &str) -> Result<Option<String>, StateError>;

  async fn set(&self, key: &str, value: &str) -> Result<(), StateError>;

  async fn remove(&self, key: &str) -> Result<bool, StateError>;
}

/// State database handle
pub struct StateDb {
  pool: SqlitePool,
}

impl StateDb {
  /// Open (creating if needed) the database at `db_path`
  pub async fn open(db_path: &Path) -> Result<Self, StateError> {
    if let Some(parent) = db_path.parent() {
      if !parent.as_os_str().is_empty() {
        tokio::fs::create_dir_all(parent).await?;
      }
    }

    let options = SqliteConnectOptions::new()
      .filename(db_path)
      .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
      .max_connections(1)
      .connect_with(options)
      .await?;

    // Run migrations
    sqlx::query(include_str!("schema.sql"))
      .execute(&pool)
      .await?;

    tracing::debug!(path = %db_path.display(), "opened state database");
    Ok(Self { pool })
  }

  /// Close the database
  pub async fn close(self) {
    self.pool.close().await;
  }
}

#[async_trait]
impl KeyValueStore for StateDb {
  async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
    let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?1")
      .bind(key)
      .fetch_optional(&self.pool)
      .await?;
    Ok(value)
  }

  async fn set(&self, key: &str, value: &str) -> Result<(), StateError> {
    sqlx::query(
      "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
       ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value)
    .bind(chrono::Utc::now().timestamp())
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<bool, StateError> {
    let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
      .bind(key)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() > 0)
  }
}

/// Process-local store for sessions that should not outlive the process.
#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
  async fn get(&self, key: &str) -> Result<Option<String>, StateError> {
    Ok(self.entries.lock().await.get(key).cloned())
  }

  async fn set(&self, key: &str, value: &str) -> Result<(), StateError> {
    self
      .entries
      .lock()
      .await
      .insert(key.to_string(), value.to_string());
    Ok(())
  }

  async fn remove(&self, key: &str) -> Result<bool, StateError> {
    Ok(self.entries.lock().await.remove(key).is_some())
  }
}
