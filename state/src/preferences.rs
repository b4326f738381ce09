// Toolbar Preferences
// UI state restored at session start

use std::sync::Arc;

use pinpoint_protocol::{CliVersion, PromptAction, ThemePreference};
use serde::{Deserialize, Serialize};

use crate::StateError;
use crate::database::KeyValueStore;

/// Preferences persisted between toolbar sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolbarPreferences {
  pub theme: ThemePreference,
  pub minimized: bool,
  pub prompt_action: PromptAction,
  pub cli_version: CliVersion,
}

/// Stored shape; every field is optional so a partial or older document still
/// restores the fields it has.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPreferences {
  theme: Option<ThemePreference>,
  minimized: Option<bool>,
  prompt_action: Option<PromptAction>,
  cli_version: Option<CliVersion>,
}

impl From<StoredPreferences> for ToolbarPreferences {
  fn from(stored: StoredPreferences) -> Self {
    let defaults = ToolbarPreferences::default();
    Self {
      theme: stored.theme.unwrap_or(defaults.theme),
      minimized: stored.minimized.unwrap_or(defaults.minimized),
      prompt_action: stored.prompt_action.unwrap_or(defaults.prompt_action),
      cli_version: stored.cli_version.unwrap_or(defaults.cli_version),
    }
  }
}

/// Reads and writes [`ToolbarPreferences`] as one JSON document under a fixed
/// namespace key.
#[derive(Clone)]
pub struct PreferencesStore {
  store: Arc<dyn KeyValueStore>,
  namespace: String,
}

impl PreferencesStore {
  pub fn new(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
    Self {
      store,
      namespace: namespace.into(),
    }
  }

  pub fn namespace(&self) -> &str {
    &self.namespace
  }

  /// Load preferences, falling back to defaults when nothing usable is stored.
  pub async fn load(&self) -> ToolbarPreferences {
    let raw = match self.store.get(&self.namespace).await {
      Ok(Some(raw)) => raw,
      Ok(None) => return ToolbarPreferences::default(),
      Err(e) => {
        tracing::warn!(namespace = %self.namespace, "failed to load preferences: {e}");
        return ToolbarPreferences::default();
      }
    };

    match serde_json::from_str::<StoredPreferences>(&raw) {
      Ok(stored) => stored.into(),
      Err(e) => {
        tracing::warn!(namespace = %self.namespace, "ignoring corrupt preferences: {e}");
        ToolbarPreferences::default()
      }
    }
  }

  pub async fn save(&self, preferences: &ToolbarPreferences) -> Result<(), StateError> {
    let raw = serde_json::to_string(preferences)?;
    self.store.set(&self.namespace, &raw).await
  }

  /// Apply `update` to the stored preferences and persist the result.
  pub async fn update<F>(&self, update: F) -> Result<ToolbarPreferences, StateError>
  where
    F: FnOnce(&mut ToolbarPreferences),
  {
    let mut preferences = self.load().await;
    update(&mut preferences);
    self.save(&preferences).await?;
    Ok(preferences)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::database::MemoryStore;
  use pretty_assertions::assert_eq;

  fn store() -> (Arc<MemoryStore>, PreferencesStore) {
    let kv = Arc::new(MemoryStore::new());
    let prefs = PreferencesStore::new(kv.clone(), "pinpoint:companion");
    (kv, prefs)
  }

  #[tokio::test]
  async fn defaults_when_nothing_is_stored() {
    let (_, prefs) = store();
    let loaded = prefs.load().await;
    assert_eq!(loaded.prompt_action, PromptAction::Send);
    assert_eq!(loaded.cli_version, CliVersion::V3);
    assert_eq!(loaded.theme, ThemePreference::System);
    assert!(!loaded.minimized);
  }

  #[tokio::test]
  async fn partial_document_keeps_known_fields() {
    let (kv, prefs) = store();
    kv.set("pinpoint:companion", r#"{"promptAction":"both"}"#)
      .await
      .expect("seed");

    let loaded = prefs.load().await;
    assert_eq!(loaded.prompt_action, PromptAction::Both);
    assert_eq!(loaded.cli_version, CliVersion::V3);
  }

  #[tokio::test]
  async fn corrupt_document_falls_back_to_defaults() {
    let (kv, prefs) = store();
    kv.set("pinpoint:companion", "not json").await.expect("seed");
    assert_eq!(prefs.load().await, ToolbarPreferences::default());
  }

  #[tokio::test]
  async fn update_persists_under_namespace() {
    let (kv, prefs) = store();
    prefs
      .update(|p| {
        p.minimized = true;
        p.cli_version = CliVersion::V2;
      })
      .await
      .expect("update");

    let raw = kv
      .get("pinpoint:companion")
      .await
      .expect("get")
      .expect("stored");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(value["minimized"], serde_json::json!(true));
    assert_eq!(value["cliVersion"], serde_json::json!("v2"));
  }
}
