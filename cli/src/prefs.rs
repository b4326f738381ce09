// Preference commands: open the configured store and edit single fields

use anyhow::{Context, Result, bail};
use pinpoint_config::StorageConfig;
use pinpoint_state::{MemoryStore, PreferencesStore, StateDb, ToolbarPreferences};
use serde_json::Value;
use std::sync::Arc;

/// Preferences backed by the configured SQLite file, or by memory when
/// `storage.path` is the empty string.
pub async fn open_store(storage: &StorageConfig) -> Result<PreferencesStore> {
    let path = storage.path.clone().unwrap_or_else(StorageConfig::default_path);
    if path.as_os_str().is_empty() {
        return Ok(PreferencesStore::new(
            Arc::new(MemoryStore::new()),
            storage.namespace.clone(),
        ));
    }

    let db = StateDb::open(&path)
        .await
        .with_context(|| format!("Failed to open state database {}", path.display()))?;
    Ok(PreferencesStore::new(Arc::new(db), storage.namespace.clone()))
}

/// Set `key` to `value` on `current`. Keys may be given in snake_case or
/// camelCase; values are parsed as JSON first and fall back to a plain string.
pub fn apply_preference(
    current: ToolbarPreferences,
    key: &str,
    value: &str,
) -> Result<ToolbarPreferences> {
    let field = camel_case(key);
    let mut document = serde_json::to_value(current)?;
    let Some(fields) = document.as_object_mut() else {
        bail!("Preferences are not an object");
    };
    if !fields.contains_key(&field) {
        bail!("Unknown preference: {key}");
    }

    let parsed = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    fields.insert(field, parsed);
    serde_json::from_value(document).with_context(|| format!("Invalid value for {key}: {value}"))
}

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for ch in key.chars() {
        if ch == '_' || ch == '-' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}
