// Layered Configuration
// Support for layered configuration with precedence

use serde::{Deserialize, Serialize};

/// Layered configuration wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayeredConfig {
  /// Configuration layers, lowest precedence first
  layers: Vec<ConfigLayer>,
}

/// Configuration layer with source tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigLayer {
  /// Layer source
  pub source: ConfigLayerSource,
  /// Configuration values
  pub values: toml::Value,
}

/// Configuration layer source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigLayerSource {
  /// Built-in defaults
  Default,
  /// Global user config
  GlobalConfig,
  /// Project-specific config
  ProjectConfig,
  /// Named profile from any config file
  Profile(String),
  /// CLI override
  CliOverride,
}

impl LayeredConfig {
  /// Create a new layered configuration
  pub fn new() -> Self {
    Self { layers: Vec::new() }
  }

  /// Add a layer on top of the existing ones
  pub fn add_layer(&mut self, layer: ConfigLayer) {
    self.layers.push(layer);
  }

  pub fn sources(&self) -> Vec<ConfigLayerSource> {
    self.layers.iter().map(|l| l.source.clone()).collect()
  }

  /// Get merged configuration. Tables merge key by key; any other value in a
  /// higher layer replaces the lower one.
  pub fn merge(&self) -> toml::Value {
    let mut merged = toml::Value::Table(toml::map::Map::new());
    for layer in &self.layers {
      Self::merge_into(&mut merged, &layer.values);
    }
    merged
  }

  fn merge_into(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
      (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
        for (key, value) in overlay_table {
          match base_table.get_mut(key) {
            Some(existing) => Self::merge_into(existing, value),
            None => {
              base_table.insert(key.clone(), value.clone());
            }
          }
        }
      }
      (base, overlay) => *base = overlay.clone(),
    }
  }
}

impl Default for LayeredConfig {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn layer(source: ConfigLayerSource, raw: &str) -> ConfigLayer {
    ConfigLayer {
      source,
      values: toml::from_str(raw).expect("parse layer"),
    }
  }

  #[test]
  fn nested_tables_merge_key_by_key() {
    let mut layered = LayeredConfig::new();
    layered.add_layer(layer(
      ConfigLayerSource::Default,
      "[agent]\ncompletion_delay_ms = 1000\nidle_delay_ms = 5000\n",
    ));
    layered.add_layer(layer(
      ConfigLayerSource::ProjectConfig,
      "[agent]\nidle_delay_ms = 10\n",
    ));

    let merged = layered.merge();
    assert_eq!(merged["agent"]["completion_delay_ms"].as_integer(), Some(1000));
    assert_eq!(merged["agent"]["idle_delay_ms"].as_integer(), Some(10));
  }

  #[test]
  fn arrays_are_replaced_not_appended() {
    let mut layered = LayeredConfig::new();
    layered.add_layer(layer(
      ConfigLayerSource::GlobalConfig,
      "[host]\ninstalled_extensions = [\"a\", \"b\"]\n",
    ));
    layered.add_layer(layer(
      ConfigLayerSource::CliOverride,
      "[host]\ninstalled_extensions = [\"c\"]\n",
    ));

    let merged = layered.merge();
    let installed = merged["host"]["installed_extensions"]
      .as_array()
      .expect("array");
    assert_eq!(installed.len(), 1);
  }
}
