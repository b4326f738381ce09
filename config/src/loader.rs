// Configuration Loader
// Layered configuration loading system

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::layered::{ConfigLayer, ConfigLayerSource, LayeredConfig};
use crate::profile::ConfigProfiles;
use crate::types::Config;

/// Keys accepted as `-c key=value` overrides.
pub const OVERRIDE_KEYS: &[&str] = &[
  "agent.name",
  "agent.description",
  "agent.completion_delay_ms",
  "agent.idle_delay_ms",
  "agent.completion_note",
  "assembly.plugin_timeout_ms",
  "registry.base_url",
  "registry.request_timeout_ms",
  "registry.email",
  "registry.license_key",
  "host.app_name",
  "host.workspace_name",
  "host.installed_extensions",
  "host.reply_timeout_ms",
  "storage.path",
  "storage.namespace",
];

/// Configuration loader with layered support
pub struct ConfigLoader {
  /// Global config directory
  global_dir: PathBuf,
  /// Project config directory
  project_dir: Option<PathBuf>,
  /// Profile to apply above the config files
  profile: Option<String>,
}

impl ConfigLoader {
  /// Create a new configuration loader
  pub fn new() -> Self {
    let global_dir = dirs::home_dir()
      .unwrap_or_else(|| PathBuf::from("."))
      .join(".pinpoint");

    Self {
      global_dir,
      project_dir: None,
      profile: None,
    }
  }

  /// Override the global config directory
  pub fn with_global_dir(mut self, dir: PathBuf) -> Self {
    self.global_dir = dir;
    self
  }

  /// Set project directory
  pub fn with_project_dir(mut self, dir: PathBuf) -> Self {
    self.project_dir = Some(dir);
    self
  }

  /// Select a named profile
  pub fn with_profile(mut self, profile: Option<String>) -> Self {
    self.profile = profile;
    self
  }

  /// Load configuration with CLI overrides
  pub fn load_with_cli_overrides(&self, cli_overrides: Vec<(String, String)>) -> Result<Config> {
    // Load layers in order:
    // 1. Built-in defaults
    // 2. Global config (~/.pinpoint/config.toml)
    // 3. Project config (.pinpoint/config.toml)
    // 4. Selected profile
    // 5. CLI overrides
    let mut layered = LayeredConfig::new();
    let mut profiles = ConfigProfiles::default();

    layered.add_layer(ConfigLayer {
      source: ConfigLayerSource::Default,
      values: toml::Value::try_from(Config::default()).context("serialize default config")?,
    });

    let global_path = self.global_dir.join("config.toml");
    if let Some(document) = read_document(&global_path)? {
      profiles.extend(ConfigProfiles::from_document(&document));
      layered.add_layer(ConfigLayer {
        source: ConfigLayerSource::GlobalConfig,
        values: strip_profiles(document),
      });
    }

    if let Some(project_dir) = &self.project_dir {
      let project_path = project_dir.join(".pinpoint").join("config.toml");
      if let Some(document) = read_document(&project_path)? {
        profiles.extend(ConfigProfiles::from_document(&document));
        layered.add_layer(ConfigLayer {
          source: ConfigLayerSource::ProjectConfig,
          values: strip_profiles(document),
        });
      }
    }

    if let Some(name) = &self.profile {
      let profile = profiles
        .get(name)
        .with_context(|| format!("Unknown config profile: {name}"))?;
      layered.add_layer(ConfigLayer {
        source: ConfigLayerSource::Profile(profile.name),
        values: profile.values,
      });
    }

    for (key, value) in cli_overrides {
      layered.add_layer(ConfigLayer {
        source: ConfigLayerSource::CliOverride,
        values: override_table(&key, &value)?,
      });
    }

    tracing::debug!(sources = ?layered.sources(), "merged configuration layers");
    let config = layered
      .merge()
      .try_into::<Config>()
      .context("Invalid configuration")?;
    Ok(config)
  }
}

impl Default for ConfigLoader {
  fn default() -> Self {
    Self::new()
  }
}

/// Split `key=value` arguments
pub fn parse_override(raw: &str) -> Result<(String, String)> {
  let (key, value) = raw
    .split_once('=')
    .with_context(|| format!("Config override must be KEY=VALUE: {raw}"))?;
  Ok((key.trim().to_string(), value.trim().to_string()))
}

fn read_document(path: &Path) -> Result<Option<toml::Value>> {
  if !path.exists() {
    return Ok(None);
  }
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read {}", path.display()))?;
  let document = toml::from_str(&content)
    .with_context(|| format!("Failed to parse {}", path.display()))?;
  Ok(Some(document))
}

fn strip_profiles(mut document: toml::Value) -> toml::Value {
  if let toml::Value::Table(table) = &mut document {
    table.remove("profiles");
  }
  document
}

/// Build a one-key table such as `{ agent = { idle_delay_ms = 10 } }`.
fn override_table(key: &str, value: &str) -> Result<toml::Value> {
  if !OVERRIDE_KEYS.contains(&key) {
    anyhow::bail!("Unknown config key: {key}");
  }

  let parsed = parse_override_value(value);
  let mut current = parsed;
  for segment in key.rsplit('.') {
    let mut table = toml::map::Map::new();
    table.insert(segment.to_string(), current);
    current = toml::Value::Table(table);
  }
  Ok(current)
}

/// TOML literal when it parses as one, plain string otherwise.
fn parse_override_value(value: &str) -> toml::Value {
  let probe = format!("v = {value}");
  toml::from_str::<toml::Table>(&probe)
    .ok()
    .and_then(|mut table| table.remove("v"))
    .unwrap_or_else(|| toml::Value::String(value.to_string()))
}
