// Configuration Types
// All configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Agent state machine settings
  pub agent: AgentConfig,
  /// Message assembly settings
  pub assembly: AssemblyConfig,
  /// Block/theme registry settings
  pub registry: RegistryConfig,
  /// Host IDE settings
  pub host: HostConfig,
  /// Preference storage settings
  pub storage: StorageConfig,
}

// ============================================================================
// AGENT CONFIGURATION
// ============================================================================

pub const DEFAULT_COMPLETION_DELAY_MS: u64 = 1000;
pub const DEFAULT_IDLE_DELAY_MS: u64 = 5000;
pub const DEFAULT_COMPLETION_NOTE: &str = "Prompt was added to the agents chatbox";

/// Agent state machine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
  /// Name advertised to the toolbar; defaults to the host application name
  pub name: Option<String>,
  /// Description advertised to the toolbar
  pub description: Option<String>,
  /// Delay between WORKING and COMPLETED
  pub completion_delay_ms: u64,
  /// Delay between COMPLETED and IDLE
  pub idle_delay_ms: u64,
  /// Description attached to the COMPLETED state
  pub completion_note: String,
}

impl AgentConfig {
  pub fn completion_delay(&self) -> Duration {
    Duration::from_millis(self.completion_delay_ms)
  }

  pub fn idle_delay(&self) -> Duration {
    Duration::from_millis(self.idle_delay_ms)
  }
}

impl Default for AgentConfig {
  fn default() -> Self {
    Self {
      name: None,
      description: None,
      completion_delay_ms: DEFAULT_COMPLETION_DELAY_MS,
      idle_delay_ms: DEFAULT_IDLE_DELAY_MS,
      completion_note: DEFAULT_COMPLETION_NOTE.to_string(),
    }
  }
}

// ============================================================================
// ASSEMBLY CONFIGURATION
// ============================================================================

/// Message assembly configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
  /// Upper bound for a single plugin's contribution
  pub plugin_timeout_ms: u64,
}

impl AssemblyConfig {
  pub fn plugin_timeout(&self) -> Duration {
    Duration::from_millis(self.plugin_timeout_ms)
  }
}

impl Default for AssemblyConfig {
  fn default() -> Self {
    Self {
      plugin_timeout_ms: 5000,
    }
  }
}

// ============================================================================
// REGISTRY CONFIGURATION
// ============================================================================

/// Block/theme registry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
  /// Registry origin, without trailing slash
  pub base_url: String,
  /// Per-request timeout
  pub request_timeout_ms: u64,
  /// Account email appended to v2 installation URLs
  pub email: Option<String>,
  /// License key appended to v2 installation URLs
  pub license_key: Option<String>,
}

impl RegistryConfig {
  pub fn request_timeout(&self) -> Duration {
    Duration::from_millis(self.request_timeout_ms)
  }
}

impl Default for RegistryConfig {
  fn default() -> Self {
    Self {
      base_url: "https://shadcnstudio.com".to_string(),
      request_timeout_ms: 10_000,
      email: None,
      license_key: None,
    }
  }
}

// ============================================================================
// HOST CONFIGURATION
// ============================================================================

/// Host IDE configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
  /// Application name used for IDE detection
  pub app_name: Option<String>,
  /// Workspace name advertised as the agent description
  pub workspace_name: Option<String>,
  /// Extension ids reported as installed without asking the editor
  pub installed_extensions: Vec<String>,
  /// How long to wait for the editor to answer a host request
  pub reply_timeout_ms: u64,
}

impl HostConfig {
  pub fn reply_timeout(&self) -> Duration {
    Duration::from_millis(self.reply_timeout_ms)
  }
}

impl Default for HostConfig {
  fn default() -> Self {
    Self {
      app_name: None,
      workspace_name: None,
      installed_extensions: Vec::new(),
      reply_timeout_ms: 10_000,
    }
  }
}

// ============================================================================
// STORAGE CONFIGURATION
// ============================================================================

pub const DEFAULT_PREFERENCES_NAMESPACE: &str = "pinpoint:companion";

/// Preference storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
  /// SQLite database path; `None` keeps preferences in memory
  pub path: Option<PathBuf>,
  /// Key the preferences document is stored under
  pub namespace: String,
}

impl StorageConfig {
  /// Default database location under the user's data directory.
  pub fn default_path() -> PathBuf {
    dirs::data_local_dir()
      .unwrap_or_else(|| PathBuf::from("."))
      .join("pinpoint")
      .join("state.sqlite")
  }
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      path: None,
      namespace: DEFAULT_PREFERENCES_NAMESPACE.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_file_keeps_defaults() {
    let config: Config = toml::from_str(
      r#"
        [agent]
        idle_delay_ms = 250
      "#,
    )
    .expect("parse partial config");

    assert_eq!(config.agent.idle_delay(), Duration::from_millis(250));
    assert_eq!(config.agent.completion_delay_ms, DEFAULT_COMPLETION_DELAY_MS);
    assert_eq!(config.storage.namespace, DEFAULT_PREFERENCES_NAMESPACE);
  }
}
