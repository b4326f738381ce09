// Configuration Types for Protocol
// User preferences that travel with a message

use serde::{Deserialize, Serialize};

/// What the agent side does with a composed prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptAction {
  /// Deliver to the IDE agent only
  #[default]
  Send,
  /// Copy to the clipboard only
  Copy,
  /// Copy and deliver
  Both,
}

impl PromptAction {
  pub fn copies(self) -> bool {
    matches!(self, PromptAction::Copy | PromptAction::Both)
  }

  pub fn sends(self) -> bool {
    matches!(self, PromptAction::Send | PromptAction::Both)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      PromptAction::Send => "send",
      PromptAction::Copy => "copy",
      PromptAction::Both => "both",
    }
  }
}

impl std::str::FromStr for PromptAction {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "send" => Ok(PromptAction::Send),
      "copy" => Ok(PromptAction::Copy),
      "both" => Ok(PromptAction::Both),
      other => Err(format!("invalid prompt action: {other}")),
    }
  }
}

/// shadcn CLI generation used to format installation commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CliVersion {
  V2,
  #[default]
  V3,
}

impl CliVersion {
  pub fn as_str(self) -> &'static str {
    match self {
      CliVersion::V2 => "v2",
      CliVersion::V3 => "v3",
    }
  }
}

impl std::str::FromStr for CliVersion {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "v2" => Ok(CliVersion::V2),
      "v3" => Ok(CliVersion::V3),
      other => Err(format!("invalid cli version: {other}")),
    }
  }
}

/// Toolbar color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
  Light,
  Dark,
  #[default]
  System,
}

impl std::str::FromStr for ThemePreference {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "light" => Ok(ThemePreference::Light),
      "dark" => Ok(ThemePreference::Dark),
      "system" => Ok(ThemePreference::System),
      other => Err(format!("invalid theme: {other}")),
    }
  }
}
