// Agent Items
// Agent state, availability and identity as seen by the toolbar

use serde::{Deserialize, Serialize};

/// Phase of the agent's work on the current message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStateType {
  #[default]
  Idle,
  Thinking,
  Working,
  CallingTool,
  WaitingForUserResponse,
  Completed,
  Failed,
}

impl AgentStateType {
  pub const ALL: [AgentStateType; 7] = [
    AgentStateType::Idle,
    AgentStateType::Thinking,
    AgentStateType::Working,
    AgentStateType::CallingTool,
    AgentStateType::WaitingForUserResponse,
    AgentStateType::Completed,
    AgentStateType::Failed,
  ];

  /// States in which the toolbar lets the user compose a new prompt.
  pub fn accepts_user_input(self) -> bool {
    matches!(
      self,
      AgentStateType::Idle | AgentStateType::WaitingForUserResponse
    )
  }

  pub fn as_str(self) -> &'static str {
    match self {
      AgentStateType::Idle => "IDLE",
      AgentStateType::Thinking => "THINKING",
      AgentStateType::Working => "WORKING",
      AgentStateType::CallingTool => "CALLING_TOOL",
      AgentStateType::WaitingForUserResponse => "WAITING_FOR_USER_RESPONSE",
      AgentStateType::Completed => "COMPLETED",
      AgentStateType::Failed => "FAILED",
    }
  }
}

impl std::fmt::Display for AgentStateType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Current agent phase with an optional human readable note.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentState {
  pub state: AgentStateType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl AgentState {
  pub fn new(state: AgentStateType, description: Option<String>) -> Self {
    Self { state, description }
  }

  pub fn idle() -> Self {
    Self::default()
  }
}

/// Reason an agent reports itself unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentAvailabilityError {
  NoConnection,
  NoAuthentication,
  IncompatibleVersion,
  Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAvailability {
  pub is_available: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<AgentAvailabilityError>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error_message: Option<String>,
}

impl AgentAvailability {
  pub fn available() -> Self {
    Self {
      is_available: true,
      error: None,
      error_message: None,
    }
  }

  pub fn unavailable(error: AgentAvailabilityError, message: Option<String>) -> Self {
    Self {
      is_available: false,
      error: Some(error),
      error_message: message,
    }
  }
}

impl Default for AgentAvailability {
  fn default() -> Self {
    Self::unavailable(AgentAvailabilityError::NoConnection, None)
  }
}

/// Identity the agent host advertises to the toolbar.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentInfo {
  pub name: String,
  pub description: String,
}
