// Pinpoint Protocol Layer
// Requests from the toolbar and events pushed back by the agent host

pub mod config_types;
pub mod items;
pub mod models;
pub mod selection;
pub mod user_input;

pub use config_types::{CliVersion, PromptAction, ThemePreference};
pub use items::{AgentAvailability, AgentAvailabilityError, AgentInfo, AgentState, AgentStateType};
pub use models::PromptRequest;
pub use selection::{
  BoundingRect, ContextCategory, PluginAnnotation, SelectedBlock, SelectedDoc, SelectedElement,
  SelectedTheme,
};
pub use user_input::{
  PluginContent, UserMessage, UserMessageContentItem, UserMessageMetadata, ViewportResolution,
};

use serde::{Deserialize, Serialize};

/// Requests submitted by the toolbar over the transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ToolbarRequest {
  /// Submit a composed user message
  SendUserMessage(UserMessage),
  /// Ask for a snapshot of state, availability and info
  Sync,
}

/// Updates reported by the agent running inside the IDE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum AgentRequest {
  /// The agent moved to a new phase
  SetState(AgentState),
  /// The agent has content for the toolbar chat
  AgentMessage(AgentMessageUpdate),
}

/// Events pushed by the agent host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum AgentEvent {
  /// Agent phase changed
  StateChanged(AgentState),
  /// Agent availability changed
  AvailabilityChanged(AgentAvailability),
  /// Agent name or description changed
  InfoChanged(AgentInfo),
  /// Agent-authored message content
  AgentMessage(AgentMessageUpdate),
}

/// Content the agent wants to show in the toolbar chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessageUpdate {
  pub message_id: String,
  pub content_items: Vec<UserMessageContentItem>,
  /// True when the update replaces earlier content of the same message
  #[serde(default)]
  pub resync: bool,
}
