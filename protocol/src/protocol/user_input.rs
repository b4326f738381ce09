// User Input Types
// A composed user message and its content parts

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::config_types::{CliVersion, PromptAction};
use super::selection::{SelectedBlock, SelectedDoc, SelectedElement, SelectedTheme};

/// Snippets contributed by plugins: plugin name -> snippet name -> content.
pub type PluginContent = IndexMap<String, IndexMap<String, UserMessageContentItem>>;

/// One typed part of a user message.
///
/// Unknown `type` tags fail deserialization instead of being carried along.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserMessageContentItem {
  Text {
    text: String,
  },
  Image {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
  },
}

impl UserMessageContentItem {
  pub fn text(text: impl Into<String>) -> Self {
    Self::Text { text: text.into() }
  }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text { text } => Some(text),
      Self::Image { .. } => None,
    }
  }
}

/// Viewport size of the page the message was composed on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportResolution {
  pub width: f64,
  pub height: f64,
}

/// Context describing the page and the user's selections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessageMetadata {
  pub current_url: Option<String>,
  pub current_title: Option<String>,
  pub current_zoom_level: Option<f64>,
  pub viewport_resolution: Option<ViewportResolution>,
  pub device_pixel_ratio: Option<f64>,
  pub user_agent: Option<String>,
  pub locale: Option<String>,
  #[serde(default)]
  pub selected_elements: Vec<SelectedElement>,
  #[serde(default)]
  pub selected_docs: Vec<SelectedDoc>,
  #[serde(default)]
  pub selected_blocks: Vec<SelectedBlock>,
  #[serde(default)]
  pub selected_themes: Vec<SelectedTheme>,
  pub prompt_action: Option<PromptAction>,
  pub cli_version: Option<CliVersion>,
}

/// A single composed request from the toolbar to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessage {
  pub id: String,
  pub created_at: DateTime<Utc>,
  pub content_items: Vec<UserMessageContentItem>,
  pub metadata: UserMessageMetadata,
  #[serde(default)]
  pub plugin_content: PluginContent,
  #[serde(default)]
  pub sent_by_plugin: bool,
}

impl UserMessage {
  /// Create a message with a fresh id and timestamp and no plugin content.
  pub fn new(content_items: Vec<UserMessageContentItem>, metadata: UserMessageMetadata) -> Self {
    Self {
      id: uuid::Uuid::new_v4().to_string(),
      created_at: Utc::now(),
      content_items,
      metadata,
      plugin_content: PluginContent::new(),
      sent_by_plugin: false,
    }
  }

  /// Text parts in order, skipping other kinds.
  pub fn text_parts(&self) -> impl Iterator<Item = &str> {
    self
      .content_items
      .iter()
      .filter_map(UserMessageContentItem::as_text)
  }

  /// True when at least one text part has non-whitespace content.
  pub fn has_text(&self) -> bool {
    self.text_parts().any(|text| !text.trim().is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn content_item_uses_type_tag() {
    let item = UserMessageContentItem::text("hello");
    let json = serde_json::to_value(&item).expect("serialize content item");
    assert_eq!(json, serde_json::json!({ "type": "text", "text": "hello" }));
  }

  #[test]
  fn unknown_content_kind_is_rejected() {
    let parsed = serde_json::from_str::<UserMessageContentItem>(r#"{"type":"audio","data":"x"}"#);
    assert!(parsed.is_err());
  }

  #[test]
  fn message_parses_camel_case_payload() {
    let raw = r#"{
      "id": "m1",
      "createdAt": "2025-01-01T00:00:00Z",
      "contentItems": [{ "type": "text", "text": "make it blue" }],
      "metadata": {
        "currentUrl": "http://localhost:3000/",
        "promptAction": "copy",
        "selectedElements": []
      },
      "pluginContent": { "react": { "component": { "type": "text", "text": "Button" } } },
      "sentByPlugin": false
    }"#;

    let message: UserMessage = serde_json::from_str(raw).expect("parse user message");
    assert_eq!(message.metadata.prompt_action, Some(PromptAction::Copy));
    assert_eq!(message.text_parts().collect::<Vec<_>>(), vec!["make it blue"]);
    assert_eq!(
      message.plugin_content["react"]["component"].as_text(),
      Some("Button")
    );
  }

  #[test]
  fn whitespace_only_text_is_not_content() {
    let message = UserMessage::new(
      vec![UserMessageContentItem::text("   ")],
      UserMessageMetadata::default(),
    );
    assert!(!message.has_text());
  }
}
