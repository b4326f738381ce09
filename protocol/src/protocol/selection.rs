// Selection Types
// Snapshots of what the user attached as context

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Bounding box of an element at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingRect {
  pub width: f64,
  pub height: f64,
  pub top: f64,
  pub left: f64,
}

/// Context a plugin attached to a selected element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginAnnotation {
  pub plugin_name: String,
  pub content: String,
}

/// Value snapshot of a DOM element and its ancestors.
///
/// The parent chain is owned, so it cannot form a cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedElement {
  pub node_type: String,
  #[serde(default)]
  pub attributes: IndexMap<String, String>,
  #[serde(default)]
  pub own_properties: IndexMap<String, serde_json::Value>,
  #[serde(default)]
  pub bounding_client_rect: BoundingRect,
  #[serde(default)]
  pub text_content: String,
  #[serde(default)]
  pub plugin_info: Vec<PluginAnnotation>,
  pub xpath: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub parent: Option<Box<SelectedElement>>,
}

impl SelectedElement {
  pub fn new(node_type: impl Into<String>, xpath: impl Into<String>) -> Self {
    Self {
      node_type: node_type.into(),
      xpath: xpath.into(),
      ..Self::default()
    }
  }

  pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.attributes.insert(key.into(), value.into());
    self
  }

  pub fn with_parent(mut self, parent: SelectedElement) -> Self {
    self.parent = Some(Box::new(parent));
    self
  }

  /// Ancestors from the direct parent up to the root.
  pub fn ancestors(&self) -> Ancestors<'_> {
    Ancestors {
      next: self.parent.as_deref(),
    }
  }

  /// Number of ancestors captured with this element.
  pub fn depth(&self) -> usize {
    self.ancestors().count()
  }
}

pub struct Ancestors<'a> {
  next: Option<&'a SelectedElement>,
}

impl<'a> Iterator for Ancestors<'a> {
  type Item = &'a SelectedElement;

  fn next(&mut self) -> Option<Self::Item> {
    let current = self.next?;
    self.next = current.parent.as_deref();
    Some(current)
  }
}

/// Where a doc entry was listed in the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextCategory {
  Popular,
  Recent,
}

impl std::fmt::Display for ContextCategory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ContextCategory::Popular => f.write_str("popular"),
      ContextCategory::Recent => f.write_str("recent"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedDoc {
  pub id: String,
  pub title: String,
  pub description: String,
  pub category: ContextCategory,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedBlock {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<ContextCategory>,
  pub installation_command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedTheme {
  pub name: String,
  pub installation_command: String,
}
