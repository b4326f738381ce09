use serde::{Deserialize, Serialize};

/// Agent-agnostic instruction handed to the dispatch router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
  pub prompt: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub files: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub images: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub model: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub mode: Option<String>,
}

impl PromptRequest {
  pub fn new(prompt: impl Into<String>) -> Self {
    Self {
      prompt: prompt.into(),
      ..Self::default()
    }
  }

  /// Prompt text with the file and image reference lists appended.
  ///
  /// `model` and `mode` are not forwarded to any integration yet.
  pub fn compose_text(&self) -> String {
    let mut text = self.prompt.clone();
    if let Some(files) = self.files.as_ref().filter(|f| !f.is_empty()) {
      text.push_str("\n\n use the following files: ");
      text.push_str(&files.join("\n"));
    }
    if let Some(images) = self.images.as_ref().filter(|i| !i.is_empty()) {
      text.push_str("\n\n use the following images: ");
      text.push_str(&images.join("\n"));
    }
    text
  }
}
