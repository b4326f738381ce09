// Toolbar Plugins
// Context contributors consulted when elements are selected and prompts are sent

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use pinpoint_protocol::{SelectedElement, UserMessage};

/// Snippet text, either known up front or still being produced.
pub enum SnippetContent {
  Ready(String),
  Pending(BoxFuture<'static, anyhow::Result<String>>),
}

impl SnippetContent {
  pub fn pending<F>(future: F) -> Self
  where
    F: std::future::Future<Output = anyhow::Result<String>> + Send + 'static,
  {
    Self::Pending(Box::pin(future))
  }

  pub async fn resolve(self) -> anyhow::Result<String> {
    match self {
      SnippetContent::Ready(text) => Ok(text),
      SnippetContent::Pending(future) => future.await,
    }
  }
}

impl From<String> for SnippetContent {
  fn from(text: String) -> Self {
    SnippetContent::Ready(text)
  }
}

impl From<&str> for SnippetContent {
  fn from(text: &str) -> Self {
    SnippetContent::Ready(text.to_string())
  }
}

/// Named piece of context a plugin adds to an outgoing prompt.
pub struct ContextSnippet {
  pub prompt_context_name: String,
  pub content: SnippetContent,
}

impl ContextSnippet {
  pub fn new(name: impl Into<String>, content: impl Into<SnippetContent>) -> Self {
    Self {
      prompt_context_name: name.into(),
      content: content.into(),
    }
  }
}

#[async_trait]
pub trait ToolbarPlugin: Send + Sync {
  fn name(&self) -> &str;

  /// Snippets for the message about to be sent. An empty list contributes
  /// nothing.
  async fn on_prompt_send(&self, message: &UserMessage) -> anyhow::Result<Vec<ContextSnippet>>;

  /// Annotation attached to an element when the user selects it.
  async fn on_context_element_select(
    &self,
    _element: &SelectedElement,
  ) -> anyhow::Result<Option<String>> {
    Ok(None)
  }
}

/// Plugins in registration order.
#[derive(Default, Clone)]
pub struct PluginRegistry {
  plugins: Vec<Arc<dyn ToolbarPlugin>>,
}

impl PluginRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register `plugin`, replacing an earlier plugin with the same name.
  pub fn register(&mut self, plugin: Arc<dyn ToolbarPlugin>) {
    self.plugins.retain(|p| p.name() != plugin.name());
    self.plugins.push(plugin);
  }

  pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ToolbarPlugin>> {
    self.plugins.iter()
  }
}
