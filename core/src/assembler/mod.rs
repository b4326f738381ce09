// Message Assembler
// Builds the outbound UserMessage and collects plugin snippets

pub mod plugins;
mod render;

use std::time::Duration;

use futures::future::join_all;
use indexmap::IndexMap;
use pinpoint_protocol::{UserMessage, UserMessageContentItem, UserMessageMetadata};
use serde::Serialize;
use tracing::{debug, warn};

pub use plugins::{ContextSnippet, PluginRegistry, SnippetContent, ToolbarPlugin};
pub use render::render_prompt;

/// Why a plugin's contribution was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PluginFailureReason {
  Error { message: String },
  TimedOut { after_ms: u64 },
}

/// A plugin excluded from one message. The rest of the message is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyPluginFailure {
  pub plugin: String,
  pub reason: PluginFailureReason,
}

impl std::fmt::Display for AssemblyPluginFailure {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.reason {
      PluginFailureReason::Error { message } => {
        write!(f, "plugin `{}` failed: {message}", self.plugin)
      }
      PluginFailureReason::TimedOut { after_ms } => {
        write!(f, "plugin `{}` timed out after {after_ms} ms", self.plugin)
      }
    }
  }
}

#[derive(Debug, Clone)]
pub struct AssemblyReport {
  pub message: UserMessage,
  pub warnings: Vec<AssemblyPluginFailure>,
}

pub struct MessageAssembler {
  plugins: PluginRegistry,
  plugin_timeout: Duration,
}

impl MessageAssembler {
  pub fn new(plugins: PluginRegistry, plugin_timeout: Duration) -> Self {
    Self {
      plugins,
      plugin_timeout,
    }
  }

  pub fn plugins(&self) -> &PluginRegistry {
    &self.plugins
  }

  /// Build a message from `text` and `metadata`, then ask every plugin for
  /// snippets concurrently.
  ///
  /// Each plugin runs under its own timeout. A failing or slow plugin is left
  /// out and reported in the warnings; plugins that return no snippets are left
  /// out silently.
  pub async fn assemble(&self, text: &str, metadata: UserMessageMetadata) -> AssemblyReport {
    let mut message = UserMessage::new(vec![UserMessageContentItem::text(text)], metadata);

    let results = join_all(self.plugins.iter().map(|plugin| {
      let message = &message;
      async move {
        let outcome = tokio::time::timeout(
          self.plugin_timeout,
          collect_snippets(plugin.as_ref(), message),
        )
        .await;
        (plugin.name().to_string(), outcome)
      }
    }))
    .await;

    let mut warnings = Vec::new();
    for (plugin, outcome) in results {
      let reason = match outcome {
        Ok(Ok(snippets)) if snippets.is_empty() => continue,
        Ok(Ok(snippets)) => {
          debug!(%plugin, count = snippets.len(), "plugin contributed snippets");
          message.plugin_content.insert(plugin, snippets);
          continue;
        }
        Ok(Err(e)) => PluginFailureReason::Error {
          message: format!("{e:#}"),
        },
        Err(_) => PluginFailureReason::TimedOut {
          after_ms: u64::try_from(self.plugin_timeout.as_millis()).unwrap_or(u64::MAX),
        },
      };
      let failure = AssemblyPluginFailure { plugin, reason };
      warn!("{failure}");
      warnings.push(failure);
    }

    AssemblyReport { message, warnings }
  }
}

/// All snippets of one plugin, resolved in order. Any failing snippet fails
/// the whole plugin.
async fn collect_snippets(
  plugin: &dyn ToolbarPlugin,
  message: &UserMessage,
) -> anyhow::Result<IndexMap<String, UserMessageContentItem>> {
  let snippets = plugin.on_prompt_send(message).await?;
  let (names, contents): (Vec<_>, Vec<_>) = snippets
    .into_iter()
    .map(|snippet| (snippet.prompt_context_name, snippet.content.resolve()))
    .unzip();

  let mut resolved = IndexMap::with_capacity(names.len());
  for (name, text) in names.into_iter().zip(join_all(contents).await) {
    resolved.insert(name, UserMessageContentItem::text(text?));
  }
  Ok(resolved)
}
