// Context Collector
// Normalizes toolbar selections into UserMessageMetadata

use std::sync::Arc;

use futures::future::join_all;
use pinpoint_protocol::{
  CliVersion, ContextCategory, PluginAnnotation, PromptAction, SelectedBlock, SelectedDoc,
  SelectedElement, SelectedTheme, UserMessageMetadata, ViewportResolution,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::registry::{RegistryError, RegistryKind, RegistryLookup};

/// Page-level facts reported by the toolbar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageInfo {
  pub url: Option<String>,
  pub title: Option<String>,
  pub zoom_level: Option<f64>,
  pub viewport: Option<ViewportResolution>,
  pub device_pixel_ratio: Option<f64>,
  pub user_agent: Option<String>,
  pub locale: Option<String>,
}

/// A selected element plus what plugins said about it at selection time.
#[derive(Debug, Clone, PartialEq)]
pub struct DomContextEntry {
  pub element: SelectedElement,
  pub plugin_annotations: Vec<PluginAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStub {
  pub name: String,
  pub title: Option<String>,
  pub description: String,
  pub category: Option<ContextCategory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeStub {
  pub name: String,
}

/// Everything attached to one draft, in selection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSelection {
  pub page: PageInfo,
  pub elements: Vec<DomContextEntry>,
  pub docs: Vec<SelectedDoc>,
  pub blocks: Vec<BlockStub>,
  pub themes: Vec<ThemeStub>,
}

/// A registry item whose installation command could not be resolved. The
/// item is still sent, with an empty command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionDegradation {
  pub kind: &'static str,
  pub name: String,
  pub error: String,
}

#[derive(Debug, Clone)]
pub struct CollectionReport {
  pub metadata: UserMessageMetadata,
  pub warnings: Vec<CollectionDegradation>,
}

pub struct ContextCollector {
  registry: Arc<dyn RegistryLookup>,
}

impl ContextCollector {
  pub fn new(registry: Arc<dyn RegistryLookup>) -> Self {
    Self { registry }
  }

  /// Build message metadata from `selection`.
  ///
  /// Installation commands of all blocks and themes are looked up together and
  /// all of them are awaited before this returns.
  pub async fn collect(
    &self,
    selection: &ContextSelection,
    prompt_action: PromptAction,
    cli_version: CliVersion,
  ) -> CollectionReport {
    let block_lookups = selection.blocks.iter().map(|block| {
      self
        .registry
        .installation_command(RegistryKind::Blocks, &block.name, cli_version)
    });
    let theme_lookups = selection.themes.iter().map(|theme| {
      self
        .registry
        .installation_command(RegistryKind::Themes, &theme.name, cli_version)
    });
    let (block_commands, theme_commands) =
      futures::join!(join_all(block_lookups), join_all(theme_lookups));

    let mut warnings = Vec::new();
    let mut resolve = |kind: RegistryKind, name: &str, result: Result<String, RegistryError>| match result {
      Ok(command) => command,
      Err(e) => {
        warn!(kind = kind.singular(), %name, "installation command unavailable: {e}");
        warnings.push(CollectionDegradation {
          kind: kind.singular(),
          name: name.to_string(),
          error: e.to_string(),
        });
        String::new()
      }
    };

    let selected_blocks = selection
      .blocks
      .iter()
      .zip(block_commands)
      .map(|(block, result)| SelectedBlock {
        name: block.name.clone(),
        title: block.title.clone(),
        description: block.description.clone(),
        category: block.category,
        installation_command: resolve(RegistryKind::Blocks, &block.name, result),
      })
      .collect();

    let selected_themes = selection
      .themes
      .iter()
      .zip(theme_commands)
      .map(|(theme, result)| SelectedTheme {
        name: theme.name.clone(),
        installation_command: resolve(RegistryKind::Themes, &theme.name, result),
      })
      .collect();

    let selected_elements = selection
      .elements
      .iter()
      .map(|entry| {
        let mut element = entry.element.clone();
        element
          .plugin_info
          .extend(entry.plugin_annotations.iter().cloned());
        element
      })
      .collect();

    let page = &selection.page;
    let metadata = UserMessageMetadata {
      current_url: page.url.clone(),
      current_title: page.title.clone(),
      current_zoom_level: page.zoom_level,
      viewport_resolution: page.viewport,
      device_pixel_ratio: page.device_pixel_ratio,
      user_agent: page.user_agent.clone(),
      locale: page.locale.clone(),
      selected_elements,
      selected_docs: selection.docs.clone(),
      selected_blocks,
      selected_themes,
      prompt_action: Some(prompt_action),
      cli_version: Some(cli_version),
    };

    CollectionReport { metadata, warnings }
  }
}
