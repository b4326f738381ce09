// Prompt Rendering
// XML-tagged prompt text for text-based coding agents

use std::fmt::Write as _;

use pinpoint_protocol::prompts::context::{
  BLOCK_FOLLOW_UP_STEPS, BLOCK_INSTALL_STEP, BLOCK_INSTRUCTIONS_HEADER, DOC_INSTRUCTIONS,
  THEME_FOLLOW_UP_STEPS, THEME_INSTALL_STEP, THEME_INSTRUCTIONS_HEADER,
};
use pinpoint_protocol::{
  SelectedBlock, SelectedDoc, SelectedElement, SelectedTheme, UserMessage, UserMessageContentItem,
};

/// Render `message` as a single `<request>` document.
///
/// Sections for empty categories are left out. Output depends only on the
/// message, so rendering the same message twice gives identical text.
pub fn render_prompt(message: &UserMessage) -> String {
  let metadata = &message.metadata;
  let mut out = String::from("<request>\n");

  let text = message.text_parts().collect::<Vec<_>>().join("\n\n");
  push_tag(&mut out, "user_message", &text);
  push_optional(&mut out, "url", metadata.current_url.as_deref());

  if !metadata.selected_docs.is_empty() {
    out.push_str("<selected_docs>\n");
    for (index, doc) in metadata.selected_docs.iter().enumerate() {
      render_doc(&mut out, doc, index + 1);
    }
    out.push_str("</selected_docs>\n");
  }

  if !metadata.selected_blocks.is_empty() {
    out.push_str("<selected_blocks>\n");
    for (index, block) in metadata.selected_blocks.iter().enumerate() {
      render_block(&mut out, block, index + 1);
    }
    out.push_str("</selected_blocks>\n");
  }

  if !metadata.selected_themes.is_empty() {
    out.push_str("<selected_themes>\n");
    for (index, theme) in metadata.selected_themes.iter().enumerate() {
      render_theme(&mut out, theme, index + 1);
    }
    out.push_str("</selected_themes>\n");
  }

  push_optional(&mut out, "page_title", metadata.current_title.as_deref());
  push_optional(&mut out, "browser_locale", metadata.locale.as_deref());
  push_optional(&mut out, "user_agent", metadata.user_agent.as_deref());

  if !metadata.selected_elements.is_empty() {
    out.push_str("<selected_elements>\n");
    for (index, element) in metadata.selected_elements.iter().enumerate() {
      let tag = format!("element_{index}");
      open(&mut out, &tag);
      render_element(&mut out, element);
      close(&mut out, &tag);
    }
    out.push_str("</selected_elements>\n");
  }

  for (plugin, snippets) in &message.plugin_content {
    let texts: Vec<_> = snippets
      .iter()
      .filter_map(|(name, item)| match item {
        UserMessageContentItem::Text { text } => Some((name, text)),
        UserMessageContentItem::Image { .. } => None,
      })
      .collect();
    if texts.is_empty() {
      continue;
    }

    out.push_str("<plugin_contexts>\n");
    open(&mut out, plugin);
    for (name, text) in texts {
      push_tag(&mut out, name, text);
    }
    close(&mut out, plugin);
    out.push_str("</plugin_contexts>\n");
  }

  out.push_str("</request>");
  out
}

fn render_doc(out: &mut String, doc: &SelectedDoc, index: usize) {
  let _ = writeln!(out, "<doc index=\"{index}\">");
  push_tag(out, "instructions", DOC_INSTRUCTIONS);
  push_tag(out, "id", &doc.id);
  push_tag(out, "title", &doc.title);
  push_tag(out, "description", &doc.description);
  push_tag(out, "category", &doc.category.to_string());
  push_optional(out, "content", doc.content.as_deref());
  out.push_str("</doc>\n");
}

fn render_block(out: &mut String, block: &SelectedBlock, index: usize) {
  let instructions = numbered_instructions(
    BLOCK_INSTRUCTIONS_HEADER,
    BLOCK_INSTALL_STEP,
    &block.installation_command,
    &BLOCK_FOLLOW_UP_STEPS,
  );

  let _ = writeln!(out, "<block index=\"{index}\">");
  push_tag(out, "instructions", &instructions);
  push_tag(out, "path", &block.name);
  push_tag(out, "title", block.title.as_deref().unwrap_or(&block.name));
  push_tag(out, "description", &block.description);
  push_tag(out, "installation_command", &block.installation_command);
  out.push_str("</block>\n");
}

fn render_theme(out: &mut String, theme: &SelectedTheme, index: usize) {
  let instructions = numbered_instructions(
    THEME_INSTRUCTIONS_HEADER,
    THEME_INSTALL_STEP,
    &theme.installation_command,
    &THEME_FOLLOW_UP_STEPS,
  );

  let _ = writeln!(out, "<theme index=\"{index}\">");
  push_tag(out, "instructions", &instructions);
  push_tag(out, "name", &theme.name);
  push_tag(out, "installation_command", &theme.installation_command);
  out.push_str("</theme>\n");
}

fn numbered_instructions(header: &str, install: &str, command: &str, follow_up: &[&str]) -> String {
  let mut text = format!("\n{header}\n1. {install} {command}\n");
  for (offset, step) in follow_up.iter().enumerate() {
    let _ = writeln!(text, "{}. {step}", offset + 2);
  }
  text
}

/// Element body, with each ancestor nested one `<parent>` deeper.
fn render_element(out: &mut String, element: &SelectedElement) {
  push_tag(out, "node_type", &element.node_type);

  open(out, "attributes");
  for (key, value) in &element.attributes {
    push_tag(out, key, value);
  }
  close(out, "attributes");

  open(out, "properties");
  for (key, value) in &element.own_properties {
    push_tag(out, key, &value.to_string());
  }
  close(out, "properties");

  let rect = &element.bounding_client_rect;
  open(out, "bounding_client_rect");
  push_tag(out, "width", &rect.width.to_string());
  push_tag(out, "height", &rect.height.to_string());
  push_tag(out, "top", &rect.top.to_string());
  push_tag(out, "left", &rect.left.to_string());
  close(out, "bounding_client_rect");

  push_tag(out, "text_content", &element.text_content);

  open(out, "plugin_info");
  for annotation in &element.plugin_info {
    push_tag(out, &annotation.plugin_name, &annotation.content);
  }
  close(out, "plugin_info");

  push_tag(out, "xpath", &element.xpath);

  if let Some(parent) = &element.parent {
    open(out, "parent");
    render_element(out, parent);
    close(out, "parent");
  }
}

fn open(out: &mut String, tag: &str) {
  let _ = writeln!(out, "<{tag}>");
}

fn close(out: &mut String, tag: &str) {
  let _ = writeln!(out, "</{tag}>");
}

fn push_tag(out: &mut String, tag: &str, body: &str) {
  let _ = writeln!(out, "<{tag}>{body}</{tag}>");
}

fn push_optional(out: &mut String, tag: &str, body: Option<&str>) {
  if let Some(body) = body {
    push_tag(out, tag, body);
  }
}
