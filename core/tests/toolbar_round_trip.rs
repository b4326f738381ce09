use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pinpoint_config::Config;
use pinpoint_core::assembler::{ContextSnippet, MessageAssembler, PluginRegistry, ToolbarPlugin};
use pinpoint_core::context::{BlockStub, ContextCollector, PageInfo, ThemeStub};
use pinpoint_core::dispatch::{HostCall, RecordingHost};
use pinpoint_core::{LocalTransport, SendError, SessionStore};
use pinpoint_protocol::{AgentStateType, PromptAction, SelectedElement, UserMessage};
use pinpoint_state::{MemoryStore, PreferencesStore};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{OfflineRegistry, started_service};

struct ComponentPlugin;

#[async_trait]
impl ToolbarPlugin for ComponentPlugin {
  fn name(&self) -> &str {
    "react"
  }

  async fn on_prompt_send(&self, _message: &UserMessage) -> anyhow::Result<Vec<ContextSnippet>> {
    Ok(vec![ContextSnippet::new("component", "HeroSection")])
  }

  async fn on_context_element_select(
    &self,
    element: &SelectedElement,
  ) -> anyhow::Result<Option<String>> {
    Ok(element.attributes.get("id").map(|id| format!("#{id} in HeroSection")))
  }
}

/// Answers after a second, long past any sensible plugin timeout.
struct SlowPlugin;

#[async_trait]
impl ToolbarPlugin for SlowPlugin {
  fn name(&self) -> &str {
    "slow"
  }

  async fn on_prompt_send(&self, _message: &UserMessage) -> anyhow::Result<Vec<ContextSnippet>> {
    tokio::time::sleep(Duration::from_secs(1)).await;
    Ok(vec![ContextSnippet::new("late", "never seen")])
  }
}

async fn session(host: RecordingHost, plugins: PluginRegistry) -> (Arc<RecordingHost>, SessionStore) {
  let (host, service) = started_service(host);
  let preferences = PreferencesStore::new(Arc::new(MemoryStore::new()), "pinpoint:companion");
  let store = SessionStore::open(
    Arc::new(LocalTransport::new(service)),
    ContextCollector::new(Arc::new(OfflineRegistry)),
    Arc::new(MessageAssembler::new(plugins, Duration::from_secs(5))),
    preferences,
  )
  .await
  .expect("open session");
  (host, store)
}

fn page() -> PageInfo {
  PageInfo {
    url: Some("http://localhost:3000/".to_string()),
    title: Some("Landing".to_string()),
    ..PageInfo::default()
  }
}

#[tokio::test]
async fn make_this_bigger_on_cursor() {
  let (host, store) = session(RecordingHost::new("Cursor"), PluginRegistry::new()).await;
  assert_eq!(store.preferences().prompt_action, PromptAction::Send);
  assert!(store.input_enabled());

  let button = SelectedElement::new("button", "/html/body/main/button[1]").with_attribute("id", "cta");
  assert!(store.add_dom_context(button).await);
  store.set_input("make this bigger");

  let sent = store.send_message(page()).await.expect("send");
  assert!(sent.collection_warnings.is_empty());

  let calls = host.calls();
  assert!(
    !calls
      .iter()
      .any(|call| matches!(call, HostCall::WriteClipboard { .. }))
  );
  let dispatched: Vec<_> = calls
    .iter()
    .filter(|call| matches!(call, HostCall::ExecuteCommand { .. }))
    .collect();
  assert_eq!(
    dispatched,
    vec![&HostCall::ExecuteCommand {
      command: "composer.fixerrormessage".to_string(),
      payload: None,
    }]
  );

  let Some(HostCall::InjectDiagnostic { prompt }) = calls.first() else {
    panic!("expected diagnostic injection first, got {calls:?}");
  };
  assert!(prompt.contains("make this bigger"));
  let elements = prompt
    .split("<selected_elements>")
    .nth(1)
    .expect("selected elements section");
  assert!(elements.contains("<node_type>button</node_type>"));
  assert!(elements.contains("<id>cta</id>"));

  assert_eq!(store.draft().input, "");
  assert!(store.draft().dom_context.is_empty());
}

#[tokio::test]
async fn plugins_annotate_elements_and_add_snippets() {
  let mut plugins = PluginRegistry::new();
  plugins.register(Arc::new(ComponentPlugin));
  let (host, store) = session(RecordingHost::new("Trae"), plugins).await;

  store
    .add_dom_context(SelectedElement::new("h1", "/html/body/h1").with_attribute("id", "title"))
    .await;
  store.add_theme(ThemeStub {
    name: "sunset".to_string(),
  });
  store.set_input("use the theme for the title");

  let sent = store.send_message(page()).await.expect("send");
  assert_eq!(
    sent.message.metadata.selected_elements[0].plugin_info[0].content,
    "#title in HeroSection"
  );
  assert_eq!(
    sent.message.metadata.selected_themes[0].installation_command,
    "npx shadcn@latest add @ss-themes/sunset"
  );

  let calls = host.calls();
  let HostCall::ExecuteCommand {
    payload: Some(payload),
    ..
  } = &calls[0]
  else {
    panic!("trae receives one command with a payload");
  };
  let query = payload["query"].as_str().expect("query");
  assert!(query.contains("<plugin_contexts>\n<react>\n<component>HeroSection</component>"));
  assert!(query.contains("<react>#title in HeroSection</react>"));
}

#[tokio::test]
async fn empty_input_is_rejected_without_contacting_agent() {
  let (host, store) = session(RecordingHost::new("Cursor"), PluginRegistry::new()).await;
  store.set_input("   ");

  let err = store.send_message(page()).await.expect_err("empty");
  assert_eq!(err, SendError::EmptyMessage);
  assert!(host.calls().is_empty());
}

#[tokio::test]
async fn prompt_creation_stops_when_agent_gets_busy() {
  let (_host, store) = session(RecordingHost::new("Cursor"), PluginRegistry::new()).await;
  let mut agent = store.subscribe_agent();

  assert!(store.start_prompt_creation());
  assert!(store.prompt_creation_active());

  store.set_input("hello");
  store.send_message(page()).await.expect("send");

  agent
    .wait_for(|mirror| mirror.state.state == AgentStateType::Working)
    .await
    .expect("mirror sees WORKING");
  assert!(!store.prompt_creation_active());
  assert!(!store.start_prompt_creation());
}

#[tokio::test]
async fn preferences_drive_copy_and_persist() {
  let (host, store) = session(RecordingHost::new("Cursor"), PluginRegistry::new()).await;
  let updated = store
    .update_preferences(|p| p.prompt_action = PromptAction::Copy)
    .await
    .expect("save preferences");
  assert_eq!(updated.prompt_action, PromptAction::Copy);

  store.set_input("copy only");
  store.send_message(page()).await.expect("send");

  let calls = host.calls();
  assert_eq!(calls.len(), 1);
  assert!(matches!(&calls[0], HostCall::WriteClipboard { text } if text.contains("copy only")));
}

#[tokio::test]
async fn configured_session_uses_registry_and_plugin_timeout() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/r/themes/registry.json"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "items": [{ "name": "sunset" }]
    })))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/r/blocks/registry.json"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "items": [{ "name": "hero-01" }]
    })))
    .mount(&server)
    .await;

  let mut config = Config::default();
  config.registry.base_url = server.uri();
  config.assembly.plugin_timeout_ms = 50;

  let mut plugins = PluginRegistry::new();
  plugins.register(Arc::new(SlowPlugin));
  let (_host, service) = started_service(RecordingHost::new("Cursor"));
  let store = SessionStore::from_config(
    Arc::new(LocalTransport::new(service)),
    &config,
    plugins,
    PreferencesStore::new(Arc::new(MemoryStore::new()), config.storage.namespace.clone()),
  )
  .await
  .expect("open configured session");

  store.add_theme(ThemeStub {
    name: "sunset".to_string(),
  });
  store.add_block(BlockStub {
    name: "hero-99".to_string(),
    title: None,
    description: "retired hero".to_string(),
    category: None,
  });
  store.set_input("apply the theme");

  let sent = store.send_message(page()).await.expect("send");
  assert_eq!(
    sent.message.metadata.selected_themes[0].installation_command,
    "npx shadcn@latest add @ss-themes/sunset"
  );
  assert_eq!(sent.message.metadata.selected_blocks[0].installation_command, "");
  assert_eq!(sent.collection_warnings.len(), 1);
  assert_eq!(sent.collection_warnings[0].name, "hero-99");

  assert_eq!(sent.plugin_warnings.len(), 1);
  assert_eq!(sent.plugin_warnings[0].to_string(), "plugin `slow` timed out after 50 ms");
  assert!(sent.message.plugin_content.is_empty());
}
