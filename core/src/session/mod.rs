// Toolbar Session
// Draft composition, preferences and the mirrored agent state

mod state;

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use pinpoint_config::Config;
use pinpoint_protocol::{
  AgentAvailability, AgentAvailabilityError, AgentEvent, PluginAnnotation, SelectedDoc,
  SelectedElement, UserMessage,
};
use pinpoint_state::{PreferencesStore, StateError, ToolbarPreferences};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, info, warn};

pub use state::{AgentMirror, Draft, MAX_AGENT_MESSAGES};

use crate::assembler::{AssemblyPluginFailure, MessageAssembler, PluginRegistry};
use crate::context::{
  BlockStub, CollectionDegradation, ContextCollector, DomContextEntry, PageInfo, RegistryClient,
  RegistryError, ThemeStub,
};
use crate::transport::{AgentTransport, TransportError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
  #[error("cannot send an empty message")]
  EmptyMessage,

  #[error(transparent)]
  Transport(#[from] TransportError),
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
  #[error(transparent)]
  Registry(#[from] RegistryError),

  #[error(transparent)]
  Transport(#[from] TransportError),
}

/// A message that went out, with everything that was degraded on the way.
#[derive(Debug, Clone)]
pub struct SentMessage {
  pub message: UserMessage,
  pub collection_warnings: Vec<CollectionDegradation>,
  pub plugin_warnings: Vec<AssemblyPluginFailure>,
}

struct MirrorTask {
  cancellation_token: CancellationToken,
  _handle: AbortOnDropHandle<()>,
}

/// Toolbar-side session. Owns the draft and the mirrored agent state; both
/// change only through the methods here, each applied as an update of the
/// latest value.
pub struct SessionStore {
  transport: Arc<dyn AgentTransport>,
  collector: ContextCollector,
  assembler: Arc<MessageAssembler>,
  preferences_store: PreferencesStore,
  preferences: watch::Sender<ToolbarPreferences>,
  draft: watch::Sender<Draft>,
  agent: Arc<watch::Sender<AgentMirror>>,
  prompt_creation: Arc<watch::Sender<bool>>,
  mirror: Mutex<Option<MirrorTask>>,
}

impl SessionStore {
  /// Restore preferences, take an initial snapshot of the agent and start
  /// mirroring its events.
  pub async fn open(
    transport: Arc<dyn AgentTransport>,
    collector: ContextCollector,
    assembler: Arc<MessageAssembler>,
    preferences_store: PreferencesStore,
  ) -> Result<Self, TransportError> {
    let preferences = preferences_store.load().await;
    let (preferences, _) = watch::channel(preferences);
    let (draft, _) = watch::channel(Draft::default());
    let (agent, _) = watch::channel(AgentMirror::default());
    let (prompt_creation, _) = watch::channel(false);

    let store = Self {
      transport,
      collector,
      assembler,
      preferences_store,
      preferences,
      draft,
      agent: Arc::new(agent),
      prompt_creation: Arc::new(prompt_creation),
      mirror: Mutex::new(None),
    };

    // Subscribe before the snapshot so nothing published in between is lost.
    let events = store.transport.subscribe();
    for event in store.transport.sync().await? {
      apply_event(&store.agent, &store.prompt_creation, event);
    }
    store.start_mirror(events);
    Ok(store)
  }

  /// Open a session wired from `config`: registry lookups over HTTP against
  /// `registry.base_url`, plugins bounded by `assembly.plugin_timeout_ms`.
  pub async fn from_config(
    transport: Arc<dyn AgentTransport>,
    config: &Config,
    plugins: PluginRegistry,
    preferences_store: PreferencesStore,
  ) -> Result<Self, OpenError> {
    let registry = RegistryClient::new(&config.registry)?;
    let collector = ContextCollector::new(Arc::new(registry));
    let assembler = MessageAssembler::new(plugins, config.assembly.plugin_timeout());
    Ok(Self::open(transport, collector, Arc::new(assembler), preferences_store).await?)
  }

  fn start_mirror(&self, events: broadcast::Receiver<AgentEvent>) {
    let cancellation_token = CancellationToken::new();
    let handle = tokio::spawn(run_mirror(
      events,
      Arc::clone(&self.agent),
      Arc::clone(&self.prompt_creation),
      cancellation_token.clone(),
    ));
    let previous = self
      .mirror
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .replace(MirrorTask {
        cancellation_token,
        _handle: AbortOnDropHandle::new(handle),
      });
    if let Some(previous) = previous {
      previous.cancellation_token.cancel();
    }
  }

  /// Stop mirroring agent events.
  pub fn teardown(&self) {
    let task = self
      .mirror
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .take();
    if let Some(task) = task {
      task.cancellation_token.cancel();
      debug!("session mirror stopped");
    }
  }

  pub fn agent(&self) -> AgentMirror {
    self.agent.borrow().clone()
  }

  pub fn subscribe_agent(&self) -> watch::Receiver<AgentMirror> {
    self.agent.subscribe()
  }

  pub fn input_enabled(&self) -> bool {
    self.agent.borrow().accepts_input()
  }

  pub fn draft(&self) -> Draft {
    self.draft.borrow().clone()
  }

  pub fn set_input(&self, input: &str) {
    self.draft.send_if_modified(|draft| draft.set_input(input));
  }

  /// Add an element, asking every plugin for an annotation first. Plugins that
  /// fail are skipped.
  pub async fn add_dom_context(&self, element: SelectedElement) -> bool {
    let annotations = join_all(self.assembler.plugins().iter().map(|plugin| {
      let element = &element;
      async move {
        match plugin.on_context_element_select(element).await {
          Ok(content) => content.map(|content| PluginAnnotation {
            plugin_name: plugin.name().to_string(),
            content,
          }),
          Err(e) => {
            warn!(plugin = plugin.name(), "element annotation failed: {e:#}");
            None
          }
        }
      }
    }))
    .await;

    let entry = DomContextEntry {
      element,
      plugin_annotations: annotations.into_iter().flatten().collect(),
    };
    self
      .draft
      .send_if_modified(|draft| draft.add_dom_context(entry))
  }

  pub fn remove_dom_context(&self, xpath: &str) -> bool {
    self
      .draft
      .send_if_modified(|draft| draft.remove_dom_context(xpath))
  }

  pub fn add_doc(&self, doc: SelectedDoc) -> bool {
    self.draft.send_if_modified(|draft| draft.add_doc(doc))
  }

  pub fn remove_doc(&self, id: &str) -> bool {
    self.draft.send_if_modified(|draft| draft.remove_doc(id))
  }

  pub fn add_block(&self, block: BlockStub) -> bool {
    self.draft.send_if_modified(|draft| draft.add_block(block))
  }

  pub fn remove_block(&self, name: &str) -> bool {
    self.draft.send_if_modified(|draft| draft.remove_block(name))
  }

  pub fn add_theme(&self, theme: ThemeStub) -> bool {
    self.draft.send_if_modified(|draft| draft.add_theme(theme))
  }

  pub fn remove_theme(&self, name: &str) -> bool {
    self.draft.send_if_modified(|draft| draft.remove_theme(name))
  }

  pub fn clear_draft(&self) {
    self.draft.send_if_modified(Draft::clear);
  }

  /// Enter element-selection mode. Refused while the agent is busy or
  /// disconnected.
  pub fn start_prompt_creation(&self) -> bool {
    if !self.input_enabled() {
      return false;
    }
    self.prompt_creation.send_if_modified(|active| !std::mem::replace(active, true));
    true
  }

  pub fn stop_prompt_creation(&self) {
    self.prompt_creation.send_if_modified(|active| std::mem::replace(active, false));
  }

  pub fn prompt_creation_active(&self) -> bool {
    *self.prompt_creation.borrow()
  }

  pub fn preferences(&self) -> ToolbarPreferences {
    *self.preferences.borrow()
  }

  /// Apply `update` to the current preferences and persist the result.
  pub async fn update_preferences<F>(&self, update: F) -> Result<ToolbarPreferences, StateError>
  where
    F: FnOnce(&mut ToolbarPreferences),
  {
    self.preferences.send_modify(update);
    let preferences = *self.preferences.borrow();
    self.preferences_store.save(&preferences).await?;
    Ok(preferences)
  }

  /// Collect the draft's context, assemble the message and submit it. The
  /// draft is cleared and selection mode left once the agent accepted it.
  pub async fn send_message(&self, page: PageInfo) -> Result<SentMessage, SendError> {
    let draft = self.draft();
    if draft.input.trim().is_empty() {
      return Err(SendError::EmptyMessage);
    }

    let preferences = self.preferences();
    let collection = self
      .collector
      .collect(
        &draft.selection(page),
        preferences.prompt_action,
        preferences.cli_version,
      )
      .await;
    let assembly = self
      .assembler
      .assemble(&draft.input, collection.metadata)
      .await;

    self
      .transport
      .send_user_message(assembly.message.clone())
      .await?;
    info!(message_id = %assembly.message.id, "message sent");

    self.clear_draft();
    self.stop_prompt_creation();
    Ok(SentMessage {
      message: assembly.message,
      collection_warnings: collection.warnings,
      plugin_warnings: assembly.warnings,
    })
  }
}

impl Drop for SessionStore {
  fn drop(&mut self) {
    self.teardown();
  }
}

fn apply_event(agent: &watch::Sender<AgentMirror>, prompt_creation: &watch::Sender<bool>, event: AgentEvent) {
  agent.send_modify(|mirror| mirror.apply(event));
  if !agent.borrow().state.state.accepts_user_input() {
    prompt_creation.send_if_modified(|active| std::mem::replace(active, false));
  }
}

async fn run_mirror(
  mut events: broadcast::Receiver<AgentEvent>,
  agent: Arc<watch::Sender<AgentMirror>>,
  prompt_creation: Arc<watch::Sender<bool>>,
  cancellation_token: CancellationToken,
) {
  loop {
    tokio::select! {
      _ = cancellation_token.cancelled() => break,
      event = events.recv() => match event {
        Ok(event) => apply_event(&agent, &prompt_creation, event),
        Err(RecvError::Lagged(skipped)) => {
          warn!(skipped, "session mirror lagged behind agent events");
        }
        Err(RecvError::Closed) => {
          agent.send_modify(|mirror| {
            mirror.availability =
              AgentAvailability::unavailable(AgentAvailabilityError::NoConnection, None);
          });
          prompt_creation.send_if_modified(|active| std::mem::replace(active, false));
          break;
        }
      },
    }
  }
}
