// Agent Service
// Receives user messages, drives the agent state and dispatches prompts

use std::sync::Arc;

use pinpoint_config::AgentConfig;
use pinpoint_protocol::{
  AgentAvailability, AgentAvailabilityError, AgentEvent, AgentInfo, AgentMessageUpdate,
  AgentRequest, AgentState, AgentStateType, PromptAction, PromptRequest, UserMessage,
};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::agent::{AgentStateMachine, AgentTimings};
use crate::assembler::render_prompt;
use crate::dispatch::{DispatchError, DispatchReport, DispatchRouter, Host};
use crate::event::EventBroadcaster;

const NO_WORKSPACE: &str = "No open workspace";

/// Agent side of the toolbar connection. Constructed explicitly and driven
/// through [`AgentService::start`] and [`AgentService::shutdown`].
pub struct AgentService {
  router: DispatchRouter,
  machine: AgentStateMachine,
  events: EventBroadcaster,
  availability: watch::Sender<AgentAvailability>,
  info: watch::Sender<AgentInfo>,
  name_override: Option<String>,
  description_override: Option<String>,
}

impl AgentService {
  pub fn new(host: Arc<dyn Host>, config: &AgentConfig) -> Self {
    let events = EventBroadcaster::default();
    let machine = AgentStateMachine::new(AgentTimings::from_config(config), events.clone());
    let (availability, _) = watch::channel(AgentAvailability::default());
    let (info, _) = watch::channel(AgentInfo {
      name: String::new(),
      description: NO_WORKSPACE.to_string(),
    });

    Self {
      router: DispatchRouter::new(host),
      machine,
      events,
      availability,
      info,
      name_override: config.name.clone(),
      description_override: config.description.clone(),
    }
  }

  /// Publish agent info and mark the agent available.
  pub fn start(&self) {
    let host = self.router.host();
    let info = AgentInfo {
      name: self
        .name_override
        .clone()
        .unwrap_or_else(|| host.app_name()),
      description: self
        .description_override
        .clone()
        .or_else(|| host.workspace_name())
        .unwrap_or_else(|| NO_WORKSPACE.to_string()),
    };
    info!(name = %info.name, ide = %self.router.detect(), "agent service started");

    self.info.send_replace(info.clone());
    self.events.publish(AgentEvent::InfoChanged(info));
    self.set_availability(AgentAvailability::available());
  }

  /// Cancel pending transitions and mark the agent unavailable.
  pub fn shutdown(&self) {
    self.machine.shutdown();
    self.set_availability(AgentAvailability::unavailable(
      AgentAvailabilityError::NoConnection,
      Some("agent service stopped".to_string()),
    ));
    info!("agent service stopped");
  }

  pub fn is_running(&self) -> bool {
    self.availability.borrow().is_available
  }

  /// Handle one inbound message: WORKING, render, then copy and/or send
  /// according to the message's prompt action (`both` when unset).
  ///
  /// A failed delivery has already been shown to the user by the router; here
  /// it moves the agent to FAILED.
  pub async fn handle_user_message(
    &self,
    message: UserMessage,
  ) -> Result<DispatchReport, DispatchError> {
    let generation = self.machine.on_user_message();

    let action = message
      .metadata
      .prompt_action
      .unwrap_or(PromptAction::Both);
    info!(message_id = %message.id, action = action.as_str(), "user message received");

    let request = PromptRequest::new(render_prompt(&message));
    match self.router.deliver(&request, action).await {
      Ok(report) => Ok(report),
      Err(e) => {
        warn!(message_id = %message.id, "delivery failed: {e}");
        if !self.machine.fail_if_current(generation, e.to_string()) {
          debug!(message_id = %message.id, "newer message in flight, state left as is");
        }
        Err(e)
      }
    }
  }

  /// Externally driven phase, e.g. reported by the agent itself.
  pub fn set_agent_state(&self, state: AgentStateType, description: Option<String>) {
    self.machine.set(state, description);
  }

  /// Forward agent-authored chat content to the toolbar.
  pub fn publish_agent_message(&self, update: AgentMessageUpdate) {
    debug!(message_id = %update.message_id, resync = update.resync, "agent message");
    self.events.publish(AgentEvent::AgentMessage(update));
  }

  /// Apply an update reported by the agent running in the IDE.
  pub fn handle_agent_request(&self, request: AgentRequest) {
    match request {
      AgentRequest::SetState(state) => self.set_agent_state(state.state, state.description),
      AgentRequest::AgentMessage(update) => self.publish_agent_message(update),
    }
  }

  pub fn state(&self) -> AgentState {
    self.machine.current()
  }

  pub fn availability(&self) -> AgentAvailability {
    self.availability.borrow().clone()
  }

  pub fn info(&self) -> AgentInfo {
    self.info.borrow().clone()
  }

  pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
    self.events.subscribe()
  }

  /// Current info, availability and state, for a newly connected client.
  pub fn snapshot(&self) -> Vec<AgentEvent> {
    vec![
      AgentEvent::InfoChanged(self.info()),
      AgentEvent::AvailabilityChanged(self.availability()),
      AgentEvent::StateChanged(self.state()),
    ]
  }

  fn set_availability(&self, availability: AgentAvailability) {
    self
      .availability
      .send_modify(|current| *current = availability.clone());
    self
      .events
      .publish(AgentEvent::AvailabilityChanged(availability));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dispatch::{HostCall, RecordingHost};
  use pretty_assertions::assert_eq;
  use pinpoint_protocol::{UserMessageContentItem, UserMessageMetadata};

  fn message(action: Option<PromptAction>) -> UserMessage {
    UserMessage::new(
      vec![UserMessageContentItem::text("tighten the spacing")],
      UserMessageMetadata {
        prompt_action: action,
        ..UserMessageMetadata::default()
      },
    )
  }

  #[tokio::test]
  async fn start_publishes_info_and_availability() {
    let host = Arc::new(RecordingHost::new("Cursor").with_workspace("shop"));
    let service = AgentService::new(host, &AgentConfig::default());
    let mut events = service.subscribe();

    service.start();

    assert_eq!(
      events.recv().await.expect("info"),
      AgentEvent::InfoChanged(AgentInfo {
        name: "Cursor".to_string(),
        description: "shop".to_string(),
      })
    );
    assert_eq!(
      events.recv().await.expect("availability"),
      AgentEvent::AvailabilityChanged(AgentAvailability::available())
    );
    assert!(service.is_running());
  }

  #[tokio::test]
  async fn missing_prompt_action_copies_and_sends() {
    let host = Arc::new(RecordingHost::new("Cursor"));
    let service = AgentService::new(host.clone(), &AgentConfig::default());
    service.start();

    let report = service
      .handle_user_message(message(None))
      .await
      .expect("delivered");

    assert!(report.copied);
    assert!(report.target.is_some());
    assert!(matches!(host.calls()[0], HostCall::WriteClipboard { .. }));
  }

  #[tokio::test(start_paused = true)]
  async fn failed_delivery_sets_failed() {
    let host = Arc::new(RecordingHost::new("Notepad"));
    let service = AgentService::new(host, &AgentConfig::default());
    service.start();

    let err = service
      .handle_user_message(message(Some(PromptAction::Send)))
      .await
      .expect_err("unsupported host");

    let state = service.state();
    assert_eq!(state.state, AgentStateType::Failed);
    assert_eq!(state.description, Some(err.to_string()));
  }

  #[tokio::test]
  async fn agent_requests_reach_subscribers() {
    let service = AgentService::new(Arc::new(RecordingHost::new("Cursor")), &AgentConfig::default());
    let mut events = service.subscribe();

    service.handle_agent_request(AgentRequest::SetState(AgentState::new(
      AgentStateType::Thinking,
      Some("reading files".to_string()),
    )));
    let update = AgentMessageUpdate {
      message_id: "a1".to_string(),
      content_items: vec![UserMessageContentItem::text("Done, the header is bigger.")],
      resync: false,
    };
    service.handle_agent_request(AgentRequest::AgentMessage(update.clone()));

    assert_eq!(
      events.recv().await.expect("state"),
      AgentEvent::StateChanged(AgentState::new(
        AgentStateType::Thinking,
        Some("reading files".to_string()),
      ))
    );
    assert_eq!(
      events.recv().await.expect("message"),
      AgentEvent::AgentMessage(update)
    );
    assert_eq!(service.state().state, AgentStateType::Thinking);
  }

  #[tokio::test]
  async fn shutdown_marks_unavailable() {
    let service = AgentService::new(Arc::new(RecordingHost::new("Trae")), &AgentConfig::default());
    service.start();
    service.shutdown();

    let availability = service.availability();
    assert!(!availability.is_available);
    assert_eq!(availability.error, Some(AgentAvailabilityError::NoConnection));
  }
}
