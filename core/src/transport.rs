// Agent Transport
// Toolbar-facing channel to an agent service

use std::sync::Arc;

use async_trait::async_trait;
use pinpoint_protocol::{AgentEvent, UserMessage};
use tokio::sync::broadcast;
use tracing::debug;

use crate::service::AgentService;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
  #[error("agent is not available")]
  Unavailable,

  #[error("transport closed")]
  Closed,
}

/// Request/response plus push-event channel between the toolbar and an agent.
#[async_trait]
pub trait AgentTransport: Send + Sync {
  /// Submit a message. Returns once the agent has accepted it.
  async fn send_user_message(&self, message: UserMessage) -> Result<(), TransportError>;

  /// Pushed agent events from now on.
  fn subscribe(&self) -> broadcast::Receiver<AgentEvent>;

  /// Events describing the agent's current info, availability and state.
  async fn sync(&self) -> Result<Vec<AgentEvent>, TransportError>;
}

/// In-process transport over an [`AgentService`].
#[derive(Clone)]
pub struct LocalTransport {
  service: Arc<AgentService>,
}

impl LocalTransport {
  pub fn new(service: Arc<AgentService>) -> Self {
    Self { service }
  }

  pub fn service(&self) -> &Arc<AgentService> {
    &self.service
  }
}

#[async_trait]
impl AgentTransport for LocalTransport {
  async fn send_user_message(&self, message: UserMessage) -> Result<(), TransportError> {
    if !self.service.is_running() {
      return Err(TransportError::Unavailable);
    }
    // Delivery failures reach the toolbar as a FAILED state event.
    if let Err(e) = self.service.handle_user_message(message).await {
      debug!("message accepted but not delivered: {e}");
    }
    Ok(())
  }

  fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
    self.service.subscribe()
  }

  async fn sync(&self) -> Result<Vec<AgentEvent>, TransportError> {
    Ok(self.service.snapshot())
  }
}
