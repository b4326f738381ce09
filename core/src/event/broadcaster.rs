// Event Broadcaster
use pinpoint_protocol::AgentEvent;
use tokio::sync::broadcast;

/// Event broadcaster configuration
pub struct EventBroadcasterConfig {
  /// Channel capacity
  pub capacity: usize,
}

impl Default for EventBroadcasterConfig {
  fn default() -> Self {
    Self { capacity: 256 }
  }
}

/// Fan-out of [`AgentEvent`]s to every subscriber.
///
/// Publishing never blocks and never fails; events sent while nobody is
/// subscribed are dropped.
#[derive(Clone)]
pub struct EventBroadcaster {
  tx: broadcast::Sender<AgentEvent>,
}

impl EventBroadcaster {
  pub fn new(config: EventBroadcasterConfig) -> Self {
    let (tx, _) = broadcast::channel(config.capacity);
    Self { tx }
  }

  pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
    self.tx.subscribe()
  }

  pub fn publish(&self, event: AgentEvent) {
    if self.tx.send(event).is_err() {
      tracing::trace!("no event subscribers");
    }
  }
}

impl Default for EventBroadcaster {
  fn default() -> Self {
    Self::new(EventBroadcasterConfig::default())
  }
}
