// Agent State Machine
// WORKING -> COMPLETED -> IDLE chain with a single cancellable slot

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use pinpoint_config::AgentConfig;
use pinpoint_protocol::{AgentEvent, AgentState, AgentStateType};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::debug;

use crate::event::EventBroadcaster;

/// Delays and note for the automatic transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTimings {
  pub completion_delay: Duration,
  pub idle_delay: Duration,
  pub completion_note: String,
}

impl AgentTimings {
  pub fn from_config(config: &AgentConfig) -> Self {
    Self {
      completion_delay: config.completion_delay(),
      idle_delay: config.idle_delay(),
      completion_note: config.completion_note.clone(),
    }
  }
}

impl Default for AgentTimings {
  fn default() -> Self {
    Self::from_config(&AgentConfig::default())
  }
}

/// Identifies the chain started for one user message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainGeneration(u64);

struct ChainStep {
  after: Duration,
  state: AgentStateType,
  description: Option<String>,
}

struct PendingChain {
  cancellation_token: CancellationToken,
  _handle: AbortOnDropHandle<()>,
}

#[derive(Default)]
struct ChainSlot {
  generation: u64,
  pending: Option<PendingChain>,
}

struct Inner {
  state: watch::Sender<AgentState>,
  events: EventBroadcaster,
  /// Guards the chain slot and serializes every state write.
  chain: Mutex<ChainSlot>,
}

impl Inner {
  fn publish(&self, state: AgentStateType, description: Option<String>) {
    let next = AgentState::new(state, description);
    self.state.send_modify(|current| *current = next.clone());
    self.events.publish(AgentEvent::StateChanged(next));
  }
}

/// Authoritative agent state for one service.
///
/// The state is last-write-wins: external phases are accepted without
/// validation. At most one timed chain is pending; starting a new one cancels
/// the previous one under the same lock that writes the state. A failure only
/// applies to the chain of the message it belongs to.
pub struct AgentStateMachine {
  inner: Arc<Inner>,
  timings: AgentTimings,
}

impl AgentStateMachine {
  pub fn new(timings: AgentTimings, events: EventBroadcaster) -> Self {
    let (state, _) = watch::channel(AgentState::idle());
    Self {
      inner: Arc::new(Inner {
        state,
        events,
        chain: Mutex::new(ChainSlot::default()),
      }),
      timings,
    }
  }

  pub fn current(&self) -> AgentState {
    self.inner.state.borrow().clone()
  }

  /// A user message arrived: WORKING now, COMPLETED after the completion
  /// delay, IDLE after the idle delay. Restarts any pending chain.
  pub fn on_user_message(&self) -> ChainGeneration {
    let mut slot = self.lock_slot();
    self.replace_chain(
      &mut slot,
      AgentStateType::Working,
      None,
      vec![
        ChainStep {
          after: self.timings.completion_delay,
          state: AgentStateType::Completed,
          description: Some(self.timings.completion_note.clone()),
        },
        ChainStep {
          after: self.timings.idle_delay,
          state: AgentStateType::Idle,
          description: None,
        },
      ],
    )
  }

  /// FAILED now, IDLE after the idle delay, replacing the chain of
  /// `generation`. Returns false without touching anything when a newer
  /// message has started its own chain since.
  pub fn fail_if_current(&self, generation: ChainGeneration, message: impl Into<String>) -> bool {
    let mut slot = self.lock_slot();
    if slot.generation != generation.0 {
      debug!(generation = generation.0, current = slot.generation, "stale failure ignored");
      return false;
    }
    self.replace_chain(
      &mut slot,
      AgentStateType::Failed,
      Some(message.into()),
      vec![ChainStep {
        after: self.timings.idle_delay,
        state: AgentStateType::Idle,
        description: None,
      }],
    );
    true
  }

  /// Externally driven phase. Does not touch the pending chain.
  pub fn set(&self, state: AgentStateType, description: Option<String>) {
    let _slot = self.lock_slot();
    self.inner.publish(state, description);
  }

  pub fn has_pending_chain(&self) -> bool {
    self
      .lock_slot()
      .pending
      .as_ref()
      .is_some_and(|chain| !chain.cancellation_token.is_cancelled())
  }

  /// Cancel the pending chain, if any. The current state is kept.
  pub fn shutdown(&self) {
    let pending = self.lock_slot().pending.take();
    if let Some(chain) = pending {
      chain.cancellation_token.cancel();
      debug!("cancelled pending agent state chain");
    }
  }

  fn lock_slot(&self) -> std::sync::MutexGuard<'_, ChainSlot> {
    self
      .inner
      .chain
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
  }

  fn replace_chain(
    &self,
    slot: &mut ChainSlot,
    state: AgentStateType,
    description: Option<String>,
    steps: Vec<ChainStep>,
  ) -> ChainGeneration {
    if let Some(previous) = slot.pending.take() {
      previous.cancellation_token.cancel();
    }
    slot.generation += 1;

    self.inner.publish(state, description);

    let cancellation_token = CancellationToken::new();
    let handle = tokio::spawn(run_chain(
      Arc::downgrade(&self.inner),
      cancellation_token.clone(),
      steps,
    ));
    slot.pending = Some(PendingChain {
      cancellation_token,
      _handle: AbortOnDropHandle::new(handle),
    });
    ChainGeneration(slot.generation)
  }
}

async fn run_chain(inner: Weak<Inner>, cancellation_token: CancellationToken, steps: Vec<ChainStep>) {
  for step in steps {
    tokio::select! {
      _ = cancellation_token.cancelled() => return,
      _ = tokio::time::sleep(step.after) => {}
    }

    let Some(inner) = inner.upgrade() else {
      return;
    };
    {
      let _slot = inner.chain.lock().unwrap_or_else(PoisonError::into_inner);
      if cancellation_token.is_cancelled() {
        return;
      }
      inner.publish(step.state, step.description);
    }
  }
  cancellation_token.cancel();
}
