#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use pinpoint_config::AgentConfig;
use pinpoint_core::context::{RegistryError, RegistryKind, RegistryLookup, format_installation_command};
use pinpoint_core::dispatch::RecordingHost;
use pinpoint_core::AgentService;
use pinpoint_protocol::{AgentEvent, AgentStateType, CliVersion};
use tokio::time::Instant;

/// Registry that knows every item.
pub struct OfflineRegistry;

#[async_trait]
impl RegistryLookup for OfflineRegistry {
  async fn installation_command(
    &self,
    kind: RegistryKind,
    name: &str,
    cli_version: CliVersion,
  ) -> Result<String, RegistryError> {
    Ok(format_installation_command(
      "https://registry.test",
      kind,
      name,
      cli_version,
      None,
    ))
  }
}

pub fn started_service(host: RecordingHost) -> (Arc<RecordingHost>, Arc<AgentService>) {
  let host = Arc::new(host);
  let service = Arc::new(AgentService::new(host.clone(), &AgentConfig::default()));
  service.start();
  (host, service)
}

/// Records every state change with its offset from creation, in ms.
pub struct StateRecorder {
  seen: Arc<Mutex<Vec<(u128, AgentStateType)>>>,
}

impl StateRecorder {
  pub fn spawn(service: &AgentService) -> Self {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut events = service.subscribe();
    let start = Instant::now();
    let sink = Arc::clone(&seen);
    tokio::spawn(async move {
      while let Ok(event) = events.recv().await {
        if let AgentEvent::StateChanged(state) = event {
          sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((start.elapsed().as_millis(), state.state));
        }
      }
    });
    Self { seen }
  }

  pub fn seen(&self) -> Vec<(u128, AgentStateType)> {
    self
      .seen
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }
}
