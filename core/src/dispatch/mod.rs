// Dispatch Router
// Delivers a prompt into the detected IDE's agent surface

mod error;
pub mod host;
pub mod integrations;

use std::sync::Arc;

use pinpoint_protocol::{PromptAction, PromptRequest};
use serde::Serialize;
use tracing::{debug, error, info};

pub use error::DispatchError;
pub use host::{Host, HostCall, HostError, RecordingHost};
pub use integrations::{DispatchTarget, Delivery, HostCommand, Integration, VSCODE_PROBE_ORDER};

use crate::ide::Ide;

/// What a successful delivery did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
  pub copied: bool,
  pub target: Option<DispatchTarget>,
}

/// Stateless router over a [`Host`]. Each call is independent.
#[derive(Clone)]
pub struct DispatchRouter {
  host: Arc<dyn Host>,
}

impl DispatchRouter {
  pub fn new(host: Arc<dyn Host>) -> Self {
    Self { host }
  }

  pub fn host(&self) -> &Arc<dyn Host> {
    &self.host
  }

  pub fn detect(&self) -> Ide {
    Ide::detect(&self.host.app_name())
  }

  /// Pick the delivery target for `ide`. Probes installed extensions on VS Code.
  pub async fn resolve_target(&self, ide: Ide) -> Result<DispatchTarget, DispatchError> {
    match ide {
      Ide::Cursor => Ok(DispatchTarget::Cursor),
      Ide::Windsurf => Ok(DispatchTarget::Windsurf),
      Ide::Antigravity => Ok(DispatchTarget::Antigravity),
      Ide::Trae => Ok(DispatchTarget::Trae),
      Ide::Vscode => {
        for integration in VSCODE_PROBE_ORDER {
          if self
            .host
            .is_extension_installed(integration.extension_id())
            .await
          {
            return Ok(DispatchTarget::Vscode(integration));
          }
        }
        Err(DispatchError::NoIntegration)
      }
      Ide::Unknown => Err(DispatchError::UnsupportedHost {
        app_name: self.host.app_name(),
      }),
    }
  }

  /// Apply `action` to `request`: copy to the clipboard, send to the agent, or
  /// both. The two effects run independently; the first failure is returned
  /// after both were attempted.
  pub async fn deliver(
    &self,
    request: &PromptRequest,
    action: PromptAction,
  ) -> Result<DispatchReport, DispatchError> {
    let mut report = DispatchReport::default();
    let mut first_error = None;

    if action.copies() {
      match self.copy(&request.prompt).await {
        Ok(()) => report.copied = true,
        Err(e) => first_error = Some(e),
      }
    }

    if action.sends() {
      match self.dispatch(request).await {
        Ok(target) => report.target = Some(target),
        Err(e) => {
          first_error.get_or_insert(e);
        }
      }
    }

    match first_error {
      Some(e) => Err(e),
      None => Ok(report),
    }
  }

  /// Copy `text` to the clipboard, surfacing failures to the user.
  pub async fn copy(&self, text: &str) -> Result<(), DispatchError> {
    let result = self
      .host
      .write_clipboard(text)
      .await
      .map_err(DispatchError::from);
    self.surface(result).await
  }

  /// Send `request` to the agent of the detected IDE, surfacing failures to the
  /// user.
  pub async fn dispatch(&self, request: &PromptRequest) -> Result<DispatchTarget, DispatchError> {
    let result = self.dispatch_inner(request).await;
    self.surface(result).await
  }

  async fn dispatch_inner(&self, request: &PromptRequest) -> Result<DispatchTarget, DispatchError> {
    let ide = self.detect();
    let target = self.resolve_target(ide).await?;
    debug!(%ide, %target, "dispatching prompt");

    let text = request.compose_text();
    self.run(target.delivery(&text)).await?;
    info!(%target, "prompt delivered");
    Ok(target)
  }

  async fn run(&self, delivery: Delivery) -> Result<(), HostError> {
    match delivery {
      Delivery::Diagnostic { prompt, command } => {
        self.host.inject_prompt_diagnostic(&prompt).await?;
        let executed = self.host.execute_command(command, None).await;
        let cleared = self.host.clear_prompt_diagnostic().await;
        executed.and(cleared)
      }
      Delivery::Commands(commands) => {
        for HostCommand { command, payload } in commands {
          self.host.execute_command(command, payload).await?;
        }
        Ok(())
      }
    }
  }

  async fn surface<T>(&self, result: Result<T, DispatchError>) -> Result<T, DispatchError> {
    if let Err(e) = &result {
      error!("prompt delivery failed: {e}");
      self.host.show_error_message(&e.to_string()).await;
    }
    result
  }
}
