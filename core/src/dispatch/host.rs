// Dispatch Host
// Command, clipboard and diagnostic primitives provided by the IDE

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Failure reported by a host primitive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
  #[error("command `{command}` failed: {message}")]
  Command { command: String, message: String },

  #[error("clipboard write failed: {0}")]
  Clipboard(String),

  #[error("prompt diagnostic failed: {0}")]
  Diagnostic(String),

  #[error("host disconnected")]
  Disconnected,

  #[error("host did not answer within {0:?}")]
  Timeout(Duration),
}

/// The IDE side of a dispatch. The router only talks to the editor through
/// these primitives.
#[async_trait]
pub trait Host: Send + Sync {
  /// Application name used for IDE detection.
  fn app_name(&self) -> String;

  /// Name of the open workspace, if any.
  fn workspace_name(&self) -> Option<String> {
    None
  }

  async fn execute_command(&self, command: &str, payload: Option<Value>) -> Result<(), HostError>;

  async fn write_clipboard(&self, text: &str) -> Result<(), HostError>;

  async fn is_extension_installed(&self, extension_id: &str) -> bool;

  /// Surface `prompt` as a diagnostic on the active editor so a
  /// problem-fixing command picks it up.
  async fn inject_prompt_diagnostic(&self, prompt: &str) -> Result<(), HostError>;

  async fn clear_prompt_diagnostic(&self) -> Result<(), HostError>;

  async fn show_error_message(&self, message: &str);
}

/// One primitive invocation seen by a [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum HostCall {
  ExecuteCommand {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
  },
  WriteClipboard {
    text: String,
  },
  IsExtensionInstalled {
    extension_id: String,
  },
  InjectDiagnostic {
    prompt: String,
  },
  ClearDiagnostic,
  ShowError {
    message: String,
  },
}

/// Host that records every call instead of touching an editor.
///
/// Used for dry runs and tests. Commands listed in `failing_commands` return
/// [`HostError::Command`].
pub struct RecordingHost {
  app_name: String,
  workspace_name: Option<String>,
  installed: HashSet<String>,
  failing_commands: HashSet<String>,
  fail_clipboard: bool,
  calls: Mutex<Vec<HostCall>>,
}

impl RecordingHost {
  pub fn new(app_name: impl Into<String>) -> Self {
    Self {
      app_name: app_name.into(),
      workspace_name: None,
      installed: HashSet::new(),
      failing_commands: HashSet::new(),
      fail_clipboard: false,
      calls: Mutex::new(Vec::new()),
    }
  }

  pub fn with_workspace(mut self, name: impl Into<String>) -> Self {
    self.workspace_name = Some(name.into());
    self
  }

  pub fn with_installed<I, S>(mut self, extension_ids: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self
      .installed
      .extend(extension_ids.into_iter().map(Into::into));
    self
  }

  pub fn with_failing_command(mut self, command: impl Into<String>) -> Self {
    self.failing_commands.insert(command.into());
    self
  }

  pub fn with_failing_clipboard(mut self) -> Self {
    self.fail_clipboard = true;
    self
  }

  /// Snapshot of the calls so far, in order.
  pub fn calls(&self) -> Vec<HostCall> {
    self
      .calls
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  fn record(&self, call: HostCall) {
    self
      .calls
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(call);
  }
}

#[async_trait]
impl Host for RecordingHost {
  fn app_name(&self) -> String {
    self.app_name.clone()
  }

  fn workspace_name(&self) -> Option<String> {
    self.workspace_name.clone()
  }

  async fn execute_command(&self, command: &str, payload: Option<Value>) -> Result<(), HostError> {
    self.record(HostCall::ExecuteCommand {
      command: command.to_string(),
      payload,
    });
    if self.failing_commands.contains(command) {
      return Err(HostError::Command {
        command: command.to_string(),
        message: "command rejected by host".to_string(),
      });
    }
    Ok(())
  }

  async fn write_clipboard(&self, text: &str) -> Result<(), HostError> {
    self.record(HostCall::WriteClipboard {
      text: text.to_string(),
    });
    if self.fail_clipboard {
      return Err(HostError::Clipboard("clipboard unavailable".to_string()));
    }
    Ok(())
  }

  async fn is_extension_installed(&self, extension_id: &str) -> bool {
    self.record(HostCall::IsExtensionInstalled {
      extension_id: extension_id.to_string(),
    });
    self.installed.contains(extension_id)
  }

  async fn inject_prompt_diagnostic(&self, prompt: &str) -> Result<(), HostError> {
    self.record(HostCall::InjectDiagnostic {
      prompt: prompt.to_string(),
    });
    Ok(())
  }

  async fn clear_prompt_diagnostic(&self) -> Result<(), HostError> {
    self.record(HostCall::ClearDiagnostic);
    Ok(())
  }

  async fn show_error_message(&self, message: &str) {
    self.record(HostCall::ShowError {
      message: message.to_string(),
    });
  }
}
