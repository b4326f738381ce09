// Dispatch Errors

use super::host::HostError;

/// Reasons a prompt could not be delivered. Every variant is shown to the
/// user through the host before it is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
  #[error(
    "Currently, only Copilot Chat, Cline, Roo Code, and Kilo Code are supported for VS Code. Please install one of them from the marketplace to send prompts from VS Code."
  )]
  NoIntegration,

  #[error("Failed to call agent: IDE is not supported ({app_name})")]
  UnsupportedHost { app_name: String },

  #[error("Failed to call agent: {0}")]
  Transport(#[from] HostError),
}

impl DispatchError {
  pub fn is_transport(&self) -> bool {
    matches!(self, DispatchError::Transport(_))
  }
}
