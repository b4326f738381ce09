// Agent Integrations
// Per-target delivery plans

use pinpoint_protocol::prompts::ide::{
  ANTIGRAVITY_PROMPT_PREFIX, CURSOR_PROMPT_PREFIX, WINDSURF_PROMPT_PREFIX,
};
use serde::Serialize;
use serde_json::{Value, json};

/// Third-party agent extensions reachable from plain VS Code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Integration {
  Cline,
  RooCode,
  KiloCode,
  CopilotChat,
}

/// Probe order for VS Code. The first installed integration receives the prompt.
pub const VSCODE_PROBE_ORDER: [Integration; 4] = [
  Integration::Cline,
  Integration::RooCode,
  Integration::KiloCode,
  Integration::CopilotChat,
];

impl Integration {
  pub fn extension_id(self) -> &'static str {
    match self {
      Integration::Cline => "saoudrizwan.claude-dev",
      Integration::RooCode => "rooveterinaryinc.roo-cline",
      Integration::KiloCode => "kilocode.kilo-code",
      Integration::CopilotChat => "github.copilot-chat",
    }
  }

  pub fn display_name(self) -> &'static str {
    match self {
      Integration::Cline => "Cline",
      Integration::RooCode => "Roo Code",
      Integration::KiloCode => "Kilo Code",
      Integration::CopilotChat => "Copilot Chat",
    }
  }
}

/// Where a prompt ends up once the host has been classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "target", content = "integration", rename_all = "snake_case")]
pub enum DispatchTarget {
  Cursor,
  Windsurf,
  Antigravity,
  Trae,
  Vscode(Integration),
}

impl std::fmt::Display for DispatchTarget {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      DispatchTarget::Cursor => f.write_str("Cursor"),
      DispatchTarget::Windsurf => f.write_str("Windsurf"),
      DispatchTarget::Antigravity => f.write_str("Antigravity"),
      DispatchTarget::Trae => f.write_str("Trae"),
      DispatchTarget::Vscode(integration) => write!(f, "VS Code ({})", integration.display_name()),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostCommand {
  pub command: &'static str,
  pub payload: Option<Value>,
}

impl HostCommand {
  fn bare(command: &'static str) -> Self {
    Self {
      command,
      payload: None,
    }
  }
}

/// Concrete host calls for one delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
  /// Inject `prompt` as a diagnostic, run `command`, then clear the diagnostic.
  Diagnostic {
    prompt: String,
    command: &'static str,
  },
  /// Run the commands in order.
  Commands(Vec<HostCommand>),
}

impl DispatchTarget {
  /// Build the delivery for already composed prompt text.
  pub fn delivery(self, text: &str) -> Delivery {
    match self {
      DispatchTarget::Cursor => Delivery::Diagnostic {
        prompt: format!("{CURSOR_PROMPT_PREFIX}\n{text}"),
        command: "composer.fixerrormessage",
      },
      DispatchTarget::Windsurf => Delivery::Diagnostic {
        prompt: format!("{WINDSURF_PROMPT_PREFIX}\n{text}"),
        command: "windsurf.prioritized.explainProblem",
      },
      DispatchTarget::Antigravity => Delivery::Diagnostic {
        prompt: format!("{ANTIGRAVITY_PROMPT_PREFIX}\n{text}"),
        command: "antigravity.prioritized.explainProblem",
      },
      DispatchTarget::Trae => Delivery::Commands(vec![HostCommand {
        command: "workbench.action.chat.icube.open",
        payload: Some(json!({ "query": text })),
      }]),
      DispatchTarget::Vscode(Integration::Cline) => Delivery::Diagnostic {
        prompt: text.to_string(),
        command: "cline.fixWithCline",
      },
      DispatchTarget::Vscode(Integration::RooCode) => Delivery::Diagnostic {
        prompt: text.to_string(),
        command: "roo-cline.fixCode",
      },
      DispatchTarget::Vscode(Integration::KiloCode) => Delivery::Diagnostic {
        prompt: text.to_string(),
        command: "kilo-code.fixCode",
      },
      DispatchTarget::Vscode(Integration::CopilotChat) => Delivery::Commands(vec![
        HostCommand::bare("workbench.action.chat.openAgent"),
        HostCommand {
          command: "workbench.action.chat.sendToNewChat",
          payload: Some(json!({ "inputValue": text })),
        },
      ]),
    }
  }
}
