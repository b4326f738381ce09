// Host IDE Detection

use serde::{Deserialize, Serialize};

/// Host application the agent service runs inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ide {
  Vscode,
  Windsurf,
  Cursor,
  Trae,
  Antigravity,
  Unknown,
}

/// Substrings probed against the lowercased application name. Order is the
/// tie-break when a name contains more than one of them.
const DETECTION_ORDER: [(&str, Ide); 5] = [
  ("windsurf", Ide::Windsurf),
  ("cursor", Ide::Cursor),
  ("visual studio code", Ide::Vscode),
  ("trae", Ide::Trae),
  ("antigravity", Ide::Antigravity),
];

impl Ide {
  /// Classify a host application name; first match in priority order wins.
  pub fn detect(app_name: &str) -> Ide {
    let app_name = app_name.to_lowercase();
    DETECTION_ORDER
      .iter()
      .find(|(needle, _)| app_name.contains(needle))
      .map_or(Ide::Unknown, |(_, ide)| *ide)
  }

  pub fn display_name(self) -> &'static str {
    match self {
      Ide::Vscode => "VS Code",
      Ide::Windsurf => "Windsurf",
      Ide::Cursor => "Cursor",
      Ide::Trae => "Trae",
      Ide::Antigravity => "Antigravity",
      Ide::Unknown => "unknown IDE",
    }
  }
}

impl std::fmt::Display for Ide {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let tag = match self {
      Ide::Vscode => "VSCODE",
      Ide::Windsurf => "WINDSURF",
      Ide::Cursor => "CURSOR",
      Ide::Trae => "TRAE",
      Ide::Antigravity => "ANTIGRAVITY",
      Ide::Unknown => "UNKNOWN",
    };
    f.write_str(tag)
  }
}
