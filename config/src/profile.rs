// Configuration Profile
// Named bundles of overrides selected with `--profile`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named profiles as found under `[profiles.<name>]` in a config file.
///
/// A profile is a partial config table; it is layered above the config files
/// and below CLI overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigProfiles {
  #[serde(default)]
  pub profiles: BTreeMap<String, toml::Value>,
}

/// A resolved profile ready to be layered
#[derive(Debug, Clone)]
pub struct ConfigProfile {
  pub name: String,
  pub values: toml::Value,
}

impl ConfigProfiles {
  /// Extract the `profiles` table from a raw config document.
  pub fn from_document(document: &toml::Value) -> Self {
    document
      .get("profiles")
      .and_then(|p| p.clone().try_into::<BTreeMap<String, toml::Value>>().ok())
      .map(|profiles| Self { profiles })
      .unwrap_or_default()
  }

  pub fn get(&self, name: &str) -> Option<ConfigProfile> {
    self.profiles.get(name).map(|values| ConfigProfile {
      name: name.to_string(),
      values: values.clone(),
    })
  }

  /// Later documents win for profiles defined more than once.
  pub fn extend(&mut self, other: ConfigProfiles) {
    self.profiles.extend(other.profiles);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn profiles_are_read_from_document() {
    let document: toml::Value = toml::from_str(
      r#"
        [profiles.fast.agent]
        completion_delay_ms = 10
      "#,
    )
    .expect("parse document");

    let profiles = ConfigProfiles::from_document(&document);
    let fast = profiles.get("fast").expect("fast profile");
    assert_eq!(fast.values["agent"]["completion_delay_ms"].as_integer(), Some(10));
    assert!(profiles.get("slow").is_none());
  }
}
