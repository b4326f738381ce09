// Component Registry
// Installation command lookup for blocks and themes

use std::collections::HashSet;

use async_trait::async_trait;
use pinpoint_config::RegistryConfig;
use pinpoint_protocol::CliVersion;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKind {
  Blocks,
  Themes,
}

impl RegistryKind {
  pub fn path_segment(self) -> &'static str {
    match self {
      RegistryKind::Blocks => "blocks",
      RegistryKind::Themes => "themes",
    }
  }

  /// Namespace used by the shadcn v3 CLI.
  pub fn scope(self) -> &'static str {
    match self {
      RegistryKind::Blocks => "@ss-blocks",
      RegistryKind::Themes => "@ss-themes",
    }
  }

  pub fn singular(self) -> &'static str {
    match self {
      RegistryKind::Blocks => "block",
      RegistryKind::Themes => "theme",
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
  #[error("registry request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("registry returned HTTP {status} for {url}")]
  Status { status: u16, url: String },

  #[error("{} `{name}` is not in the registry", .kind.singular())]
  NotFound { kind: RegistryKind, name: String },
}

/// Resolves how to install a registry item.
#[async_trait]
pub trait RegistryLookup: Send + Sync {
  async fn installation_command(
    &self,
    kind: RegistryKind,
    name: &str,
    cli_version: CliVersion,
  ) -> Result<String, RegistryError>;
}

/// Credentials appended to v2 install URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryCredentials {
  pub email: String,
  pub license_key: String,
}

/// shadcn CLI command for one item.
///
/// v3 uses the scoped registry name. v2 installs from the item URL, with the
/// credentials as query parameters inside the quotes.
pub fn format_installation_command(
  base_url: &str,
  kind: RegistryKind,
  name: &str,
  cli_version: CliVersion,
  credentials: Option<&RegistryCredentials>,
) -> String {
  match cli_version {
    CliVersion::V3 => format!("npx shadcn@latest add {}/{name}", kind.scope()),
    CliVersion::V2 => {
      let url = format!(
        "{}/r/{}/{name}.json",
        base_url.trim_end_matches('/'),
        kind.path_segment()
      );
      match credentials {
        Some(c) => format!(
          "npx shadcn@latest add \"{url}?email={}&license_key={}\"",
          c.email, c.license_key
        ),
        None => format!("npx shadcn@latest add \"{url}\""),
      }
    }
  }
}

#[derive(Debug, Deserialize)]
struct RegistryIndex {
  #[serde(default)]
  items: Vec<RegistryItem>,
}

#[derive(Debug, Deserialize)]
struct RegistryItem {
  name: String,
}

/// HTTP client for the component registry. Each index is fetched once per
/// client and kept for its lifetime.
pub struct RegistryClient {
  http: reqwest::Client,
  base_url: String,
  credentials: Option<RegistryCredentials>,
  blocks: OnceCell<HashSet<String>>,
  themes: OnceCell<HashSet<String>>,
}

impl RegistryClient {
  pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
    let http = reqwest::Client::builder()
      .timeout(config.request_timeout())
      .build()?;
    let credentials = match (&config.email, &config.license_key) {
      (Some(email), Some(license_key)) if !email.is_empty() && !license_key.is_empty() => {
        Some(RegistryCredentials {
          email: email.clone(),
          license_key: license_key.clone(),
        })
      }
      _ => None,
    };

    Ok(Self {
      http,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      credentials,
      blocks: OnceCell::new(),
      themes: OnceCell::new(),
    })
  }

  fn index_url(&self, kind: RegistryKind) -> String {
    format!(
      "{}/r/{}/registry.json?is_extension=true",
      self.base_url,
      kind.path_segment()
    )
  }

  async fn index(&self, kind: RegistryKind) -> Result<&HashSet<String>, RegistryError> {
    let cell = match kind {
      RegistryKind::Blocks => &self.blocks,
      RegistryKind::Themes => &self.themes,
    };
    cell.get_or_try_init(|| self.fetch_index(kind)).await
  }

  async fn fetch_index(&self, kind: RegistryKind) -> Result<HashSet<String>, RegistryError> {
    let url = self.index_url(kind);
    let response = self.http.get(&url).send().await?;
    if !response.status().is_success() {
      return Err(RegistryError::Status {
        status: response.status().as_u16(),
        url,
      });
    }

    let index: RegistryIndex = response.json().await?;
    debug!(kind = kind.path_segment(), items = index.items.len(), "fetched registry index");
    Ok(index.items.into_iter().map(|item| item.name).collect())
  }
}

#[async_trait]
impl RegistryLookup for RegistryClient {
  async fn installation_command(
    &self,
    kind: RegistryKind,
    name: &str,
    cli_version: CliVersion,
  ) -> Result<String, RegistryError> {
    if !self.index(kind).await?.contains(name) {
      return Err(RegistryError::NotFound {
        kind,
        name: name.to_string(),
      });
    }
    Ok(format_installation_command(
      &self.base_url,
      kind,
      name,
      cli_version,
      self.credentials.as_ref(),
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use serde_json::json;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn config(base_url: String) -> RegistryConfig {
    RegistryConfig {
      base_url,
      ..RegistryConfig::default()
    }
  }

  #[test]
  fn v3_commands_use_scoped_names() {
    assert_eq!(
      format_installation_command("https://x", RegistryKind::Themes, "sunset", CliVersion::V3, None),
      "npx shadcn@latest add @ss-themes/sunset"
    );
  }

  #[test]
  fn v2_commands_quote_the_url() {
    let credentials = RegistryCredentials {
      email: "me@example.com".to_string(),
      license_key: "KEY".to_string(),
    };
    assert_eq!(
      format_installation_command(
        "https://shadcnstudio.com/",
        RegistryKind::Blocks,
        "hero-01",
        CliVersion::V2,
        Some(&credentials)
      ),
      "npx shadcn@latest add \"https://shadcnstudio.com/r/blocks/hero-01.json?email=me@example.com&license_key=KEY\""
    );
    assert_eq!(
      format_installation_command(
        "https://shadcnstudio.com",
        RegistryKind::Blocks,
        "hero-01",
        CliVersion::V2,
        None
      ),
      "npx shadcn@latest add \"https://shadcnstudio.com/r/blocks/hero-01.json\""
    );
  }

  #[tokio::test]
  async fn client_checks_the_index_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/r/blocks/registry.json"))
      .and(query_param("is_extension", "true"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "name": "ss-blocks",
        "items": [{ "name": "hero-01", "type": "registry:block" }]
      })))
      .expect(1)
      .mount(&server)
      .await;

    let client = RegistryClient::new(&config(server.uri())).expect("client");
    let command = client
      .installation_command(RegistryKind::Blocks, "hero-01", CliVersion::V3)
      .await
      .expect("known block");
    assert_eq!(command, "npx shadcn@latest add @ss-blocks/hero-01");

    let err = client
      .installation_command(RegistryKind::Blocks, "missing", CliVersion::V3)
      .await
      .expect_err("unknown block");
    assert!(matches!(err, RegistryError::NotFound { .. }));
  }

  #[tokio::test]
  async fn http_errors_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/r/themes/registry.json"))
      .respond_with(ResponseTemplate::new(503))
      .mount(&server)
      .await;

    let client = RegistryClient::new(&config(server.uri())).expect("client");
    let err = client
      .installation_command(RegistryKind::Themes, "sunset", CliVersion::V3)
      .await
      .expect_err("unavailable");
    assert!(matches!(err, RegistryError::Status { status: 503, .. }));
  }
}
