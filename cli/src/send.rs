// `pinpoint send`: one toolbar message through an in-process agent

use std::sync::Arc;

use anyhow::Result;
use pinpoint_config::Config;
use pinpoint_core::assembler::PluginRegistry;
use pinpoint_core::context::{PageInfo, ThemeStub};
use pinpoint_core::dispatch::RecordingHost;
use pinpoint_core::{AgentService, LocalTransport, SessionStore};
use serde_json::{Value, json};
use tracing::info;

use crate::host_app_name;
use crate::prefs;

/// What the toolbar would have in its draft.
#[derive(Debug, Default)]
pub struct SendOptions {
    pub input: String,
    pub page_url: Option<String>,
    pub title: Option<String>,
    pub themes: Vec<String>,
    pub app_name: Option<String>,
    pub installed: Vec<String>,
}

/// Compose a draft in a configured session and send it. The agent side runs
/// against a recording host; its calls are part of the returned report.
pub async fn send_once(options: SendOptions, config: &Config) -> Result<Value> {
    let host = Arc::new(
        RecordingHost::new(host_app_name(options.app_name, config))
            .with_installed(config.host.installed_extensions.iter().cloned())
            .with_installed(options.installed),
    );
    let service = Arc::new(AgentService::new(host.clone(), &config.agent));
    service.start();

    let preferences = prefs::open_store(&config.storage).await?;
    let store = SessionStore::from_config(
        Arc::new(LocalTransport::new(Arc::clone(&service))),
        config,
        PluginRegistry::new(),
        preferences,
    )
    .await?;

    for name in options.themes {
        store.add_theme(ThemeStub { name });
    }
    store.set_input(&options.input);
    let page = PageInfo {
        url: options.page_url,
        title: options.title,
        ..PageInfo::default()
    };

    let result = match store.send_message(page).await {
        Ok(sent) => json!({
            "message": sent.message,
            "collection_warnings": sent.collection_warnings,
            "plugin_warnings": sent.plugin_warnings,
        }),
        Err(e) => json!({ "error": e.to_string() }),
    };
    store.teardown();
    service.shutdown();
    info!(calls = host.calls().len(), "send finished");

    Ok(json!({
        "result": result,
        "state": service.state(),
        "calls": host.calls(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn in_memory_config() -> Config {
        let mut config = Config::default();
        config.storage.path = Some(PathBuf::new());
        config
    }

    #[tokio::test]
    async fn message_reaches_the_detected_ide() {
        let report = send_once(
            SendOptions {
                input: "make this bigger".to_string(),
                page_url: Some("http://localhost:3000/".to_string()),
                app_name: Some("Cursor".to_string()),
                ..SendOptions::default()
            },
            &in_memory_config(),
        )
        .await
        .expect("send");

        let prompt = report["calls"][0]["prompt"].as_str().expect("diagnostic prompt");
        assert!(prompt.contains("make this bigger"));
        assert!(prompt.contains("http://localhost:3000/"));
        assert_eq!(report["calls"][1]["command"], json!("composer.fixerrormessage"));
        assert_eq!(report["state"]["state"], json!("WORKING"));
        assert_eq!(
            report["result"]["message"]["metadata"]["currentUrl"],
            json!("http://localhost:3000/")
        );
    }

    #[tokio::test]
    async fn blank_input_is_reported_not_sent() {
        let report = send_once(
            SendOptions {
                input: "  ".to_string(),
                app_name: Some("Cursor".to_string()),
                ..SendOptions::default()
            },
            &in_memory_config(),
        )
        .await
        .expect("send");

        assert_eq!(report["result"]["error"], json!("cannot send an empty message"));
        assert_eq!(report["calls"], json!([]));
    }
}
