// Host that forwards editor primitives as JSON lines and awaits the replies

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use pinpoint_config::HostConfig;
use pinpoint_core::dispatch::{Host, HostCall, HostError};
use pinpoint_protocol::{AgentEvent, AgentRequest, ToolbarRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// One line written by `pinpoint serve`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "channel", content = "message", rename_all = "snake_case")]
pub enum Outbound {
    /// For the toolbar
    Event(AgentEvent),
    /// For the editor extension driving this process
    Host(HostRequest),
}

/// A host primitive for the driving extension. Requests carrying an `id`
/// expect a `host` reply with the same id; the others are notifications.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub call: HostCall,
}

/// The editor's answer to a [`HostRequest`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HostReply {
    pub id: u64,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Value,
}

/// One line read by `pinpoint serve`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "channel", content = "message", rename_all = "snake_case")]
pub enum Inbound {
    Toolbar(ToolbarRequest),
    Agent(AgentRequest),
    Host(HostReply),
}

/// Editor primitives are written out for the driving extension to execute and
/// their outcome is awaited; the clipboard is written locally.
pub struct StdioHost {
    app_name: String,
    workspace_name: Option<String>,
    installed: HashSet<String>,
    reply_timeout: Duration,
    out: mpsc::UnboundedSender<Outbound>,
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, oneshot::Sender<HostReply>>>,
}

impl StdioHost {
    pub fn new(app_name: String, config: &HostConfig, out: mpsc::UnboundedSender<Outbound>) -> Self {
        Self {
            app_name,
            workspace_name: config.workspace_name.clone(),
            installed: config.installed_extensions.iter().cloned().collect(),
            reply_timeout: config.reply_timeout(),
            out,
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Hand `reply` to the request waiting for it. Unknown ids are dropped.
    pub fn resolve(&self, reply: HostReply) -> bool {
        let id = reply.id;
        let waiter = self.pending().remove(&id);
        match waiter {
            Some(waiter) => waiter.send(reply).is_ok(),
            None => {
                debug!(id, "reply for unknown host request");
                false
            }
        }
    }

    /// Fail every outstanding request with [`HostError::Disconnected`].
    pub fn disconnect(&self) {
        self.pending().clear();
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<u64, oneshot::Sender<HostReply>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, call: HostCall) -> Result<(), HostError> {
        self.out
            .send(Outbound::Host(HostRequest { id: None, call }))
            .map_err(|_| HostError::Disconnected)
    }

    async fn request(&self, call: HostCall) -> Result<HostReply, HostError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending().insert(id, tx);

        if self
            .out
            .send(Outbound::Host(HostRequest { id: Some(id), call }))
            .is_err()
        {
            self.pending().remove(&id);
            return Err(HostError::Disconnected);
        }

        match tokio::time::timeout(self.reply_timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(HostError::Disconnected),
            Err(_) => {
                self.pending().remove(&id);
                Err(HostError::Timeout(self.reply_timeout))
            }
        }
    }
}

#[async_trait]
impl Host for StdioHost {
    fn app_name(&self) -> String {
        self.app_name.clone()
    }

    fn workspace_name(&self) -> Option<String> {
        self.workspace_name.clone()
    }

    async fn execute_command(&self, command: &str, payload: Option<Value>) -> Result<(), HostError> {
        let reply = self
            .request(HostCall::ExecuteCommand {
                command: command.to_string(),
                payload,
            })
            .await?;
        match reply.error {
            Some(message) => Err(HostError::Command {
                command: command.to_string(),
                message,
            }),
            None => Ok(()),
        }
    }

    async fn write_clipboard(&self, text: &str) -> Result<(), HostError> {
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text))
        })
        .await
        .map_err(|e| HostError::Clipboard(e.to_string()))?
        .map_err(|e| HostError::Clipboard(e.to_string()))?;
        debug!("prompt copied to clipboard");
        Ok(())
    }

    /// Configured ids answer without a round trip; anything else is asked.
    async fn is_extension_installed(&self, extension_id: &str) -> bool {
        if self.installed.contains(extension_id) {
            return true;
        }
        let reply = self
            .request(HostCall::IsExtensionInstalled {
                extension_id: extension_id.to_string(),
            })
            .await;
        match reply {
            Ok(HostReply { error: None, result, .. }) => result.as_bool().unwrap_or(false),
            Ok(HostReply { error: Some(e), .. }) => {
                debug!(extension_id, "extension check failed: {e}");
                false
            }
            Err(e) => {
                debug!(extension_id, "extension check failed: {e}");
                false
            }
        }
    }

    async fn inject_prompt_diagnostic(&self, prompt: &str) -> Result<(), HostError> {
        let reply = self
            .request(HostCall::InjectDiagnostic {
                prompt: prompt.to_string(),
            })
            .await?;
        reply.error.map_or(Ok(()), |e| Err(HostError::Diagnostic(e)))
    }

    async fn clear_prompt_diagnostic(&self) -> Result<(), HostError> {
        let reply = self.request(HostCall::ClearDiagnostic).await?;
        reply.error.map_or(Ok(()), |e| Err(HostError::Diagnostic(e)))
    }

    async fn show_error_message(&self, message: &str) {
        if self
            .notify(HostCall::ShowError {
                message: message.to_string(),
            })
            .is_err()
        {
            debug!("error message dropped, output closed: {message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn host(
        app_name: &str,
        config: HostConfig,
    ) -> (Arc<StdioHost>, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(StdioHost::new(app_name.to_string(), &config, tx)), rx)
    }

    fn request_id(outbound: Outbound) -> u64 {
        match outbound {
            Outbound::Host(HostRequest { id: Some(id), .. }) => id,
            other => panic!("expected a host request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn commands_are_written_out_with_an_id() {
        let (host, mut rx) = host("Trae", HostConfig::default());

        let call = tokio::spawn({
            let host = Arc::clone(&host);
            async move {
                host.execute_command("workbench.action.chat.icube.open", Some(json!({ "query": "hi" })))
                    .await
            }
        });

        let line = serde_json::to_value(rx.recv().await.expect("outbound")).expect("serialize");
        assert_eq!(
            line,
            json!({
                "channel": "host",
                "message": {
                    "id": 1,
                    "call": "execute_command",
                    "command": "workbench.action.chat.icube.open",
                    "payload": { "query": "hi" },
                },
            })
        );

        assert!(host.resolve(HostReply {
            id: 1,
            error: None,
            result: Value::Null,
        }));
        call.await.expect("join").expect("command succeeded");
    }

    #[tokio::test]
    async fn editor_errors_become_command_failures() {
        let (host, mut rx) = host("Cursor", HostConfig::default());

        let call = tokio::spawn({
            let host = Arc::clone(&host);
            async move { host.execute_command("composer.fixerrormessage", None).await }
        });
        let id = request_id(rx.recv().await.expect("outbound"));
        host.resolve(HostReply {
            id,
            error: Some("command not found".to_string()),
            result: Value::Null,
        });

        assert_eq!(
            call.await.expect("join"),
            Err(HostError::Command {
                command: "composer.fixerrormessage".to_string(),
                message: "command not found".to_string(),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_request_times_out() {
        let config = HostConfig {
            reply_timeout_ms: 50,
            ..HostConfig::default()
        };
        let (host, _rx) = host("Cursor", config);

        assert_eq!(
            host.clear_prompt_diagnostic().await,
            Err(HostError::Timeout(Duration::from_millis(50)))
        );
        assert!(host.pending().is_empty());
    }

    #[tokio::test]
    async fn disconnect_fails_outstanding_requests() {
        let (host, mut rx) = host("Cursor", HostConfig::default());

        let call = tokio::spawn({
            let host = Arc::clone(&host);
            async move { host.inject_prompt_diagnostic("hello").await }
        });
        rx.recv().await.expect("outbound");
        host.disconnect();

        assert_eq!(call.await.expect("join"), Err(HostError::Disconnected));
    }

    #[tokio::test]
    async fn closed_output_is_a_disconnect() {
        let (host, rx) = host("Cursor", HostConfig::default());
        drop(rx);

        assert_eq!(
            host.clear_prompt_diagnostic().await,
            Err(HostError::Disconnected)
        );
    }

    #[tokio::test]
    async fn extension_check_asks_the_editor() {
        let (host, mut rx) = host("Visual Studio Code", HostConfig::default());

        let check = tokio::spawn({
            let host = Arc::clone(&host);
            async move { host.is_extension_installed("github.copilot-chat").await }
        });
        let outbound = rx.recv().await.expect("outbound");
        assert!(matches!(
            &outbound,
            Outbound::Host(HostRequest {
                call: HostCall::IsExtensionInstalled { extension_id },
                ..
            }) if extension_id == "github.copilot-chat"
        ));
        host.resolve(HostReply {
            id: request_id(outbound),
            error: None,
            result: Value::Bool(true),
        });

        assert!(check.await.expect("join"));
    }

    #[tokio::test]
    async fn configured_extensions_skip_the_round_trip() {
        let config = HostConfig {
            installed_extensions: vec!["saoudrizwan.claude-dev".to_string()],
            ..HostConfig::default()
        };
        let (host, mut rx) = host("Visual Studio Code", config);

        assert!(host.is_extension_installed("saoudrizwan.claude-dev").await);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn inbound_lines_are_routed_by_channel() {
        let reply: Inbound =
            serde_json::from_str(r#"{"channel":"host","message":{"id":7,"error":null}}"#)
                .expect("parse reply");
        assert_eq!(
            reply,
            Inbound::Host(HostReply {
                id: 7,
                error: None,
                result: Value::Null,
            })
        );

        let sync: Inbound =
            serde_json::from_str(r#"{"channel":"toolbar","message":{"type":"sync"}}"#)
                .expect("parse sync");
        assert_eq!(sync, Inbound::Toolbar(ToolbarRequest::Sync));
    }
}
