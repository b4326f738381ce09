// `pinpoint serve`: the agent service over JSON lines on stdio

use std::sync::Arc;

use anyhow::Result;
use pinpoint_config::Config;
use pinpoint_core::{AgentService, AgentTransport, LocalTransport};
use pinpoint_protocol::{AgentEvent, ToolbarRequest};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::host_app_name;
use crate::stdio_host::{Inbound, Outbound, StdioHost};

pub async fn run(config: &Config) -> Result<()> {
    serve_lines(config, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Read [`Inbound`] lines until EOF. Agent events and host requests are
/// written to `output`, one JSON object per line.
pub async fn serve_lines<R, W>(config: &Config, input: R, output: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_lines(out_rx, output));

    let host = Arc::new(StdioHost::new(
        host_app_name(None, config),
        &config.host,
        out_tx.clone(),
    ));
    let service = Arc::new(AgentService::new(host.clone(), &config.agent));
    let transport = LocalTransport::new(Arc::clone(&service));

    let forward_token = CancellationToken::new();
    let forward = tokio::spawn(forward_events(
        transport.subscribe(),
        out_tx.clone(),
        forward_token.clone(),
    ));
    service.start();

    let mut inflight = JoinSet::new();
    let mut lines = BufReader::new(input).lines();
    while let Some(line) = lines.next_line().await? {
        while inflight.try_join_next().is_some() {}
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Inbound>(&line) {
            Ok(Inbound::Toolbar(ToolbarRequest::SendUserMessage(message))) => {
                let transport = transport.clone();
                inflight.spawn(async move {
                    if let Err(e) = transport.send_user_message(message).await {
                        warn!("message rejected: {e}");
                    }
                });
            }
            Ok(Inbound::Toolbar(ToolbarRequest::Sync)) => {
                for event in transport.sync().await? {
                    if out_tx.send(Outbound::Event(event)).is_err() {
                        break;
                    }
                }
            }
            Ok(Inbound::Agent(request)) => service.handle_agent_request(request),
            Ok(Inbound::Host(reply)) => {
                if !host.resolve(reply) {
                    debug!("host reply arrived after its request gave up");
                }
            }
            Err(e) => warn!("ignoring malformed line: {e}"),
        }
    }

    info!("input closed, shutting down");
    host.disconnect();
    while inflight.join_next().await.is_some() {}
    service.shutdown();
    forward_token.cancel();
    forward.await?;

    drop(transport);
    drop(service);
    drop(host);
    drop(out_tx);
    writer.await??;
    Ok(())
}

async fn forward_events(
    mut events: broadcast::Receiver<AgentEvent>,
    out: mpsc::UnboundedSender<Outbound>,
    cancellation_token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => break,
            event = events.recv() => match event {
                Ok(event) => {
                    if out.send(Outbound::Event(event)).is_err() {
                        return;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event forwarder lagged"),
                Err(RecvError::Closed) => return,
            },
        }
    }

    // Flush whatever was published before cancellation.
    while let Ok(event) = events.try_recv() {
        if out.send(Outbound::Event(event)).is_err() {
            return;
        }
    }
}

async fn write_lines<W>(mut out: mpsc::UnboundedReceiver<Outbound>, mut output: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = out.recv().await {
        let mut line = serde_json::to_string(&message)?;
        line.push('\n');
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(())
}
