//! JSON-lines transport for the host channel: one request per input line,
//! one reply per output line.

use anyhow::Result;
use homespace_core::channel::{HomeSpace, Outcome, Reply, Request};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn serve_lines<R, W>(space: HomeSpace, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (req_tx, req_rx) = mpsc::channel::<Request>(32);
    let (reply_tx, mut reply_rx) = mpsc::channel::<Reply>(32);
    let server = tokio::spawn(async move { space.serve(req_rx, reply_tx).await });

    let mut lines = reader.lines();
    let mut handled = 0u64;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Request>(&line) {
            Ok(request) => {
                if req_tx.send(request).await.is_err() {
                    break;
                }
                if let Some(reply) = reply_rx.recv().await {
                    write_reply(&mut writer, &reply).await?;
                }
            }
            Err(e) => {
                warn!(error = %e, "malformed request");
                write_reply(&mut writer, &parse_error_reply(&line, e)).await?;
            }
        }
        handled += 1;
    }
    drop(req_tx);
    while let Some(reply) = reply_rx.recv().await {
        write_reply(&mut writer, &reply).await?;
    }
    server.await?;
    info!(handled, "input closed, serve loop finished");
    Ok(())
}

/// Builds error replies for lines that did not parse, keeping the caller's id
/// when it is readable.
fn parse_error_reply(line: &str, err: serde_json::Error) -> Reply {
    let id = serde_json::from_str::<serde_json::Value>(line)
        .ok()
        .and_then(|v| v.get("id").and_then(|id| id.as_u64()))
        .unwrap_or(0);
    Reply {
        id,
        outcome: Outcome::Error(format!("malformed request: {err}")),
    }
}

async fn write_reply<W: AsyncWrite + Unpin>(writer: &mut W, reply: &Reply) -> Result<()> {
    let mut line = serde_json::to_vec(reply)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}
