use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::session::OpsSession;

use super::handle_line;

const OUTBOUND_QUEUE: usize = 64;

/// Serve newline-delimited JSON-RPC from `reader`, writing responses to `writer`.
///
/// Each message is handled on its own task; responses are written in
/// completion order by a single writer task. The outbound queue is bounded,
/// so handlers wait when the writer stalls. Returns once the input is
/// exhausted and every in-flight request has been answered.
///
/// # Errors
///
/// Returns the first I/O error from reading input or writing output.
pub async fn serve<R, W>(session: Arc<OpsSession>, reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_QUEUE);

    let writer_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            writer.write_all(message.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        Ok::<(), io::Error>(())
    });

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let session = Arc::clone(&session);
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some(response) = handle_line(&session, &line).await {
                // Receiver only goes away when the writer failed; that error is reported below.
                let _ = tx.send(response).await;
            }
        });
    }
    drop(tx);

    writer_task.await.map_err(io::Error::other)?
}
