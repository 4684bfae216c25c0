//! Connection to the authoritative server: one task reads length-prefixed
//! [`Snapshot`] frames and forwards them to the main loop, another writes
//! [`Intent`] frames pulled from an outbound channel.

use seedfall_net::wire::{self, Intent, Snapshot};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::warn;

pub async fn connect(
    server_addr: &str,
) -> std::io::Result<(mpsc::UnboundedSender<Intent>, mpsc::UnboundedReceiver<Snapshot>)> {
    let stream = TcpStream::connect(server_addr).await?;
    let (read_half, write_half) = stream.into_split();

    let (intent_tx, intent_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = mpsc::unbounded_channel();

    tokio::spawn(read_loop(read_half, snapshot_tx));
    tokio::spawn(write_loop(write_half, intent_rx));

    Ok((intent_tx, snapshot_rx))
}

async fn read_loop(mut read_half: tokio::net::tcp::OwnedReadHalf, tx: mpsc::UnboundedSender<Snapshot>) {
    loop {
        let frame = match read_frame(&mut read_half).await {
            Ok(Some(frame)) => frame,
            Ok(None) => return,
            Err(err) => {
                warn!(?err, "connection read failed");
                return;
            }
        };
        match wire::decode::<Snapshot>(&frame) {
            Ok(snapshot) => {
                if tx.send(snapshot).is_err() {
                    return;
                }
            }
            Err(err) => warn!(?err, "malformed snapshot frame"),
        }
    }
}

async fn write_loop(mut write_half: tokio::net::tcp::OwnedWriteHalf, mut rx: mpsc::UnboundedReceiver<Intent>) {
    while let Some(intent) = rx.recv().await {
        let bytes = match wire::encode(&intent) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(?err, "failed to encode intent");
                continue;
            }
        };
        if write_frame(&mut write_half, &bytes).await.is_err() {
            return;
        }
    }
}

async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> std::io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err),
    }
    let len = u32::from_le_bytes(len_buf) as usize;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

async fn write_frame<W: AsyncWriteExt + Unpin>(writer: &mut W, body: &[u8]) -> std::io::Result<()> {
    writer.write_all(&(body.len() as u32).to_le_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await
}
