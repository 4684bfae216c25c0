//! Client-facing TCP listener. Each connection gets one read task and one
//! write task; both only ever talk to the simulation thread through
//! `ServerMsg` and an unbounded per-client outbound channel -- never to the
//! ECS world directly.

use std::sync::atomic::{AtomicU32, Ordering};

use seedfall_net::wire::{self, Intent};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::error::HostError;
use crate::sim::ServerMsg;

static NEXT_CLIENT_ID: AtomicU32 = AtomicU32::new(1);

pub async fn accept_loop(port: u16, sim_tx: mpsc::UnboundedSender<ServerMsg>) -> Result<(), HostError> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|source| HostError::Bind { port, source })?;
    info!(port, "listening for clients");

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(err) => {
                warn!(?err, "accept failed");
                continue;
            }
        };
        let client_id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
        let sim_tx = sim_tx.clone();
        tokio::spawn(async move {
            info!(client_id, %addr, "client connected");
            if let Err(err) = handle_client(client_id, stream, sim_tx.clone()).await {
                warn!(client_id, ?err, "client connection ended");
            }
            let _ = sim_tx.send(ServerMsg::Disconnect { client_id });
        });
    }
}

async fn handle_client(
    client_id: u32,
    stream: TcpStream,
    sim_tx: mpsc::UnboundedSender<ServerMsg>,
) -> std::io::Result<()> {
    let (reply_tx, reply_rx) = oneshot::channel();
    let _ = sim_tx.send(ServerMsg::Connect { client_id, reply: reply_tx });
    let outbound = reply_rx.await.map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "sim thread gone"))?;

    let (read_half, write_half) = stream.into_split();

    tokio::select! {
        result = read_loop(client_id, read_half, sim_tx) => result,
        result = write_loop(write_half, outbound) => result,
    }
}

async fn read_loop(
    client_id: u32,
    mut read_half: tokio::net::tcp::OwnedReadHalf,
    sim_tx: mpsc::UnboundedSender<ServerMsg>,
) -> std::io::Result<()> {
    loop {
        let frame = match read_frame(&mut read_half).await? {
            Some(frame) => frame,
            None => return Ok(()),
        };
        match wire::decode::<Intent>(&frame) {
            Ok(intent) => {
                let _ = sim_tx.send(ServerMsg::Intent { client_id, intent });
            }
            Err(err) => warn!(client_id, ?err, "malformed intent frame, dropping client"),
        }
    }
}

async fn write_loop(
    mut write_half: tokio::net::tcp::OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Vec<u8>>,
) -> std::io::Result<()> {
    while let Some(bytes) = outbound.recv().await {
        write_frame(&mut write_half, &bytes).await?;
    }
    Ok(())
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
