//! Per-client connection loop.

use std::sync::Arc;

use thiserror::Error;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, WriteHalf},
    sync::watch,
};
use tracing::{debug, warn};

use crate::{
    commands::{CommandDispatcher, CommandResult},
    input::{ProtocolError, RequestDecoder},
    resp::RespValue,
    state::{ClientId, ClientState, SharedState},
};

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Serves one client until it disconnects, sends QUIT, sends a malformed
/// frame, or the server shuts down.
///
/// Requests are answered strictly in the order they arrive. Messages
/// published to the client's subscriptions are written as soon as the loop
/// is idle; those published before a command ran are written ahead of its
/// reply. Whatever ends the connection, all of its subscriptions are removed
/// before returning.
pub async fn handle_connection<S>(
    stream: S,
    client_id: ClientId,
    state: SharedState,
    dispatcher: Arc<CommandDispatcher>,
    shutdown: watch::Receiver<bool>,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut client = ClientState::new(client_id);

    let result = serve(stream, &mut client, &state, &dispatcher, shutdown).await;

    state.lock().await.pub_sub.remove_client(client_id);
    debug!(
        client = client_id.0,
        dropped_transaction = client.in_transaction(),
        "connection closed"
    );

    result
}

async fn serve<S>(
    stream: S,
    client: &mut ClientState,
    state: &SharedState,
    dispatcher: &CommandDispatcher,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);
    let mut decoder = RequestDecoder::new();

    loop {
        // Answer everything already buffered before reading again, so
        // pipelined requests are served in order.
        match decoder.decode() {
            Ok(Some(request)) => {
                let result = dispatcher.dispatch(state, client, request).await;
                for message in client.take_pending_pushes() {
                    write_frame(&mut writer, &message).await?;
                }
                if !write_result(&mut writer, result).await? {
                    return Ok(());
                }
                continue;
            }
            Ok(None) => {}
            Err(error) => {
                warn!(client = client.id.0, "protocol error: {}", error);
                write_frame(&mut writer, &error.to_resp()).await?;
                writer.shutdown().await?;
                return Err(error.into());
            }
        }

        if *shutdown.borrow_and_update() {
            return Ok(());
        }

        tokio::select! {
            read = reader.read_buf(decoder.buffer_mut()) => {
                if read? == 0 {
                    return Ok(());
                }
            }
            Some(message) = client.next_push() => {
                write_frame(&mut writer, &message).await?;
            }
            _ = shutdown.changed() => {
                return Ok(());
            }
        }
    }
}

async fn write_frame<S>(writer: &mut WriteHalf<S>, frame: &RespValue) -> std::io::Result<()>
where
    S: AsyncWrite,
{
    writer.write_all(&frame.encode()).await?;
    writer.flush().await
}

/// Writes a command result. Returns `false` when the connection must close.
async fn write_result<S>(writer: &mut WriteHalf<S>, result: CommandResult) -> std::io::Result<bool>
where
    S: AsyncWrite,
{
    match result {
        CommandResult::Response(frame) => {
            write_frame(writer, &frame).await?;
            Ok(true)
        }
        CommandResult::Replies(frames) => {
            let mut out = Vec::new();
            for frame in &frames {
                frame.encode_into(&mut out);
            }
            writer.write_all(&out).await?;
            writer.flush().await?;
            Ok(true)
        }
        CommandResult::Close(frame) => {
            write_frame(writer, &frame).await?;
            writer.shutdown().await?;
            Ok(false)
        }
    }
}
