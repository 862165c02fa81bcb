//! Local endpoint that lets separate client processes reach the handoff.
//!
//! Each accepted Unix socket connection gets a proxy task. The proxy reads
//! slot frames from its process and replays them against the in-process
//! handoff as that client: `Connect` frames use the two-phase connect,
//! `Disconnect` frames the fire-and-forget disconnect, everything else a
//! one-phase transaction. Responses go back as slot frames.

use log::{debug, error, info, warn};
use shared::handoff::{HandoffClient, HandoffError};
use shared::wire::{read_slot, write_slot, WireError};
use shared::{Outcome, Request, Response, TransactionSlot};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::timeout;

pub use shared::wire::DEFAULT_SOCKET_PATH;

/// How long shutdown waits for proxies to tell their clients.
const PROXY_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Owns the socket file; it is unlinked when the listener is dropped.
pub struct IpcListener {
    listener: UnixListener,
    path: PathBuf,
}

impl IpcListener {
    /// Creates the socket. Fails if another server is already answering on
    /// `path`; a stale file left by a dead server is removed first.
    pub fn bind(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        if path.exists() {
            if std::os::unix::net::UnixStream::connect(&path).is_ok() {
                return Err(io::Error::new(
                    io::ErrorKind::AddrInUse,
                    format!("a server is already listening on {}", path.display()),
                ));
            }
            warn!("Removing stale socket {}", path.display());
            std::fs::remove_file(&path)?;
        }

        let listener = UnixListener::bind(&path)?;
        info!("Listening on {}", path.display());
        Ok(Self { listener, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accepts client processes until `shutdown` fires, then waits briefly for
    /// every proxy to notify its client.
    pub async fn serve(self, handoff: HandoffClient, mut shutdown: watch::Receiver<bool>) {
        let mut proxies = JoinSet::new();

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let handoff = handoff.clone();
                        let shutdown = shutdown.clone();
                        proxies.spawn(async move {
                            if let Err(e) = proxy_connection(stream, handoff, shutdown).await {
                                warn!("Client connection ended with error: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }

            // Reap finished proxies so the set does not grow without bound.
            while proxies.try_join_next().is_some() {}
        }

        let drain = async { while proxies.join_next().await.is_some() {} };
        if timeout(PROXY_DRAIN_TIMEOUT, drain).await.is_err() {
            warn!("Abandoning client connections that did not close in time");
        }
        info!("Stopped accepting clients");
    }
}

impl Drop for IpcListener {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            error!("Failed to remove socket {}: {}", self.path.display(), e);
        }
    }
}

/// Runs one request from a client process through the handoff.
///
/// Returns `None` for requests that have no response.
async fn forward(handoff: &HandoffClient, request: Request) -> Result<Option<Response>, HandoffError> {
    match request {
        Request::Connect => {
            let client_id = handoff.connect().await?;
            Ok(Some(Response::connected(client_id)))
        }
        Request::Disconnect { client_id } => {
            handoff.disconnect(client_id).await?;
            Ok(None)
        }
        other => handoff.transact(other).await.map(Some),
    }
}

async fn notify_shutdown<W: AsyncWrite + Unpin>(writer: &mut W) {
    if let Err(e) = write_slot(writer, &TransactionSlot::terminating()).await {
        debug!("Could not send terminate frame: {}", e);
    }
}

async fn proxy_connection(
    stream: UnixStream,
    handoff: HandoffClient,
    shutdown: watch::Receiver<bool>,
) -> Result<(), WireError> {
    // Session created through this connection and not yet ended.
    let mut session: Option<u32> = None;
    let result = relay(stream, &handoff, shutdown, &mut session).await;

    // The process went away without saying goodbye, cleanly or not.
    if let Some(client_id) = session {
        info!("Client {} closed its connection, ending session", client_id);
        if let Err(e) = handoff.disconnect(client_id).await {
            debug!("Could not end session {}: {}", client_id, e);
        }
    }
    result
}

/// Moves frames between one client process and the handoff until either
/// side is done. `session` tracks the id that still needs a disconnect.
async fn relay(
    stream: UnixStream,
    handoff: &HandoffClient,
    mut shutdown: watch::Receiver<bool>,
    session: &mut Option<u32>,
) -> Result<(), WireError> {
    let (mut reader, mut writer) = stream.into_split();

    loop {
        let frame = tokio::select! {
            frame = read_slot(&mut reader) => frame,
            _ = shutdown.changed() => {
                // The server drops every session itself.
                *session = None;
                notify_shutdown(&mut writer).await;
                return Ok(());
            }
        };

        let request = match frame {
            Ok(Some(frame)) => Request::from_slot(&frame),
            Ok(None) => return Ok(()),
            // Frames have a fixed size, so the stream is still aligned.
            Err(WireError::Codec(e)) => {
                warn!("Undecodable frame from client process: {}", e);
                Request::Malformed {
                    client_id: session.unwrap_or_default(),
                }
            }
            Err(e) => return Err(e),
        };

        match forward(handoff, request).await {
            Ok(Some(response)) => {
                match (request, response.outcome) {
                    (Request::Connect, _) => *session = Some(response.client_id),
                    (_, Outcome::NoMoreWords) => *session = None,
                    _ => {}
                }
                write_slot(&mut writer, &response.to_slot()).await?;
            }
            Ok(None) => {
                *session = None;
                return Ok(());
            }
            Err(HandoffError::Shutdown) => {
                *session = None;
                notify_shutdown(&mut writer).await;
                return Ok(());
            }
            Err(e) => {
                warn!("Refusing request from client process: {}", e);
                let client_id = request.client_id().unwrap_or_default();
                write_slot(&mut writer, &Response::rejected(client_id).to_slot()).await?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;
    use crate::words::WordSource;
    use shared::handoff::{Handoff, HandoffServer};
    use shared::wire::encode_slot;
    use tokio::io::AsyncWriteExt;

    fn socket_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("hangman-ipc-{}-{}.sock", name, std::process::id()))
    }

    /// Serves the handoff with real game rules until a disconnect arrives,
    /// then hands back the state.
    async fn serve_until_disconnect(server: HandoffServer, mut state: GameState) -> GameState {
        loop {
            let request = server.next_request().await.unwrap();
            if let Some(response) = state.handle(request) {
                server.respond(&response).await;
            }
            if request == Request::Connect {
                server.await_connect_ack().await.unwrap();
            }
            server.release();
            if matches!(request, Request::Disconnect { .. }) {
                return state;
            }
        }
    }

    fn game_state(word: &str) -> GameState {
        GameState::new(WordSource::new(vec![word.to_string()]).unwrap())
    }

    #[tokio::test]
    async fn test_bind_removes_stale_socket_file() {
        let path = socket_path("stale");
        std::fs::write(&path, b"").unwrap();

        let listener = IpcListener::bind(&path).unwrap();
        assert_eq!(listener.path(), path.as_path());

        drop(listener);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_bind_refuses_live_socket() {
        let path = socket_path("live");
        let _first = IpcListener::bind(&path).unwrap();

        let second = IpcListener::bind(&path);
        assert_eq!(
            second.err().map(|e| e.kind()),
            Some(io::ErrorKind::AddrInUse)
        );
    }

    #[tokio::test]
    async fn test_forward_reports_shutdown() {
        let handoff = Handoff::new();
        handoff.server().shutdown().await;

        let result = forward(&handoff.client(), Request::NewGame { client_id: 1 }).await;
        assert_eq!(result, Err(HandoffError::Shutdown));
    }

    #[tokio::test]
    async fn test_proxy_sends_terminate_on_shutdown() {
        let handoff = Handoff::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (near, far) = UnixStream::pair().unwrap();

        let proxy = tokio::spawn(proxy_connection(far, handoff.client(), shutdown_rx));
        shutdown_tx.send(true).unwrap();

        let (mut reader, _writer) = near.into_split();
        let frame = read_slot(&mut reader).await.unwrap().unwrap();
        assert!(frame.terminate);
        proxy.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_proxy_answers_malformed_frames() {
        let handoff = Handoff::new();
        let server = handoff.server();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (near, far) = UnixStream::pair().unwrap();
        let proxy = tokio::spawn(proxy_connection(far, handoff.client(), shutdown_rx));

        let (mut reader, mut writer) = near.into_split();
        let idle = TransactionSlot {
            client_id: 3,
            ..TransactionSlot::default()
        };
        write_slot(&mut writer, &idle).await.unwrap();

        assert_eq!(
            server.next_request().await,
            Ok(Request::Malformed { client_id: 3 })
        );
        server.respond(&Response::rejected(3)).await;
        server.release();

        let frame = read_slot(&mut reader).await.unwrap().unwrap();
        assert_eq!(frame.outcome, Outcome::ProtocolViolation);

        drop(writer);
        proxy.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_vanished_client_session_is_removed() {
        let handoff = Handoff::new();
        let server = tokio::spawn(serve_until_disconnect(handoff.server(), game_state("CAT")));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (near, far) = UnixStream::pair().unwrap();
        let proxy = tokio::spawn(proxy_connection(far, handoff.client(), shutdown_rx));

        let (mut reader, mut writer) = near.into_split();
        write_slot(&mut writer, &Request::Connect.to_slot()).await.unwrap();
        let client_id = read_slot(&mut reader).await.unwrap().unwrap().client_id;
        write_slot(&mut writer, &Request::NewGame { client_id }.to_slot())
            .await
            .unwrap();

        // Gone mid-turn, before reading the NewGame response.
        drop(reader);
        drop(writer);

        let state = timeout(Duration::from_secs(1), server)
            .await
            .expect("session was never ended")
            .unwrap();
        assert!(state.sessions.is_empty());
        // Broken pipe or clean EOF, depending on timing.
        let _ = proxy.await.unwrap();
    }

    #[tokio::test]
    async fn test_undecodable_frame_gets_protocol_violation() {
        let handoff = Handoff::new();
        let server = tokio::spawn(serve_until_disconnect(handoff.server(), game_state("CAT")));
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let (near, far) = UnixStream::pair().unwrap();
        let proxy = tokio::spawn(proxy_connection(far, handoff.client(), shutdown_rx));

        let (mut reader, mut writer) = near.into_split();
        write_slot(&mut writer, &Request::Connect.to_slot()).await.unwrap();
        let client_id = read_slot(&mut reader).await.unwrap().unwrap().client_id;

        let mut data = encode_slot(&Request::NewGame { client_id }.to_slot()).unwrap();
        // Leading byte of the request kind; no variant has this index.
        data[0] = 0x7F;
        writer.write_all(&data).await.unwrap();

        let frame = read_slot(&mut reader).await.unwrap().unwrap();
        assert_eq!(frame.outcome, Outcome::ProtocolViolation);
        assert_eq!(frame.client_id, client_id);

        // The next well-formed frame is read normally.
        write_slot(&mut writer, &Request::NewGame { client_id }.to_slot())
            .await
            .unwrap();
        let frame = read_slot(&mut reader).await.unwrap().unwrap();
        assert_eq!(Response::from_slot(&frame).revealed_word(), "___");

        write_slot(&mut writer, &Request::Disconnect { client_id }.to_slot())
            .await
            .unwrap();
        let state = timeout(Duration::from_secs(1), server).await.unwrap().unwrap();
        assert!(state.sessions.is_empty());
        proxy.await.unwrap().unwrap();
    }
}
