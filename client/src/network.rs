//! Connection from a client process to the server's local socket.

use log::{debug, info};
use shared::wire::{read_slot, write_slot, WireError};
use shared::{Request, Response};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("server not reachable at {path}: {source}")]
    Unreachable { path: PathBuf, source: io::Error },
    #[error("server is shutting down")]
    Shutdown,
    #[error("connection to server lost")]
    Closed,
    #[error(transparent)]
    Wire(#[from] WireError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub struct Connection {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
}

impl Connection {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path)
            .await
            .map_err(|source| ClientError::Unreachable {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Opened connection to {}", path.display());

        let (reader, writer) = stream.into_split();
        Ok(Self { reader, writer })
    }

    async fn exchange(&mut self, request: Request) -> Result<Response, ClientError> {
        if let Err(e) = write_slot(&mut self.writer, &request.to_slot()).await {
            // A server that shut down leaves its terminate frame behind.
            return match read_slot(&mut self.reader).await {
                Ok(Some(slot)) if slot.terminate => Err(ClientError::Shutdown),
                _ => Err(e.into()),
            };
        }

        match read_slot(&mut self.reader).await? {
            Some(slot) if slot.terminate => Err(ClientError::Shutdown),
            Some(slot) => Ok(Response::from_slot(&slot)),
            None => Err(ClientError::Closed),
        }
    }

    /// Runs the connect handshake and returns the assigned client id.
    pub async fn connect(&mut self) -> Result<u32, ClientError> {
        let response = self.exchange(Request::Connect).await?;
        info!("Connected! Client ID: {}", response.client_id);
        Ok(response.client_id)
    }

    /// Sends a `NewGame` or `Play` request and waits for its response.
    pub async fn request(&mut self, request: Request) -> Result<Response, ClientError> {
        self.exchange(request).await
    }

    /// Ends the session. The server sends nothing back.
    pub async fn disconnect(&mut self, client_id: u32) -> Result<(), ClientError> {
        write_slot(&mut self.writer, &Request::Disconnect { client_id }.to_slot()).await?;
        Ok(())
    }
}
