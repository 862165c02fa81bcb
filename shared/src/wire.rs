//! Constant-size frames for moving transaction slots between processes.
//!
//! A frame is one bincode-encoded [`TransactionSlot`] and nothing else. Every
//! field has a fixed width, so readers know the frame size up front and no
//! length prefix is needed.

use crate::TransactionSlot;
use bincode::{deserialize, serialize, serialized_size};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Where the server listens unless told otherwise.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/hangman.sock";

#[derive(Debug, Error)]
pub enum WireError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed frame: {0}")]
    Codec(#[from] bincode::Error),
    #[error("frame is {actual} bytes, expected {expected}")]
    Size { expected: usize, actual: usize },
}

/// Encoded size of every slot.
pub fn slot_wire_size() -> Result<usize, WireError> {
    Ok(serialized_size(&TransactionSlot::default())? as usize)
}

pub fn encode_slot(slot: &TransactionSlot) -> Result<Vec<u8>, WireError> {
    Ok(serialize(slot)?)
}

pub fn decode_slot(bytes: &[u8]) -> Result<TransactionSlot, WireError> {
    let expected = slot_wire_size()?;
    if bytes.len() != expected {
        return Err(WireError::Size {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(deserialize(bytes)?)
}

/// Reads one frame. Returns `Ok(None)` when the peer closed the stream.
pub async fn read_slot<R>(reader: &mut R) -> Result<Option<TransactionSlot>, WireError>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = vec![0u8; slot_wire_size()?];
    match reader.read_exact(&mut buffer).await {
        Ok(_) => decode_slot(&buffer).map(Some),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub async fn write_slot<W>(writer: &mut W, slot: &TransactionSlot) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    let data = encode_slot(slot)?;
    writer.write_all(&data).await?;
    writer.flush().await?;
    Ok(())
}
