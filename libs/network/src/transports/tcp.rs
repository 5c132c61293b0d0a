//! TCP Multipart Framing
//!
//! Every message on the wire is one frame:
//!
//! ```text
//! ┌────────────┬────────────┬─────────┬────────────┬─────────┬───┐
//! │ parts: u32 │ len_0: u32 │ part_0  │ len_1: u32 │ part_1  │ … │
//! └────────────┴────────────┴─────────┴────────────┴─────────┴───┘
//! ```
//!
//! All integers are big-endian. The whole frame, headers included, must fit
//! in `max_message_size`; oversized frames are rejected on both ends.

use super::TcpConfig;
use crate::{Result, TransportError};
use bytes::{BufMut, Bytes, BytesMut};
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info};

/// Width of the part count and of every part length
pub const HEADER_LEN: usize = 4;

/// Encode `parts` into one frame, refusing frames over `max_message_size`
pub fn encode_frame<P: AsRef<[u8]>>(parts: &[P], max_message_size: usize) -> Result<Bytes> {
    let size = HEADER_LEN
        + parts
            .iter()
            .map(|part| HEADER_LEN + part.as_ref().len())
            .sum::<usize>();
    if size > max_message_size {
        return Err(TransportError::protocol(format!(
            "Message size {} exceeds maximum {}",
            size, max_message_size
        )));
    }

    let mut buffer = BytesMut::with_capacity(size);
    buffer.put_u32(parts.len() as u32);
    for part in parts {
        let part = part.as_ref();
        buffer.put_u32(part.len() as u32);
        buffer.extend_from_slice(part);
    }
    Ok(buffer.freeze())
}

/// Connect with the configured timeout and Nagle disabled
pub async fn connect(addr: impl ToSocketAddrs, config: &TcpConfig) -> Result<TcpStream> {
    let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| {
            TransportError::timeout("connect", config.connect_timeout.as_millis() as u64)
        })?
        .map_err(|e| TransportError::connection_with_source("Failed to connect", None, e))?;

    let peer = stream.peer_addr().ok();
    stream.set_nodelay(true).map_err(|e| {
        TransportError::connection_with_source("Failed to set TCP_NODELAY", peer, e)
    })?;
    if let Some(peer) = peer {
        info!(peer = %peer, "Connected");
    }
    Ok(stream)
}

/// Reads whole frames from a byte stream
pub struct FrameReader<R> {
    reader: R,
    peer: Option<SocketAddr>,
    max_message_size: usize,
    /// Reusable read buffer; parts are split off it without copying
    buffer: BytesMut,
    bytes_received: u64,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R, max_message_size: usize) -> Self {
        Self {
            reader,
            peer: None,
            max_message_size,
            buffer: BytesMut::with_capacity(64 * 1024),
            bytes_received: 0,
        }
    }

    /// Tag log lines with the remote address
    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Next frame, or `None` when the peer closed cleanly between frames
    pub async fn read_frame(&mut self) -> Result<Option<Vec<Bytes>>> {
        let count = match self.reader.read_u32().await {
            Ok(count) => count as usize,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => {
                return Err(TransportError::network_with_source(
                    "Failed to read part count",
                    e,
                ))
            }
        };

        let mut size = HEADER_LEN + count * HEADER_LEN;
        if size > self.max_message_size {
            return Err(TransportError::protocol(format!(
                "Frame of {} parts exceeds maximum size {}",
                count, self.max_message_size
            )));
        }

        let mut parts = Vec::with_capacity(count);
        for _ in 0..count {
            let len = self
                .reader
                .read_u32()
                .await
                .map_err(|e| TransportError::network_with_source("Failed to read part length", e))?
                as usize;

            size += len;
            if size > self.max_message_size {
                return Err(TransportError::protocol(format!(
                    "Message size {} exceeds maximum {}",
                    size, self.max_message_size
                )));
            }

            self.buffer.resize(len, 0);
            self.reader
                .read_exact(&mut self.buffer)
                .await
                .map_err(|e| TransportError::network_with_source("Failed to read message part", e))?;
            parts.push(self.buffer.split().freeze());
        }

        self.bytes_received += size as u64;
        debug!(
            peer = ?self.peer,
            parts = count,
            bytes = size,
            total_received = self.bytes_received,
            "Received frame"
        );
        Ok(Some(parts))
    }
}

/// Writes whole frames to a byte stream
pub struct FrameWriter<W> {
    writer: W,
    peer: Option<SocketAddr>,
    max_message_size: usize,
    bytes_sent: u64,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W, max_message_size: usize) -> Self {
        Self {
            writer,
            peer: None,
            max_message_size,
            bytes_sent: 0,
        }
    }

    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Encode and send one frame
    pub async fn write_frame<P: AsRef<[u8]>>(&mut self, parts: &[P]) -> Result<()> {
        let frame = encode_frame(parts, self.max_message_size)?;
        self.write_encoded(&frame).await
    }

    /// Send a frame produced by [`encode_frame`]
    pub async fn write_encoded(&mut self, frame: &[u8]) -> Result<()> {
        // Single write call, then flush for immediate transmission
        self.writer
            .write_all(frame)
            .await
            .map_err(|e| TransportError::network_with_source("Failed to write message", e))?;
        self.writer
            .flush()
            .await
            .map_err(|e| TransportError::network_with_source("Failed to flush stream", e))?;

        self.bytes_sent += frame.len() as u64;
        debug!(
            peer = ?self.peer,
            bytes = frame.len(),
            total_sent = self.bytes_sent,
            "Sent frame"
        );
        Ok(())
    }

    /// Flush and close the write side
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await.map_err(TransportError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frame_exchange() {
        let (client, server) = tokio::io::duplex(1024);
        let mut writer = FrameWriter::new(client, 1024);
        let mut reader = FrameReader::new(server, 1024);

        writer.write_frame(&[&b"deposit"[..], &b""[..], &b"json"[..]]).await.unwrap();
        writer.write_frame::<&[u8]>(&[]).await.unwrap();

        let parts = reader.read_frame().await.unwrap().unwrap();
        assert_eq!(parts, vec![Bytes::from("deposit"), Bytes::new(), Bytes::from("json")]);
        assert!(reader.read_frame().await.unwrap().unwrap().is_empty());
        assert_eq!(reader.bytes_received(), writer.bytes_sent());
    }

    #[tokio::test]
    async fn test_clean_close_between_frames() {
        let (client, server) = tokio::io::duplex(64);
        let mut writer = FrameWriter::new(client, 64);
        let mut reader = FrameReader::new(server, 64);

        writer.write_frame(&["ping"]).await.unwrap();
        drop(writer);
        assert_eq!(reader.read_frame().await.unwrap().unwrap(), vec![Bytes::from("ping")]);
        assert!(reader.read_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_truncated_frame_is_error() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = FrameReader::new(server, 64);

        // One part announced as 10 bytes, only 3 delivered
        client.write_all(&[0, 0, 0, 1, 0, 0, 0, 10, b'a', b'b', b'c']).await.unwrap();
        drop(client);
        let err = reader.read_frame().await.unwrap_err();
        assert_eq!(err.category(), "network");
    }

    #[tokio::test]
    async fn test_oversized_frames_rejected() {
        assert!(encode_frame(&[vec![0u8; 100]], 64).is_err());
        assert_eq!(encode_frame(&[vec![0u8; 56]], 64).unwrap().len(), 64);

        let (mut client, server) = tokio::io::duplex(256);
        let mut reader = FrameReader::new(server, 64);
        client.write_all(&[0, 0, 0, 1, 0, 0, 1, 0]).await.unwrap();
        let err = reader.read_frame().await.unwrap_err();
        assert!(matches!(err, TransportError::Protocol { .. }));
    }
}
