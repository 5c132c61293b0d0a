//! Request/reply server side
//!
//! A [`Replier`] exposes one [`Mailbox`] on a TCP listener. Each request
//! frame `[id, operation, format, arguments]` becomes a `mailbox.send`;
//! when the promise resolves the reply `[id, value, error]` is written
//! back in the format the request named. Replies may leave in a different
//! order than requests arrived, the id ties them together.

use crate::transports::{FrameReader, FrameWriter, TcpConfig};
use crate::{Result, TransportError};
use actors::{Mailbox, Scheduler};
use bytes::Bytes;
use codec::Codec;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use types::{Error, Outcome};

/// Number of parts in a request frame
pub const REQUEST_PARTS: usize = 4;
/// Number of parts in a reply frame
pub const REPLY_PARTS: usize = 3;

/// Serves a mailbox to remote requesters
pub struct Replier {
    listener: TcpListener,
    config: TcpConfig,
}

impl Replier {
    pub async fn bind(addr: impl ToSocketAddrs, config: TcpConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TransportError::network_with_source("Failed to bind replier", e))?;
        if let Ok(local) = listener.local_addr() {
            info!(addr = %local, "Replier listening");
        }
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(TransportError::from)
    }

    /// Accept connections forever, each handled on its own task
    pub async fn serve(self, scheduler: Scheduler, mailbox: Mailbox) -> Result<()> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "Failed to accept connection");
                    continue;
                }
            };
            info!(peer = %peer, "Accepted requester");

            let scheduler = scheduler.clone();
            let mailbox = mailbox.clone();
            let config = self.config.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer, scheduler, mailbox, config).await {
                    warn!(peer = %peer, error = %e, category = e.category(), "Requester connection failed");
                }
            });
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    scheduler: Scheduler,
    mailbox: Mailbox,
    config: TcpConfig,
) -> Result<()> {
    stream
        .set_nodelay(true)
        .map_err(|e| TransportError::connection_with_source("Failed to set TCP_NODELAY", Some(peer), e))?;
    let (read_half, write_half) = stream.into_split();
    let mut reader = FrameReader::new(read_half, config.max_message_size).with_peer(peer);
    let mut writer = FrameWriter::new(write_half, config.max_message_size).with_peer(peer);

    // Replies are produced on scheduler workers; one task owns the socket
    let (replies, mut outgoing) = mpsc::unbounded_channel::<Vec<Bytes>>();
    let writer_task = tokio::spawn(async move {
        while let Some(reply) = outgoing.recv().await {
            if let Err(e) = writer.write_frame(&reply).await {
                warn!(peer = %peer, error = %e, "Failed to write reply");
                break;
            }
        }
    });

    let result = loop {
        match reader.read_frame().await {
            Ok(Some(request)) => dispatch(request, &scheduler, &mailbox, &replies),
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    // Outstanding replies still hold senders; the writer drains them first
    drop(replies);
    let _ = writer_task.await;
    info!(peer = %peer, "Requester disconnected");
    result
}

fn dispatch(
    request: Vec<Bytes>,
    scheduler: &Scheduler,
    mailbox: &Mailbox,
    replies: &mpsc::UnboundedSender<Vec<Bytes>>,
) {
    let id = match request.first() {
        Some(id) => id.clone(),
        None => {
            warn!("Dropping empty request frame");
            return;
        }
    };

    let (operation, codec, arguments) = match parse_request(&request) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Malformed request");
            let _ = replies.send(error_reply(id, &e));
            return;
        }
    };

    debug!(operation = %operation, format = codec.name(), "Dispatching request");
    let replies = replies.clone();
    mailbox
        .send(scheduler, &operation, arguments)
        .observe(move |outcome| {
            let _ = replies.send(encode_reply(id, codec, outcome));
        });
}

fn parse_request(request: &[Bytes]) -> std::result::Result<(String, &'static dyn Codec, types::List), Error> {
    if request.len() != REQUEST_PARTS {
        return Err(Error::new(format!(
            "expected {} request parts but {} were given",
            REQUEST_PARTS,
            request.len()
        )));
    }
    let operation = std::str::from_utf8(&request[1])
        .map_err(|_| Error::new("operation name is not valid UTF-8"))?
        .to_string();
    let format = std::str::from_utf8(&request[2])
        .map_err(|_| Error::new("format name is not valid UTF-8"))?;
    let codec = codec::require(format)?;
    let arguments = codec.decode(&request[3])?;
    let arguments = arguments
        .as_list()
        .cloned()
        .ok_or_else(|| Error::new(format!("arguments must be a List, not {}", arguments.type_name())))?;
    Ok((operation, codec, arguments))
}

fn encode_reply(id: Bytes, codec: &dyn Codec, outcome: Outcome) -> Vec<Bytes> {
    match outcome.into_result() {
        Ok(value) => match codec.encode(&value) {
            Ok(encoded) => vec![id, Bytes::from(encoded), Bytes::new()],
            Err(e) => error_reply(id, &Error::from(e)),
        },
        Err(error) => error_reply(id, &error),
    }
}

fn error_reply(id: Bytes, error: &Error) -> Vec<Bytes> {
    vec![id, Bytes::new(), Bytes::copy_from_slice(error.message().as_bytes())]
}

/// Split a reply frame into its id and outcome
pub(crate) fn decode_reply(
    codec: &dyn Codec,
    reply: &[Bytes],
) -> Result<std::result::Result<types::Value, Error>> {
    if reply.len() != REPLY_PARTS {
        return Err(TransportError::protocol(format!(
            "expected {} reply parts but {} were given",
            REPLY_PARTS,
            reply.len()
        )));
    }
    if reply[1].is_empty() {
        return Ok(Err(Error::new(String::from_utf8_lossy(&reply[2]).into_owned())));
    }
    Ok(Ok(codec.decode(&reply[1])?))
}
