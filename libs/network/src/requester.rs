//! Request/reply client side
//!
//! A [`Requester`] is a [`MailboxInterface`] whose operations run in a
//! remote [`Replier`](crate::Replier). Sending never blocks: the request
//! is queued for the connection's writer task and the returned promise is
//! resolved by the reader task when the matching reply arrives.

use crate::replier::decode_reply;
use crate::transports::{tcp, FrameReader, FrameWriter, TcpConfig};
use crate::{Result, TransportError};
use actors::{Mailbox, MailboxInterface, Promise, Scheduler};
use bytes::Bytes;
use codec::Codec;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::ToSocketAddrs;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use types::{Error, List, Value};

/// Requests awaiting a reply
#[derive(Default)]
struct Pending {
    promises: HashMap<u64, Promise>,
    closed: bool,
}

impl Pending {
    /// Fail everything outstanding and refuse new requests
    fn close(&mut self) {
        self.closed = true;
        let failed = self.promises.len();
        for (_, promise) in self.promises.drain() {
            promise.set_result(Error::new("connection closed"));
        }
        if failed > 0 {
            debug!(failed, "Failed pending requests on close");
        }
    }
}

struct RequesterInner {
    peer: SocketAddr,
    codec: &'static dyn Codec,
    outgoing: mpsc::UnboundedSender<Vec<Bytes>>,
    pending: Arc<Mutex<Pending>>,
    next_id: AtomicU64,
}

/// Remote mailbox over one TCP connection
#[derive(Clone)]
pub struct Requester {
    inner: Arc<RequesterInner>,
}

impl Requester {
    /// Connect to a replier; arguments and replies use `codec`
    pub async fn connect(
        addr: impl ToSocketAddrs,
        codec: &'static dyn Codec,
        config: TcpConfig,
    ) -> Result<Self> {
        let stream = tcp::connect(addr, &config).await?;
        let peer = stream.peer_addr().map_err(TransportError::from)?;
        let (read_half, write_half) = stream.into_split();

        let pending = Arc::new(Mutex::new(Pending::default()));
        let (outgoing, requests) = mpsc::unbounded_channel();

        tokio::spawn(write_requests(
            FrameWriter::new(write_half, config.max_message_size).with_peer(peer),
            requests,
            pending.clone(),
        ));
        tokio::spawn(read_replies(
            FrameReader::new(read_half, config.max_message_size).with_peer(peer),
            codec,
            pending.clone(),
        ));

        info!(peer = %peer, format = codec.name(), "Requester connected");
        Ok(Self {
            inner: Arc::new(RequesterInner {
                peer,
                codec,
                outgoing,
                pending,
                next_id: AtomicU64::new(0),
            }),
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.inner.peer
    }

    /// Requests sent but not yet answered
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().promises.len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.pending.lock().closed
    }

    /// This requester as an ordinary mailbox
    pub fn mailbox(&self) -> Mailbox {
        Mailbox::from_interface(self.clone())
    }
}

impl MailboxInterface for Requester {
    fn send(&self, scheduler: &Scheduler, name: &str, arguments: List) -> Promise {
        let encoded = match self.inner.codec.encode(&Value::List(arguments)) {
            Ok(encoded) => encoded,
            Err(e) => return Promise::resolved(scheduler.clone(), Error::from(e)),
        };

        let promise = Promise::new(scheduler.clone());
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut pending = self.inner.pending.lock();
            if pending.closed {
                promise.set_result(Error::new("connection closed"));
                return promise;
            }
            pending.promises.insert(id, promise.clone());
        }

        let request = vec![
            Bytes::copy_from_slice(&id.to_be_bytes()),
            Bytes::copy_from_slice(name.as_bytes()),
            Bytes::from_static(self.inner.codec.name().as_bytes()),
            Bytes::from(encoded),
        ];
        if self.inner.outgoing.send(request).is_err() {
            self.inner.pending.lock().promises.remove(&id);
            promise.set_result(Error::new("connection closed"));
        }
        promise
    }
}

async fn write_requests(
    mut writer: FrameWriter<OwnedWriteHalf>,
    mut requests: mpsc::UnboundedReceiver<Vec<Bytes>>,
    pending: Arc<Mutex<Pending>>,
) {
    while let Some(request) = requests.recv().await {
        if let Err(e) = writer.write_frame(&request).await {
            warn!(error = %e, "Failed to send request");
            // Oversized requests only fail themselves
            if matches!(e, TransportError::Protocol { .. }) {
                if let Some(promise) = request_id(&request).and_then(|id| pending.lock().promises.remove(&id)) {
                    promise.set_result(Error::from(e));
                }
                continue;
            }
            pending.lock().close();
            return;
        }
    }
    // Every Requester handle is gone; closing the write side ends the session
    let _ = writer.shutdown().await;
}

async fn read_replies(
    mut reader: FrameReader<OwnedReadHalf>,
    codec: &'static dyn Codec,
    pending: Arc<Mutex<Pending>>,
) {
    loop {
        match reader.read_frame().await {
            Ok(Some(reply)) => {
                let Some(id) = request_id(&reply) else {
                    warn!(parts = reply.len(), "Reply without a usable id");
                    continue;
                };
                let Some(promise) = pending.lock().promises.remove(&id) else {
                    debug!(id, "Reply for an unknown request");
                    continue;
                };
                match decode_reply(codec, &reply) {
                    Ok(outcome) => promise.set_result(outcome),
                    Err(e) => promise.set_result(Error::from(e)),
                };
            }
            Ok(None) => {
                info!("Replier closed the connection");
                break;
            }
            Err(e) => {
                warn!(error = %e, category = e.category(), "Failed to read reply");
                break;
            }
        }
    }
    pending.lock().close();
}

fn request_id(frame: &[Bytes]) -> Option<u64> {
    let id: [u8; 8] = frame.first()?.as_ref().try_into().ok()?;
    Some(u64::from_be_bytes(id))
}
