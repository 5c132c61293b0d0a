//! Publish side of publish/subscribe
//!
//! Subscribers connect and send one subscription frame listing topic
//! prefixes (an empty prefix matches every topic). Each published value is
//! encoded once into a `[topic, format, payload]` frame and queued to every
//! subscriber whose prefixes match.

use crate::transports::{encode_frame, FrameReader, FrameWriter, TcpConfig};
use crate::{Result, TransportError};
use actors::{Promise, Scheduler};
use bytes::Bytes;
use codec::Codec;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use types::{Error, Value};

struct Subscription {
    id: u64,
    peer: SocketAddr,
    topics: Vec<String>,
    frames: mpsc::UnboundedSender<Bytes>,
}

impl Subscription {
    fn matches(&self, topic: &str) -> bool {
        self.topics.iter().any(|prefix| topic.starts_with(prefix.as_str()))
    }
}

struct PublisherShared {
    codec: &'static dyn Codec,
    config: TcpConfig,
    subscriptions: Mutex<Vec<Subscription>>,
    next_id: AtomicU64,
}

impl PublisherShared {
    fn unsubscribe(&self, id: u64) {
        let mut subscriptions = self.subscriptions.lock();
        if let Some(index) = subscriptions.iter().position(|s| s.id == id) {
            let removed = subscriptions.swap_remove(index);
            info!(peer = %removed.peer, "Subscriber removed");
        }
    }
}

/// Fans published values out to TCP subscribers
pub struct Publisher {
    shared: Arc<PublisherShared>,
    local_addr: SocketAddr,
    accept_task: JoinHandle<()>,
}

impl Publisher {
    /// Bind and start accepting subscribers in the background
    pub async fn bind(
        addr: impl ToSocketAddrs,
        codec: &'static dyn Codec,
        config: TcpConfig,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TransportError::network_with_source("Failed to bind publisher", e))?;
        let local_addr = listener.local_addr().map_err(TransportError::from)?;
        info!(addr = %local_addr, format = codec.name(), "Publisher listening");

        let shared = Arc::new(PublisherShared {
            codec,
            config,
            subscriptions: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        });
        let accept_task = tokio::spawn(accept_subscribers(listener, Arc::downgrade(&shared)));
        Ok(Self {
            shared,
            local_addr,
            accept_task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscriptions.lock().len()
    }

    /// Queue `value` to every subscriber of `topic`
    ///
    /// The promise resolves immediately to the number of subscribers the
    /// value was queued for, or to an error if it could not be encoded.
    pub fn publish(&self, scheduler: &Scheduler, topic: &str, value: &Value) -> Promise {
        match self.fan_out(topic, value) {
            Ok(delivered) => Promise::resolved(scheduler.clone(), Value::from(delivered as u64)),
            Err(e) => Promise::resolved(scheduler.clone(), Error::from(e)),
        }
    }

    fn fan_out(&self, topic: &str, value: &Value) -> Result<usize> {
        let payload = self.shared.codec.encode(value)?;
        let frame = encode_frame(
            &[topic.as_bytes(), self.shared.codec.name().as_bytes(), &payload[..]],
            self.shared.config.max_message_size,
        )?;

        let mut subscriptions = self.shared.subscriptions.lock();
        let mut delivered = 0;
        // Writers that went away are pruned here as well as on disconnect
        subscriptions.retain(|subscription| {
            if !subscription.matches(topic) {
                return true;
            }
            match subscription.frames.send(frame.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        debug!(topic, delivered, bytes = frame.len(), "Published");
        Ok(delivered)
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.accept_task.abort();
        // Dropping the senders ends every connection's writer
        self.shared.subscriptions.lock().clear();
    }
}

async fn accept_subscribers(listener: TcpListener, shared: std::sync::Weak<PublisherShared>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "Failed to accept subscriber");
                continue;
            }
        };
        let Some(shared) = shared.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = handle_subscriber(stream, peer, shared).await {
                warn!(peer = %peer, error = %e, "Subscriber connection failed");
            }
        });
    }
}

async fn handle_subscriber(
    stream: TcpStream,
    peer: SocketAddr,
    shared: Arc<PublisherShared>,
) -> Result<()> {
    stream
        .set_nodelay(true)
        .map_err(|e| TransportError::connection_with_source("Failed to set TCP_NODELAY", Some(peer), e))?;
    let max_message_size = shared.config.max_message_size;
    let (read_half, write_half) = stream.into_split();
    let mut reader = FrameReader::new(read_half, max_message_size).with_peer(peer);
    let mut writer = FrameWriter::new(write_half, max_message_size).with_peer(peer);

    let topics = match reader.read_frame().await? {
        Some(parts) => parts
            .iter()
            .map(|part| {
                std::str::from_utf8(part)
                    .map(str::to_string)
                    .map_err(|_| TransportError::protocol("Topic is not valid UTF-8"))
            })
            .collect::<Result<Vec<_>>>()?,
        None => return Ok(()),
    };

    let id = shared.next_id.fetch_add(1, Ordering::Relaxed);
    let (frames, mut queued) = mpsc::unbounded_channel();
    info!(peer = %peer, topics = ?topics, "Subscriber registered");
    shared.subscriptions.lock().push(Subscription {
        id,
        peer,
        topics,
        frames,
    });

    // Subscribers send nothing after subscribing; EOF means they left
    let watcher = {
        let shared = Arc::downgrade(&shared);
        tokio::spawn(async move {
            let _ = reader.read_frame().await;
            if let Some(shared) = shared.upgrade() {
                shared.unsubscribe(id);
            }
        })
    };
    drop(shared);

    let result = async {
        while let Some(frame) = queued.recv().await {
            writer.write_encoded(&frame).await?;
        }
        writer.shutdown().await
    }
    .await;
    watcher.abort();
    result
}
