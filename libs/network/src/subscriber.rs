//! Subscribe side of publish/subscribe

use crate::transports::{tcp, FrameReader, FrameWriter, TcpConfig};
use crate::{Result, TransportError};
use actors::{Access, ActorId, DispatchQueue, Promise, Scheduler};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::ToSocketAddrs;
use tracing::{debug, info, warn};
use types::{Error, Value};

/// A connected, subscribed publisher feed
pub struct Subscriber {
    reader: FrameReader<OwnedReadHalf>,
    // Held open until the subscriber goes away; dropping it signals the publisher
    writer: FrameWriter<OwnedWriteHalf>,
    peer: SocketAddr,
    topics: Vec<String>,
}

impl Subscriber {
    /// Connect and subscribe to every topic starting with one of `topics`
    ///
    /// An empty prefix subscribes to everything.
    pub async fn connect<T: AsRef<str>>(
        addr: impl ToSocketAddrs,
        topics: &[T],
        config: TcpConfig,
    ) -> Result<Self> {
        let stream = tcp::connect(addr, &config).await?;
        let peer = stream.peer_addr().map_err(TransportError::from)?;
        let (read_half, write_half) = stream.into_split();
        let reader = FrameReader::new(read_half, config.max_message_size).with_peer(peer);
        let mut writer = FrameWriter::new(write_half, config.max_message_size).with_peer(peer);

        let topics: Vec<String> = topics.iter().map(|t| t.as_ref().to_string()).collect();
        let subscription: Vec<&[u8]> = topics.iter().map(|t| t.as_bytes()).collect();
        writer.write_frame(&subscription).await?;
        info!(peer = %peer, topics = ?topics, "Subscribed");

        Ok(Self {
            reader,
            writer,
            peer,
            topics,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    /// Deliver every published value to `callback` on `scheduler`
    ///
    /// Callbacks run one at a time in publication order. The returned
    /// promise resolves to `Null` when the publisher closes the feed, or
    /// to an error if the connection fails. Must be called from within a
    /// Tokio runtime.
    pub fn listen<F>(self, scheduler: &Scheduler, callback: F) -> Promise
    where
        F: Fn(String, Value) + Send + Sync + 'static,
    {
        let finished = Promise::new(scheduler.clone());
        let done = finished.clone();
        let scheduler = scheduler.clone();
        let callback = Arc::new(callback);
        let deliveries = Arc::new(DispatchQueue::new(ActorId::new()));

        let Subscriber {
            mut reader,
            writer,
            peer,
            ..
        } = self;
        tokio::spawn(async move {
            let _writer = writer;
            loop {
                match reader.read_frame().await {
                    Ok(Some(message)) => match decode_message(&message) {
                        Ok((topic, value)) => {
                            debug!(peer = %peer, topic = %topic, "Received publication");
                            let callback = callback.clone();
                            deliveries.submit(&scheduler, Access::Writer, move || {
                                callback(topic, value)
                            });
                        }
                        Err(e) => warn!(peer = %peer, error = %e, "Dropping malformed publication"),
                    },
                    Ok(None) => {
                        info!(peer = %peer, "Publisher closed the feed");
                        done.set_result(Value::Null);
                        return;
                    }
                    Err(e) => {
                        warn!(peer = %peer, error = %e, "Subscription failed");
                        done.set_result(Error::from(e));
                        return;
                    }
                }
            }
        });
        finished
    }
}

fn decode_message(message: &[Bytes]) -> std::result::Result<(String, Value), Error> {
    let [topic, format, payload] = message else {
        return Err(Error::new(format!(
            "expected 3 publication parts but {} were given",
            message.len()
        )));
    };
    let topic = std::str::from_utf8(topic)
        .map_err(|_| Error::new("topic is not valid UTF-8"))?
        .to_string();
    let format = std::str::from_utf8(format).map_err(|_| Error::new("format name is not valid UTF-8"))?;
    let value = codec::require(format)?.decode(payload)?;
    Ok((topic, value))
}
