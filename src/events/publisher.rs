//! Broadcast publisher for the event feed.
//!
//! [`Publisher`] binds a TCP listener and fans every published frame out to
//! all connected subscribers. Subscribers are not tracked beyond their
//! connection: there is no handshake, acknowledgement or replay.
//!
//! Each connection reads from its own [`tokio::sync::broadcast`] receiver.
//! The ring buffer holds at least `high_water_mark` frames, rounded up to a
//! power of two by the channel. A subscriber that falls further behind loses
//! the oldest frames; the publish call itself never waits on the network.
//!
//! Delivery is at-most-once. Frames published while no subscriber is
//! connected, or before a subscriber's connection has been accepted, are
//! gone. The grace period after bind lets subscribers that are already
//! retrying connect before the first publish.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;

use super::domain_event::DomainEvent;
use super::envelope::{Topic, encode_frame};
use super::error::{BindError, PublishError};
use crate::config::PublisherConfig;

/// An encoded, newline-terminated frame shared by all connections.
type Frame = Arc<[u8]>;

const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Fire-and-forget event publisher bound to one address for its lifetime.
#[derive(Debug)]
pub struct Publisher {
    topic: Topic,
    local_addr: SocketAddr,
    sender: broadcast::Sender<Frame>,
    ready_at: Instant,
    closed: AtomicBool,
    shutdown: watch::Sender<bool>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl Publisher {
    /// Binds the broadcast listener and starts accepting subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] if the address is unavailable. The service must
    /// not start serving in that case.
    pub async fn bind(config: PublisherConfig) -> Result<Self, BindError> {
        let addr = config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| BindError { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| BindError { addr, source })?;

        let capacity = ring_capacity(config.high_water_mark);
        let (sender, _) = broadcast::channel(capacity);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let accept_task = tokio::spawn(accept_loop(listener, sender.clone(), shutdown_rx));

        tracing::info!(
            addr = %local_addr,
            topic = %config.topic,
            high_water_mark = config.high_water_mark,
            capacity,
            grace_ms = config.grace_period.as_millis(),
            "event publisher bound"
        );

        Ok(Self {
            topic: config.topic,
            local_addr,
            sender,
            ready_at: Instant::now() + config.grace_period,
            closed: AtomicBool::new(false),
            shutdown,
            accept_task: Mutex::new(Some(accept_task)),
        })
    }

    /// Returns the address the listener is actually bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the topic published frames are tagged with.
    #[must_use]
    pub const fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Returns the number of currently connected subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Returns `true` once [`Publisher::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Queues `event` for every connected subscriber.
    ///
    /// Waits out the remainder of the grace period on the first calls after
    /// bind, then returns as soon as the frame is queued. Returns the number
    /// of subscribers the frame was queued for; zero is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Closed`] after [`Publisher::close`], or
    /// [`PublishError::Encode`] if the event cannot be serialized.
    pub async fn publish(&self, event: &DomainEvent) -> Result<usize, PublishError> {
        if self.is_closed() {
            return Err(PublishError::Closed);
        }
        tokio::time::sleep_until(self.ready_at).await;

        let frame: Frame = encode_frame(&self.topic, event)?.into();
        let subscribers = self.sender.send(frame).unwrap_or(0);

        tracing::debug!(kind = event.kind(), subscribers, "event published");
        Ok(subscribers)
    }

    /// Announces a committed team registration.
    ///
    /// Failures are logged and swallowed: the team has already been stored
    /// and the caller's response must not depend on event delivery.
    pub async fn notify_team_registered(&self, team_id: &str, name: &str) {
        let event = DomainEvent::team_registered(team_id, name);
        match self.publish(&event).await {
            Ok(subscribers) => {
                tracing::info!(team_id, name, subscribers, "published TeamRegistered");
            }
            Err(e) => {
                tracing::error!(team_id, name, error = %e, "failed to publish TeamRegistered");
            }
        }
    }

    /// Stops accepting, disconnects every subscriber and waits for all
    /// connection tasks to finish. Safe to call more than once.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shutdown.send_replace(true);

        let task = self.accept_task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "publisher accept task failed");
            }
        }
        tracing::info!(addr = %self.local_addr, "event publisher closed");
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
    }
}

/// Per-subscriber ring size for a configured high-water mark.
///
/// `broadcast::channel` rejects zero and rounds up to a power of two, so the
/// effective bound is computed here and logged.
fn ring_capacity(high_water_mark: usize) -> usize {
    let floor = high_water_mark.max(1);
    floor.checked_next_power_of_two().unwrap_or(floor)
}

async fn accept_loop(
    listener: TcpListener,
    sender: broadcast::Sender<Frame>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let frames = sender.subscribe();
                    tracing::info!(
                        %peer,
                        subscribers = sender.receiver_count(),
                        "subscriber connected"
                    );
                    connections.spawn(serve_subscriber(stream, peer, frames, shutdown.clone()));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept subscriber");
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                }
            },
            Some(finished) = connections.join_next(), if !connections.is_empty() => {
                if let Err(e) = finished {
                    tracing::warn!(error = %e, "subscriber connection task failed");
                }
            }
        }
    }

    drop(listener);
    while let Some(finished) = connections.join_next().await {
        if let Err(e) = finished {
            tracing::warn!(error = %e, "subscriber connection task failed");
        }
    }
}

/// Forwards frames to one subscriber until it disconnects or the publisher
/// shuts down.
async fn serve_subscriber(
    stream: TcpStream,
    peer: SocketAddr,
    mut frames: broadcast::Receiver<Frame>,
    mut shutdown: watch::Receiver<bool>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(%peer, error = %e, "failed to set TCP_NODELAY");
    }
    let (mut reader, mut writer) = stream.into_split();
    // Subscribers never send; reading only detects a closed connection.
    let mut scratch = [0_u8; 64];

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            read = reader.read(&mut scratch) => match read {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            },
            frame = frames.recv() => match frame {
                Ok(frame) => {
                    let written = tokio::select! {
                        biased;
                        _ = shutdown.changed() => break,
                        written = writer.write_all(&frame) => written,
                    };
                    if let Err(e) = written {
                        tracing::debug!(%peer, error = %e, "subscriber write failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(dropped)) => {
                    tracing::warn!(%peer, dropped, "subscriber lagged; oldest frames dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    let _ = writer.shutdown().await;
    tracing::info!(%peer, "subscriber disconnected");
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use tokio::io::{AsyncBufReadExt, BufReader};

    use super::*;
    use crate::events::envelope::TopicEnvelope;

    fn local_config(grace_period: Duration) -> PublisherConfig {
        let Ok(topic) = Topic::new("teamServiceTopic") else {
            panic!("valid topic");
        };
        PublisherConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            topic,
            high_water_mark: 16,
            grace_period,
        }
    }

    async fn bind(grace_period: Duration) -> Publisher {
        let Ok(publisher) = Publisher::bind(local_config(grace_period)).await else {
            panic!("bind failed");
        };
        publisher
    }

    async fn wait_for_subscribers(publisher: &Publisher, n: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while publisher.subscriber_count() < n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "subscriber never connected");
    }

    #[test]
    fn ring_capacity_rounds_up_to_power_of_two() {
        assert_eq!(ring_capacity(0), 1);
        assert_eq!(ring_capacity(1), 1);
        assert_eq!(ring_capacity(5), 8);
        assert_eq!(ring_capacity(1000), 1024);
        assert_eq!(ring_capacity(1024), 1024);
    }

    #[tokio::test]
    async fn publish_without_subscribers_returns_zero() {
        let publisher = bind(Duration::ZERO).await;
        let sent = publisher
            .publish(&DomainEvent::team_registered("abc-123", "Helsinki FC"))
            .await;
        assert!(matches!(sent, Ok(0)));
    }

    #[tokio::test]
    async fn second_bind_on_same_address_fails() {
        let first = bind(Duration::ZERO).await;
        let mut config = local_config(Duration::ZERO);
        config.bind_addr = first.local_addr();

        let Err(err) = Publisher::bind(config).await else {
            panic!("second bind unexpectedly succeeded");
        };
        assert_eq!(err.addr, first.local_addr());
        assert_eq!(err.source.kind(), std::io::ErrorKind::AddrInUse);
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let publisher = bind(Duration::ZERO).await;
        publisher.close().await;
        publisher.close().await;
        assert!(publisher.is_closed());

        let sent = publisher
            .publish(&DomainEvent::team_registered("abc-123", "Helsinki FC"))
            .await;
        assert!(matches!(sent, Err(PublishError::Closed)));
    }

    #[tokio::test]
    async fn connected_subscriber_receives_frames_in_order() {
        let publisher = bind(Duration::ZERO).await;
        let Ok(stream) = TcpStream::connect(publisher.local_addr()).await else {
            panic!("connect failed");
        };
        wait_for_subscribers(&publisher, 1).await;

        for i in 0..3 {
            let event = DomainEvent::team_registered(&format!("team-{i}"), "FC");
            assert!(matches!(publisher.publish(&event).await, Ok(1)));
        }

        let mut lines = BufReader::new(stream).lines();
        for i in 0..3 {
            let Ok(Some(line)) = lines.next_line().await else {
                panic!("expected frame {i}");
            };
            let Ok(envelope) = TopicEnvelope::decode(line.as_bytes()) else {
                panic!("undecodable frame: {line}");
            };
            assert_eq!(envelope.topic().as_str(), "teamServiceTopic");
            assert_eq!(envelope.body().get_str("teamId"), Some(format!("team-{i}").as_str()));
        }
    }

    #[tokio::test]
    async fn close_disconnects_subscribers() {
        let publisher = bind(Duration::ZERO).await;
        let Ok(mut stream) = TcpStream::connect(publisher.local_addr()).await else {
            panic!("connect failed");
        };
        wait_for_subscribers(&publisher, 1).await;

        publisher.close().await;
        assert_eq!(publisher.subscriber_count(), 0);

        let mut buf = [0_u8; 8];
        let read = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf)).await;
        assert!(matches!(read, Ok(Ok(0))));
    }

    #[tokio::test]
    async fn disconnected_subscriber_is_released() {
        let publisher = bind(Duration::ZERO).await;
        let Ok(stream) = TcpStream::connect(publisher.local_addr()).await else {
            panic!("connect failed");
        };
        wait_for_subscribers(&publisher, 1).await;
        drop(stream);

        let released = tokio::time::timeout(Duration::from_secs(5), async {
            while publisher.subscriber_count() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(released.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn first_publish_waits_for_grace_period() {
        let publisher = bind(Duration::from_millis(500)).await;
        let started = Instant::now();
        let _ = publisher
            .publish(&DomainEvent::team_registered("abc-123", "Helsinki FC"))
            .await;
        assert!(started.elapsed() >= Duration::from_millis(500));
    }
}
