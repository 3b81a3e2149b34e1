//! Long-lived subscriber to an upstream event publisher.
//!
//! The receive loop runs on its own tokio task and owns the TCP connection.
//! It connects lazily, reconnects with exponential backoff when the
//! upstream is unreachable or goes away, and only exits when asked to stop.
//! Every read is bounded by the configured poll timeout so a stop request is
//! noticed within one interval even on an idle connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::dispatch::Dispatcher;
use super::envelope::TopicEnvelope;
use super::error::{ConnectError, DecodeError};
use crate::config::SubscriberConfig;

/// Handle to the receive loop for one upstream publisher.
///
/// Dropping a running subscriber drops its stop sender, which the loop
/// observes as a stop request on its next poll.
#[derive(Debug)]
pub struct Subscriber {
    config: SubscriberConfig,
    dispatcher: Arc<Dispatcher>,
    connected: Arc<AtomicBool>,
    running: Option<Running>,
}

#[derive(Debug)]
struct Running {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Subscriber {
    /// Prepares a subscriber for `config.upstream`.
    ///
    /// No connection is made here; the receive loop connects once
    /// [`Subscriber::start`] runs, so an unreachable upstream never blocks
    /// the caller.
    #[must_use]
    pub fn connect(config: SubscriberConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            config,
            dispatcher,
            connected: Arc::new(AtomicBool::new(false)),
            running: None,
        }
    }

    /// Upstream address this subscriber reads from.
    #[must_use]
    pub fn upstream(&self) -> &str {
        &self.config.upstream
    }

    /// Returns `true` while the receive loop holds a live connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Returns `true` if the receive loop has been started and not stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.task.is_finished())
    }

    /// Spawns the receive loop. Does nothing if it is already running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let (stop, shutdown) = watch::channel(false);
        let receive_loop = ReceiveLoop {
            config: self.config.clone(),
            dispatcher: Arc::clone(&self.dispatcher),
            connected: Arc::clone(&self.connected),
            shutdown,
        };
        let task = tokio::spawn(receive_loop.run());
        self.running = Some(Running { stop, task });
    }

    /// Signals the receive loop and waits for it to exit, releasing the
    /// connection. An event being dispatched is finished first.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        running.stop.send_replace(true);
        if let Err(e) = running.task.await {
            tracing::warn!(error = %e, "event subscriber task failed");
        }
        self.connected.store(false, Ordering::Release);
    }
}

struct ReceiveLoop {
    config: SubscriberConfig,
    dispatcher: Arc<Dispatcher>,
    connected: Arc<AtomicBool>,
    shutdown: watch::Receiver<bool>,
}

impl ReceiveLoop {
    async fn run(mut self) {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.config.reconnect_min_delay)
            .with_max_delay(self.config.reconnect_max_delay)
            .with_max_times(usize::MAX)
            .with_jitter();
        let mut delays = backoff.build();

        tracing::info!(
            upstream = %self.config.upstream,
            topic = %self.config.topic_filter,
            "event subscriber started"
        );

        while !self.stop_requested() {
            let attempt = tokio::select! {
                biased;
                _ = self.shutdown.changed() => break,
                attempt = connect(&self.config.upstream) => attempt,
            };

            match attempt {
                Ok(stream) => {
                    delays = backoff.build();
                    self.connected.store(true, Ordering::Release);
                    tracing::info!(upstream = %self.config.upstream, "connected to event publisher");

                    self.receive(stream).await;

                    self.connected.store(false, Ordering::Release);
                    if self.stop_requested() {
                        break;
                    }
                    tracing::warn!(upstream = %self.config.upstream, "event publisher went away; reconnecting");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "event publisher unreachable; retrying");
                }
            }

            let delay = delays.next().unwrap_or(self.config.reconnect_max_delay);
            tracing::debug!(backoff_ms = delay.as_millis(), "waiting before reconnect");
            if !self.pause(delay).await {
                break;
            }
        }

        self.connected.store(false, Ordering::Release);
        tracing::info!(upstream = %self.config.upstream, "event subscriber stopped");
    }

    /// A dropped sender counts as a stop request.
    fn stop_requested(&self) -> bool {
        *self.shutdown.borrow() || self.shutdown.has_changed().is_err()
    }

    /// Sleeps for `delay` unless stopped first. Returns `false` on stop.
    async fn pause(&mut self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.shutdown.changed() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }

    /// Reads frames until the connection ends or a stop is requested.
    async fn receive(&mut self, stream: TcpStream) {
        let max = self.config.max_frame_bytes;
        let mut reader = BufReader::new(stream);
        let mut frame = Vec::with_capacity(max.min(4096));
        // Set while skipping the rest of an oversized frame.
        let mut discarding = false;

        loop {
            if self.stop_requested() {
                return;
            }

            // Bytes read before a timeout stay in `frame`; the next call
            // continues the same line.
            let budget = u64::try_from(max.saturating_add(1).saturating_sub(frame.len()))
                .unwrap_or(u64::MAX);
            let read = tokio::time::timeout(
                self.config.poll_timeout,
                (&mut reader).take(budget).read_until(b'\n', &mut frame),
            )
            .await;

            let n = match read {
                Err(_elapsed) => continue,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "event stream read failed");
                    return;
                }
                Ok(Ok(n)) => n,
            };

            if frame.ends_with(b"\n") {
                if discarding {
                    discarding = false;
                } else {
                    self.on_frame(&frame).await;
                }
                frame.clear();
            } else if frame.len() > max {
                if !discarding {
                    let error = DecodeError::FrameTooLarge {
                        len: frame.len(),
                        max,
                    };
                    tracing::warn!(%error, "oversized frame discarded");
                    discarding = true;
                }
                frame.clear();
            } else if n == 0 {
                return;
            }
        }
    }

    async fn on_frame(&self, frame: &[u8]) {
        if !self.config.topic_filter.matches(frame) {
            tracing::trace!(len = frame.len(), "frame for another topic ignored");
            return;
        }

        match TopicEnvelope::decode(frame) {
            Ok(envelope) => {
                let outcome = self.dispatcher.dispatch(envelope.body()).await;
                tracing::debug!(kind = envelope.body().kind(), ?outcome, "event dispatched");
            }
            Err(e) => {
                tracing::warn!(error = %e, len = frame.len(), "undecodable frame skipped");
            }
        }
    }
}

async fn connect(upstream: &str) -> Result<TcpStream, ConnectError> {
    TcpStream::connect(upstream)
        .await
        .map_err(|source| ConnectError {
            upstream: upstream.to_string(),
            source,
        })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use async_trait::async_trait;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    use super::*;
    use crate::events::dispatch::EventHandler;
    use crate::events::domain_event::{DomainEvent, TEAM_REGISTERED};
    use crate::events::envelope::Topic;
    use crate::events::error::DispatchError;

    #[derive(Debug, Default)]
    struct Recording {
        events: Mutex<Vec<DomainEvent>>,
    }

    #[async_trait]
    impl EventHandler for Recording {
        async fn handle(&self, event: &DomainEvent) -> Result<(), DispatchError> {
            self.events.lock().await.push(event.clone());
            Ok(())
        }
    }

    fn config(upstream: String) -> SubscriberConfig {
        let Ok(topic_filter) = Topic::new("teamServiceTopic") else {
            panic!("valid topic");
        };
        SubscriberConfig {
            upstream,
            topic_filter,
            poll_timeout: Duration::from_millis(50),
            reconnect_min_delay: Duration::from_millis(10),
            reconnect_max_delay: Duration::from_millis(100),
            max_frame_bytes: 256,
        }
    }

    fn recording_dispatcher() -> (Arc<Dispatcher>, Arc<Recording>) {
        let recording = Arc::new(Recording::default());
        let handler: Arc<dyn EventHandler> = Arc::clone(&recording) as Arc<dyn EventHandler>;
        let dispatcher = Dispatcher::new().with_handler(TEAM_REGISTERED, handler);
        (Arc::new(dispatcher), recording)
    }

    async fn wait_for_events(recording: &Recording, n: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while recording.events.lock().await.len() < n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "expected {n} events");
    }

    #[tokio::test]
    async fn filters_and_skips_bad_frames_without_stopping() {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        let (dispatcher, recording) = recording_dispatcher();
        let mut subscriber = Subscriber::connect(config(addr.to_string()), dispatcher);
        subscriber.start();

        let Ok((mut upstream, _)) = listener.accept().await else {
            panic!("accept failed");
        };
        let oversized = format!(
            "teamServiceTopic {{\"event\":\"TeamRegistered\",\"teamId\":\"big\",\"name\":\"{}\"}}\n",
            "x".repeat(512)
        );
        let frames = [
            "otherTopic {\"event\":\"TeamRegistered\",\"teamId\":\"a\",\"name\":\"A\"}\n".to_string(),
            "teamServiceTopic not-json\n".to_string(),
            oversized,
            "teamServiceTopic {\"event\":\"TeamRegistered\",\"teamId\":\"b\",\"name\":\"B\"}\n".to_string(),
        ];
        for frame in &frames {
            assert!(upstream.write_all(frame.as_bytes()).await.is_ok());
        }

        wait_for_events(&recording, 1).await;
        assert!(subscriber.is_connected());
        {
            let events = recording.events.lock().await;
            assert_eq!(events.len(), 1);
            let Some(event) = events.first() else {
                panic!("no event");
            };
            assert_eq!(event.get_str("teamId"), Some("b"));
        }

        subscriber.stop().await;
        assert!(!subscriber.is_connected());
        assert!(!subscriber.is_running());
    }

    #[tokio::test]
    async fn frame_split_across_polls_is_reassembled() {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        let (dispatcher, recording) = recording_dispatcher();
        let mut subscriber = Subscriber::connect(config(addr.to_string()), dispatcher);
        subscriber.start();

        let Ok((mut upstream, _)) = listener.accept().await else {
            panic!("accept failed");
        };
        assert!(upstream.write_all(b"teamServiceTopic {\"event\":\"TeamRe").await.is_ok());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(
            upstream
                .write_all(b"gistered\",\"teamId\":\"c\",\"name\":\"C\"}\n")
                .await
                .is_ok()
        );

        wait_for_events(&recording, 1).await;
        subscriber.stop().await;
    }

    #[tokio::test]
    async fn stop_is_prompt_while_upstream_is_unreachable() {
        // Bind then drop to get a port nobody listens on.
        let addr = {
            let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
                panic!("bind failed");
            };
            let Ok(addr) = listener.local_addr() else {
                panic!("no local addr");
            };
            addr
        };
        let (dispatcher, _) = recording_dispatcher();
        let mut subscriber = Subscriber::connect(config(addr.to_string()), dispatcher);
        subscriber.start();
        subscriber.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(subscriber.is_running());
        assert!(!subscriber.is_connected());

        let stopped = tokio::time::timeout(Duration::from_secs(2), subscriber.stop()).await;
        assert!(stopped.is_ok());
        assert!(!subscriber.is_running());
    }

    #[tokio::test]
    async fn stop_without_start_is_a_no_op() {
        let (dispatcher, _) = recording_dispatcher();
        let mut subscriber = Subscriber::connect(config("127.0.0.1:1".to_string()), dispatcher);
        subscriber.stop().await;
        assert!(!subscriber.is_running());
    }
}
