//! Start/stop management of the tournament service's event subscriber.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::dispatch::Dispatcher;
use super::subscriber::Subscriber;
use crate::config::SubscriberConfig;

/// Owns at most one running [`Subscriber`].
///
/// The dispatcher passed in already holds the initialised store, so the
/// subscriber can only be started once persistence is ready.
#[derive(Debug)]
pub struct SubscriberLifecycle {
    config: SubscriberConfig,
    dispatcher: Arc<Dispatcher>,
    current: Mutex<Option<Subscriber>>,
}

impl SubscriberLifecycle {
    /// Creates a lifecycle with no subscriber running.
    #[must_use]
    pub fn new(config: SubscriberConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            config,
            dispatcher,
            current: Mutex::new(None),
        }
    }

    /// Starts the subscriber unless one is already running.
    pub async fn startup(&self) {
        let mut current = self.current.lock().await;
        if let Some(subscriber) = current.as_mut() {
            subscriber.start();
            return;
        }

        let mut subscriber =
            Subscriber::connect(self.config.clone(), Arc::clone(&self.dispatcher));
        subscriber.start();
        tracing::info!(upstream = subscriber.upstream(), "event subscriber launched");
        *current = Some(subscriber);
    }

    /// Stops the subscriber, if any, so that a later [`startup`] creates a
    /// fresh one.
    ///
    /// [`startup`]: SubscriberLifecycle::startup
    pub async fn shutdown(&self) {
        let subscriber = self.current.lock().await.take();
        if let Some(mut subscriber) = subscriber {
            subscriber.stop().await;
            tracing::info!("event subscriber shut down");
        }
    }

    /// Returns `true` if a subscriber is running.
    pub async fn is_running(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(Subscriber::is_running)
    }

    /// Returns `true` if the subscriber holds a live upstream connection.
    pub async fn is_receiving(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .is_some_and(Subscriber::is_connected)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::events::envelope::Topic;

    fn lifecycle() -> SubscriberLifecycle {
        let config = SubscriberConfig {
            upstream: "127.0.0.1:1".to_string(),
            topic_filter: Topic::any(),
            poll_timeout: Duration::from_millis(50),
            reconnect_min_delay: Duration::from_millis(10),
            reconnect_max_delay: Duration::from_millis(50),
            max_frame_bytes: 1024,
        };
        SubscriberLifecycle::new(config, Arc::new(Dispatcher::new()))
    }

    #[tokio::test]
    async fn startup_twice_keeps_one_subscriber() {
        let lifecycle = lifecycle();
        lifecycle.startup().await;
        lifecycle.startup().await;
        assert!(lifecycle.is_running().await);
        assert!(!lifecycle.is_receiving().await);
        lifecycle.shutdown().await;
        assert!(!lifecycle.is_running().await);
    }

    #[tokio::test]
    async fn restart_after_shutdown() {
        let lifecycle = lifecycle();
        lifecycle.startup().await;
        lifecycle.shutdown().await;
        lifecycle.shutdown().await;
        lifecycle.startup().await;
        assert!(lifecycle.is_running().await);
        lifecycle.shutdown().await;
    }
}
