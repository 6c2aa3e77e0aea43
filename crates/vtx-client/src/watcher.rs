//! Client-side worker wake watcher.
//!
//! Polls the edge API's wake probe on a fixed interval, starting immediately,
//! and publishes a [`WorkerStatus`] on a watch channel. Polling stops once the
//! worker is awake. A failed probe request publishes `Error` and polling
//! continues.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use vtx_models::{WakeStatus, WorkerStatus};

use crate::client::ApiClient;
use crate::error::ClientResult;

/// Anything that can answer a wake probe.
#[async_trait]
pub trait WakeSource: Send + Sync {
    async fn wake(&self) -> ClientResult<WakeStatus>;
}

#[async_trait]
impl WakeSource for ApiClient {
    async fn wake(&self) -> ClientResult<WakeStatus> {
        ApiClient::wake(self).await
    }
}

pub struct WakeWatcher {
    source: Arc<dyn WakeSource>,
    interval: Duration,
}

impl WakeWatcher {
    pub fn new(source: Arc<dyn WakeSource>, interval: Duration) -> Self {
        Self { source, interval }
    }

    /// Start polling in the background.
    pub fn spawn(self) -> (watch::Receiver<WorkerStatus>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(WorkerStatus::Waking);
        let handle = tokio::spawn(self.run(tx));
        (rx, handle)
    }

    /// Poll until the worker is awake or every receiver is gone.
    pub async fn run(self, tx: watch::Sender<WorkerStatus>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let status = match self.source.wake().await {
                Ok(probe) => WorkerStatus::from(probe),
                Err(e) => {
                    debug!("Wake probe failed: {}", e);
                    WorkerStatus::Error
                }
            };
            tx.send_replace(status);

            if status.is_awake() {
                info!("Worker is awake");
                break;
            }
            if tx.is_closed() {
                break;
            }
        }
    }
}

/// Wait until `rx` reports `Awake`. Returns false if the watcher stopped first.
pub async fn wait_for_awake(mut rx: watch::Receiver<WorkerStatus>) -> bool {
    rx.wait_for(|status| status.is_awake()).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays scripted probe results, recording when each was asked for.
    struct Scripted {
        replies: Mutex<VecDeque<ClientResult<WakeStatus>>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl Scripted {
        fn new(replies: Vec<ClientResult<WakeStatus>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl WakeSource for Scripted {
        async fn wake(&self) -> ClientResult<WakeStatus> {
            self.calls.lock().unwrap().push(Instant::now());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(WakeStatus::Asleep))
        }
    }

    fn fetch_failed() -> ClientResult<WakeStatus> {
        Err(ClientError::Api {
            status: 502,
            message: "bad gateway".into(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_awake_then_stops() {
        let source = Scripted::new(vec![
            Ok(WakeStatus::Asleep),
            Ok(WakeStatus::Asleep),
            Ok(WakeStatus::Awake),
        ]);
        let start = Instant::now();

        let (rx, handle) = WakeWatcher::new(source.clone(), Duration::from_secs(3)).spawn();
        assert!(wait_for_awake(rx.clone()).await);
        handle.await.unwrap();

        assert_eq!(*rx.borrow(), WorkerStatus::Awake);
        assert_eq!(source.call_count(), 3);

        let calls = source.calls.lock().unwrap().clone();
        assert_eq!(calls[0] - start, Duration::ZERO);
        assert_eq!(calls[2] - start, Duration::from_secs(6));

        // No further probes once awake
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_is_published_and_polling_continues() {
        let source = Scripted::new(vec![fetch_failed(), Ok(WakeStatus::Awake)]);
        let (mut rx, handle) = WakeWatcher::new(source.clone(), Duration::from_secs(3)).spawn();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), WorkerStatus::Error);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), WorkerStatus::Awake);

        handle.await.unwrap();
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_receivers_dropped() {
        let source = Scripted::new(vec![]);
        let (rx, handle) = WakeWatcher::new(source.clone(), Duration::from_secs(3)).spawn();
        drop(rx);

        handle.await.unwrap();
        assert_eq!(source.call_count(), 1);
    }
}
