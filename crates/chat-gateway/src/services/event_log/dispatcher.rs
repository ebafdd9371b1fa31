use flume::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn, Instrument, Span};

use super::{ChatLogEvent, EventPublisher};
use crate::config::EventLogConfig;
use crate::error::PublishError;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Max events held in memory before new ones are dropped
    pub queue_capacity: usize,

    /// Number of publishing workers
    pub worker_count: usize,

    /// Deadline for a single publish call
    pub publish_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10_000,
            worker_count: 2,
            publish_timeout: Duration::from_secs(3),
        }
    }
}

impl From<&EventLogConfig> for DispatcherConfig {
    fn from(config: &EventLogConfig) -> Self {
        Self {
            queue_capacity: config.queue_capacity,
            worker_count: config.worker_count,
            publish_timeout: config.publish_timeout(),
        }
    }
}

struct QueuedEvent {
    event: ChatLogEvent,
    /// Span of the request that produced the event
    span: Span,
}

/// Non-blocking front of the event log. Cheap to clone.
#[derive(Clone)]
pub struct EventDispatcher {
    sender: Sender<QueuedEvent>,
    /// Queued plus in-flight events
    pending: Arc<AtomicUsize>,
}

/// Owned by the server bootstrap; used to drain the queue on shutdown.
pub struct DispatcherHandle {
    pending: Arc<AtomicUsize>,
    workers: Vec<JoinHandle<()>>,
}

impl EventDispatcher {
    /// Start the background workers.
    pub fn spawn(
        publisher: Arc<dyn EventPublisher>,
        config: DispatcherConfig,
    ) -> (Self, DispatcherHandle) {
        let (sender, receiver) = bounded(config.queue_capacity.max(1));
        let pending = Arc::new(AtomicUsize::new(0));

        info!(
            "Initializing EventDispatcher: queue={}, workers={}, timeout={:?}",
            config.queue_capacity, config.worker_count, config.publish_timeout
        );

        let workers = (0..config.worker_count.max(1))
            .map(|worker_id| {
                let publisher = publisher.clone();
                let receiver = receiver.clone();
                let pending = pending.clone();
                let timeout = config.publish_timeout;

                tokio::spawn(async move {
                    Self::worker_loop(worker_id, publisher, receiver, pending, timeout).await;
                })
            })
            .collect();

        (
            Self {
                sender,
                pending: pending.clone(),
            },
            DispatcherHandle { pending, workers },
        )
    }

    /// Queue an event for publishing. Never waits: a full queue drops the event.
    pub fn enqueue(&self, event: ChatLogEvent) -> Result<(), PublishError> {
        self.pending.fetch_add(1, Ordering::SeqCst);

        let queued = QueuedEvent {
            event,
            span: Span::current(),
        };

        match self.sender.try_send(queued) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                match e {
                    TrySendError::Full(_) => Err(PublishError::QueueFull),
                    TrySendError::Disconnected(_) => Err(PublishError::QueueClosed),
                }
            }
        }
    }

    pub fn queue_len(&self) -> usize {
        self.sender.len()
    }

    async fn worker_loop(
        worker_id: usize,
        publisher: Arc<dyn EventPublisher>,
        receiver: Receiver<QueuedEvent>,
        pending: Arc<AtomicUsize>,
        timeout: Duration,
    ) {
        info!("Event log worker {} started", worker_id);

        while let Ok(QueuedEvent { event, span }) = receiver.recv_async().await {
            Self::publish_one(publisher.as_ref(), &event, timeout)
                .instrument(span)
                .await;
            pending.fetch_sub(1, Ordering::SeqCst);
        }

        info!("Event log worker {} shutting down (channel closed)", worker_id);
    }

    async fn publish_one(publisher: &dyn EventPublisher, event: &ChatLogEvent, timeout: Duration) {
        let outcome = match tokio::time::timeout(timeout, publisher.publish(event)).await {
            Ok(result) => result,
            Err(_) => Err(PublishError::Timeout(timeout.as_millis() as u64)),
        };

        match outcome {
            Ok(()) => debug!(session_id = %event.session_id, "Chat log published"),
            // No retry: emission is at-most-once.
            Err(e) => error!(
                user_id = %event.user_id,
                session_id = %event.session_id,
                error = %e,
                "Failed to publish chat log event"
            ),
        }
    }
}

impl DispatcherHandle {
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Wait until every queued event was attempted, up to `grace`.
    /// Returns `false` if events were still pending at the deadline.
    pub async fn drain(&self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;

        while self.pending() > 0 {
            if Instant::now() >= deadline {
                warn!("Event log drain timed out with {} events pending", self.pending());
                return false;
            }
            sleep(Duration::from_millis(20)).await;
        }

        true
    }

    /// Drain, then stop the workers.
    pub async fn shutdown(self, grace: Duration) {
        let drained = self.drain(grace).await;
        for worker in &self.workers {
            worker.abort();
        }
        info!("Event log dispatcher stopped (drained={})", drained);
    }
}
