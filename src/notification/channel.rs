use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::MutationEvent;
use crate::NotificationConfig;
use crate::NOTIFICATION_PUBLISH_METRIC;

/// What happened to a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Buffered immediately, in publish order
    Enqueued,
    /// Buffer was full; a background task waits for room up to the publish
    /// timeout and drops the event if none frees up
    Deferred,
    /// No subscriber is attached, or the channel is closed
    Dropped,
}

impl PublishOutcome {
    fn label(&self) -> &'static str {
        match self {
            PublishOutcome::Enqueued => "enqueued",
            PublishOutcome::Deferred => "deferred",
            PublishOutcome::Dropped => "dropped",
        }
    }
}

/// Bounded multi-producer, multi-consumer queue of [`MutationEvent`]s.
///
/// Cloning yields another handle to the same queue. Consumers share one
/// receiver, so each event is handed to exactly one caller of [`next`].
///
/// The channel keeps no history. Events published while no subscriber is
/// [`attach`]ed are dropped, and whatever is still buffered when the last
/// subscriber detaches is discarded.
///
/// [`next`]: NotificationChannel::next
/// [`attach`]: NotificationChannel::attach
#[derive(Clone, Debug)]
pub struct NotificationChannel {
    sender: mpsc::Sender<MutationEvent>,
    receiver: Arc<Mutex<mpsc::Receiver<MutationEvent>>>,
    subscribers: Arc<AtomicUsize>,
    shutdown: CancellationToken,
    publish_timeout: Duration,
}

/// Keeps a subscriber counted as attached until dropped.
#[derive(Debug)]
pub struct Attachment {
    channel: NotificationChannel,
}

impl Drop for Attachment {
    fn drop(&mut self) {
        if self.channel.subscribers.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.channel.discard_unclaimed();
        }
    }
}

impl NotificationChannel {
    pub fn new(config: &NotificationConfig) -> Self {
        Self::with_capacity(config.channel_capacity, config.publish_timeout())
    }

    /// `capacity` must be non-zero.
    pub fn with_capacity(
        capacity: usize,
        publish_timeout: Duration,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            subscribers: Arc::new(AtomicUsize::new(0)),
            shutdown: CancellationToken::new(),
            publish_timeout,
        }
    }

    /// Registers a subscriber. Events published from now on are buffered
    /// for delivery until the returned [`Attachment`] is dropped.
    pub fn attach(&self) -> Attachment {
        let attached = self.subscribers.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(attached, "Subscriber attached");
        Attachment {
            channel: self.clone(),
        }
    }

    /// Number of currently attached subscribers.
    pub fn subscribers(&self) -> usize {
        self.subscribers.load(Ordering::Acquire)
    }

    /// Publishes an event without ever blocking or failing the caller.
    ///
    /// Without an attached subscriber the event is dropped. Events that fit
    /// in the buffer are enqueued in call order. When the buffer is full the
    /// event is handed to a background task, so a deferred event may be
    /// observed after events published later.
    pub fn publish(
        &self,
        event: MutationEvent,
    ) -> PublishOutcome {
        let outcome = if self.shutdown.is_cancelled() {
            debug!(subject = %event.subject, action = %event.action, "Channel closed, event dropped");
            PublishOutcome::Dropped
        } else if self.subscribers() == 0 {
            trace!(subject = %event.subject, action = %event.action, "No subscriber attached, event dropped");
            PublishOutcome::Dropped
        } else {
            match self.sender.try_send(event) {
                Ok(()) => PublishOutcome::Enqueued,
                Err(TrySendError::Full(event)) => self.defer(event),
                Err(TrySendError::Closed(event)) => {
                    debug!(subject = %event.subject, "Receiver gone, event dropped");
                    PublishOutcome::Dropped
                }
            }
        };

        trace!(?outcome, "Notification published");
        NOTIFICATION_PUBLISH_METRIC
            .with_label_values(&[outcome.label()])
            .inc();
        outcome
    }

    fn defer(
        &self,
        event: MutationEvent,
    ) -> PublishOutcome {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(subject = %event.subject, "No runtime to wait for channel room, event dropped");
            return PublishOutcome::Dropped;
        };

        warn!(
            subject = %event.subject,
            action = %event.action,
            timeout_ms = self.publish_timeout.as_millis() as u64,
            "Notification channel saturated, waiting for room"
        );

        let channel = self.clone();
        runtime.spawn(async move {
            tokio::select! {
                biased;
                _ = channel.shutdown.cancelled() => {
                    debug!("Channel closed while waiting for room, event dropped");
                    record_late_outcome("dropped_shutdown");
                }
                result = channel.sender.send_timeout(event, channel.publish_timeout) => match result {
                    Ok(()) if channel.subscribers() == 0 => {
                        channel.discard_unclaimed();
                        record_late_outcome("dropped_unclaimed");
                    }
                    Ok(()) => record_late_outcome("delivered_late"),
                    Err(SendTimeoutError::Timeout(event)) => {
                        warn!(
                            subject = %event.subject,
                            action = %event.action,
                            "No room freed within publish timeout, event dropped"
                        );
                        record_late_outcome("dropped_timeout");
                    }
                    Err(SendTimeoutError::Closed(_)) => record_late_outcome("dropped_shutdown"),
                },
            }
        });

        PublishOutcome::Deferred
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the channel is closed. Cancel-safe: dropping the
    /// returned future never loses an event.
    pub async fn next(&self) -> Option<MutationEvent> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => None,
            event = async { self.receiver.lock().await.recv().await } => event,
        }
    }

    /// Closes the channel. Idempotent.
    ///
    /// Pending events are discarded; publishers and consumers observe the
    /// closure immediately.
    pub fn close(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown.cancel();

        let discarded = match self.receiver.try_lock() {
            Ok(mut receiver) => {
                receiver.close();
                let mut discarded = 0usize;
                while receiver.try_recv().is_ok() {
                    discarded += 1;
                }
                discarded
            }
            // A consumer still holds the receiver; it returns `None` on its next poll
            Err(_) => self.pending(),
        };
        info!(discarded, "Notification channel closed");
    }

    /// Empties the buffer while no subscriber is attached.
    fn discard_unclaimed(&self) {
        // Lock held: a consumer is still draining
        let Ok(mut receiver) = self.receiver.try_lock() else {
            return;
        };
        let mut discarded = 0usize;
        while self.subscribers() == 0 && receiver.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!(discarded, "Last subscriber detached, unclaimed events discarded");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        self.shutdown.cancelled().await
    }

    /// Number of buffered events not yet taken by a consumer.
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}

fn record_late_outcome(label: &str) {
    NOTIFICATION_PUBLISH_METRIC.with_label_values(&[label]).inc();
}
