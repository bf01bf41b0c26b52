//! Per-subscriber forwarding loop for `NotifyUserChanges`.
//!
//! # Lifecycle
//!
//! ```text
//! Attached --run()--> Streaming --subscriber gone--> Closed(Disconnected)
//!                               \--channel closed--> Closed(Shutdown)
//! ```
//!
//! A handler counts as attached to the channel from construction until it is
//! dropped; only events published in that window can reach it.
//!
//! A handler only takes an event off the shared channel once it holds a
//! free slot on its subscriber's response stream and the subscriber is still
//! connected, so an event is never consumed on behalf of a subscriber that
//! can no longer receive it.

use tokio::sync::mpsc;
use tonic::Status;
use tracing::debug;
use tracing::info;
use tracing::trace;

use super::Attachment;
use super::MutationEvent;
use super::NotificationChannel;
use crate::proto::UserActionStream;
use crate::ACTIVE_SUBSCRIBERS_METRIC;

pub type ResponseSender = mpsc::Sender<std::result::Result<UserActionStream, Status>>;

/// Why a subscriber's stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The subscriber cancelled or its connection dropped
    Disconnected,
    /// The notification channel was closed by service shutdown
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Attached,
    Streaming,
    Closed(CloseReason),
}

/// Forwards events from the shared [`NotificationChannel`] to one subscriber.
pub struct NotificationStreamHandler {
    subscriber_id: u64,
    channel: NotificationChannel,
    state: SubscriberState,
    _attachment: Attachment,
}

impl NotificationStreamHandler {
    pub fn new(
        subscriber_id: u64,
        channel: NotificationChannel,
    ) -> Self {
        let attachment = channel.attach();
        Self {
            subscriber_id,
            channel,
            state: SubscriberState::Attached,
            _attachment: attachment,
        }
    }

    pub fn id(&self) -> u64 {
        self.subscriber_id
    }

    pub fn state(&self) -> SubscriberState {
        self.state
    }

    /// Streams events until the subscriber disconnects or the channel closes.
    ///
    /// Closing never sends a terminal message: the response stream simply
    /// ends once `response_sender` is dropped by the caller.
    pub async fn run(
        &mut self,
        response_sender: ResponseSender,
    ) -> CloseReason {
        let subscriber_id = self.subscriber_id;
        info!(subscriber_id, "Notification stream started");
        self.state = SubscriberState::Streaming;
        ACTIVE_SUBSCRIBERS_METRIC.inc();

        let reason = loop {
            if let Err(reason) = self.forward_next(&response_sender).await {
                break reason;
            }
        };

        ACTIVE_SUBSCRIBERS_METRIC.dec();
        self.state = SubscriberState::Closed(reason);
        info!(subscriber_id, ?reason, "Notification stream ended");
        reason
    }

    async fn forward_next(
        &self,
        response_sender: &ResponseSender,
    ) -> std::result::Result<(), CloseReason> {
        let permit = tokio::select! {
            biased;
            _ = self.channel.closed() => return Err(CloseReason::Shutdown),
            permit = response_sender.reserve() => permit.map_err(|_| CloseReason::Disconnected)?,
        };

        let event = tokio::select! {
            biased;
            _ = response_sender.closed() => return Err(CloseReason::Disconnected),
            event = self.channel.next() => event.ok_or(CloseReason::Shutdown)?,
        };

        trace!(
            subscriber_id = self.subscriber_id,
            subject = %event.subject,
            action = %event.action,
            "Forwarding notification"
        );
        permit.send(Ok(Self::convert_event_to_response(&event)));
        debug!(subscriber_id = self.subscriber_id, "Notification delivered");
        Ok(())
    }

    fn convert_event_to_response(event: &MutationEvent) -> UserActionStream {
        UserActionStream {
            action: event.to_string(),
        }
    }
}
