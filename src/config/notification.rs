use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Policy of the process-wide change-notification channel
///
/// The channel buffers up to `channel_capacity` events. A publish that finds
/// the buffer full is handed to a background task that waits at most
/// `publish_timeout_ms` for room and then drops the event.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotificationConfig {
    /// Number of events buffered between write paths and subscribers
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Longest a saturated publish may wait for room before the event is dropped
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,

    /// Per-subscriber gRPC response buffer
    #[serde(default = "default_response_buffer_size")]
    pub response_buffer_size: usize,

    /// Publish a `Retrieved` event for every successful Get
    #[serde(default = "default_notify_reads")]
    pub notify_reads: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            publish_timeout_ms: default_publish_timeout_ms(),
            response_buffer_size: default_response_buffer_size(),
            notify_reads: default_notify_reads(),
        }
    }
}

impl NotificationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.channel_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "notification.channel_capacity must be > 0".into(),
            )));
        }

        if self.publish_timeout_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "notification.publish_timeout_ms must be > 0".into(),
            )));
        }

        if self.response_buffer_size == 0 {
            return Err(Error::Config(ConfigError::Message(
                "notification.response_buffer_size must be > 0".into(),
            )));
        }

        Ok(())
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}

fn default_channel_capacity() -> usize {
    1024
}
fn default_publish_timeout_ms() -> u64 {
    5000
}
fn default_response_buffer_size() -> usize {
    16
}
fn default_notify_reads() -> bool {
    true
}
