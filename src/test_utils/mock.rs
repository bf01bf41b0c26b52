use std::sync::Arc;
use std::time::Duration;

use super::sample_profile;
use crate::MockUserStore;
use crate::NotificationChannel;
use crate::NotificationConfig;
use crate::RecordKey;
use crate::UserManagementService;
use crate::UserRecord;

pub const TEST_CHANNEL_CAPACITY: usize = 16;

pub fn sample_record(email: &str) -> UserRecord {
    UserRecord {
        key: RecordKey::generate(),
        profile: sample_profile(email),
        created_at_ms: 1_700_000_000_000,
        updated_at_ms: 1_700_000_000_000,
    }
}

pub fn test_channel() -> NotificationChannel {
    NotificationChannel::with_capacity(TEST_CHANNEL_CAPACITY, Duration::from_millis(100))
}

/// Service over a mocked store, sharing `channel` with the caller.
pub fn mock_service(
    store: MockUserStore,
    channel: NotificationChannel,
) -> UserManagementService<MockUserStore> {
    UserManagementService::new(Arc::new(store), channel, NotificationConfig::default())
}
