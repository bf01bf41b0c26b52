use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Milliseconds since the Unix epoch.
///
/// A clock set before the epoch yields 0.
pub(crate) fn get_now_as_u64_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_monotonic_enough() {
        let t1 = get_now_as_u64_millis();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let t2 = get_now_as_u64_millis();

        assert!(t1 > 1_600_000_000_000);
        assert!(t2 >= t1 + 5);
    }
}
