use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in whole seconds.
///
/// Staleness decisions across the tracker are second-granular, so seconds are
/// the canonical unit everywhere a timestamp is stored or compared.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Seconds elapsed since `t`, saturating at zero for timestamps in the future.
pub fn age(t: u64) -> u64 {
    unix_now().saturating_sub(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_nonzero() {
        assert!(unix_now() > 0);
    }

    #[test]
    fn age_of_now_is_small() {
        assert!(age(unix_now()) <= 1);
    }

    #[test]
    fn age_saturates_for_future_timestamps() {
        assert_eq!(age(unix_now() + 1000), 0);
    }
}
