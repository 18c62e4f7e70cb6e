use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix timestamp in whole seconds.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs()
}
