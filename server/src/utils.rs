use rand::Rng;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Get current server wall clock in milliseconds
pub fn server_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

// Generate an opaque session identifier, unique per connection
pub fn generate_session_id() -> String {
    format!("{:016x}", rand::thread_rng().gen::<u64>())
}
