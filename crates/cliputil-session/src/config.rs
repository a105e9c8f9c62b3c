use std::time::Duration;

/// Controls how a session acquires access and reports formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Give up retrying `open` after this long. Zero means a single attempt.
    pub open_timeout: Duration,
    /// Pause between `open` attempts while another process holds the clipboard.
    pub retry_interval: Duration,
    /// Map native format ids into the portable space when enumerating.
    pub convert_foreign_formats: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            open_timeout: Duration::from_secs(5),
            retry_interval: Duration::from_millis(50),
            convert_foreign_formats: false,
        }
    }
}
