use std::fmt;
use std::io;

use cliputil_platform::PlatformError;
use cliputil_session::{CodecError, SessionError};

// Exit code constants; sysexits-style where one applies.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const BACKEND_UNAVAILABLE: i32 = 3;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::InvalidData => DATA_INVALID,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn platform_error(context: &str, err: PlatformError) -> CliError {
    match err {
        PlatformError::Unsupported { .. } => {
            CliError::new(BACKEND_UNAVAILABLE, format!("{context}: {err}"))
        }
        PlatformError::Os { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::AccessDenied { .. } => {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        SessionError::Timeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
    }
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    match err {
        CodecError::InvalidRadix(_) => CliError::new(USAGE, format!("{context}: {err}")),
        CodecError::Parse { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cliputil_session::ValueKind;

    use super::*;

    #[test]
    fn session_errors_map_to_distinct_codes() {
        let denied = session_error("open", SessionError::AccessDenied { code: 5 });
        assert_eq!(denied.code, PERMISSION_DENIED);
        assert!(denied.message.starts_with("open: "));

        let timeout = session_error(
            "open",
            SessionError::Timeout {
                timeout: Duration::from_secs(1),
                attempts: 3,
            },
        );
        assert_eq!(timeout.code, TIMEOUT);
    }

    #[test]
    fn unsupported_platform_is_backend_unavailable() {
        let err = platform_error("backend", PlatformError::Unsupported { platform: "linux" });
        assert_eq!(err.code, BACKEND_UNAVAILABLE);
    }

    #[test]
    fn codec_errors_split_usage_from_data() {
        assert_eq!(codec_error("read", CodecError::InvalidRadix(99)).code, USAGE);
        let parse = CodecError::Parse {
            kind: ValueKind::Integer,
            input: "x".to_string(),
            reason: "bad".to_string(),
        };
        assert_eq!(codec_error("read", parse).code, DATA_INVALID);
    }

    #[test]
    fn invalid_utf8_input_is_data_invalid() {
        let err = io_error("stdin", io::Error::new(io::ErrorKind::InvalidData, "utf-8"));
        assert_eq!(err.code, DATA_INVALID);
    }
}
