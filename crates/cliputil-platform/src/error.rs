/// Errors raised while setting up a clipboard backend.
///
/// Individual backend calls never return these; they report environmental
/// failure through null handles and `false` results instead.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// No native clipboard backend exists for this target.
    #[error("no native clipboard backend for platform {platform}")]
    Unsupported { platform: &'static str },

    /// An OS call failed with the given error code.
    #[error("{operation} failed (os error {code})")]
    Os { operation: &'static str, code: u32 },
}

pub type Result<T> = std::result::Result<T, PlatformError>;
