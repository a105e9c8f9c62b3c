/// Errors reported by [`LockGuard`](crate::LockGuard) under the signalling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LockError {
    /// The resource refused to lock.
    #[error("failed to acquire lock")]
    Acquire,

    /// The resource refused to release the held token.
    #[error("failed to release lock")]
    Release,
}

pub type Result<T> = std::result::Result<T, LockError>;
