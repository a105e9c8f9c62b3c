use std::fmt;
use std::ops::{Deref, DerefMut};

use tracing::{error, warn};

use crate::error::{LockError, Result};

/// A resource with a lock/unlock pairing.
///
/// `lock` hands out a token (`None` is the failure token); `unlock` must be
/// given back exactly that token.
pub trait Lockable {
    type Token: Copy + PartialEq + fmt::Debug;

    fn lock(&mut self) -> Option<Self::Token>;

    fn unlock(&mut self, token: Self::Token) -> bool;
}

/// What a [`LockGuard`] does when the resource refuses to lock or unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockPolicy {
    /// Failure is a programmer error: acquisition panics, release failure is
    /// a contract violation.
    #[default]
    Fatal,
    /// Failure is reported to the caller as a [`LockError`].
    Signal,
}

/// Holds a lock on a [`Lockable`] for the duration of a scope.
///
/// The token is released on every exit path: normal return, `?`, or unwinding.
pub struct LockGuard<'r, R: Lockable + ?Sized> {
    resource: &'r mut R,
    token: Option<R::Token>,
    policy: LockPolicy,
}

impl<'r, R: Lockable + ?Sized> LockGuard<'r, R> {
    /// Lock `resource`, panicking if it refuses.
    pub fn acquire(resource: &'r mut R) -> Self {
        match Self::with_policy(resource, LockPolicy::Fatal) {
            Ok(guard) => guard,
            Err(err) => panic!("lock guard: {err}"),
        }
    }

    /// Lock `resource`, returning [`LockError::Acquire`] if it refuses.
    pub fn try_acquire(resource: &'r mut R) -> Result<Self> {
        Self::with_policy(resource, LockPolicy::Signal)
    }

    /// Lock `resource` with an explicit failure policy.
    ///
    /// Under [`LockPolicy::Fatal`] a refused lock is still returned as an
    /// error here; [`acquire`](Self::acquire) is the panicking entry point.
    pub fn with_policy(resource: &'r mut R, policy: LockPolicy) -> Result<Self> {
        match resource.lock() {
            Some(token) => Ok(Self {
                resource,
                token: Some(token),
                policy,
            }),
            None => Err(LockError::Acquire),
        }
    }

    /// The token handed out by the resource.
    pub fn value(&self) -> R::Token {
        match self.token {
            Some(token) => token,
            None => panic!("lock guard holds no token"),
        }
    }

    pub fn policy(&self) -> LockPolicy {
        self.policy
    }

    pub fn resource(&self) -> &R {
        &*self.resource
    }

    pub fn resource_mut(&mut self) -> &mut R {
        &mut *self.resource
    }

    /// Release now instead of at scope end.
    pub fn release(mut self) -> Result<()> {
        self.unlock_held()
    }

    fn unlock_held(&mut self) -> Result<()> {
        let Some(token) = self.token.take() else {
            return Ok(());
        };
        if self.resource.unlock(token) {
            return Ok(());
        }
        if self.policy == LockPolicy::Fatal {
            if std::thread::panicking() {
                // A second panic here would abort the process.
                error!(
                    target: "cliputil::contract",
                    ?token,
                    "guarded resource refused to unlock while unwinding"
                );
            } else {
                contract_violation!("guarded resource refused to unlock token {:?}", token);
            }
        }
        Err(LockError::Release)
    }
}

impl<R: Lockable + ?Sized> Deref for LockGuard<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        &*self.resource
    }
}

impl<R: Lockable + ?Sized> DerefMut for LockGuard<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut *self.resource
    }
}

impl<R: Lockable + ?Sized> Drop for LockGuard<'_, R> {
    fn drop(&mut self) {
        if let Err(err) = self.unlock_held() {
            warn!(%err, "lock guard release failed");
        }
    }
}

impl<R: Lockable + ?Sized> fmt::Debug for LockGuard<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("token", &self.token)
            .field("policy", &self.policy)
            .finish()
    }
}
