use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cooperative cancellation signal shared between sheet tasks.
///
/// A token is cancelled when [`CancellationToken::cancel`] was called on it, when its deadline has
/// passed, or when any ancestor token is cancelled. Cancellation is never reset.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
    parent: Option<CancellationToken>,
}

impl CancellationToken {
    /// A token that is only cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also counts as cancelled once `deadline` has passed.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            inner: Arc::new(Inner {
                deadline: Some(deadline),
                ..Inner::default()
            }),
        }
    }

    /// A new token that is cancelled whenever `self` is, but can also be cancelled on its own
    /// without affecting `self`.
    pub fn child_token(&self) -> Self {
        Self {
            inner: Arc::new(Inner {
                parent: Some(self.clone()),
                ..Inner::default()
            }),
        }
    }

    /// Signal cancellation to every holder of this token and its children.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    /// Whether the token, its deadline or one of its ancestors has fired.
    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::Acquire) {
            return true;
        }
        if self.inner.deadline.is_some_and(|d| Instant::now() >= d) {
            return true;
        }
        self.inner
            .parent
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Returns a guard that cancels this token when dropped.
    pub fn drop_guard(&self) -> DropGuard {
        DropGuard {
            token: self.clone(),
        }
    }
}

/// Cancels its token on drop. Used to stop extraction when a request future is abandoned.
#[derive(Debug)]
pub struct DropGuard {
    token: CancellationToken,
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
