//! a thin wrapper around [`tokio::sync::Mutex`], in the spirit of
//! `hosting::casino::Casino`'s `Arc<Mutex<…>>` channel endpoints, but scoped
//! to a single accessor method so callers can't hold the guard across an
//! unrelated `await` by accident.

use tokio::sync::Mutex;

/// a mutex-protected value, accessed only through [`Protected::with`]. used
/// for the server's pending-actions queue, which is pushed to directly by
/// session tasks and drained by the single engine-owning task.
#[derive(Debug, Default)]
pub struct Protected<T> {
    inner: Mutex<T>,
}

impl<T> Protected<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// run `f` with exclusive access to the protected value, returning
    /// whatever `f` returns. the lock is held only for the duration of `f`.
    pub async fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock().await;
        f(&mut guard)
    }
}
