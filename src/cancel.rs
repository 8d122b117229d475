//! Run-level cancellation handle.
//!
//! One [`CancelToken`] is shared by every stage of a pipeline run. Blocking
//! code polls [`is_cancelled`](CancelToken::is_cancelled) at its checkpoints
//! (the Whisper abort callback, the download loop); async code races
//! [`cancelled`](CancelToken::cancelled) against its pending I/O with
//! `tokio::select!` so a network call aborts within bounded time instead of
//! running to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Cheap-to-clone cancellation handle (`Arc` internally).
///
/// Cancellation is one-way: once [`cancel`](CancelToken::cancel) has been
/// called the token stays cancelled for the rest of its life.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    /// Create a fresh, non-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation and wake every task parked in
    /// [`cancelled`](CancelToken::cancelled).
    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Returns `true` once [`cancel`](CancelToken::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolves when the token is cancelled. Never resolves otherwise.
    ///
    /// Intended for `tokio::select!` arms racing against stage I/O.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let notified = self.inner.notify.notified();
            // Re-check after registering so a cancel() between the check and
            // the await cannot be missed.
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
