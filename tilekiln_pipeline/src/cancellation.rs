//! A single cancellation signal shared by every pipeline worker (§5).
//!
//! Shaped like `tokio_util::sync::CancellationToken`, which is not a
//! workspace dependency; this crate only needs the "flip once, wake
//! everyone waiting" half of it, so it is hand-rolled over `AtomicBool` +
//! `tokio::sync::Notify`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
	cancelled: AtomicBool,
	notify: Notify,
}

/// Cloneable handle; every clone observes the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<Inner>);

impl Cancellation {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Flips the signal. Idempotent; safe to call from any worker or the
	/// supervisor. Wakes every task blocked in `cancelled()`.
	pub fn cancel(&self) {
		self.0.cancelled.store(true, Ordering::SeqCst);
		self.0.notify.notify_waiters();
	}

	#[must_use]
	pub fn is_cancelled(&self) -> bool {
		self.0.cancelled.load(Ordering::SeqCst)
	}

	/// Resolves once `cancel()` has been called. Workers select on this
	/// alongside their queue operations between records (§5 "suspension
	/// points").
	pub async fn cancelled(&self) {
		if self.is_cancelled() {
			return;
		}
		loop {
			let notified = self.0.notify.notified();
			if self.is_cancelled() {
				return;
			}
			notified.await;
			if self.is_cancelled() {
				return;
			}
		}
	}
}
