use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of [`LockMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockMetricsSnapshot {
	/// Actions executed by a transition owner.
	pub actions_run: u64,
	/// Transitions that ended with the action succeeding.
	pub committed: u64,
	/// Transitions rolled back to their base phase.
	pub reverted: u64,
	/// Barriers installed by a waiter on an in-flight transition.
	pub barriers_installed: u64,
	/// Bounded waits performed on a barrier.
	pub barrier_waits: u64,
	/// CAS attempts lost to another thread.
	pub contended: u64,
	/// Bounded coarse-lock attempts that timed out.
	pub lock_polls: u64,
}

/// Relaxed contention counters kept by a [`crate::LockProvider`].
#[derive(Debug, Default)]
pub(crate) struct LockMetrics {
	actions_run: AtomicU64,
	committed: AtomicU64,
	reverted: AtomicU64,
	barriers_installed: AtomicU64,
	barrier_waits: AtomicU64,
	contended: AtomicU64,
	lock_polls: AtomicU64,
}

impl LockMetrics {
	pub fn record_action(&self) {
		self.actions_run.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_committed(&self) {
		self.committed.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_reverted(&self) {
		self.reverted.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_barrier_installed(&self) {
		self.barriers_installed.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_barrier_wait(&self) {
		self.barrier_waits.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_contended(&self) {
		self.contended.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_lock_poll(&self) {
		self.lock_polls.fetch_add(1, Ordering::Relaxed);
	}

	pub fn snapshot(&self) -> LockMetricsSnapshot {
		LockMetricsSnapshot {
			actions_run: self.actions_run.load(Ordering::Relaxed),
			committed: self.committed.load(Ordering::Relaxed),
			reverted: self.reverted.load(Ordering::Relaxed),
			barriers_installed: self.barriers_installed.load(Ordering::Relaxed),
			barrier_waits: self.barrier_waits.load(Ordering::Relaxed),
			contended: self.contended.load(Ordering::Relaxed),
			lock_polls: self.lock_polls.load(Ordering::Relaxed),
		}
	}
}
