use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// One-shot barrier that waiters block on while a transition is in flight.
///
/// Released exactly once by the thread owning the transition. Waits are
/// always bounded; callers re-poll node state after every wake-up.
#[derive(Debug, Default)]
pub struct Latch {
	released: Mutex<bool>,
	cond: Condvar,
}

impl Latch {
	pub fn new() -> Self {
		Self::default()
	}

	/// Releases every current and future waiter.
	pub fn count_down(&self) {
		let mut released = self.released.lock();
		if !*released {
			*released = true;
			self.cond.notify_all();
		}
	}

	pub fn is_released(&self) -> bool {
		*self.released.lock()
	}

	/// Blocks for at most `timeout`. Returns true if the latch was released.
	pub fn wait_for(&self, timeout: Duration) -> bool {
		let mut released = self.released.lock();
		if !*released {
			let _ = self.cond.wait_for(&mut released, timeout);
		}
		*released
	}
}
