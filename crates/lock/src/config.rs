use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_BARRIER_WAIT_MS: u64 = 50;
const DEFAULT_LOCK_POLL_MS: u64 = 50;

/// Construction-time settings for a [`crate::LockProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockConfig {
	/// Serialize all lock requests through one process-wide lock.
	pub global_lock: bool,
	/// Upper bound of a single wait on a transition barrier.
	pub barrier_wait_ms: u64,
	/// Upper bound of a single coarse-lock acquisition attempt.
	pub lock_poll_ms: u64,
}

impl Default for LockConfig {
	fn default() -> Self {
		Self {
			global_lock: false,
			barrier_wait_ms: DEFAULT_BARRIER_WAIT_MS,
			lock_poll_ms: DEFAULT_LOCK_POLL_MS,
		}
	}
}

impl LockConfig {
	/// Default settings with the global lock engaged.
	pub fn with_global_lock() -> Self {
		Self {
			global_lock: true,
			..Self::default()
		}
	}

	/// Rejects intervals that would turn bounded waits into busy spins.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.barrier_wait_ms == 0 {
			return Err(ConfigError::ZeroInterval { field: "barrier_wait_ms" });
		}
		if self.lock_poll_ms == 0 {
			return Err(ConfigError::ZeroInterval { field: "lock_poll_ms" });
		}
		Ok(())
	}

	pub fn barrier_wait(&self) -> Duration {
		Duration::from_millis(self.barrier_wait_ms.max(1))
	}

	pub fn lock_poll(&self) -> Duration {
		Duration::from_millis(self.lock_poll_ms.max(1))
	}
}
