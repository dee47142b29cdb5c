use std::sync::Arc;

use crate::config::LockConfig;
use crate::node::{ResolvableNode, Session, TrackedSession};
use crate::phase::Phase;
use crate::provider::LockProvider;
use crate::state::ResolveStateCell;

/// Minimal node used across the crate's tests.
#[derive(Debug)]
pub(crate) struct TestNode {
	pub(crate) name: &'static str,
	pub(crate) state: ResolveStateCell,
	pub(crate) session: Arc<TrackedSession>,
}

impl TestNode {
	pub(crate) fn new(name: &'static str) -> Self {
		Self::in_session(name, Arc::new(TrackedSession::new(format!("session({name})"))))
	}

	pub(crate) fn at(name: &'static str, phase: Phase) -> Self {
		let node = Self::new(name);
		Self {
			state: ResolveStateCell::resolved(phase),
			..node
		}
	}

	pub(crate) fn in_session(name: &'static str, session: Arc<TrackedSession>) -> Self {
		Self {
			name,
			state: ResolveStateCell::new(),
			session,
		}
	}
}

impl ResolvableNode for TestNode {
	fn resolve_state(&self) -> &ResolveStateCell {
		&self.state
	}

	fn session(&self) -> &dyn Session {
		&*self.session
	}

	fn describe(&self) -> String {
		format!("node({})", self.name)
	}
}

/// Provider with short bounded waits so contention tests stay fast.
pub(crate) fn fast_provider(global_lock: bool) -> LockProvider {
	LockProvider::new(LockConfig {
		global_lock,
		barrier_wait_ms: 5,
		lock_poll_ms: 5,
	})
}
