use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::phase::Phase;
use crate::state::ResolveStateCell;

/// Snapshot validity as seen by the lock layer.
pub trait Session: Send + Sync {
	/// Returns false once the snapshot this session describes is stale.
	fn is_valid(&self) -> bool;

	/// Diagnostic description, e.g. the owning module name.
	fn describe(&self) -> String;
}

/// A unit of the IR forest that is resolved lazily, phase by phase.
pub trait ResolvableNode {
	/// The node's only concurrently mutated field.
	fn resolve_state(&self) -> &ResolveStateCell;

	/// Session the node was built in.
	fn session(&self) -> &dyn Session;

	/// Stable identity for diagnostics.
	fn describe(&self) -> String;

	/// Last committed phase.
	fn resolve_phase(&self) -> Phase {
		self.resolve_state().phase()
	}
}

/// [`Session`] backed by an atomic validity flag.
pub struct TrackedSession {
	description: String,
	valid: AtomicBool,
}

impl TrackedSession {
	pub fn new(description: impl Into<String>) -> Self {
		Self {
			description: description.into(),
			valid: AtomicBool::new(true),
		}
	}

	/// Marks the session stale. Irreversible.
	pub fn invalidate(&self) {
		if self.valid.swap(false, Ordering::AcqRel) {
			tracing::debug!(session = %self.description, "resolve.session.invalidated");
		}
	}
}

impl Session for TrackedSession {
	fn is_valid(&self) -> bool {
		self.valid.load(Ordering::Acquire)
	}

	fn describe(&self) -> String {
		self.description.clone()
	}
}

impl fmt::Debug for TrackedSession {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TrackedSession")
			.field("description", &self.description)
			.field("valid", &self.is_valid())
			.finish()
	}
}
