//! Per-node resolve state.
//!
//! # Role
//!
//! Every resolvable node owns one [`ResolveStateCell`]. After construction the
//! cell is only mutated through compare-and-swap of immutable
//! [`ResolveState`] values, which is what makes the critical section in
//! [`crate::critical`] linearizable per node.
//!
//! # Invariants
//!
//! - The observable phase never decreases (see `invariants::inv_monotonic_phase`).
//! - An in-progress state reports its base phase, never its target.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::latch::Latch;
use crate::phase::Phase;

/// Immutable snapshot of a node's resolution progress.
#[derive(Debug, Clone)]
pub enum ResolveState {
	/// Fully committed at this phase.
	Resolved(Phase),
	/// One thread is moving the node from `from` to `to`; nobody is waiting yet.
	InProgress { from: Phase, to: Phase },
	/// Same as [`Self::InProgress`], with at least one waiter parked on `barrier`.
	InProgressWithBarrier { from: Phase, to: Phase, barrier: Arc<Latch> },
}

impl ResolveState {
	/// Last committed phase.
	pub fn phase(&self) -> Phase {
		match self {
			Self::Resolved(phase) => *phase,
			Self::InProgress { from, .. } | Self::InProgressWithBarrier { from, .. } => *from,
		}
	}

	/// Phase an in-flight transition is heading to, if any.
	pub fn target(&self) -> Option<Phase> {
		match self {
			Self::Resolved(_) => None,
			Self::InProgress { to, .. } | Self::InProgressWithBarrier { to, .. } => Some(*to),
		}
	}

	/// Returns true while some thread owns a transition of the node.
	pub fn is_in_progress(&self) -> bool {
		!matches!(self, Self::Resolved(_))
	}
}

impl fmt::Display for ResolveState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Resolved(phase) => write!(f, "resolved({phase})"),
			Self::InProgress { from, to } => write!(f, "in_progress({from} -> {to})"),
			Self::InProgressWithBarrier { from, to, .. } => write!(f, "in_progress({from} -> {to}, waited)"),
		}
	}
}

/// Atomic holder of a node's [`ResolveState`].
pub struct ResolveStateCell {
	inner: ArcSwap<ResolveState>,
}

impl Default for ResolveStateCell {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for ResolveStateCell {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ResolveStateCell").field(&*self.inner.load()).finish()
	}
}

impl ResolveStateCell {
	/// Creates a cell resolved to [`Phase::FIRST`].
	pub fn new() -> Self {
		Self::resolved(Phase::FIRST)
	}

	/// Creates a cell already committed to `phase`, e.g. for nodes loaded from
	/// a pre-resolved artifact.
	pub fn resolved(phase: Phase) -> Self {
		Self {
			inner: ArcSwap::from_pointee(ResolveState::Resolved(phase)),
		}
	}

	/// Loads the current snapshot.
	pub fn load(&self) -> Arc<ResolveState> {
		self.inner.load_full()
	}

	/// Last committed phase.
	pub fn phase(&self) -> Phase {
		self.inner.load().phase()
	}

	/// Installs `new` if the cell still holds exactly `current`.
	pub(crate) fn compare_and_swap(&self, current: &Arc<ResolveState>, new: ResolveState) -> bool {
		let prev = self.inner.compare_and_swap(current, Arc::new(new));
		Arc::ptr_eq(&prev, current)
	}

	/// Ends the in-flight transition owned by the caller at `phase` and wakes
	/// any waiters parked on its barrier.
	///
	/// Waiters may install a barrier concurrently, so this retries until the
	/// swap lands on whatever in-progress snapshot is current.
	pub(crate) fn finish(&self, phase: Phase) {
		loop {
			let current = self.inner.load_full();
			debug_assert!(current.is_in_progress(), "finishing a transition nobody owns: {current}");
			if self.compare_and_swap(&current, ResolveState::Resolved(phase)) {
				if let ResolveState::InProgressWithBarrier { barrier, .. } = &*current {
					barrier.count_down();
				}
				return;
			}
		}
	}
}
