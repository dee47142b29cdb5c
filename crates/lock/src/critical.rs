//! Per-node critical section.
//!
//! # Role
//!
//! Moves one node from its committed phase to a target phase, running the
//! supplied action at most once per committed transition. Coordination is a
//! CAS loop over the node's [`ResolveStateCell`]; a barrier is only installed
//! once a second thread shows up and has to wait.
//!
//! # Invariants
//!
//! - Only the thread whose CAS installed `InProgress` runs the action.
//! - Every exit of the owner (success, error, panic) leaves the node
//!   `Resolved`, at the target on commit and at the base phase otherwise.
//! - Every loop iteration is a cancellation checkpoint; no state is touched
//!   between the checkpoint and the next snapshot read.

use std::sync::Arc;
use std::time::Duration;

use crate::cx::ResolveCx;
use crate::error::ResolveError;
use crate::latch::Latch;
use crate::metrics::LockMetrics;
use crate::node::ResolvableNode;
use crate::phase::Phase;
use crate::state::{ResolveState, ResolveStateCell};

/// Brings `node` to `target`, running `action` if this thread wins ownership
/// of the transition.
///
/// `precondition` sees the committed base phase once ownership is won and may
/// veto the transition; a veto reverts the node without running `action`.
/// With `commit == false` the node returns to its base phase after `action`
/// succeeds.
#[allow(clippy::too_many_arguments)]
pub(crate) fn advance<N, E, P, A>(
	node: &N,
	target: Phase,
	commit: bool,
	cx: &mut ResolveCx,
	barrier_wait: Duration,
	metrics: &LockMetrics,
	precondition: P,
	action: A,
) -> Result<(), E>
where
	N: ResolvableNode + ?Sized,
	E: From<ResolveError>,
	P: FnOnce(Phase) -> Result<(), E>,
	A: FnOnce(&mut ResolveCx) -> Result<(), E>,
{
	let Some(from) = acquire(node, target, cx, barrier_wait, metrics)? else {
		return Ok(());
	};

	let transition = Transition {
		cell: node.resolve_state(),
		from,
		metrics,
		finished: false,
	};

	let outcome = precondition(from).and_then(|()| {
		metrics.record_action();
		action(cx)
	});

	match outcome {
		Ok(()) => {
			let phase = if commit { target } else { from };
			transition.commit(phase);
			tracing::debug!(node = %node.describe(), from = %from, to = %phase, "resolve.lock.committed");
			Ok(())
		}
		Err(err) => {
			drop(transition);
			tracing::debug!(node = %node.describe(), phase = %from, target = %target, "resolve.lock.reverted");
			Err(err)
		}
	}
}

/// Spins on the node state until it is satisfied (`None`) or this thread owns
/// the transition from the returned base phase.
fn acquire<N>(node: &N, target: Phase, cx: &ResolveCx, barrier_wait: Duration, metrics: &LockMetrics) -> Result<Option<Phase>, ResolveError>
where
	N: ResolvableNode + ?Sized,
{
	let cell = node.resolve_state();
	loop {
		cx.check_cancelled()?;

		let snapshot = cell.load();
		if snapshot.phase() >= target {
			return Ok(None);
		}

		match &*snapshot {
			ResolveState::InProgress { from, to } => {
				let waited = ResolveState::InProgressWithBarrier {
					from: *from,
					to: *to,
					barrier: Arc::new(Latch::new()),
				};
				if cell.compare_and_swap(&snapshot, waited) {
					metrics.record_barrier_installed();
					tracing::trace!(node = %node.describe(), to = %to, "resolve.lock.barrier_installed");
				} else {
					metrics.record_contended();
				}
			}
			ResolveState::InProgressWithBarrier { to, barrier, .. } => {
				metrics.record_barrier_wait();
				if !barrier.wait_for(barrier_wait) {
					tracing::trace!(node = %node.describe(), to = %to, "resolve.lock.barrier_timeout");
				}
			}
			ResolveState::Resolved(from) => {
				let in_progress = ResolveState::InProgress { from: *from, to: target };
				if cell.compare_and_swap(&snapshot, in_progress) {
					return Ok(Some(*from));
				}
				metrics.record_contended();
			}
		}
	}
}

/// Ownership of an in-flight transition. Reverts to the base phase unless
/// committed, including when the action panics.
struct Transition<'a> {
	cell: &'a ResolveStateCell,
	from: Phase,
	metrics: &'a LockMetrics,
	finished: bool,
}

impl Transition<'_> {
	fn commit(mut self, phase: Phase) {
		self.finished = true;
		self.cell.finish(phase);
		self.metrics.record_committed();
	}
}

impl Drop for Transition<'_> {
	fn drop(&mut self) {
		if !self.finished {
			self.cell.finish(self.from);
			self.metrics.record_reverted();
		}
	}
}
