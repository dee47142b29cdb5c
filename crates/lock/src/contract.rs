//! Reentrancy and ordering guard for lock requests.
//!
//! A task that is resolving some node to phase `Q` may only ask for strictly
//! earlier phases while it is inside that request; asking for `Q` or later
//! could end up waiting on the very transition the task owns. Jumping
//! requests are also allowed at `Q` itself and skip the one-phase-at-a-time
//! rule for writes.
//!
//! Independently of phases, a task may not ask for a node whose transition it
//! already holds: the request would wait on the task's own in-flight state.

use crate::cx::{ContractFrame, FrameScope, ResolveCx};
use crate::error::ContractViolation;
use crate::node::ResolvableNode;
use crate::phase::Phase;
use crate::state::ResolveStateCell;

/// How strictly a lock request is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractMode {
	/// Nested requests must target strictly earlier phases; writes advance one
	/// phase at a time.
	Sequential,
	/// Known-safe elevation: nested requests may target the in-flight phase and
	/// writes may skip phases.
	Jumping,
}

/// Records a lock request for `phase` on `cx`, or rejects it if it would
/// re-enter the task's own in-flight resolution.
pub(crate) fn enter<'a, N>(cx: &'a mut ResolveCx, node: &N, phase: Phase, mode: ContractMode) -> Result<FrameScope<'a>, ContractViolation>
where
	N: ResolvableNode + ?Sized,
{
	let id = node_id(node);
	if let Some(owned) = cx.frame_for(id) {
		return Err(reentrant(node, phase, owned));
	}
	if let Some(current) = cx.top_frame() {
		let allowed = match mode {
			ContractMode::Sequential => phase < current.phase,
			ContractMode::Jumping => phase <= current.phase,
		};
		if !allowed {
			return Err(reentrant(node, phase, current));
		}
	}
	Ok(cx.frame_scope(ContractFrame { node: id, phase, mode }))
}

fn node_id<N>(node: &N) -> usize
where
	N: ResolvableNode + ?Sized,
{
	std::ptr::from_ref::<ResolveStateCell>(node.resolve_state()) as usize
}

fn reentrant<N>(node: &N, requested: Phase, current: ContractFrame) -> ContractViolation
where
	N: ResolvableNode + ?Sized,
{
	let violation = ContractViolation::Reentrant {
		node: node.describe(),
		requested,
		in_progress: current.phase,
	};
	tracing::warn!(error = %violation, outer_mode = ?current.mode, "resolve.contract.violation");
	violation
}

/// Checks that a sequential write from `from` targets the immediate successor.
pub(crate) fn check_sequential<N>(node: &N, from: Phase, requested: Phase) -> Result<(), ContractViolation>
where
	N: ResolvableNode + ?Sized,
{
	match from.next() {
		Some(expected) if expected == requested => Ok(()),
		next => {
			let violation = ContractViolation::NonSequential {
				node: node.describe(),
				from,
				requested,
				expected: next.unwrap_or(from),
			};
			tracing::warn!(error = %violation, "resolve.contract.violation");
			Err(violation)
		}
	}
}
