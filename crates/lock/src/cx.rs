use std::ops::{Deref, DerefMut};

use tokio_util::sync::CancellationToken;

use crate::contract::ContractMode;
use crate::error::ResolveError;
use crate::phase::Phase;

/// Lock request currently in flight on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ContractFrame {
	/// Address of the node's state cell; stable for the node's lifetime.
	pub node: usize,
	pub phase: Phase,
	pub mode: ContractMode,
}

/// Per-task resolution context.
///
/// Threaded through every lock entry point and handed to every action, so
/// nested requests see the caller's cancellation token, retry setting and
/// in-flight phases. One context belongs to one task; use [`Self::fork`] for
/// work handed to another thread.
#[derive(Debug)]
pub struct ResolveCx {
	cancel: CancellationToken,
	retry_on_invalid: bool,
	frames: Vec<ContractFrame>,
}

impl Default for ResolveCx {
	fn default() -> Self {
		Self::detached()
	}
}

impl ResolveCx {
	/// Creates a context observing `cancel`.
	pub fn new(cancel: CancellationToken) -> Self {
		Self {
			cancel,
			retry_on_invalid: false,
			frames: Vec::new(),
		}
	}

	/// Creates a context that is never cancelled from outside.
	pub fn detached() -> Self {
		Self::new(CancellationToken::new())
	}

	/// Creates a context for a child task: child token, same retry setting,
	/// no in-flight frames.
	pub fn fork(&self) -> Self {
		Self {
			cancel: self.cancel.child_token(),
			retry_on_invalid: self.retry_on_invalid,
			frames: Vec::new(),
		}
	}

	pub fn cancel_token(&self) -> &CancellationToken {
		&self.cancel
	}

	/// Whether the task's token has been cancelled.
	pub fn is_cancelled(&self) -> bool {
		self.cancel.is_cancelled()
	}

	/// Cancellation checkpoint.
	pub fn check_cancelled(&self) -> Result<(), ResolveError> {
		if self.cancel.is_cancelled() {
			return Err(ResolveError::Cancelled);
		}
		Ok(())
	}

	/// Whether a stale session should raise the invalidation signal.
	pub fn retries_wanted(&self) -> bool {
		self.retry_on_invalid
	}

	/// Phase of the innermost lock request in flight on this task.
	pub fn resolving_phase(&self) -> Option<Phase> {
		self.frames.last().map(|frame| frame.phase)
	}

	pub(crate) fn top_frame(&self) -> Option<ContractFrame> {
		self.frames.last().copied()
	}

	/// Innermost in-flight frame for the node identified by `node`.
	pub(crate) fn frame_for(&self, node: usize) -> Option<ContractFrame> {
		self.frames.iter().rev().find(|frame| frame.node == node).copied()
	}

	/// Overrides the retry setting until the returned scope drops.
	pub(crate) fn retry_scope(&mut self, wanted: bool) -> RetryScope<'_> {
		let prev = std::mem::replace(&mut self.retry_on_invalid, wanted);
		RetryScope { cx: self, prev }
	}

	/// Pushes a frame that is popped when the returned scope drops.
	pub(crate) fn frame_scope(&mut self, frame: ContractFrame) -> FrameScope<'_> {
		self.frames.push(frame);
		FrameScope { cx: self }
	}
}

/// Restores the previous retry setting on drop, including during unwinding.
pub(crate) struct RetryScope<'a> {
	cx: &'a mut ResolveCx,
	prev: bool,
}

impl Deref for RetryScope<'_> {
	type Target = ResolveCx;

	fn deref(&self) -> &ResolveCx {
		self.cx
	}
}

impl DerefMut for RetryScope<'_> {
	fn deref_mut(&mut self) -> &mut ResolveCx {
		self.cx
	}
}

impl Drop for RetryScope<'_> {
	fn drop(&mut self) {
		self.cx.retry_on_invalid = self.prev;
	}
}

/// Pops its contract frame on drop.
pub(crate) struct FrameScope<'a> {
	cx: &'a mut ResolveCx,
}

impl Deref for FrameScope<'_> {
	type Target = ResolveCx;

	fn deref(&self) -> &ResolveCx {
		self.cx
	}
}

impl DerefMut for FrameScope<'_> {
	fn deref_mut(&mut self) -> &mut ResolveCx {
		self.cx
	}
}

impl Drop for FrameScope<'_> {
	fn drop(&mut self) {
		self.cx.frames.pop();
	}
}
