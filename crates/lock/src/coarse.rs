//! Coarse-grained locks layered over the per-node critical section.
//!
//! Both locks are reentrant so nested resolution on the owning task never
//! blocks on itself, and both are acquired in bounded attempts with a
//! cancellation checkpoint between attempts.

use std::time::Duration;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::cx::ResolveCx;
use crate::error::{InvalidatedSession, ResolveError};
use crate::metrics::LockMetrics;
use crate::node::ResolvableNode;
use crate::phase::Phase;

#[derive(Debug, Default)]
pub(crate) struct CoarseLocks {
	global: ReentrantMutex<()>,
	hazardous_phase: ReentrantMutex<()>,
}

impl CoarseLocks {
	/// Runs `action` under the process-wide lock when `enabled`.
	///
	/// Once the lock is held, a stale session raises [`InvalidatedSession`]
	/// if the context asked for retries. The action itself runs with retries
	/// switched off so nested lock requests do not raise the signal again.
	pub fn with_global_lock<N, R, E>(
		&self,
		enabled: bool,
		poll: Duration,
		metrics: &LockMetrics,
		node: &N,
		cx: &mut ResolveCx,
		action: impl FnOnce(&mut ResolveCx) -> Result<R, E>,
	) -> Result<R, E>
	where
		N: ResolvableNode + ?Sized,
		E: From<ResolveError>,
	{
		if !enabled {
			return action(cx);
		}

		let _guard = acquire(&self.global, "global", poll, metrics, cx)?;

		if cx.retries_wanted() {
			let session = node.session();
			if !session.is_valid() {
				let description = session.describe();
				tracing::debug!(node = %node.describe(), session = %description, "resolve.lock.stale_session");
				return Err(ResolveError::from(InvalidatedSession { description }).into());
			}
		}

		let mut scope = cx.retry_scope(false);
		action(&mut *scope)
	}

	/// Serializes `action` through the hazardous-phase lock when `phase` is
	/// [`Phase::HAZARDOUS`]; runs it directly otherwise.
	pub fn with_phase_lock<R, E>(
		&self,
		phase: Phase,
		poll: Duration,
		metrics: &LockMetrics,
		cx: &mut ResolveCx,
		action: impl FnOnce(&mut ResolveCx) -> Result<R, E>,
	) -> Result<R, E>
	where
		E: From<ResolveError>,
	{
		if !phase.is_hazardous() {
			return action(cx);
		}

		let _guard = acquire(&self.hazardous_phase, phase.as_str(), poll, metrics, cx)?;
		action(cx)
	}
}

fn acquire<'a>(lock: &'a ReentrantMutex<()>, name: &'static str, poll: Duration, metrics: &LockMetrics, cx: &ResolveCx) -> Result<ReentrantMutexGuard<'a, ()>, ResolveError> {
	loop {
		cx.check_cancelled()?;
		if let Some(guard) = lock.try_lock_for(poll) {
			return Ok(guard);
		}
		metrics.record_lock_poll();
		tracing::trace!(lock = name, "resolve.lock.poll");
	}
}
