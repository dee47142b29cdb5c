use crate::coarse::CoarseLocks;
use crate::config::LockConfig;
use crate::contract::{self, ContractMode};
use crate::critical;
use crate::cx::ResolveCx;
use crate::error::{ConfigError, ResolveError};
use crate::metrics::{LockMetrics, LockMetricsSnapshot};
use crate::node::ResolvableNode;
use crate::phase::Phase;

/// Kind of access requested on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
	Read,
	Write,
	Jump,
}

impl Access {
	const fn commits(self) -> bool {
		!matches!(self, Self::Read)
	}

	const fn mode(self) -> ContractMode {
		match self {
			Self::Read | Self::Write => ContractMode::Sequential,
			Self::Jump => ContractMode::Jumping,
		}
	}
}

/// Entry point for lazy phase resolution.
///
/// One provider is shared by every thread resolving nodes of the same forest.
/// Lock requests go through the contract checker, then the coarse locks (when
/// engaged), then the node's critical section.
#[derive(Debug, Default)]
pub struct LockProvider {
	config: LockConfig,
	coarse: CoarseLocks,
	metrics: LockMetrics,
}

impl LockProvider {
	/// Creates a provider. Zero intervals are clamped to one millisecond.
	pub fn new(config: LockConfig) -> Self {
		tracing::debug!(
			global_lock = config.global_lock,
			barrier_wait_ms = config.barrier_wait_ms,
			lock_poll_ms = config.lock_poll_ms,
			"resolve.provider.new"
		);
		Self {
			config,
			coarse: CoarseLocks::default(),
			metrics: LockMetrics::default(),
		}
	}

	/// Creates a provider after validating `config`.
	pub fn try_new(config: LockConfig) -> Result<Self, ConfigError> {
		config.validate()?;
		Ok(Self::new(config))
	}

	pub fn config(&self) -> &LockConfig {
		&self.config
	}

	pub fn metrics(&self) -> LockMetricsSnapshot {
		self.metrics.snapshot()
	}

	/// Runs `action` while this task holds `node`'s transition towards `phase`,
	/// with the node's committed phase below `phase`. The node keeps its
	/// committed phase afterwards.
	pub fn with_read_lock<N, E>(&self, node: &N, phase: Phase, cx: &mut ResolveCx, action: impl FnOnce(&mut ResolveCx) -> Result<(), E>) -> Result<(), E>
	where
		N: ResolvableNode + ?Sized,
		E: From<ResolveError>,
	{
		self.with_lock(node, phase, Access::Read, cx, action)
	}

	/// Runs `action` to move `node` from the previous phase to `phase` and
	/// commits `phase` on success.
	pub fn with_write_lock<N, E>(&self, node: &N, phase: Phase, cx: &mut ResolveCx, action: impl FnOnce(&mut ResolveCx) -> Result<(), E>) -> Result<(), E>
	where
		N: ResolvableNode + ?Sized,
		E: From<ResolveError>,
	{
		self.with_lock(node, phase, Access::Write, cx, action)
	}

	/// Like [`Self::with_write_lock`], but `action` may lift `node` straight
	/// from its committed phase to `phase`.
	pub fn with_jumping_lock<N, E>(&self, node: &N, phase: Phase, cx: &mut ResolveCx, action: impl FnOnce(&mut ResolveCx) -> Result<(), E>) -> Result<(), E>
	where
		N: ResolvableNode + ?Sized,
		E: From<ResolveError>,
	{
		self.with_lock(node, phase, Access::Jump, cx, action)
	}

	/// Runs `action` under the process-wide lock when [`LockConfig::global_lock`]
	/// is set, aborting with the invalidation signal if `node`'s session went
	/// stale and `cx` wants retries.
	pub fn with_global_lock<N, R, E>(&self, node: &N, cx: &mut ResolveCx, action: impl FnOnce(&mut ResolveCx) -> Result<R, E>) -> Result<R, E>
	where
		N: ResolvableNode + ?Sized,
		E: From<ResolveError>,
	{
		self.coarse
			.with_global_lock(self.config.global_lock, self.config.lock_poll(), &self.metrics, node, cx, action)
	}

	/// Runs `action` under the hazardous-phase lock if `phase` is
	/// [`Phase::HAZARDOUS`], unsynchronized otherwise.
	pub fn with_phase_lock<R, E>(&self, phase: Phase, cx: &mut ResolveCx, action: impl FnOnce(&mut ResolveCx) -> Result<R, E>) -> Result<R, E>
	where
		E: From<ResolveError>,
	{
		self.coarse.with_phase_lock(phase, self.config.lock_poll(), &self.metrics, cx, action)
	}

	/// Raw critical section: no contract checks, no coarse locks.
	///
	/// Runs `action` at most once to bring `node` to `phase`; does nothing if
	/// the node is already there. With `commit == false` the node keeps its
	/// committed phase after `action` succeeds.
	pub fn advance<N, E>(&self, node: &N, phase: Phase, commit: bool, cx: &mut ResolveCx, action: impl FnOnce(&mut ResolveCx) -> Result<(), E>) -> Result<(), E>
	where
		N: ResolvableNode + ?Sized,
		E: From<ResolveError>,
	{
		critical::advance(node, phase, commit, cx, self.config.barrier_wait(), &self.metrics, |_| Ok(()), action)
	}

	fn with_lock<N, E>(&self, node: &N, phase: Phase, access: Access, cx: &mut ResolveCx, action: impl FnOnce(&mut ResolveCx) -> Result<(), E>) -> Result<(), E>
	where
		N: ResolvableNode + ?Sized,
		E: From<ResolveError>,
	{
		cx.check_cancelled()?;
		if node.resolve_phase() >= phase {
			return Ok(());
		}

		let mut scope = contract::enter(cx, node, phase, access.mode()).map_err(ResolveError::from)?;
		self.with_global_lock(node, &mut scope, |cx| {
			self.with_phase_lock(phase, cx, |cx| {
				critical::advance(
					node,
					phase,
					access.commits(),
					cx,
					self.config.barrier_wait(),
					&self.metrics,
					|from| match access {
						Access::Write => contract::check_sequential(node, from, phase).map_err(|v| ResolveError::from(v).into()),
						Access::Read | Access::Jump => Ok(()),
					},
					action,
				)
			})
		})
	}
}
