//! Cross-module invariants of the resolution engine.

use std::sync::Barrier;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use proptest::prelude::*;

use crate::error::{ContractViolation, InvalidatedSession, ResolveError};
use crate::node::ResolvableNode;
use crate::phase::Phase;
use crate::retry::retry_on_invalid_session;
use crate::testing::{TestNode, fast_provider};
use crate::{LockProvider, ResolveCx};

/// Invariant: any number of concurrent callers asking for the same node and
/// phase run the action at most once, and all of them return only after the
/// phase is committed.
pub(crate) fn inv_exactly_once(threads: usize) {
	let provider = fast_provider(false);
	let node = TestNode::at("n", Phase::Imports);
	let calls = AtomicUsize::new(0);
	let start = Barrier::new(threads);

	std::thread::scope(|s| {
		for _ in 0..threads {
			s.spawn(|| {
				let mut cx = ResolveCx::detached();
				start.wait();
				provider
					.with_write_lock(&node, Phase::Annotations, &mut cx, |_| {
						calls.fetch_add(1, Ordering::SeqCst);
						std::thread::sleep(std::time::Duration::from_millis(10));
						Ok::<_, ResolveError>(())
					})
					.unwrap();
				assert!(node.resolve_phase() >= Phase::Annotations);
			});
		}
	});

	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert_eq!(provider.metrics().actions_run, 1);
}

#[cfg_attr(test, test)]
pub(crate) fn test_exactly_once() {
	inv_exactly_once(8)
}

/// Invariant: the phase observed by a reader never decreases while writers
/// advance, fail and read concurrently.
pub(crate) fn inv_monotonic_phase() {
	let provider = fast_provider(false);
	let node = TestNode::new("n");
	let done = AtomicBool::new(false);

	std::thread::scope(|s| {
		let observer = s.spawn(|| {
			let mut last = Phase::FIRST;
			while !done.load(Ordering::SeqCst) {
				let now = node.resolve_phase();
				assert!(now >= last, "phase went backwards: {last} -> {now}");
				last = now;
			}
		});

		let writers: Vec<_> = (0..4usize)
			.map(|worker| {
				let provider = &provider;
				let node = &node;
				s.spawn(move || {
					let mut cx = ResolveCx::detached();
					for (step, phase) in Phase::ALL.into_iter().skip(1).enumerate() {
						let fail = (step + worker) % 3 == 0;
						let _ = provider.with_jumping_lock(node, phase, &mut cx, |_| {
							if fail { Err(ResolveError::Action(anyhow::anyhow!("flaky"))) } else { Ok(()) }
						});
						let _ = provider.with_read_lock(node, phase, &mut cx, |_| Ok::<_, ResolveError>(()));
					}
				})
			})
			.collect();

		for writer in writers {
			writer.join().unwrap();
		}
		done.store(true, Ordering::SeqCst);
		observer.join().unwrap();
	});
}

#[cfg_attr(test, test)]
pub(crate) fn test_monotonic_phase() {
	inv_monotonic_phase()
}

/// Invariant: an action raising the invalidation signal K times is invoked
/// exactly K + 1 times and its final value is returned.
pub(crate) fn inv_retry_count(k: usize) {
	let mut cx = ResolveCx::detached();
	let mut counter = 0;
	let out = retry_on_invalid_session(&mut cx, |_| {
		let attempt = counter;
		counter += 1;
		if attempt < k {
			return Err(ResolveError::from(InvalidatedSession {
				description: "module(app)".into(),
			}));
		}
		Ok("OK")
	});
	assert_eq!(out.unwrap(), "OK");
	assert_eq!(counter, k + 1);
}

#[cfg_attr(test, test)]
pub(crate) fn test_retry_count() {
	for k in [0, 1, 2, 7] {
		inv_retry_count(k);
	}
}

/// Invariant: a jumping lock reaches a non-adjacent phase where the
/// equivalent sequential write is rejected.
pub(crate) fn inv_jump_mode_bypass() {
	let provider = fast_provider(false);
	let mut cx = ResolveCx::detached();

	let sequential = TestNode::at("seq", Phase::Imports);
	let err = provider
		.with_write_lock(&sequential, Phase::Status, &mut cx, |_| Ok::<_, ResolveError>(()))
		.unwrap_err();
	assert!(matches!(err, ResolveError::Contract(ContractViolation::NonSequential { .. })));
	assert_eq!(sequential.resolve_phase(), Phase::Imports);

	let jumping = TestNode::at("jump", Phase::Imports);
	provider.with_jumping_lock(&jumping, Phase::Status, &mut cx, |_| Ok::<_, ResolveError>(())).unwrap();
	assert_eq!(jumping.resolve_phase(), Phase::Status);
}

#[cfg_attr(test, test)]
pub(crate) fn test_jump_mode_bypass() {
	inv_jump_mode_bypass()
}

#[derive(Debug, Clone, Copy)]
struct Op {
	target: Phase,
	succeed: bool,
	commit: bool,
}

fn op() -> impl Strategy<Value = Op> {
	(0..Phase::ALL.len(), any::<bool>(), any::<bool>()).prop_map(|(idx, succeed, commit)| Op {
		target: Phase::ALL[idx],
		succeed,
		commit,
	})
}

proptest! {
	/// Invariant: a node only ever sits at its last committed phase; failed and
	/// read-only transitions leave it there, and the action runs exactly when
	/// the target is ahead of it.
	#[test]
	fn failure_reversion_matches_model(ops in prop::collection::vec(op(), 1..40)) {
		let provider = LockProvider::default();
		let node = TestNode::new("n");
		let mut cx = ResolveCx::detached();
		let mut committed = Phase::FIRST;

		for op in ops {
			let mut ran = false;
			let out = provider.advance(&node, op.target, op.commit, &mut cx, |_| {
				ran = true;
				if op.succeed { Ok(()) } else { Err(ResolveError::Action(anyhow::anyhow!("boom"))) }
			});

			let ahead = op.target > committed;
			prop_assert_eq!(ran, ahead);
			prop_assert_eq!(out.is_ok(), !ahead || op.succeed);
			if ahead && op.succeed && op.commit {
				committed = op.target;
			}
			prop_assert_eq!(node.resolve_phase(), committed);
			prop_assert!(!node.resolve_state().load().is_in_progress());
		}
	}
}
