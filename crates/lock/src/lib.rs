//! Lazy, phase-based resolution locking for a shared IR forest.
//!
//! Nodes move monotonically through [`Phase`]s. Many threads may ask for the
//! same node at the same time; [`LockProvider`] guarantees the work for each
//! committed transition runs once, that waiters converge on its result, and
//! that a failed or cancelled attempt leaves the node at its last committed
//! phase. [`retry_on_invalid_session`] wraps top-level operations that must
//! survive their session being invalidated mid-flight.

/// Coarse-grained global and hazardous-phase locks.
mod coarse;
/// Configuration passed to the provider at construction.
pub mod config;
/// Reentrancy and ordering guard.
pub mod contract;
/// Per-node CAS state machine.
mod critical;
/// Per-task resolution context.
pub mod cx;
/// Error taxonomy.
pub mod error;
/// One-shot barrier latch.
pub mod latch;
/// Contention counters.
pub mod metrics;
/// Collaborator traits for nodes and sessions.
pub mod node;
/// Resolution phase ordering.
pub mod phase;
/// Public lock entry points.
pub mod provider;
/// Retry-on-invalidated-session wrapper.
pub mod retry;
/// Atomic per-node resolve state.
pub mod state;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod testing;

pub use config::LockConfig;
pub use contract::ContractMode;
pub use cx::ResolveCx;
pub use error::{ConfigError, ContractViolation, InvalidatedSession, ResolveError, ResolveFailure, Result};
pub use latch::Latch;
pub use metrics::LockMetricsSnapshot;
pub use node::{ResolvableNode, Session, TrackedSession};
pub use phase::Phase;
pub use provider::LockProvider;
pub use retry::retry_on_invalid_session;
pub use state::{ResolveState, ResolveStateCell};
pub use tokio_util::sync::CancellationToken;
