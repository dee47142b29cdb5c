//! Error taxonomy for lock acquisition and resolution.

use thiserror::Error;

use crate::phase::Phase;

/// Recoverable signal raised when a computation discovers it is running
/// against a session that has since been invalidated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("session invalidated: {description}")]
pub struct InvalidatedSession {
	/// Human-readable description of the stale session.
	pub description: String,
}

/// Illegal lock request made by a caller. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
	/// A nested request on the same task would wait on itself.
	#[error("cannot resolve {node} to {requested} while resolving {in_progress} on the same task")]
	Reentrant {
		node: String,
		requested: Phase,
		in_progress: Phase,
	},
	/// A sequential write tried to skip phases.
	#[error("cannot advance {node} from {from} to {requested}: next phase is {expected}; use a jumping lock")]
	NonSequential {
		node: String,
		from: Phase,
		requested: Phase,
		expected: Phase,
	},
}

/// Engine error.
#[derive(Debug, Error)]
pub enum ResolveError {
	/// The ambient operation was cancelled.
	#[error("resolution cancelled")]
	Cancelled,
	#[error(transparent)]
	InvalidatedSession(#[from] InvalidatedSession),
	#[error("lock contract violated: {0}")]
	Contract(#[from] ContractViolation),
	/// Failure raised by resolution logic.
	#[error(transparent)]
	Action(#[from] anyhow::Error),
}

impl ResolveError {
	/// Whether this is the cancellation signal.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled)
	}
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Caller error types the retry wrapper can see through.
///
/// Implement this for an application error enum that embeds [`ResolveError`]
/// so [`crate::retry_on_invalid_session`] can tell the invalidation signal
/// apart from real failures.
pub trait ResolveFailure: From<ResolveError> {
	/// Returns the invalidation payload if this error is the stale-session signal.
	fn invalidated_session(&self) -> Option<&InvalidatedSession>;
}

impl ResolveFailure for ResolveError {
	fn invalidated_session(&self) -> Option<&InvalidatedSession> {
		match self {
			Self::InvalidatedSession(stale) => Some(stale),
			_ => None,
		}
	}
}

/// Invalid [`crate::LockConfig`] value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
	#[error("{field} must be greater than zero")]
	ZeroInterval { field: &'static str },
}
