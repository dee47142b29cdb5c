use crate::cx::ResolveCx;
use crate::error::ResolveFailure;

/// Re-runs `action` until it finishes without the invalidated-session signal.
///
/// Retries are requested on `cx` for the duration of the call and the previous
/// setting is restored on every exit. Other failures propagate on the first
/// occurrence. There is no retry cap or backoff: invalidation is expected to
/// be rare and to settle once the caller observes a fresh session. The loop
/// still stops when `cx` is cancelled.
pub fn retry_on_invalid_session<T, E, F>(cx: &mut ResolveCx, mut action: F) -> Result<T, E>
where
	E: ResolveFailure,
	F: FnMut(&mut ResolveCx) -> Result<T, E>,
{
	let mut scope = cx.retry_scope(true);
	let mut attempt: u64 = 0;
	loop {
		scope.check_cancelled()?;
		attempt += 1;

		let err = match action(&mut *scope) {
			Ok(value) => return Ok(value),
			Err(err) => err,
		};
		let stale = err.invalidated_session().map(|stale| stale.description.clone());
		match stale {
			Some(session) => tracing::debug!(session = %session, attempt, "resolve.retry.invalidated_session"),
			None => return Err(err),
		}
	}
}
