//! Session-invalidated marker and the navigation hook the host application implements.
//!
//! A failed refresh never navigates on its own. The client purges credentials, hands a
//! [`SessionInvalidated`] event to the configured [`SessionObserver`], and returns the same
//! value inside [`Error::SessionInvalidated`] so callers that only look at results can react too.

// self
use crate::{_prelude::*, error::RefreshError};

/// Marker carried by refresh failures; the presentation layer navigates to `login_route`.
#[derive(Debug, ThisError)]
#[error("Session invalidated; navigate to `{login_route}`.")]
pub struct SessionInvalidated {
	/// Unauthenticated entry point the host should navigate to.
	pub login_route: String,
	/// Refresh failure that ended the session.
	#[source]
	pub source: RefreshError,
}
impl SessionInvalidated {
	/// Creates a marker for the provided login route and refresh failure.
	pub fn new(login_route: impl Into<String>, source: RefreshError) -> Self {
		Self { login_route: login_route.into(), source }
	}
}

/// Navigation surface notified once per request whose refresh failed.
pub trait SessionObserver
where
	Self: Send + Sync,
{
	/// Called after the credential store has been purged.
	fn session_invalidated(&self, event: &SessionInvalidated);
}

/// Observer that only counts invalidations and remembers the last requested route.
///
/// Handy for headless hosts (CLIs, workers) that poll instead of navigating.
#[derive(Debug, Default)]
pub struct RecordingObserver {
	routes: Mutex<Vec<String>>,
}
impl RecordingObserver {
	/// Returns how many invalidations were observed.
	pub fn count(&self) -> usize {
		self.routes.lock().len()
	}

	/// Returns the most recent login route requested, if any.
	pub fn last_route(&self) -> Option<String> {
		self.routes.lock().last().cloned()
	}
}
impl SessionObserver for RecordingObserver {
	fn session_invalidated(&self, event: &SessionInvalidated) {
		self.routes.lock().push(event.login_route.clone());
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recording_observer_tracks_routes() {
		let observer = RecordingObserver::default();

		assert_eq!(observer.count(), 0);
		assert_eq!(observer.last_route(), None);

		observer.session_invalidated(&SessionInvalidated::new(
			"/login",
			RefreshError::MissingRefreshToken,
		));

		assert_eq!(observer.count(), 1);
		assert_eq!(observer.last_route().as_deref(), Some("/login"));
	}
}
