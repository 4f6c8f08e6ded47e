//! Error types for client-side routing.

use std::error::Error as StdError;

/// Error type for router operations.
///
/// Navigation never surfaces these to callers of
/// [`Router::navigate`](crate::Router::navigate); they are handed to the
/// configured error handler and the navigation resolves `false`.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
	/// A route key could not be registered.
	#[error("Invalid route '{key}': {reason}")]
	InvalidRoute {
		/// The rejected registration key.
		key: String,
		/// Why the key was rejected.
		reason: String,
	},
	/// A route or not-found handler failed.
	#[error("Handler for '{path}' failed: {source}")]
	HandlerFailed {
		/// Path of the route being rendered.
		path: String,
		/// The handler's error.
		#[source]
		source: HandlerError,
	},
	/// The history backend rejected an update.
	#[error("History update failed: {0}")]
	History(String),
	/// A platform call (DOM, timers, events) failed.
	#[error("Platform error: {0}")]
	Platform(String),
	/// Configuration or history state could not be (de)serialized.
	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
	/// The router was destroyed.
	#[error("Router has been destroyed")]
	Destroyed,
}

/// Error returned by a route handler.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
	message: String,
	#[source]
	source: Option<Box<dyn StdError + 'static>>,
}

impl HandlerError {
	/// Creates an error with a message.
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			source: None,
		}
	}

	/// Creates an error wrapping another error.
	pub fn with_source(message: impl Into<String>, source: impl StdError + 'static) -> Self {
		Self {
			message: message.into(),
			source: Some(Box::new(source)),
		}
	}

	/// Returns the message.
	pub fn message(&self) -> &str {
		&self.message
	}
}

impl From<String> for HandlerError {
	fn from(message: String) -> Self {
		Self::new(message)
	}
}

impl From<&str> for HandlerError {
	fn from(message: &str) -> Self {
		Self::new(message)
	}
}

/// Error returned by a navigation hook.
///
/// Hook errors are logged and never stop a navigation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl From<String> for HookError {
	fn from(message: String) -> Self {
		Self(message)
	}
}

impl From<&str> for HookError {
	fn from(message: &str) -> Self {
		Self(message.to_string())
	}
}
