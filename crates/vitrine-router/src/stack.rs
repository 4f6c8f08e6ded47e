//! Bounded navigation stack.

use crate::config::DEFAULT_MAX_STACK_SIZE;
use crate::platform::now_millis;
use crate::route::Route;
use std::collections::VecDeque;

/// Recently visited routes, oldest first.
///
/// `current` is always the last entry and `previous` the one before it.
/// When the bound is exceeded the oldest entries are dropped.
#[derive(Debug, Clone)]
pub struct NavigationStack {
	entries: VecDeque<Route>,
	max_size: usize,
}

impl Default for NavigationStack {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_STACK_SIZE)
	}
}

impl NavigationStack {
	/// Creates an empty stack holding at most `max_size` routes.
	///
	/// A bound of zero is treated as one.
	pub fn new(max_size: usize) -> Self {
		Self {
			entries: VecDeque::new(),
			max_size: max_size.max(1),
		}
	}

	/// Appends a copy of `route` stamped with the current time, making it
	/// current. Returns the stored copy.
	pub fn push(&mut self, route: &Route) -> Route {
		let mut stored = route.clone();
		stored.timestamp = now_millis();
		self.entries.push_back(stored.clone());
		self.trim();
		stored
	}

	fn trim(&mut self) {
		while self.entries.len() > self.max_size {
			self.entries.pop_front();
		}
	}

	/// Returns the current route.
	pub fn current(&self) -> Option<&Route> {
		self.entries.back()
	}

	/// Returns the route before the current one.
	pub fn previous(&self) -> Option<&Route> {
		self.entries.len().checked_sub(2).and_then(|i| self.entries.get(i))
	}

	/// Returns a copy of every entry, oldest first.
	pub fn to_vec(&self) -> Vec<Route> {
		self.entries.iter().cloned().collect()
	}

	/// Returns the number of entries.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` when no route was pushed.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Returns the bound.
	pub fn max_size(&self) -> usize {
		self.max_size
	}

	/// Changes the bound, dropping the oldest entries if needed.
	///
	/// A bound of zero is treated as one.
	pub fn set_max_size(&mut self, max_size: usize) {
		self.max_size = max_size.max(1);
		self.trim();
	}

	/// Removes every entry.
	pub fn clear(&mut self) {
		self.entries.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn route(section: &str) -> Route {
		Route {
			section: section.to_string(),
			path: format!("/{}", section),
			..Route::default()
		}
	}

	fn sections(stack: &NavigationStack) -> Vec<String> {
		stack.to_vec().into_iter().map(|r| r.section).collect()
	}

	#[rstest]
	fn test_current_and_previous() {
		let mut stack = NavigationStack::default();

		stack.push(&route("a"));
		assert_eq!(stack.current().map(|r| r.section.as_str()), Some("a"));
		assert!(stack.previous().is_none());

		stack.push(&route("b"));
		assert_eq!(stack.current().map(|r| r.section.as_str()), Some("b"));
		assert_eq!(stack.previous().map(|r| r.section.as_str()), Some("a"));
	}

	#[rstest]
	fn test_push_stamps_copy() {
		let mut stack = NavigationStack::default();
		let original = route("a");

		let stored = stack.push(&original);

		assert_eq!(original.timestamp, 0);
		assert!(stored.timestamp > 0);
	}

	#[rstest]
	fn test_bound_drops_oldest() {
		let mut stack = NavigationStack::new(3);

		for section in ["a", "b", "c", "d", "e"] {
			stack.push(&route(section));
		}

		assert_eq!(sections(&stack), vec!["c", "d", "e"]);
		assert_eq!(stack.previous().map(|r| r.section.as_str()), Some("d"));
	}

	#[rstest]
	fn test_shrinking_keeps_tail_pointers() {
		// Arrange
		let mut stack = NavigationStack::new(10);
		for section in ["a", "b", "c", "d"] {
			stack.push(&route(section));
		}

		// Act
		stack.set_max_size(2);

		// Assert
		assert_eq!(sections(&stack), vec!["c", "d"]);
		assert_eq!(stack.current().map(|r| r.section.as_str()), Some("d"));
		assert_eq!(stack.previous().map(|r| r.section.as_str()), Some("c"));
	}

	#[rstest]
	#[case(0, 1)]
	#[case(1, 1)]
	#[case(5, 5)]
	fn test_bound_is_at_least_one(#[case] requested: usize, #[case] expected: usize) {
		let mut stack = NavigationStack::new(requested);
		stack.push(&route("a"));
		stack.push(&route("b"));

		assert_eq!(stack.max_size(), expected);
		assert_eq!(stack.len(), expected.min(2));
		assert_eq!(stack.current().map(|r| r.section.as_str()), Some("b"));
	}

	#[rstest]
	fn test_clear() {
		let mut stack = NavigationStack::default();
		stack.push(&route("a"));

		stack.clear();

		assert!(stack.is_empty());
		assert!(stack.current().is_none());
	}
}
