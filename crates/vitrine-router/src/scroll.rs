//! Per-path scroll position memory.
//!
//! Restoring a position is deferred: the stored offset is applied
//! [`APPLY_DELAY`] after the request so the new content can lay out, then
//! checked again [`VERIFY_DELAY`] later and re-applied when the browser
//! moved it. Pending timers are cancelled by [`ScrollPositionStore::cancel_pending`],
//! which the router calls at the start of every navigation.

use crate::config::RouterConfig;
use crate::platform::{Scheduler, TimerHandle, now_millis};
use crate::route::Route;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tracing::trace;

/// Delay before a stored position is applied.
pub const APPLY_DELAY: Duration = Duration::from_millis(50);

/// Delay between applying a position and verifying it.
pub const VERIFY_DELAY: Duration = Duration::from_millis(100);

/// Offsets closer than this to the target count as restored.
const TOLERANCE: f64 = 1.0;

/// The scrolled surface: the window, or an element selected by CSS.
pub trait ScrollTarget {
	/// Returns the vertical offset of `element`, or of the window.
	fn offset(&self, element: Option<&str>) -> f64;

	/// Scrolls `element`, or the window, to `y`.
	fn scroll_to(&self, element: Option<&str>, y: f64);
}

/// A saved offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedPosition {
	/// Vertical offset in pixels.
	pub position: f64,
	/// Save time in milliseconds.
	pub timestamp: u64,
}

#[derive(Debug, Clone)]
struct ScrollSettings {
	enabled: bool,
	element: Option<String>,
}

impl From<&RouterConfig> for ScrollSettings {
	fn from(config: &RouterConfig) -> Self {
		Self {
			enabled: config.scroll_restoration,
			element: config.scroll_element.clone(),
		}
	}
}

/// Saves and restores scroll offsets keyed by route path.
pub struct ScrollPositionStore {
	target: Rc<dyn ScrollTarget>,
	scheduler: Rc<dyn Scheduler>,
	positions: RefCell<HashMap<String, SavedPosition>>,
	pending: RefCell<Vec<TimerHandle>>,
	settings: RefCell<ScrollSettings>,
}

impl ScrollPositionStore {
	/// Creates an empty store.
	pub fn new(target: Rc<dyn ScrollTarget>, scheduler: Rc<dyn Scheduler>, config: &RouterConfig) -> Self {
		Self {
			target,
			scheduler,
			positions: RefCell::new(HashMap::new()),
			pending: RefCell::new(Vec::new()),
			settings: RefCell::new(ScrollSettings::from(config)),
		}
	}

	/// Updates the enabled flag and scrolled element.
	pub fn configure(&self, config: &RouterConfig) {
		*self.settings.borrow_mut() = ScrollSettings::from(config);
	}

	/// Records the current offset under `route`'s path.
	///
	/// An offset of zero forgets the path instead. Does nothing without a
	/// route, for a route without a path, or while restoration is disabled.
	pub fn save_scroll_position(&self, route: Option<&Route>) {
		let Some(route) = route.filter(|r| !r.path.is_empty()) else {
			return;
		};
		let settings = self.settings.borrow();
		if !settings.enabled {
			return;
		}
		let position = self.target.offset(settings.element.as_deref());
		if position <= 0.0 {
			self.positions.borrow_mut().remove(&route.path);
			return;
		}
		trace!(path = %route.path, position, "Saving scroll position");
		self.positions.borrow_mut().insert(
			route.path.clone(),
			SavedPosition {
				position,
				timestamp: now_millis(),
			},
		);
	}

	/// Schedules restoration of `route`'s saved offset.
	///
	/// Returns `true` when a saved offset exists. Without one, scrolls to the
	/// top when `reset_if_not_found` is set and returns `false`.
	pub fn restore_scroll_position(&self, route: Option<&Route>, reset_if_not_found: bool) -> bool {
		let Some(route) = route.filter(|r| !r.path.is_empty()) else {
			return false;
		};
		let settings = self.settings.borrow().clone();
		if !settings.enabled {
			return false;
		}

		let saved = self.positions.borrow().get(&route.path).copied();
		let Some(saved) = saved else {
			if reset_if_not_found {
				self.reset_scroll();
			}
			return false;
		};

		trace!(path = %route.path, position = saved.position, "Restoring scroll position");
		let target = saved.position;

		let apply = {
			let scroll = Rc::clone(&self.target);
			let element = settings.element.clone();
			move || scroll.scroll_to(element.as_deref(), target)
		};
		let verify = {
			let scroll = Rc::clone(&self.target);
			let element = settings.element;
			move || {
				let current = scroll.offset(element.as_deref());
				if (current - target).abs() > TOLERANCE {
					scroll.scroll_to(element.as_deref(), target);
				}
			}
		};

		let mut pending = self.pending.borrow_mut();
		pending.push(self.scheduler.schedule(APPLY_DELAY, Box::new(apply)));
		pending.push(
			self.scheduler
				.schedule(APPLY_DELAY + VERIFY_DELAY, Box::new(verify)),
		);
		true
	}

	/// Scrolls to the top immediately.
	pub fn reset_scroll(&self) {
		let element = self.settings.borrow().element.clone();
		self.target.scroll_to(element.as_deref(), 0.0);
	}

	/// Restores the offset for a back/forward move, scrolling to the top
	/// when none was saved.
	pub fn handle_pop_state_scroll(&self, route: Option<&Route>, _previous: Option<&Route>) -> bool {
		self.restore_scroll_position(route, true)
	}

	/// Cancels scheduled restorations that have not run yet.
	pub fn cancel_pending(&self) {
		for handle in self.pending.borrow_mut().drain(..) {
			handle.cancel();
		}
	}

	/// Forgets every saved offset and cancels pending restorations.
	pub fn clear(&self) {
		self.cancel_pending();
		self.positions.borrow_mut().clear();
	}

	/// Returns the saved offset for `path`.
	pub fn position_for(&self, path: &str) -> Option<SavedPosition> {
		self.positions.borrow().get(path).copied()
	}

	/// Returns a snapshot of every saved offset.
	pub fn positions(&self) -> HashMap<String, SavedPosition> {
		self.positions.borrow().clone()
	}
}

impl std::fmt::Debug for ScrollPositionStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ScrollPositionStore")
			.field("positions", &self.positions.borrow().len())
			.field("pending", &self.pending.borrow().len())
			.field("settings", &self.settings.borrow())
			.finish()
	}
}

#[derive(Debug, Default)]
struct MemoryScrollState {
	offsets: HashMap<Option<String>, f64>,
	calls: Vec<(Option<String>, f64)>,
	ignored: usize,
}

/// In-memory scroll surface.
#[derive(Debug, Clone, Default)]
pub struct MemoryScroll {
	state: Rc<RefCell<MemoryScrollState>>,
}

impl MemoryScroll {
	/// Creates a surface scrolled to the top.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the window offset, as if the user scrolled.
	pub fn set_offset(&self, y: f64) {
		self.state.borrow_mut().offsets.insert(None, y);
	}

	/// Sets an element's offset.
	pub fn set_element_offset(&self, element: &str, y: f64) {
		self.state
			.borrow_mut()
			.offsets
			.insert(Some(element.to_string()), y);
	}

	/// Returns the window offset.
	pub fn window_offset(&self) -> f64 {
		self.offset(None)
	}

	/// Makes the next `count` scroll requests have no effect.
	pub fn ignore_next_scrolls(&self, count: usize) {
		self.state.borrow_mut().ignored = count;
	}

	/// Returns every scroll request, oldest first.
	pub fn scroll_calls(&self) -> Vec<(Option<String>, f64)> {
		self.state.borrow().calls.clone()
	}
}

impl ScrollTarget for MemoryScroll {
	fn offset(&self, element: Option<&str>) -> f64 {
		self.state
			.borrow()
			.offsets
			.get(&element.map(str::to_string))
			.copied()
			.unwrap_or(0.0)
	}

	fn scroll_to(&self, element: Option<&str>, y: f64) {
		let mut state = self.state.borrow_mut();
		let element = element.map(str::to_string);
		state.calls.push((element.clone(), y));
		if state.ignored > 0 {
			state.ignored -= 1;
			return;
		}
		state.offsets.insert(element, y);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::platform::ManualScheduler;
	use rstest::{fixture, rstest};

	struct Fixture {
		scroll: MemoryScroll,
		scheduler: ManualScheduler,
		store: ScrollPositionStore,
	}

	fn build(config: &RouterConfig) -> Fixture {
		let scroll = MemoryScroll::new();
		let scheduler = ManualScheduler::new();
		let store = ScrollPositionStore::new(Rc::new(scroll.clone()), Rc::new(scheduler.clone()), config);
		Fixture {
			scroll,
			scheduler,
			store,
		}
	}

	#[fixture]
	fn fixture() -> Fixture {
		build(&RouterConfig::default())
	}

	fn route(path: &str) -> Route {
		Route {
			path: path.to_string(),
			..Route::default()
		}
	}

	#[rstest]
	fn test_save_then_restore_after_delay(fixture: Fixture) {
		// Arrange
		fixture.scroll.set_offset(420.0);
		fixture.store.save_scroll_position(Some(&route("/components")));
		fixture.scroll.set_offset(0.0);

		// Act
		let restored = fixture.store.restore_scroll_position(Some(&route("/components")), false);
		let before = fixture.scroll.window_offset();
		fixture.scheduler.advance(APPLY_DELAY);

		// Assert
		assert!(restored);
		assert_eq!(before, 0.0);
		assert_eq!(fixture.scroll.window_offset(), 420.0);
	}

	#[rstest]
	fn test_verification_reapplies(fixture: Fixture) {
		// Arrange
		fixture.scroll.set_offset(300.0);
		fixture.store.save_scroll_position(Some(&route("/docs")));
		fixture.scroll.set_offset(0.0);
		fixture.scroll.ignore_next_scrolls(1);

		// Act
		fixture.store.restore_scroll_position(Some(&route("/docs")), false);
		fixture.scheduler.advance(APPLY_DELAY);
		let after_apply = fixture.scroll.window_offset();
		fixture.scheduler.advance(VERIFY_DELAY);

		// Assert
		assert_eq!(after_apply, 0.0);
		assert_eq!(fixture.scroll.window_offset(), 300.0);
		assert_eq!(fixture.scroll.scroll_calls().len(), 2);
	}

	#[rstest]
	fn test_verification_skips_when_close_enough(fixture: Fixture) {
		fixture.scroll.set_offset(300.0);
		fixture.store.save_scroll_position(Some(&route("/docs")));

		fixture.store.restore_scroll_position(Some(&route("/docs")), false);
		fixture.scheduler.advance(APPLY_DELAY + VERIFY_DELAY);

		assert_eq!(fixture.scroll.scroll_calls().len(), 1);
	}

	#[rstest]
	fn test_missing_position_resets_when_asked(fixture: Fixture) {
		fixture.scroll.set_offset(90.0);

		let restored = fixture.store.restore_scroll_position(Some(&route("/new")), true);

		assert!(!restored);
		assert_eq!(fixture.scroll.window_offset(), 0.0);
	}

	#[rstest]
	fn test_missing_position_without_reset_leaves_offset(fixture: Fixture) {
		fixture.scroll.set_offset(90.0);

		let restored = fixture.store.restore_scroll_position(Some(&route("/new")), false);

		assert!(!restored);
		assert_eq!(fixture.scroll.window_offset(), 90.0);
	}

	#[rstest]
	fn test_cancel_pending_stops_restoration(fixture: Fixture) {
		fixture.scroll.set_offset(200.0);
		fixture.store.save_scroll_position(Some(&route("/a")));
		fixture.scroll.set_offset(0.0);
		fixture.store.restore_scroll_position(Some(&route("/a")), false);

		fixture.store.cancel_pending();
		fixture.scheduler.advance(Duration::from_secs(1));

		assert_eq!(fixture.scroll.window_offset(), 0.0);
		assert_eq!(fixture.scheduler.pending(), 0);
	}

	#[rstest]
	fn test_disabled_store_is_inert() {
		let fixture = build(&RouterConfig {
			scroll_restoration: false,
			..RouterConfig::default()
		});
		fixture.scroll.set_offset(50.0);

		fixture.store.save_scroll_position(Some(&route("/a")));
		let restored = fixture.store.restore_scroll_position(Some(&route("/a")), true);

		assert!(!restored);
		assert!(fixture.store.positions().is_empty());
		assert_eq!(fixture.scroll.window_offset(), 50.0);
	}

	#[rstest]
	fn test_scroll_element_is_used() {
		let fixture = build(&RouterConfig {
			scroll_element: Some("#content".to_string()),
			..RouterConfig::default()
		});
		fixture.scroll.set_element_offset("#content", 75.0);
		fixture.scroll.set_offset(10.0);

		fixture.store.save_scroll_position(Some(&route("/a")));

		assert_eq!(fixture.store.position_for("/a").map(|p| p.position), Some(75.0));
	}

	#[rstest]
	fn test_pathless_routes_are_ignored(fixture: Fixture) {
		fixture.scroll.set_offset(10.0);
		fixture.store.save_scroll_position(None);
		fixture.store.save_scroll_position(Some(&route("")));

		assert!(fixture.store.positions().is_empty());
		assert!(!fixture.store.restore_scroll_position(None, true));
	}

	#[rstest]
	fn test_top_of_page_is_not_stored(fixture: Fixture) {
		fixture.store.save_scroll_position(Some(&route("/a")));
		assert!(fixture.store.positions().is_empty());

		fixture.scroll.set_offset(120.0);
		fixture.store.save_scroll_position(Some(&route("/a")));
		assert_eq!(fixture.store.position_for("/a").map(|p| p.position), Some(120.0));

		fixture.scroll.set_offset(0.0);
		fixture.store.save_scroll_position(Some(&route("/a")));
		assert!(fixture.store.position_for("/a").is_none());
	}

	#[rstest]
	fn test_clear_forgets_positions(fixture: Fixture) {
		fixture.scroll.set_offset(10.0);
		fixture.store.save_scroll_position(Some(&route("/a")));

		fixture.store.clear();

		assert!(fixture.store.position_for("/a").is_none());
	}
}
