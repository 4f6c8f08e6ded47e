//! Platform seams.
//!
//! The router never reaches for browser globals. Everything it touches
//! outside its own state goes through a [`Platform`]: the history backend,
//! the scroll target, timers, the document (title and navigation events)
//! and a task spawner for navigations started from browser events.
//!
//! [`Platform::browser`] wires the real browser APIs on `wasm32`.
//! [`MemoryPlatform`] provides in-process implementations for native
//! builds and tests.

use crate::history::{HistoryBackend, MemoryHistory};
use crate::route::{Params, Route};
use crate::scroll::{MemoryScroll, ScrollTarget};
use futures::future::LocalBoxFuture;
use serde::{Serialize, Serializer};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Returns the current wall-clock time in milliseconds.
#[cfg(target_arch = "wasm32")]
pub fn now_millis() -> u64 {
	js_sys::Date::now() as u64
}

/// Returns the current wall-clock time in milliseconds.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_millis() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_millis() as u64)
		.unwrap_or_default()
}

/// Outcome carried by a navigation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationStatus {
	/// A registered handler rendered the route.
	Success,
	/// A handler failed.
	Error,
	/// No handler matched; the not-found handler may have rendered.
	NotFound,
}

/// Detail of the `navigation` event dispatched after each navigation.
///
/// Serializes as the route's fields next to `status`, `error` and
/// `timestamp`; the event's dispatch time takes the place of the route's
/// creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationEvent {
	/// The navigated route.
	pub route: Route,
	/// How the navigation ended.
	pub status: NavigationStatus,
	/// Error message for [`NavigationStatus::Error`].
	pub error: Option<String>,
	/// Dispatch time in milliseconds.
	pub timestamp: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventDetail<'a> {
	section: &'a str,
	subsection: &'a str,
	path: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	original_path: Option<&'a str>,
	params: &'a Params,
	query: &'a str,
	popstate: bool,
	status: NavigationStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<&'a str>,
	timestamp: u64,
}

impl Serialize for NavigationEvent {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let route = &self.route;
		EventDetail {
			section: &route.section,
			subsection: &route.subsection,
			path: &route.path,
			original_path: route.original_path.as_deref(),
			params: &route.params,
			query: &route.query,
			popstate: route.popstate,
			status: self.status,
			error: self.error.as_deref(),
			timestamp: self.timestamp,
		}
		.serialize(serializer)
	}
}

impl NavigationEvent {
	/// Creates an event stamped with the current time.
	pub fn new(route: Route, status: NavigationStatus, error: Option<String>) -> Self {
		Self {
			route,
			status,
			error,
			timestamp: now_millis(),
		}
	}
}

/// Document-level side effects of a navigation.
pub trait DocumentSink {
	/// Sets the document title.
	fn set_title(&self, title: &str);

	/// Publishes a navigation event to external listeners.
	fn dispatch_navigation(&self, event: &NavigationEvent);
}

/// Runs futures started outside of an awaiting caller.
pub trait Spawner {
	/// Schedules `task` to run to completion.
	fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// Delayed task execution.
pub trait Scheduler {
	/// Runs `task` once after `delay`.
	fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle;
}

/// Handle to a scheduled task.
///
/// Dropping the handle leaves the task scheduled; call
/// [`TimerHandle::cancel`] to stop it.
pub struct TimerHandle {
	cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerHandle {
	/// Creates a handle that runs `cancel` when cancelled.
	pub fn new(cancel: impl FnOnce() + 'static) -> Self {
		Self {
			cancel: Some(Box::new(cancel)),
		}
	}

	/// Creates a handle for a task that cannot be cancelled.
	pub fn detached() -> Self {
		Self { cancel: None }
	}

	/// Cancels the task if it has not run yet.
	pub fn cancel(mut self) {
		if let Some(cancel) = self.cancel.take() {
			cancel();
		}
	}
}

impl std::fmt::Debug for TimerHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TimerHandle")
			.field("cancellable", &self.cancel.is_some())
			.finish()
	}
}

/// The set of platform services a router runs against.
#[derive(Clone)]
pub struct Platform {
	/// Session history.
	pub history: Rc<dyn HistoryBackend>,
	/// Scrolled viewport or element.
	pub scroll: Rc<dyn ScrollTarget>,
	/// Timer source.
	pub scheduler: Rc<dyn Scheduler>,
	/// Title and event sink.
	pub document: Rc<dyn DocumentSink>,
	/// Background task runner.
	pub spawner: Rc<dyn Spawner>,
}

impl std::fmt::Debug for Platform {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Platform").finish_non_exhaustive()
	}
}

// ============================================================================
// In-memory platform
// ============================================================================

/// In-process platform with inspectable state.
///
/// Every field is a cheap handle; clones share state with the [`Platform`]
/// returned by [`MemoryPlatform::platform`].
#[derive(Clone, Default)]
pub struct MemoryPlatform {
	/// History entries.
	pub history: MemoryHistory,
	/// Scroll offset.
	pub scroll: MemoryScroll,
	/// Virtual clock.
	pub scheduler: ManualScheduler,
	/// Recorded titles and events.
	pub document: MemoryDocument,
	/// Spawned tasks.
	pub tasks: TaskQueue,
}

impl MemoryPlatform {
	/// Creates a platform starting at `/`.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a platform whose history starts at `url`.
	pub fn at(url: &str) -> Self {
		Self {
			history: MemoryHistory::new(url),
			..Self::default()
		}
	}

	/// Returns the [`Platform`] view of these services.
	pub fn platform(&self) -> Platform {
		Platform {
			history: Rc::new(self.history.clone()),
			scroll: Rc::new(self.scroll.clone()),
			scheduler: Rc::new(self.scheduler.clone()),
			document: Rc::new(self.document.clone()),
			spawner: Rc::new(self.tasks.clone()),
		}
	}
}

impl std::fmt::Debug for MemoryPlatform {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemoryPlatform")
			.field("history", &self.history)
			.field("scroll", &self.scroll)
			.field("document", &self.document)
			.field("pending_tasks", &self.tasks.len())
			.finish()
	}
}

#[derive(Default)]
struct SchedulerState {
	now: Duration,
	next_id: u64,
	tasks: BTreeMap<(Duration, u64), Box<dyn FnOnce()>>,
}

/// Scheduler driven by a virtual clock.
///
/// Tasks run only when [`ManualScheduler::advance`] moves the clock past
/// their due time.
#[derive(Clone, Default)]
pub struct ManualScheduler {
	state: Rc<RefCell<SchedulerState>>,
}

impl ManualScheduler {
	/// Creates a scheduler at time zero.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the virtual time.
	pub fn now(&self) -> Duration {
		self.state.borrow().now
	}

	/// Returns the number of tasks still scheduled.
	pub fn pending(&self) -> usize {
		self.state.borrow().tasks.len()
	}

	/// Moves the clock forward by `by`, running due tasks in order.
	///
	/// Tasks scheduled by running tasks are picked up if they fall due
	/// within the same window.
	pub fn advance(&self, by: Duration) {
		let target = self.now() + by;
		loop {
			let next = {
				let mut state = self.state.borrow_mut();
				let due = state.tasks.keys().next().copied();
				match due {
					Some(key) if key.0 <= target => {
						state.now = key.0;
						state.tasks.remove(&key)
					}
					_ => None,
				}
			};
			match next {
				Some(task) => task(),
				None => break,
			}
		}
		self.state.borrow_mut().now = target;
	}
}

impl Scheduler for ManualScheduler {
	fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle {
		let key = {
			let mut state = self.state.borrow_mut();
			let key = (state.now + delay, state.next_id);
			state.next_id += 1;
			state.tasks.insert(key, task);
			key
		};

		let weak: Weak<RefCell<SchedulerState>> = Rc::downgrade(&self.state);
		TimerHandle::new(move || {
			if let Some(state) = weak.upgrade() {
				state.borrow_mut().tasks.remove(&key);
			}
		})
	}
}

impl std::fmt::Debug for ManualScheduler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ManualScheduler")
			.field("now", &self.now())
			.field("pending", &self.pending())
			.finish()
	}
}

#[derive(Debug, Default)]
struct DocumentState {
	titles: Vec<String>,
	events: Vec<NavigationEvent>,
}

/// Document sink that records what it receives.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
	state: Rc<RefCell<DocumentState>>,
}

impl MemoryDocument {
	/// Creates an empty document.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the last title set.
	pub fn title(&self) -> Option<String> {
		self.state.borrow().titles.last().cloned()
	}

	/// Returns every dispatched event, oldest first.
	pub fn events(&self) -> Vec<NavigationEvent> {
		self.state.borrow().events.clone()
	}

	/// Returns the last dispatched event.
	pub fn last_event(&self) -> Option<NavigationEvent> {
		self.state.borrow().events.last().cloned()
	}
}

impl DocumentSink for MemoryDocument {
	fn set_title(&self, title: &str) {
		self.state.borrow_mut().titles.push(title.to_string());
	}

	fn dispatch_navigation(&self, event: &NavigationEvent) {
		self.state.borrow_mut().events.push(event.clone());
	}
}

/// Spawner that queues tasks until they are drained.
#[derive(Clone, Default)]
pub struct TaskQueue {
	tasks: Rc<RefCell<VecDeque<LocalBoxFuture<'static, ()>>>>,
}

impl TaskQueue {
	/// Creates an empty queue.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the number of queued tasks.
	pub fn len(&self) -> usize {
		self.tasks.borrow().len()
	}

	/// Returns `true` when nothing is queued.
	pub fn is_empty(&self) -> bool {
		self.tasks.borrow().is_empty()
	}

	/// Runs queued tasks one after another until the queue is empty,
	/// including tasks queued while draining.
	pub async fn run_until_idle(&self) {
		loop {
			let next = self.tasks.borrow_mut().pop_front();
			match next {
				Some(task) => task.await,
				None => break,
			}
		}
	}
}

impl Spawner for TaskQueue {
	fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
		self.tasks.borrow_mut().push_back(task);
	}
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::cell::Cell;

	#[rstest]
	fn test_manual_scheduler_runs_due_tasks_in_order() {
		// Arrange
		let scheduler = ManualScheduler::new();
		let log = Rc::new(RefCell::new(Vec::new()));
		for (delay, label) in [(150, "verify"), (50, "apply")] {
			let log = Rc::clone(&log);
			scheduler.schedule(
				Duration::from_millis(delay),
				Box::new(move || log.borrow_mut().push(label)),
			);
		}

		// Act
		scheduler.advance(Duration::from_millis(100));
		let after_first = log.borrow().clone();
		scheduler.advance(Duration::from_millis(100));

		// Assert
		assert_eq!(after_first, vec!["apply"]);
		assert_eq!(*log.borrow(), vec!["apply", "verify"]);
		assert_eq!(scheduler.pending(), 0);
		assert_eq!(scheduler.now(), Duration::from_millis(200));
	}

	#[rstest]
	fn test_cancelled_task_never_runs() {
		let scheduler = ManualScheduler::new();
		let ran = Rc::new(Cell::new(false));
		let flag = Rc::clone(&ran);

		let handle = scheduler.schedule(Duration::from_millis(10), Box::new(move || flag.set(true)));
		handle.cancel();
		scheduler.advance(Duration::from_millis(50));

		assert!(!ran.get());
		assert_eq!(scheduler.pending(), 0);
	}

	#[rstest]
	fn test_memory_document_records() {
		let document = MemoryDocument::new();
		document.set_title("Buttons");
		document.dispatch_navigation(&NavigationEvent::new(
			Route::default(),
			NavigationStatus::NotFound,
			None,
		));

		assert_eq!(document.title().as_deref(), Some("Buttons"));
		assert_eq!(
			document.last_event().map(|e| e.status),
			Some(NavigationStatus::NotFound)
		);
	}

	#[rstest]
	fn test_navigation_event_serializes_flat() {
		let route = Route {
			section: "components".to_string(),
			path: "/components".to_string(),
			..Route::default()
		};
		let event = NavigationEvent::new(route, NavigationStatus::Success, None);

		let json = serde_json::to_value(&event).unwrap();

		assert_eq!(json["status"], "success");
		assert_eq!(json["section"], "components");
		assert!(json.get("error").is_none());
	}

	#[rstest]
	fn test_navigation_event_writes_one_timestamp() {
		// Arrange
		let route = Route {
			section: "components".to_string(),
			path: "/components".to_string(),
			timestamp: 1,
			..Route::default()
		};
		let event = NavigationEvent::new(route, NavigationStatus::Success, None);

		// Act
		let json = serde_json::to_string(&event).unwrap();

		// Assert
		assert_eq!(json.matches("\"timestamp\"").count(), 1);
		let value: serde_json::Value = serde_json::from_str(&json).unwrap();
		assert_eq!(value["timestamp"], event.timestamp);
	}

	#[tokio::test]
	async fn test_task_queue_drains_nested_tasks() {
		// Arrange
		let queue = TaskQueue::new();
		let count = Rc::new(Cell::new(0));
		let inner_queue = queue.clone();
		let inner_count = Rc::clone(&count);
		queue.spawn(Box::pin(async move {
			inner_count.set(inner_count.get() + 1);
			let nested = Rc::clone(&inner_count);
			inner_queue.spawn(Box::pin(async move {
				nested.set(nested.get() + 1);
			}));
		}));

		// Act
		queue.run_until_idle().await;

		// Assert
		assert_eq!(count.get(), 2);
		assert!(queue.is_empty());
	}
}
