//! Session history integration.
//!
//! [`HistoryAdapter`] turns routes into history entries and browser
//! locations back into router paths, honoring the configured mode and root.
//! The backend behind it is either the browser History API or
//! [`MemoryHistory`].

use crate::config::{HistoryMode, RouterConfig};
use crate::error::RouterError;
use crate::platform::now_millis;
use crate::route::Route;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// State object stored with each history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
	/// The route, stamped at the time the entry was written.
	#[serde(flatten)]
	pub route: Route,
}

impl HistoryState {
	/// Stamps `route` with the current time and the popstate flag.
	pub fn new(route: &Route, popstate: bool) -> Self {
		let mut route = route.clone();
		route.timestamp = now_millis();
		route.popstate = popstate;
		Self { route }
	}
}

/// Location split the way browsers expose it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawLocation {
	/// Path part, starting with `/`.
	pub pathname: String,
	/// Query part including `?`, or empty.
	pub search: String,
	/// Fragment including `#`, or empty.
	pub hash: String,
}

impl RawLocation {
	/// Splits a URL such as `/docs/?a=1#top`.
	pub fn parse(url: &str) -> Self {
		let (rest, hash) = match url.find('#') {
			Some(idx) => (&url[..idx], &url[idx..]),
			None => (url, ""),
		};
		let (pathname, search) = match rest.find('?') {
			Some(idx) => (&rest[..idx], &rest[idx..]),
			None => (rest, ""),
		};
		let pathname = if pathname.starts_with('/') {
			pathname.to_string()
		} else {
			format!("/{}", pathname)
		};
		Self {
			pathname,
			search: search.to_string(),
			hash: hash.to_string(),
		}
	}
}

/// Browser back/forward notification.
#[derive(Debug, Clone, PartialEq)]
pub struct PopStateEvent {
	/// State attached to the entry, if it was written by the router.
	pub state: Option<HistoryState>,
	/// Location after the move.
	pub location: RawLocation,
}

/// Callback receiving popstate notifications.
pub type PopStateListener = Rc<dyn Fn(PopStateEvent)>;

/// Session history operations.
pub trait HistoryBackend {
	/// Appends an entry after the current one.
	fn push(&self, state: &HistoryState, url: &str) -> Result<(), RouterError>;

	/// Replaces the current entry.
	fn replace(&self, state: &HistoryState, url: &str) -> Result<(), RouterError>;

	/// Moves through history by `delta` entries.
	fn go(&self, delta: i32);

	/// Returns the number of entries.
	fn len(&self) -> usize;

	/// Returns the current location.
	fn location(&self) -> RawLocation;

	/// Installs the popstate listener, replacing an earlier one.
	fn subscribe(&self, listener: PopStateListener) -> Result<(), RouterError>;

	/// Removes the popstate listener.
	fn unsubscribe(&self);

	/// Turns off the browser's own scroll restoration.
	fn set_manual_scroll_restoration(&self) {}
}

/// Removes the application root from a browser pathname.
pub fn strip_root(pathname: &str, root: &str) -> String {
	let root = root.trim_end_matches('/');
	let stripped = if root.is_empty() {
		pathname
	} else if pathname == root {
		"/"
	} else {
		match pathname.strip_prefix(root) {
			Some(rest) if rest.starts_with('/') => rest,
			_ => pathname,
		}
	};
	if stripped.starts_with('/') {
		stripped.to_string()
	} else {
		format!("/{}", stripped)
	}
}

#[derive(Debug, Clone)]
struct UrlSettings {
	mode: HistoryMode,
	root: String,
	scroll_restoration: bool,
}

impl From<&RouterConfig> for UrlSettings {
	fn from(config: &RouterConfig) -> Self {
		Self {
			mode: config.mode,
			root: config.normalized_root(),
			scroll_restoration: config.scroll_restoration,
		}
	}
}

/// Maps routes to history entries and back.
pub struct HistoryAdapter {
	backend: Rc<dyn HistoryBackend>,
	listener: PopStateListener,
	settings: RefCell<UrlSettings>,
}

impl HistoryAdapter {
	/// Creates an adapter forwarding popstate notifications to `listener`.
	pub fn new(backend: Rc<dyn HistoryBackend>, listener: PopStateListener, config: &RouterConfig) -> Self {
		Self {
			backend,
			listener,
			settings: RefCell::new(UrlSettings::from(config)),
		}
	}

	/// Installs the popstate listener and takes over scroll restoration when
	/// it is enabled.
	///
	/// # Errors
	///
	/// Returns the backend's error when the listener cannot be installed.
	pub fn init(&self) -> Result<(), RouterError> {
		self.backend.subscribe(Rc::clone(&self.listener))?;
		if self.settings.borrow().scroll_restoration {
			self.backend.set_manual_scroll_restoration();
		}
		Ok(())
	}

	/// Updates mode, root and scroll settings.
	pub fn set_config(&self, config: &RouterConfig) {
		*self.settings.borrow_mut() = UrlSettings::from(config);
	}

	/// Returns the browser URL for a router path.
	///
	/// The query string is not part of the URL; it travels in the entry's
	/// state.
	pub fn url_for(&self, path: &str) -> String {
		let settings = self.settings.borrow();
		let path = path.split_once('?').map_or(path, |(before, _)| before);
		let relative = path.trim_start_matches('/');
		match settings.mode {
			HistoryMode::History => format!("{}{}", settings.root, relative),
			HistoryMode::Hash => format!("{}#/{}", settings.root, relative),
		}
	}

	/// Returns the router path, with query, for a browser location.
	pub fn path_from_location(&self, location: &RawLocation) -> String {
		let settings = self.settings.borrow();
		match settings.mode {
			HistoryMode::History => {
				format!("{}{}", strip_root(&location.pathname, &settings.root), location.search)
			}
			HistoryMode::Hash => {
				let fragment = location.hash.trim_start_matches('#');
				if fragment.starts_with('/') {
					fragment.to_string()
				} else {
					format!("/{}", fragment)
				}
			}
		}
	}

	/// Returns the router path of the current location.
	pub fn current_path(&self) -> String {
		self.path_from_location(&self.backend.location())
	}

	/// Writes `route` to history, as a new entry or replacing the current one.
	///
	/// # Errors
	///
	/// Returns the backend's error when the entry cannot be written.
	pub fn update_history(&self, route: &Route, replace: bool) -> Result<(), RouterError> {
		let state = HistoryState::new(route, route.popstate);
		let url = self.url_for(&route.path);
		debug!(url = %url, replace, "Updating history");
		if replace {
			self.backend.replace(&state, &url)
		} else {
			self.backend.push(&state, &url)
		}
	}

	/// Steps back. Returns `false` when there is at most one entry.
	pub fn back(&self) -> bool {
		if self.backend.len() <= 1 {
			return false;
		}
		self.backend.go(-1);
		true
	}

	/// Steps forward. Returns `false` when there is at most one entry.
	pub fn forward(&self) -> bool {
		if self.backend.len() <= 1 {
			return false;
		}
		self.backend.go(1);
		true
	}

	/// Removes the popstate listener.
	pub fn destroy(&self) {
		self.backend.unsubscribe();
	}
}

impl std::fmt::Debug for HistoryAdapter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HistoryAdapter")
			.field("settings", &self.settings.borrow())
			.finish_non_exhaustive()
	}
}

#[derive(Default)]
struct MemoryState {
	entries: Vec<(Option<HistoryState>, String)>,
	index: usize,
	listener: Option<PopStateListener>,
	manual_scroll: bool,
}

/// In-memory session history.
///
/// [`HistoryBackend::go`] notifies the listener synchronously, before it
/// returns.
#[derive(Clone)]
pub struct MemoryHistory {
	state: Rc<RefCell<MemoryState>>,
}

impl Default for MemoryHistory {
	fn default() -> Self {
		Self::new("/")
	}
}

impl MemoryHistory {
	/// Creates a history with a single entry at `url`.
	pub fn new(url: &str) -> Self {
		Self {
			state: Rc::new(RefCell::new(MemoryState {
				entries: vec![(None, url.to_string())],
				..MemoryState::default()
			})),
		}
	}

	/// Returns every entry's URL, oldest first.
	pub fn urls(&self) -> Vec<String> {
		self.state
			.borrow()
			.entries
			.iter()
			.map(|(_, url)| url.clone())
			.collect()
	}

	/// Returns the current entry's URL.
	pub fn current_url(&self) -> String {
		let state = self.state.borrow();
		state
			.entries
			.get(state.index)
			.map(|(_, url)| url.clone())
			.unwrap_or_default()
	}

	/// Returns the current entry's state.
	pub fn current_state(&self) -> Option<HistoryState> {
		let state = self.state.borrow();
		state.entries.get(state.index).and_then(|(s, _)| s.clone())
	}

	/// Returns the current entry's index.
	pub fn index(&self) -> usize {
		self.state.borrow().index
	}

	/// Returns `true` while a listener is installed.
	pub fn is_subscribed(&self) -> bool {
		self.state.borrow().listener.is_some()
	}

	/// Returns `true` once manual scroll restoration was requested.
	pub fn manual_scroll_restoration(&self) -> bool {
		self.state.borrow().manual_scroll
	}
}

impl HistoryBackend for MemoryHistory {
	fn push(&self, state: &HistoryState, url: &str) -> Result<(), RouterError> {
		let mut inner = self.state.borrow_mut();
		let keep = inner.index + 1;
		inner.entries.truncate(keep);
		inner.entries.push((Some(state.clone()), url.to_string()));
		inner.index = keep;
		Ok(())
	}

	fn replace(&self, state: &HistoryState, url: &str) -> Result<(), RouterError> {
		let mut inner = self.state.borrow_mut();
		let index = inner.index;
		match inner.entries.get_mut(index) {
			Some(entry) => {
				*entry = (Some(state.clone()), url.to_string());
				Ok(())
			}
			None => Err(RouterError::History(format!("no entry at index {}", index))),
		}
	}

	fn go(&self, delta: i32) {
		let notification = {
			let mut inner = self.state.borrow_mut();
			let last = inner.entries.len().saturating_sub(1) as i64;
			let target = (inner.index as i64 + i64::from(delta)).clamp(0, last) as usize;
			if target == inner.index {
				None
			} else {
				inner.index = target;
				let (state, url) = inner.entries[target].clone();
				inner.listener.clone().map(|listener| {
					(
						listener,
						PopStateEvent {
							state,
							location: RawLocation::parse(&url),
						},
					)
				})
			}
		};
		if let Some((listener, event)) = notification {
			listener(event);
		}
	}

	fn len(&self) -> usize {
		self.state.borrow().entries.len()
	}

	fn location(&self) -> RawLocation {
		RawLocation::parse(&self.current_url())
	}

	fn subscribe(&self, listener: PopStateListener) -> Result<(), RouterError> {
		self.state.borrow_mut().listener = Some(listener);
		Ok(())
	}

	fn unsubscribe(&self) {
		self.state.borrow_mut().listener = None;
	}

	fn set_manual_scroll_restoration(&self) {
		self.state.borrow_mut().manual_scroll = true;
	}
}

impl std::fmt::Debug for MemoryHistory {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MemoryHistory")
			.field("urls", &self.urls())
			.field("index", &self.index())
			.finish()
	}
}
