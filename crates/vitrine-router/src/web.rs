//! Browser platform.
//!
//! Implements the platform seams on top of `web-sys` and installs the
//! click interceptor turning internal links into router navigations.

use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::handler::Ui;
use crate::history::{
	HistoryBackend, HistoryState, PopStateEvent, PopStateListener, RawLocation, strip_root,
};
use crate::platform::{DocumentSink, NavigationEvent, Platform, Scheduler, Spawner, TimerHandle};
use crate::scroll::ScrollTarget;
use crate::service::{NavigateOptions, Router, WeakRouter};
use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{trace, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

fn js_error(context: &str, err: JsValue) -> RouterError {
	RouterError::Platform(format!("{}: {:?}", context, err))
}

fn window() -> Result<web_sys::Window, RouterError> {
	web_sys::window().ok_or_else(|| RouterError::Platform("no window".to_string()))
}

fn history() -> Result<web_sys::History, RouterError> {
	window()?.history().map_err(|e| js_error("history unavailable", e))
}

fn to_js(state: &HistoryState) -> Result<JsValue, RouterError> {
	let json = serde_json::to_string(state)?;
	js_sys::JSON::parse(&json).map_err(|e| js_error("state encoding failed", e))
}

fn from_js(value: &JsValue) -> Option<HistoryState> {
	if value.is_null() || value.is_undefined() {
		return None;
	}
	let json: String = js_sys::JSON::stringify(value).ok()?.into();
	serde_json::from_str(&json).ok()
}

fn current_location() -> RawLocation {
	let Some(location) = web_sys::window().map(|w| w.location()) else {
		return RawLocation::default();
	};
	RawLocation {
		pathname: location.pathname().unwrap_or_else(|_| "/".to_string()),
		search: location.search().unwrap_or_default(),
		hash: location.hash().unwrap_or_default(),
	}
}

// ============================================================================
// History
// ============================================================================

type PopStateClosure = Closure<dyn FnMut(web_sys::PopStateEvent)>;

/// History API backend.
#[derive(Default)]
pub struct BrowserHistory {
	listener: RefCell<Option<PopStateClosure>>,
}

impl BrowserHistory {
	/// Creates a backend for the current window.
	pub fn new() -> Self {
		Self::default()
	}
}

impl HistoryBackend for BrowserHistory {
	fn push(&self, state: &HistoryState, url: &str) -> Result<(), RouterError> {
		history()?
			.push_state_with_url(&to_js(state)?, "", Some(url))
			.map_err(|e| RouterError::History(format!("{:?}", e)))
	}

	fn replace(&self, state: &HistoryState, url: &str) -> Result<(), RouterError> {
		history()?
			.replace_state_with_url(&to_js(state)?, "", Some(url))
			.map_err(|e| RouterError::History(format!("{:?}", e)))
	}

	fn go(&self, delta: i32) {
		if let Err(err) = history().and_then(|h| {
			h.go_with_delta(delta)
				.map_err(|e| RouterError::History(format!("{:?}", e)))
		}) {
			warn!(error = %err, delta, "History traversal failed");
		}
	}

	fn len(&self) -> usize {
		history()
			.ok()
			.and_then(|h| h.length().ok())
			.map_or(0, |len| len as usize)
	}

	fn location(&self) -> RawLocation {
		current_location()
	}

	fn subscribe(&self, listener: PopStateListener) -> Result<(), RouterError> {
		self.unsubscribe();
		let closure = Closure::wrap(Box::new(move |event: web_sys::PopStateEvent| {
			listener(PopStateEvent {
				state: from_js(&event.state()),
				location: current_location(),
			});
		}) as Box<dyn FnMut(web_sys::PopStateEvent)>);

		window()?
			.add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref())
			.map_err(|e| js_error("popstate listener failed", e))?;
		*self.listener.borrow_mut() = Some(closure);
		Ok(())
	}

	fn unsubscribe(&self) {
		let Some(closure) = self.listener.borrow_mut().take() else {
			return;
		};
		if let Ok(window) = window() {
			let _ = window
				.remove_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
		}
	}

	fn set_manual_scroll_restoration(&self) {
		if let Ok(history) = history() {
			let _ = history.set_scroll_restoration(web_sys::ScrollRestoration::Manual);
		}
	}
}

// ============================================================================
// Scroll, timers, document, tasks
// ============================================================================

fn element(selector: &str) -> Option<web_sys::Element> {
	web_sys::window()?
		.document()?
		.query_selector(selector)
		.ok()
		.flatten()
}

/// Window or element scrolling.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserScroll;

impl ScrollTarget for BrowserScroll {
	fn offset(&self, selector: Option<&str>) -> f64 {
		match selector {
			Some(selector) => element(selector).map_or(0.0, |el| f64::from(el.scroll_top())),
			None => web_sys::window()
				.and_then(|w| w.scroll_y().ok())
				.unwrap_or(0.0),
		}
	}

	fn scroll_to(&self, selector: Option<&str>, y: f64) {
		match selector {
			Some(selector) => {
				if let Some(el) = element(selector) {
					el.set_scroll_top(y as i32);
				}
			}
			None => {
				if let Some(window) = web_sys::window() {
					window.scroll_to_with_x_and_y(0.0, y);
				}
			}
		}
	}
}

/// `setTimeout` scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
	fn schedule(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerHandle {
		let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
		let id = gloo_timers::callback::Timeout::new(millis, task).forget();
		let Some(handle) = id.as_f64() else {
			return TimerHandle::detached();
		};
		TimerHandle::new(move || {
			if let Some(window) = web_sys::window() {
				window.clear_timeout_with_handle(handle as i32);
			}
		})
	}
}

/// `document.title` and `navigation` events on `window`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserDocument;

impl BrowserDocument {
	fn try_dispatch(event: &NavigationEvent) -> Result<(), RouterError> {
		let detail = js_sys::JSON::parse(&serde_json::to_string(event)?)
			.map_err(|e| js_error("event encoding failed", e))?;
		let init = web_sys::CustomEventInit::new();
		init.set_detail(&detail);
		let event = web_sys::CustomEvent::new_with_event_init_dict("navigation", &init)
			.map_err(|e| js_error("event creation failed", e))?;
		window()?
			.dispatch_event(&event)
			.map_err(|e| js_error("event dispatch failed", e))?;
		Ok(())
	}
}

impl DocumentSink for BrowserDocument {
	fn set_title(&self, title: &str) {
		if let Some(document) = web_sys::window().and_then(|w| w.document()) {
			document.set_title(title);
		}
	}

	fn dispatch_navigation(&self, event: &NavigationEvent) {
		if let Err(err) = Self::try_dispatch(event) {
			warn!(error = %err, "Failed to dispatch navigation event");
		}
	}
}

/// `spawn_local` task runner.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSpawner;

impl Spawner for BrowserSpawner {
	fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
		wasm_bindgen_futures::spawn_local(task);
	}
}

/// UI clearing the element matched by a CSS selector.
#[derive(Debug, Clone)]
pub struct BrowserUi {
	content_selector: String,
}

impl BrowserUi {
	/// Creates a UI rendering into `content_selector`.
	pub fn new(content_selector: impl Into<String>) -> Self {
		Self {
			content_selector: content_selector.into(),
		}
	}

	/// Returns the content element, if present.
	pub fn content(&self) -> Option<web_sys::Element> {
		element(&self.content_selector)
	}
}

impl Ui for BrowserUi {
	fn clear_content(&self) {
		if let Some(content) = self.content() {
			content.set_inner_html("");
		}
	}
}

impl Platform {
	/// Returns the platform backed by the current window.
	pub fn browser() -> Self {
		Self {
			history: Rc::new(BrowserHistory::new()),
			scroll: Rc::new(BrowserScroll),
			scheduler: Rc::new(BrowserScheduler),
			document: Rc::new(BrowserDocument),
			spawner: Rc::new(BrowserSpawner),
		}
	}
}

impl Router {
	/// Creates a router for the current window.
	///
	/// When `content_selector` is configured, handlers receive a
	/// [`BrowserUi`] for that element.
	pub fn browser(config: RouterConfig) -> Self {
		let builder = Router::builder(Platform::browser());
		let builder = match &config.content_selector {
			Some(selector) => builder.ui(BrowserUi::new(selector.clone())),
			None => builder,
		};
		builder.config(config).build()
	}
}

// ============================================================================
// Link interception
// ============================================================================

/// Returns the router path for a clicked `href`, or `None` when the link
/// must be left to the browser.
pub fn internal_href(href: &str, root: &str) -> Option<String> {
	if !href.starts_with('/') || href.starts_with("//") {
		return None;
	}
	Some(strip_root(href, root))
}

type ClickClosure = Closure<dyn FnMut(web_sys::MouseEvent)>;

/// Document-level click listener turning internal links into navigations.
pub struct LinkInterceptor {
	closure: ClickClosure,
}

impl LinkInterceptor {
	/// Installs the listener on the document.
	///
	/// # Errors
	///
	/// Returns [`RouterError::Platform`] without a document.
	pub fn install(router: &Router) -> Result<Self, RouterError> {
		let weak: WeakRouter = router.downgrade();
		let closure = Closure::wrap(Box::new(move |event: web_sys::MouseEvent| {
			if let Some(router) = weak.upgrade() {
				intercept(&router, &event);
			}
		}) as Box<dyn FnMut(web_sys::MouseEvent)>);

		let document = window()?
			.document()
			.ok_or_else(|| RouterError::Platform("no document".to_string()))?;
		document
			.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
			.map_err(|e| js_error("click listener failed", e))?;
		Ok(Self { closure })
	}

	/// Removes the listener.
	pub fn remove(self) {
		if let Some(document) = web_sys::window().and_then(|w| w.document()) {
			let _ = document
				.remove_event_listener_with_callback("click", self.closure.as_ref().unchecked_ref());
		}
	}
}

fn intercept(router: &Router, event: &web_sys::MouseEvent) {
	if event.default_prevented()
		|| event.button() != 0
		|| event.ctrl_key()
		|| event.meta_key()
		|| event.shift_key()
		|| event.alt_key()
	{
		return;
	}

	let Some(anchor) = event
		.target()
		.and_then(|t| t.dyn_into::<web_sys::Element>().ok())
		.and_then(|el| el.closest("a[href]").ok().flatten())
	else {
		return;
	};
	if anchor.has_attribute("download") {
		return;
	}
	if anchor
		.get_attribute("target")
		.is_some_and(|target| !target.is_empty() && target != "_self")
	{
		return;
	}

	let root = router.config().normalized_root();
	let Some(path) = anchor
		.get_attribute("href")
		.and_then(|href| internal_href(&href, &root))
	else {
		return;
	};

	event.prevent_default();
	trace!(path = %path, "Intercepted link click");
	router.spawn_navigation(path, NavigateOptions::default());
}
