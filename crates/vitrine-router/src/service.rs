//! Router service.
//!
//! [`Router`] ties the other modules together. A navigation runs through
//! these phases, each one observable in the debug trace:
//!
//! 1. normalize the target into a candidate [`Route`]
//! 2. run before-hooks, which may patch or cancel it
//! 3. write history unless `no_history` is set
//! 4. resolve the handler, falling back to the not-found handler
//! 5. clear the content area and render
//! 6. set the title, push the stack, dispatch the `navigation` event
//! 7. run after-hooks, then restore scroll for back/forward moves
//!
//! Navigations may overlap. Each one takes a sequence number and, after
//! every suspension point, stops if a newer navigation has started.

use crate::config::{ConfigPatch, RouterConfig};
use crate::error::{HookError, RouterError};
use crate::handler::{HandlerOutcome, IntoHandlerResult, NullUi, RouteHandler, Ui};
use crate::history::{HistoryAdapter, PopStateEvent, PopStateListener};
use crate::hooks::{HookRegistration, HooksManager, IntoHookOutcome};
use crate::parser::{encode_query, find_route_handler, generate_path, parse_path};
use crate::platform::{NavigationEvent, NavigationStatus, Platform, now_millis};
use crate::registry::{RouteEntry, RouteRegistry};
use crate::route::{Params, Route};
use crate::scroll::{SavedPosition, ScrollPositionStore};
use crate::stack::NavigationStack;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::{Rc, Weak};
use tracing::{debug, error, info, warn};

/// Message shown by the default error handler.
pub const NAVIGATION_ERROR_MESSAGE: &str = "An error occurred during navigation. Please try again.";

/// Flags controlling a single navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigateOptions {
	/// Replace the current history entry instead of pushing one.
	pub replace: bool,
	/// Leave history untouched.
	pub no_history: bool,
	/// Leave the scroll offset untouched.
	pub no_scroll: bool,
	/// The navigation comes from browser back/forward.
	pub popstate: bool,
	/// The navigation re-renders the current route.
	pub refresh: bool,
	/// The navigation renders the page's initial location.
	pub initial_route: bool,
}

impl NavigateOptions {
	/// Creates default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the current history entry.
	pub fn replace(mut self) -> Self {
		self.replace = true;
		self
	}

	/// Leaves history untouched.
	pub fn no_history(mut self) -> Self {
		self.no_history = true;
		self
	}

	/// Leaves the scroll offset untouched.
	pub fn no_scroll(mut self) -> Self {
		self.no_scroll = true;
		self
	}
}

/// Where to navigate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTarget {
	/// A path such as `/components/buttons?tab=code`, parsed as is.
	Path(String),
	/// A section, optional subsection and parameters.
	Section {
		/// Section name. A name containing `/` is split into section and
		/// leading subsection segments.
		section: String,
		/// Subsection, may be empty.
		subsection: String,
		/// Query parameters.
		params: Params,
	},
	/// An already built route.
	Route(Route),
}

impl NavigationTarget {
	/// Creates a section target without parameters.
	pub fn section(section: impl Into<String>, subsection: impl Into<String>) -> Self {
		Self::Section {
			section: section.into(),
			subsection: subsection.into(),
			params: Params::new(),
		}
	}

	/// Adds parameters to a section target. Other targets are returned
	/// unchanged.
	pub fn with_params<I, K, V>(self, params: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		match self {
			Self::Section {
				section,
				subsection,
				params: mut existing,
			} => {
				existing.extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
				Self::Section {
					section,
					subsection,
					params: existing,
				}
			}
			other => other,
		}
	}
}

impl From<&str> for NavigationTarget {
	fn from(target: &str) -> Self {
		if target.starts_with('/') {
			Self::Path(target.to_string())
		} else {
			Self::section(target, "")
		}
	}
}

impl From<String> for NavigationTarget {
	fn from(target: String) -> Self {
		if target.starts_with('/') {
			Self::Path(target)
		} else {
			Self::section(target, "")
		}
	}
}

impl From<(&str, &str)> for NavigationTarget {
	fn from((section, subsection): (&str, &str)) -> Self {
		Self::section(section, subsection)
	}
}

impl From<Route> for NavigationTarget {
	fn from(route: Route) -> Self {
		Self::Route(route)
	}
}

/// Receives every navigation error routed away from callers.
pub type ErrorHandler = Rc<dyn Fn(&RouterError, Option<&Route>, &dyn Ui)>;

/// Logs the error and shows [`NAVIGATION_ERROR_MESSAGE`] when the UI has a
/// snackbar.
pub fn default_error_handler(err: &RouterError, route: Option<&Route>, ui: &dyn Ui) {
	error!(
		error = %err,
		path = route.map(|r| r.path.as_str()).unwrap_or_default(),
		"Navigation error"
	);
	ui.show_snackbar(NAVIGATION_ERROR_MESSAGE);
}

struct RouterInner {
	platform: Platform,
	config: RefCell<RouterConfig>,
	registry: RefCell<RouteRegistry>,
	not_found: RefCell<Option<Rc<dyn RouteHandler>>>,
	hooks: HooksManager,
	stack: RefCell<NavigationStack>,
	scroll: ScrollPositionStore,
	history: HistoryAdapter,
	ui: Rc<dyn Ui>,
	on_error: ErrorHandler,
	sequence: Cell<u64>,
	in_flight: Cell<usize>,
	destroyed: Cell<bool>,
	#[cfg(target_arch = "wasm32")]
	links: RefCell<Option<crate::web::LinkInterceptor>>,
}

/// Counts a running navigation until dropped.
struct InFlight<'a> {
	count: &'a Cell<usize>,
}

impl<'a> InFlight<'a> {
	fn enter(count: &'a Cell<usize>) -> Self {
		count.set(count.get() + 1);
		Self { count }
	}

	fn is_only(&self) -> bool {
		self.count.get() == 1
	}
}

impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		self.count.set(self.count.get().saturating_sub(1));
	}
}

/// Builder for [`Router`].
pub struct RouterBuilder {
	platform: Platform,
	config: RouterConfig,
	ui: Option<Rc<dyn Ui>>,
	on_error: Option<ErrorHandler>,
	not_found: Option<Rc<dyn RouteHandler>>,
}

impl RouterBuilder {
	/// Starts a builder for `platform` with default configuration.
	pub fn new(platform: Platform) -> Self {
		Self {
			platform,
			config: RouterConfig::default(),
			ui: None,
			on_error: None,
			not_found: None,
		}
	}

	/// Sets the configuration.
	pub fn config(mut self, config: RouterConfig) -> Self {
		self.config = config;
		self
	}

	/// Sets the UI handed to handlers.
	pub fn ui(mut self, ui: impl Ui + 'static) -> Self {
		self.ui = Some(Rc::new(ui));
		self
	}

	/// Sets an already shared UI.
	pub fn shared_ui(mut self, ui: Rc<dyn Ui>) -> Self {
		self.ui = Some(ui);
		self
	}

	/// Replaces [`default_error_handler`].
	pub fn on_error(mut self, handler: impl Fn(&RouterError, Option<&Route>, &dyn Ui) + 'static) -> Self {
		self.on_error = Some(Rc::new(handler));
		self
	}

	/// Sets the handler used when no route matches.
	pub fn not_found<F, Fut>(mut self, handler: F) -> Self
	where
		F: Fn(Route, Rc<dyn Ui>) -> Fut + 'static,
		Fut: Future + 'static,
		Fut::Output: IntoHandlerResult,
	{
		self.not_found = Some(crate::handler::shared(handler));
		self
	}

	/// Builds the router. Call [`Router::init`] to start listening to
	/// history.
	pub fn build(self) -> Router {
		let Self {
			platform,
			mut config,
			ui,
			on_error,
			not_found,
		} = self;
		config.max_stack_size = config.max_stack_size.max(1);

		let inner = Rc::new_cyclic(|weak: &Weak<RouterInner>| {
			let weak = WeakRouter(weak.clone());
			let listener: PopStateListener = Rc::new(move |event| {
				if let Some(router) = weak.upgrade() {
					router.on_popstate(event);
				}
			});

			RouterInner {
				history: HistoryAdapter::new(Rc::clone(&platform.history), listener, &config),
				scroll: ScrollPositionStore::new(
					Rc::clone(&platform.scroll),
					Rc::clone(&platform.scheduler),
					&config,
				),
				stack: RefCell::new(NavigationStack::new(config.max_stack_size)),
				registry: RefCell::new(RouteRegistry::new()),
				not_found: RefCell::new(not_found),
				hooks: HooksManager::new(),
				ui: ui.unwrap_or_else(|| Rc::new(NullUi)),
				on_error: on_error.unwrap_or_else(|| Rc::new(default_error_handler)),
				sequence: Cell::new(0),
				in_flight: Cell::new(0),
				destroyed: Cell::new(false),
				#[cfg(target_arch = "wasm32")]
				links: RefCell::new(None),
				config: RefCell::new(config),
				platform,
			}
		});

		Router { inner }
	}
}

/// Client-side router.
///
/// `Router` is a cheap handle; clones share the same state.
#[derive(Clone)]
pub struct Router {
	inner: Rc<RouterInner>,
}

impl std::fmt::Debug for Router {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Router")
			.field("routes", &self.route_count())
			.field("current", &self.current_route().map(|r| r.path))
			.field("stack", &self.inner.stack.borrow().len())
			.field("hooks", &self.inner.hooks)
			.field("destroyed", &self.inner.destroyed.get())
			.finish()
	}
}

impl Router {
	/// Creates a router for `platform` with `config`.
	pub fn new(platform: Platform, config: RouterConfig) -> Self {
		RouterBuilder::new(platform).config(config).build()
	}

	/// Starts a builder.
	pub fn builder(platform: Platform) -> RouterBuilder {
		RouterBuilder::new(platform)
	}

	/// Subscribes to back/forward notifications and, on `wasm32`, installs
	/// the link interceptor when `intercept_links` is set.
	///
	/// # Errors
	///
	/// Returns [`RouterError::Destroyed`] after [`Router::destroy`], or the
	/// platform's error when a listener cannot be installed.
	pub fn init(&self) -> Result<(), RouterError> {
		if self.inner.destroyed.get() {
			return Err(RouterError::Destroyed);
		}
		self.inner.history.init()?;
		self.install_link_interceptor()?;
		info!("Router initialized");
		Ok(())
	}

	#[cfg(target_arch = "wasm32")]
	fn install_link_interceptor(&self) -> Result<(), RouterError> {
		if !self.inner.config.borrow().intercept_links {
			return Ok(());
		}
		let interceptor = crate::web::LinkInterceptor::install(self)?;
		*self.inner.links.borrow_mut() = Some(interceptor);
		Ok(())
	}

	#[cfg(not(target_arch = "wasm32"))]
	fn install_link_interceptor(&self) -> Result<(), RouterError> {
		Ok(())
	}

	#[cfg(target_arch = "wasm32")]
	fn remove_link_interceptor(&self) {
		if let Some(interceptor) = self.inner.links.borrow_mut().take() {
			interceptor.remove();
		}
	}

	#[cfg(not(target_arch = "wasm32"))]
	fn remove_link_interceptor(&self) {}

	// ------------------------------------------------------------------
	// Registration
	// ------------------------------------------------------------------

	/// Registers `handler` under `key`.
	///
	/// `key` is a literal section, `section/subsection`, a `:param`
	/// pattern or a `prefix*` wildcard. Invalid keys are logged and
	/// ignored.
	pub fn register<F, Fut>(&self, key: &str, handler: F) -> &Self
	where
		F: Fn(Route, Rc<dyn Ui>) -> Fut + 'static,
		Fut: Future + 'static,
		Fut::Output: IntoHandlerResult,
	{
		self.register_entry(key, RouteEntry::new(handler))
	}

	/// Registers an entry carrying a title and metadata.
	pub fn register_entry(&self, key: &str, entry: RouteEntry) -> &Self {
		let default_route = self.inner.config.borrow().default_route.clone();
		let result = self
			.inner
			.registry
			.borrow_mut()
			.insert(key, &default_route, entry);
		match result {
			Ok(key) => debug!(key = %key, "Registered route"),
			Err(err) => error!(error = %err, "Ignoring route registration"),
		}
		self
	}

	/// Registers several entries.
	pub fn register_routes<I, K>(&self, routes: I) -> &Self
	where
		I: IntoIterator<Item = (K, RouteEntry)>,
		K: AsRef<str>,
	{
		for (key, entry) in routes {
			self.register_entry(key.as_ref(), entry);
		}
		self
	}

	/// Sets the handler used when no route matches.
	pub fn register_not_found<F, Fut>(&self, handler: F) -> &Self
	where
		F: Fn(Route, Rc<dyn Ui>) -> Fut + 'static,
		Fut: Future + 'static,
		Fut::Output: IntoHandlerResult,
	{
		*self.inner.not_found.borrow_mut() = Some(crate::handler::shared(handler));
		self
	}

	/// Appends a before-hook receiving `(candidate, current)`.
	pub fn register_before_hook<F, Fut>(&self, hook: F) -> HookRegistration
	where
		F: Fn(Route, Option<Route>) -> Fut + 'static,
		Fut: Future + 'static,
		Fut::Output: IntoHookOutcome,
	{
		self.inner.hooks.register_before_hook(hook)
	}

	/// Appends an after-hook receiving `(route, previous, options)`.
	pub fn register_after_hook<F, Fut, E>(&self, hook: F) -> HookRegistration
	where
		F: Fn(Route, Option<Route>, NavigateOptions) -> Fut + 'static,
		Fut: Future<Output = Result<(), E>> + 'static,
		E: Into<HookError>,
	{
		self.inner.hooks.register_after_hook(hook)
	}

	// ------------------------------------------------------------------
	// Navigation
	// ------------------------------------------------------------------

	/// Navigates to `target`.
	///
	/// Resolves `true` when a handler rendered the route. Cancellation,
	/// missing handlers, handler errors, declined routes and superseded
	/// navigations resolve `false`; errors go to the error handler, never
	/// to the caller.
	pub async fn navigate(&self, target: impl Into<NavigationTarget>, options: NavigateOptions) -> bool {
		match self.run_navigation(target.into(), options).await {
			Ok(rendered) => rendered,
			Err(err) => {
				self.report_error(&err, None);
				false
			}
		}
	}

	/// Starts a navigation without awaiting it.
	pub fn spawn_navigation(&self, target: impl Into<NavigationTarget>, options: NavigateOptions) {
		let router = self.clone();
		let target = target.into();
		self.inner.platform.spawner.spawn(Box::pin(async move {
			router.navigate(target, options).await;
		}));
	}

	async fn run_navigation(&self, target: NavigationTarget, options: NavigateOptions) -> Result<bool, RouterError> {
		let inner = &self.inner;
		if inner.destroyed.get() {
			return Err(RouterError::Destroyed);
		}

		let sequence = inner.sequence.get() + 1;
		inner.sequence.set(sequence);
		inner.scroll.cancel_pending();

		// An earlier navigation may already have reset the offset.
		let in_flight = InFlight::enter(&inner.in_flight);
		let current = self.current_route();
		if in_flight.is_only() {
			inner.scroll.save_scroll_position(current.as_ref());
		}

		let candidate = self.build_route(target, &options);
		self.trace("normalized", &candidate);

		let Some(route) = inner.hooks.run_before_hooks(candidate, current).await else {
			debug!("Navigation cancelled by before-hook");
			return Ok(false);
		};
		if !self.is_latest(sequence) {
			return Ok(self.superseded(&route));
		}
		self.trace("before-hooks", &route);

		if !options.no_history {
			inner.history.update_history(&route, options.replace)?;
			self.trace("history", &route);
		}

		let found = find_route_handler(&route, &inner.registry.borrow());
		let not_found = inner.not_found.borrow().clone();
		let (handler, title, status, route) = match (found, not_found) {
			(Some(found), _) => {
				let mut route = route;
				route.params.extend(found.params);
				(found.entry.handler, found.entry.title, NavigationStatus::Success, route)
			}
			(None, Some(handler)) => (handler, None, NavigationStatus::NotFound, route),
			(None, None) => {
				warn!(path = %route.path, "No route handler found");
				self.dispatch(&route, NavigationStatus::NotFound, None);
				return Ok(false);
			}
		};
		self.trace("matched", &route);

		if status == NavigationStatus::Success && !options.no_scroll {
			inner.scroll.reset_scroll();
		}
		inner.ui.clear_content();
		let result = handler.handle(route.clone(), Rc::clone(&inner.ui)).await;
		if !self.is_latest(sequence) {
			return Ok(self.superseded(&route));
		}

		let outcome = match result {
			Ok(outcome) => outcome,
			Err(source) => {
				let err = RouterError::HandlerFailed {
					path: route.path.clone(),
					source,
				};
				self.report_error(&err, Some(&route));
				self.dispatch(&route, NavigationStatus::Error, Some(err.to_string()));
				return Ok(false);
			}
		};
		self.trace("rendered", &route);

		if let Some(title) = title {
			inner.platform.document.set_title(&title.resolve(&route));
		}
		let route = inner.stack.borrow_mut().push(&route);
		self.dispatch(&route, status, None);

		let previous = self.previous_route();
		inner
			.hooks
			.run_after_hooks(&route, previous.clone(), options)
			.await;
		if !self.is_latest(sequence) {
			return Ok(self.superseded(&route));
		}
		self.trace("after-hooks", &route);

		if options.popstate && !options.no_scroll {
			inner
				.scroll
				.handle_pop_state_scroll(Some(&route), previous.as_ref());
		}

		Ok(outcome == HandlerOutcome::Rendered)
	}

	fn build_route(&self, target: NavigationTarget, options: &NavigateOptions) -> Route {
		let config = self.inner.config.borrow();
		let mut route = match target {
			NavigationTarget::Path(path) => parse_path(&path, &config),
			NavigationTarget::Section {
				section,
				subsection,
				params,
			} => {
				let mut parts = section
					.split('/')
					.chain(subsection.split('/'))
					.filter(|s| !s.is_empty());
				let section = parts
					.next()
					.map(str::to_string)
					.unwrap_or_else(|| config.default_route.clone());
				let subsection = parts.collect::<Vec<_>>().join("/");
				Route {
					path: generate_path(&section, &subsection, &Params::new(), &config),
					query: encode_query(&params),
					section,
					subsection,
					original_path: None,
					params,
					timestamp: 0,
					popstate: false,
				}
			}
			NavigationTarget::Route(route) => route,
		};
		route.timestamp = now_millis();
		route.popstate = options.popstate;
		route
	}

	fn is_latest(&self, sequence: u64) -> bool {
		self.inner.sequence.get() == sequence
	}

	fn superseded(&self, route: &Route) -> bool {
		debug!(path = %route.path, "Navigation superseded by a newer one");
		false
	}

	fn trace(&self, phase: &str, route: &Route) {
		if self.inner.config.borrow().debug {
			debug!(
				phase,
				path = %route.path,
				section = %route.section,
				subsection = %route.subsection,
				"Navigation phase"
			);
		}
	}

	fn dispatch(&self, route: &Route, status: NavigationStatus, error: Option<String>) {
		let event = NavigationEvent::new(route.clone(), status, error);
		self.inner.platform.document.dispatch_navigation(&event);
	}

	fn report_error(&self, err: &RouterError, route: Option<&Route>) {
		(self.inner.on_error)(err, route, self.inner.ui.as_ref());
	}

	fn on_popstate(&self, event: PopStateEvent) {
		let router = self.clone();
		self.inner.platform.spawner.spawn(Box::pin(async move {
			router.handle_popstate(event).await;
		}));
	}

	/// Handles a back/forward move.
	///
	/// The route is derived from the new location; query parameters kept in
	/// the entry's state are used when the URL carries none. Does nothing
	/// when the location equals the current route.
	pub async fn handle_popstate(&self, event: PopStateEvent) -> bool {
		if self.inner.destroyed.get() {
			return false;
		}
		let path = self.inner.history.path_from_location(&event.location);
		let mut route = parse_path(&path, &self.inner.config.borrow());
		if let Some(state) = event.state {
			if state.route.path == route.path && route.query.is_empty() {
				route.query = state.route.query;
				route.params = state.route.params;
			}
		}

		let unchanged = self
			.current_route()
			.is_some_and(|current| current.same_location(&route));
		if unchanged {
			debug!(path = %route.path, "Ignoring popstate for the current location");
			return false;
		}

		let options = NavigateOptions {
			no_history: true,
			popstate: true,
			..NavigateOptions::default()
		};
		self.navigate(route, options).await
	}

	/// Steps back in history. Returns `false` when there is nowhere to go.
	pub fn back(&self) -> bool {
		self.inner.history.back()
	}

	/// Steps forward in history. Returns `false` when there is nowhere to go.
	pub fn forward(&self) -> bool {
		self.inner.history.forward()
	}

	/// Re-renders the current route without touching history.
	///
	/// Resolves `false` when nothing was rendered yet.
	pub async fn refresh(&self, options: NavigateOptions) -> bool {
		let Some(current) = self.current_route() else {
			return false;
		};
		let target = if current.query.is_empty() {
			NavigationTarget::Path(current.path)
		} else {
			NavigationTarget::Path(format!("{}?{}", current.path, current.query))
		};
		let options = NavigateOptions {
			no_history: true,
			refresh: true,
			..options
		};
		self.navigate(target, options).await
	}

	/// Renders the page's current location. Used once at startup.
	pub async fn process_initial_route(&self) -> bool {
		let path = self.inner.history.current_path();
		let options = NavigateOptions {
			no_history: true,
			initial_route: true,
			..NavigateOptions::default()
		};
		self.navigate(NavigationTarget::Path(path), options).await
	}

	// ------------------------------------------------------------------
	// Lifecycle
	// ------------------------------------------------------------------

	/// Merges `patch` into the configuration and propagates it to the
	/// scroll store, the stack bound and the history adapter.
	pub fn configure(&self, patch: ConfigPatch) {
		let config = {
			let mut config = self.inner.config.borrow_mut();
			config.merge(patch);
			config.clone()
		};
		self.inner.scroll.configure(&config);
		self.inner
			.stack
			.borrow_mut()
			.set_max_size(config.max_stack_size);
		self.inner.history.set_config(&config);
	}

	/// Removes listeners and clears routes, hooks, stack and scroll
	/// positions. In-flight navigations stop at their next suspension
	/// point and later navigations resolve `false`.
	pub fn destroy(&self) {
		let inner = &self.inner;
		inner.destroyed.set(true);
		inner.sequence.set(inner.sequence.get() + 1);
		inner.history.destroy();
		self.remove_link_interceptor();
		inner.hooks.clear();
		inner.stack.borrow_mut().clear();
		inner.registry.borrow_mut().clear();
		*inner.not_found.borrow_mut() = None;
		inner.scroll.clear();
		info!("Router destroyed");
	}

	// ------------------------------------------------------------------
	// Accessors
	// ------------------------------------------------------------------

	/// Returns the route on top of the navigation stack.
	pub fn current_route(&self) -> Option<Route> {
		self.inner.stack.borrow().current().cloned()
	}

	/// Returns the route below the current one.
	pub fn previous_route(&self) -> Option<Route> {
		self.inner.stack.borrow().previous().cloned()
	}

	/// Returns the navigation stack, oldest first.
	pub fn navigation_stack(&self) -> Vec<Route> {
		self.inner.stack.borrow().to_vec()
	}

	/// Returns a copy of the configuration.
	pub fn config(&self) -> RouterConfig {
		self.inner.config.borrow().clone()
	}

	/// Returns the number of registered keys.
	pub fn route_count(&self) -> usize {
		self.inner.registry.borrow().len()
	}

	/// Returns `true` when `key` is registered.
	pub fn has_route(&self, key: &str) -> bool {
		let default_route = self.inner.config.borrow().default_route.clone();
		self.inner.registry.borrow().contains(key, &default_route)
	}

	/// Returns a snapshot of the saved scroll offsets.
	pub fn scroll_positions(&self) -> HashMap<String, SavedPosition> {
		self.inner.scroll.positions()
	}

	/// Returns the hook lists.
	pub fn hooks(&self) -> &HooksManager {
		&self.inner.hooks
	}

	/// Returns the platform.
	pub fn platform(&self) -> &Platform {
		&self.inner.platform
	}

	/// Returns `true` after [`Router::destroy`].
	pub fn is_destroyed(&self) -> bool {
		self.inner.destroyed.get()
	}

	/// Returns a handle that does not keep the router alive.
	pub fn downgrade(&self) -> WeakRouter {
		WeakRouter(Rc::downgrade(&self.inner))
	}
}

/// Non-owning [`Router`] handle, held by browser callbacks.
#[derive(Clone)]
pub struct WeakRouter(Weak<RouterInner>);

impl WeakRouter {
	/// Returns the router if it is still alive.
	pub fn upgrade(&self) -> Option<Router> {
		self.0.upgrade().map(|inner| Router { inner })
	}
}

impl std::fmt::Debug for WeakRouter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("WeakRouter")
	}
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use crate::platform::MemoryPlatform;
	use rstest::{fixture, rstest};

	#[fixture]
	fn memory() -> MemoryPlatform {
		MemoryPlatform::new()
	}

	fn router(memory: &MemoryPlatform) -> Router {
		Router::new(memory.platform(), RouterConfig::default())
	}

	#[rstest]
	#[case("/components", NavigationTarget::Path("/components".to_string()))]
	#[case("components", NavigationTarget::section("components", ""))]
	fn test_target_from_str(#[case] input: &str, #[case] expected: NavigationTarget) {
		assert_eq!(NavigationTarget::from(input), expected);
		assert_eq!(NavigationTarget::from(input.to_string()), expected);
	}

	#[rstest]
	fn test_with_params_only_touches_sections() {
		let section = NavigationTarget::section("search", "").with_params([("q", "grid")]);
		let path = NavigationTarget::from("/search").with_params([("q", "grid")]);

		match section {
			NavigationTarget::Section { params, .. } => {
				assert_eq!(params.get("q").map(String::as_str), Some("grid"));
			}
			other => panic!("unexpected target {:?}", other),
		}
		assert_eq!(path, NavigationTarget::Path("/search".to_string()));
	}

	#[rstest]
	fn test_build_route_splits_section_paths(memory: MemoryPlatform) {
		let router = router(&memory);

		let route = router.build_route(
			NavigationTarget::section("components/forms", "inputs").with_params([("tab", "api")]),
			&NavigateOptions::default(),
		);

		assert_eq!(route.section, "components");
		assert_eq!(route.subsection, "forms/inputs");
		assert_eq!(route.path, "/components/forms/inputs");
		assert_eq!(route.query, "tab=api");
	}

	#[rstest]
	fn test_build_route_defaults_section(memory: MemoryPlatform) {
		let router = router(&memory);

		let route = router.build_route(NavigationTarget::section("", ""), &NavigateOptions::default());

		assert_eq!(route.section, "home");
		assert_eq!(route.path, "/");
	}

	#[rstest]
	fn test_invalid_registration_is_ignored(memory: MemoryPlatform) {
		let router = router(&memory);

		router
			.register("docs/*/api", |_route: Route, _ui: Rc<dyn Ui>| async {})
			.register("about", |_route: Route, _ui: Rc<dyn Ui>| async {});

		assert_eq!(router.route_count(), 1);
		assert!(router.has_route("/about/"));
		assert!(!router.has_route("docs/*/api"));
	}

	#[rstest]
	fn test_configure_resizes_stack(memory: MemoryPlatform) {
		let router = router(&memory);

		router.configure(ConfigPatch::new().max_stack_size(0).scroll_restoration(false));

		let config = router.config();
		assert_eq!(config.max_stack_size, 0);
		assert_eq!(router.inner.stack.borrow().max_size(), 1);
		assert!(!config.scroll_restoration);
	}

	#[rstest]
	#[tokio::test]
	async fn test_navigate_after_destroy_reports_error(memory: MemoryPlatform) {
		// Arrange
		let errors = Rc::new(RefCell::new(Vec::new()));
		let sink = Rc::clone(&errors);
		let router = Router::builder(memory.platform())
			.on_error(move |err, _route, _ui| sink.borrow_mut().push(err.to_string()))
			.build();
		router.register("about", |_route: Route, _ui: Rc<dyn Ui>| async {});

		// Act
		router.destroy();
		let navigated = router.navigate("/about", NavigateOptions::default()).await;

		// Assert
		assert!(!navigated);
		assert!(router.is_destroyed());
		assert_eq!(router.route_count(), 0);
		assert_eq!(*errors.borrow(), vec!["Router has been destroyed".to_string()]);
	}
}
