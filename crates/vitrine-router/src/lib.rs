//! Vitrine Router - client-side routing for the component showcase
//!
//! Maps URL paths such as `/components/buttons?tab=code` onto registered
//! handlers, keeps browser history in sync, and remembers scroll offsets
//! per page.
//!
//! ## Architecture
//!
//! - [`parser`]: path parsing, generation and handler lookup
//! - [`registry`]: route keys, entries and lookup order
//! - [`history`]: history entries and browser locations
//! - [`scroll`]: per-path scroll offsets with deferred restoration
//! - [`stack`]: bounded list of visited routes
//! - [`hooks`]: before and after navigation hooks
//! - [`service`]: the [`Router`] tying everything together
//! - [`platform`]: the browser seams, with in-memory implementations
//!
//! On `wasm32` the `web` module provides the browser platform and the
//! link interceptor.
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//! use vitrine_router::{MemoryPlatform, NavigateOptions, Route, Router, RouterConfig, Ui};
//!
//! # futures::executor::block_on(async {
//! let memory = MemoryPlatform::new();
//! let router = Router::new(memory.platform(), RouterConfig::default());
//! router.register("components/buttons", |route: Route, _ui: Rc<dyn Ui>| async move {
//! 	format!("rendered {}", route.path)
//! });
//!
//! assert!(router.navigate(("components", "buttons"), NavigateOptions::default()).await);
//! assert_eq!(router.current_route().map(|r| r.path).as_deref(), Some("/components/buttons"));
//! # });
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod history;
pub mod hooks;
pub mod parser;
pub mod platform;
pub mod registry;
pub mod route;
pub mod scroll;
pub mod service;
pub mod stack;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{ConfigPatch, DEFAULT_MAX_STACK_SIZE, DEFAULT_ROUTE, HistoryMode, RouterConfig};
pub use error::{HandlerError, HookError, RouterError};
pub use handler::{HandlerOutcome, IntoHandlerResult, NullUi, RouteHandler, Ui};
pub use history::{
	HistoryAdapter, HistoryBackend, HistoryState, MemoryHistory, PopStateEvent, RawLocation,
};
pub use hooks::{HookOutcome, HookRegistration, HooksManager, IntoHookOutcome};
pub use parser::{find_route_handler, generate_path, match_path_with_params, parse_path};
pub use platform::{
	DocumentSink, ManualScheduler, MemoryDocument, MemoryPlatform, NavigationEvent,
	NavigationStatus, Platform, Scheduler, Spawner, TaskQueue, TimerHandle,
};
pub use registry::{CACHE_CAPACITY, RouteEntry, RouteMatch, RouteRegistry, RouteTitle};
pub use route::{Params, Route, RoutePatch};
pub use scroll::{MemoryScroll, SavedPosition, ScrollPositionStore, ScrollTarget};
pub use service::{
	ErrorHandler, NAVIGATION_ERROR_MESSAGE, NavigateOptions, NavigationTarget, Router,
	RouterBuilder, WeakRouter, default_error_handler,
};
pub use stack::NavigationStack;

#[cfg(target_arch = "wasm32")]
pub use web::{BrowserHistory, BrowserUi, LinkInterceptor};
