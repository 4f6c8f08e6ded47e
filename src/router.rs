//! Client-side routing for the showcase
//!
//! This module provides access to vitrine-router, which maps showcase URLs
//! onto page handlers and keeps the History API, the document title and the
//! scroll position in step with navigation.
//!
//! ## Example
//!
//! ```rust,ignore
//! use vitrine::router::{NavigateOptions, Route, Router, RouterConfig, Ui};
//!
//! let router = Router::browser(RouterConfig::default());
//! router.register("components/:name", |route: Route, _ui: Rc<dyn Ui>| async move {
//!     format!("showing {}", route.params["name"])
//! });
//! router.init()?;
//! router.process_initial_route().await;
//! ```

// Re-export all vitrine-router functionality
pub use vitrine_router::*;
