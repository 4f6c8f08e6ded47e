//! Browser history tests
//!
//! Exercises the `web-sys` backed platform inside a real browser.
//!
//! Run with: `wasm-pack test --headless --chrome`

#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use vitrine_router::web::internal_href;
use vitrine_router::{
	BrowserHistory, HistoryBackend, HistoryState, NavigateOptions, Platform, Route, Router,
	RouterConfig, Ui,
};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn route_at(path: &str) -> Route {
	let mut route = Route::default();
	route.path = path.to_string();
	route.section = "components".to_string();
	route.subsection = "buttons".to_string();
	route
}

#[wasm_bindgen_test]
fn test_push_updates_location() {
	let backend = BrowserHistory::new();
	let before = backend.len();

	backend
		.push(&HistoryState::new(&route_at("/wasm/push"), false), "/wasm/push")
		.unwrap();

	assert_eq!(backend.location().pathname, "/wasm/push");
	assert_eq!(backend.len(), before + 1);
}

#[wasm_bindgen_test]
fn test_replace_keeps_length() {
	let backend = BrowserHistory::new();
	let before = backend.len();

	backend
		.replace(
			&HistoryState::new(&route_at("/wasm/replace"), false),
			"/wasm/replace",
		)
		.unwrap();

	assert_eq!(backend.location().pathname, "/wasm/replace");
	assert_eq!(backend.len(), before);
}

#[wasm_bindgen_test]
fn test_internal_href() {
	assert_eq!(
		internal_href("/app/components", "/app/").as_deref(),
		Some("/components")
	);
	assert_eq!(internal_href("/about", "/").as_deref(), Some("/about"));
	assert_eq!(internal_href("https://example.com/x", "/"), None);
	assert_eq!(internal_href("//cdn.example.com/x", "/"), None);
	assert_eq!(internal_href("#top", "/"), None);
}

#[wasm_bindgen_test]
async fn test_browser_scheduler_fires_and_cancels() {
	let platform = Platform::browser();
	let fired = Rc::new(RefCell::new(Vec::new()));

	let log = fired.clone();
	let _kept = platform
		.scheduler
		.schedule(Duration::from_millis(10), Box::new(move || log.borrow_mut().push("kept")));
	let log = fired.clone();
	platform
		.scheduler
		.schedule(
			Duration::from_millis(10),
			Box::new(move || log.borrow_mut().push("cancelled")),
		)
		.cancel();

	gloo_timers::future::TimeoutFuture::new(50).await;

	assert_eq!(*fired.borrow(), vec!["kept"]);
}

#[wasm_bindgen_test]
async fn test_router_navigates_in_browser() {
	let router = Router::browser(RouterConfig::default());
	router.init().unwrap();
	router.register("components/:name", |route: Route, _ui: Rc<dyn Ui>| async move {
		format!("rendered {}", route.path)
	});

	let navigated = router
		.navigate(("components", "inputs"), NavigateOptions::default())
		.await;

	assert!(navigated);
	let location = web_sys::window().unwrap().location();
	assert_eq!(location.pathname().unwrap(), "/components/inputs");
	assert_eq!(
		router.current_route().and_then(|r| r.params.get("name").cloned()),
		Some("inputs".to_string())
	);

	router.destroy();
}
