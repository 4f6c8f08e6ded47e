//! Route handlers and the UI surface they render into.

use crate::error::HandlerError;
use crate::route::Route;
use futures::future::LocalBoxFuture;
use std::future::Future;
use std::rc::Rc;

/// Future returned by a [`RouteHandler`].
pub type HandlerFuture = LocalBoxFuture<'static, Result<HandlerOutcome, HandlerError>>;

/// What a handler reports after running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
	/// The route was rendered.
	Rendered,
	/// The handler declined the route; the navigation resolves `false`.
	Declined,
}

/// UI surface shared by every handler.
pub trait Ui {
	/// Clears the content area before a handler renders into it.
	fn clear_content(&self);

	/// Shows a transient message. Returns `false` when no snackbar is
	/// available.
	fn show_snackbar(&self, _message: &str) -> bool {
		false
	}
}

/// A [`Ui`] that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullUi;

impl Ui for NullUi {
	fn clear_content(&self) {}
}

/// Renders a route.
///
/// Implemented for every `Fn(Route, Rc<dyn Ui>) -> impl Future` whose output
/// converts into a handler result, so plain async closures can be
/// registered directly.
pub trait RouteHandler {
	/// Renders `route` into `ui`.
	fn handle(&self, route: Route, ui: Rc<dyn Ui>) -> HandlerFuture;
}

impl<F, Fut> RouteHandler for F
where
	F: Fn(Route, Rc<dyn Ui>) -> Fut,
	Fut: Future + 'static,
	Fut::Output: IntoHandlerResult,
{
	fn handle(&self, route: Route, ui: Rc<dyn Ui>) -> HandlerFuture {
		let fut = self(route, ui);
		Box::pin(async move { fut.await.into_handler_result() })
	}
}

/// Conversion from handler return values to a handler result.
///
/// `false` declines the route; every other plain value means it rendered.
pub trait IntoHandlerResult {
	/// Performs the conversion.
	fn into_handler_result(self) -> Result<HandlerOutcome, HandlerError>;
}

impl IntoHandlerResult for HandlerOutcome {
	fn into_handler_result(self) -> Result<HandlerOutcome, HandlerError> {
		Ok(self)
	}
}

impl IntoHandlerResult for () {
	fn into_handler_result(self) -> Result<HandlerOutcome, HandlerError> {
		Ok(HandlerOutcome::Rendered)
	}
}

impl IntoHandlerResult for bool {
	fn into_handler_result(self) -> Result<HandlerOutcome, HandlerError> {
		Ok(if self {
			HandlerOutcome::Rendered
		} else {
			HandlerOutcome::Declined
		})
	}
}

impl IntoHandlerResult for String {
	fn into_handler_result(self) -> Result<HandlerOutcome, HandlerError> {
		Ok(HandlerOutcome::Rendered)
	}
}

impl IntoHandlerResult for &'static str {
	fn into_handler_result(self) -> Result<HandlerOutcome, HandlerError> {
		Ok(HandlerOutcome::Rendered)
	}
}

impl<T, E> IntoHandlerResult for Result<T, E>
where
	T: IntoHandlerResult,
	E: Into<HandlerError>,
{
	fn into_handler_result(self) -> Result<HandlerOutcome, HandlerError> {
		self.map_err(Into::into)?.into_handler_result()
	}
}

/// Wraps a closure into a shared handler.
pub(crate) fn shared<F, Fut>(handler: F) -> Rc<dyn RouteHandler>
where
	F: Fn(Route, Rc<dyn Ui>) -> Fut + 'static,
	Fut: Future + 'static,
	Fut::Output: IntoHandlerResult,
{
	Rc::new(handler)
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
	use super::*;
	use rstest::rstest;

	fn ui() -> Rc<dyn Ui> {
		Rc::new(NullUi)
	}

	#[rstest]
	#[tokio::test]
	async fn test_false_declines() {
		let handler = shared(|_route: Route, _ui: Rc<dyn Ui>| async { false });

		let outcome = handler.handle(Route::default(), ui()).await;

		assert_eq!(outcome.unwrap(), HandlerOutcome::Declined);
	}

	#[rstest]
	#[tokio::test]
	async fn test_marker_string_renders() {
		let handler = shared(|route: Route, _ui: Rc<dyn Ui>| async move { route.key() });

		let outcome = handler.handle(Route::default(), ui()).await;

		assert_eq!(outcome.unwrap(), HandlerOutcome::Rendered);
	}

	#[rstest]
	#[tokio::test]
	async fn test_error_is_propagated() {
		let handler = shared(|_route: Route, _ui: Rc<dyn Ui>| async {
			Err::<(), _>("template missing")
		});

		let outcome = handler.handle(Route::default(), ui()).await;

		assert_eq!(outcome.unwrap_err().message(), "template missing");
	}

	#[rstest]
	fn test_null_ui_has_no_snackbar() {
		assert!(!NullUi.show_snackbar("hello"));
	}
}
