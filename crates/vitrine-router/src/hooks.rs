//! Before and after navigation hooks.
//!
//! Before-hooks run in registration order against the candidate route and
//! may let it through, patch it, or cancel the navigation. After-hooks are
//! notifications. A failing hook is logged and skipped; it never stops a
//! navigation.

use crate::error::HookError;
use crate::route::{Route, RoutePatch};
use crate::service::NavigateOptions;
use futures::future::LocalBoxFuture;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::{Rc, Weak};
use tracing::{error, trace};

/// Decision of a before-hook.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HookOutcome {
	/// Keep the candidate route as it is.
	#[default]
	Continue,
	/// Replace fields of the candidate route.
	Patch(RoutePatch),
	/// Stop the navigation.
	Cancel,
}

/// Conversion from before-hook return values.
///
/// `false` cancels, `true` and `()` continue, a [`RoutePatch`] patches.
pub trait IntoHookOutcome {
	/// Performs the conversion.
	fn into_hook_outcome(self) -> Result<HookOutcome, HookError>;
}

impl IntoHookOutcome for HookOutcome {
	fn into_hook_outcome(self) -> Result<HookOutcome, HookError> {
		Ok(self)
	}
}

impl IntoHookOutcome for () {
	fn into_hook_outcome(self) -> Result<HookOutcome, HookError> {
		Ok(HookOutcome::Continue)
	}
}

impl IntoHookOutcome for bool {
	fn into_hook_outcome(self) -> Result<HookOutcome, HookError> {
		Ok(if self {
			HookOutcome::Continue
		} else {
			HookOutcome::Cancel
		})
	}
}

impl IntoHookOutcome for RoutePatch {
	fn into_hook_outcome(self) -> Result<HookOutcome, HookError> {
		Ok(HookOutcome::Patch(self))
	}
}

impl<T, E> IntoHookOutcome for Result<T, E>
where
	T: IntoHookOutcome,
	E: Into<HookError>,
{
	fn into_hook_outcome(self) -> Result<HookOutcome, HookError> {
		self.map_err(Into::into)?.into_hook_outcome()
	}
}

type BeforeHook = Rc<dyn Fn(Route, Option<Route>) -> LocalBoxFuture<'static, Result<HookOutcome, HookError>>>;
type AfterHook =
	Rc<dyn Fn(Route, Option<Route>, NavigateOptions) -> LocalBoxFuture<'static, Result<(), HookError>>>;

#[derive(Default)]
struct HookLists {
	before: RefCell<Vec<(u64, BeforeHook)>>,
	after: RefCell<Vec<(u64, AfterHook)>>,
	next_id: Cell<u64>,
}

impl HookLists {
	fn next_id(&self) -> u64 {
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		id
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookKind {
	Before,
	After,
}

/// Handle returned by hook registration.
///
/// Dropping the handle keeps the hook registered.
#[derive(Debug)]
#[must_use = "keep the registration to be able to remove the hook"]
pub struct HookRegistration {
	lists: Weak<HookLists>,
	kind: HookKind,
	id: u64,
}

impl HookRegistration {
	/// Removes the hook. Returns `false` when it was already gone.
	pub fn unregister(self) -> bool {
		let Some(lists) = self.lists.upgrade() else {
			return false;
		};
		match self.kind {
			HookKind::Before => remove(&lists.before, self.id),
			HookKind::After => remove(&lists.after, self.id),
		}
	}
}

fn remove<T>(list: &RefCell<Vec<(u64, T)>>, id: u64) -> bool {
	let mut list = list.borrow_mut();
	let before = list.len();
	list.retain(|(hook_id, _)| *hook_id != id);
	list.len() != before
}

/// Ordered before and after hook lists.
#[derive(Clone, Default)]
pub struct HooksManager {
	lists: Rc<HookLists>,
}

impl HooksManager {
	/// Creates empty hook lists.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a before-hook receiving `(candidate, current)`.
	pub fn register_before_hook<F, Fut>(&self, hook: F) -> HookRegistration
	where
		F: Fn(Route, Option<Route>) -> Fut + 'static,
		Fut: Future + 'static,
		Fut::Output: IntoHookOutcome,
	{
		let id = self.lists.next_id();
		let hook: BeforeHook = Rc::new(move |route, current| {
			let fut = hook(route, current);
			Box::pin(async move { fut.await.into_hook_outcome() })
		});
		self.lists.before.borrow_mut().push((id, hook));
		self.registration(HookKind::Before, id)
	}

	/// Appends an after-hook receiving `(route, previous, options)`.
	pub fn register_after_hook<F, Fut, E>(&self, hook: F) -> HookRegistration
	where
		F: Fn(Route, Option<Route>, NavigateOptions) -> Fut + 'static,
		Fut: Future<Output = Result<(), E>> + 'static,
		E: Into<HookError>,
	{
		let id = self.lists.next_id();
		let hook: AfterHook = Rc::new(move |route, previous, options| {
			let fut = hook(route, previous, options);
			Box::pin(async move { fut.await.map_err(Into::into) })
		});
		self.lists.after.borrow_mut().push((id, hook));
		self.registration(HookKind::After, id)
	}

	fn registration(&self, kind: HookKind, id: u64) -> HookRegistration {
		HookRegistration {
			lists: Rc::downgrade(&self.lists),
			kind,
			id,
		}
	}

	/// Runs before-hooks in order.
	///
	/// Returns the possibly patched route, or `None` when a hook cancelled.
	/// Later hooks see earlier patches.
	pub async fn run_before_hooks(&self, route: Route, current: Option<Route>) -> Option<Route> {
		let hooks: Vec<BeforeHook> = self
			.lists
			.before
			.borrow()
			.iter()
			.map(|(_, hook)| Rc::clone(hook))
			.collect();

		let mut candidate = route;
		for hook in hooks {
			match hook(candidate.clone(), current.clone()).await {
				Ok(HookOutcome::Continue) => {}
				Ok(HookOutcome::Patch(patch)) => {
					trace!(?patch, "Before-hook patched route");
					candidate.apply(patch);
				}
				Ok(HookOutcome::Cancel) => {
					trace!(path = %candidate.path, "Before-hook cancelled navigation");
					return None;
				}
				Err(err) => {
					error!(error = %err, path = %candidate.path, "Before-hook failed");
				}
			}
		}
		Some(candidate)
	}

	/// Runs after-hooks in order, logging failures.
	pub async fn run_after_hooks(&self, route: &Route, previous: Option<Route>, options: NavigateOptions) {
		let hooks: Vec<AfterHook> = self
			.lists
			.after
			.borrow()
			.iter()
			.map(|(_, hook)| Rc::clone(hook))
			.collect();

		for hook in hooks {
			if let Err(err) = hook(route.clone(), previous.clone(), options).await {
				error!(error = %err, path = %route.path, "After-hook failed");
			}
		}
	}

	/// Returns the number of before-hooks.
	pub fn before_len(&self) -> usize {
		self.lists.before.borrow().len()
	}

	/// Returns the number of after-hooks.
	pub fn after_len(&self) -> usize {
		self.lists.after.borrow().len()
	}

	/// Removes every hook.
	pub fn clear(&self) {
		self.lists.before.borrow_mut().clear();
		self.lists.after.borrow_mut().clear();
	}
}

impl std::fmt::Debug for HooksManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HooksManager")
			.field("before", &self.before_len())
			.field("after", &self.after_len())
			.finish()
	}
}
