//! Route registry.
//!
//! Registration keys are normalized by trimming slashes, an empty key
//! standing for the default route. Each key is classified once:
//!
//! - exact keys such as `components/buttons`
//! - parameterized keys such as `components/:name`
//! - wildcard keys ending in `*`, such as `docs/*`
//!
//! Lookup order is fixed by specificity, independent of registration order:
//! exact `section/subsection`, exact `section`, parameterized keys with more
//! literal segments first, then wildcards with longer prefixes first. Ties
//! keep registration order. Successful lookups are cached per route key
//! until the registry changes; the cache holds at most [`CACHE_CAPACITY`]
//! keys and starts over once full.

use crate::error::RouterError;
use crate::handler::RouteHandler;
use crate::route::{Params, Route};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Number of route keys the resolution cache holds before starting over.
pub const CACHE_CAPACITY: usize = 128;

/// Title shown while a route is displayed.
#[derive(Clone)]
pub enum RouteTitle {
	/// A fixed title.
	Static(String),
	/// A title computed from the route.
	Dynamic(Rc<dyn Fn(&Route) -> String>),
}

impl RouteTitle {
	/// Returns the title for `route`.
	pub fn resolve(&self, route: &Route) -> String {
		match self {
			Self::Static(title) => title.clone(),
			Self::Dynamic(title) => title(route),
		}
	}
}

impl std::fmt::Debug for RouteTitle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Static(title) => f.debug_tuple("Static").field(title).finish(),
			Self::Dynamic(_) => f.write_str("Dynamic(..)"),
		}
	}
}

impl From<&str> for RouteTitle {
	fn from(title: &str) -> Self {
		Self::Static(title.to_string())
	}
}

impl From<String> for RouteTitle {
	fn from(title: String) -> Self {
		Self::Static(title)
	}
}

/// A handler with its optional title and free-form metadata.
#[derive(Clone)]
pub struct RouteEntry {
	pub(crate) handler: Rc<dyn RouteHandler>,
	pub(crate) title: Option<RouteTitle>,
	pub(crate) metadata: BTreeMap<String, serde_json::Value>,
}

impl RouteEntry {
	/// Creates an entry for `handler`.
	pub fn new<F, Fut>(handler: F) -> Self
	where
		F: Fn(Route, Rc<dyn crate::handler::Ui>) -> Fut + 'static,
		Fut: std::future::Future + 'static,
		Fut::Output: crate::handler::IntoHandlerResult,
	{
		Self::from_handler(crate::handler::shared(handler))
	}

	/// Creates an entry for an already shared handler.
	pub fn from_handler(handler: Rc<dyn RouteHandler>) -> Self {
		Self {
			handler,
			title: None,
			metadata: BTreeMap::new(),
		}
	}

	/// Sets the title.
	pub fn title(mut self, title: impl Into<RouteTitle>) -> Self {
		self.title = Some(title.into());
		self
	}

	/// Sets a title computed from the route.
	pub fn dynamic_title(mut self, title: impl Fn(&Route) -> String + 'static) -> Self {
		self.title = Some(RouteTitle::Dynamic(Rc::new(title)));
		self
	}

	/// Adds a metadata value.
	pub fn meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.metadata.insert(key.into(), value.into());
		self
	}

	/// Returns the handler.
	pub fn handler(&self) -> &Rc<dyn RouteHandler> {
		&self.handler
	}

	/// Returns the title, if any.
	pub fn route_title(&self) -> Option<&RouteTitle> {
		self.title.as_ref()
	}

	/// Returns the metadata.
	pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
		&self.metadata
	}
}

impl std::fmt::Debug for RouteEntry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouteEntry")
			.field("title", &self.title)
			.field("metadata", &self.metadata)
			.finish_non_exhaustive()
	}
}

/// Shape of a normalized registration key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyKind {
	/// Matched by string equality.
	Exact,
	/// Contains `:name` segments.
	Param {
		/// Number of non-parameter segments.
		literal_segments: usize,
	},
	/// Ends in `*`; matches routes whose key starts with `prefix`.
	Wildcard {
		/// Key text before the `*`.
		prefix: String,
	},
}

/// A successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch {
	/// Normalized key of the matched registration.
	pub key: String,
	/// The matched entry.
	pub entry: RouteEntry,
	/// Values captured by `:name` segments.
	pub params: Params,
}

#[derive(Debug)]
struct Registered {
	kind: KeyKind,
	entry: RouteEntry,
	order: u64,
}

/// Keyed handler storage with specificity-ordered lookup.
#[derive(Debug, Default)]
pub struct RouteRegistry {
	routes: HashMap<String, Registered>,
	params: Vec<String>,
	wildcards: Vec<String>,
	next_order: u64,
	cache: RefCell<HashMap<String, (String, Params)>>,
}

impl RouteRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Normalizes and classifies a registration key.
	///
	/// # Errors
	///
	/// Returns [`RouterError::InvalidRoute`] when `*` appears anywhere but at
	/// the end of the key, or when a `:` segment has no name.
	pub fn normalize_key(raw: &str, default_route: &str) -> Result<(String, KeyKind), RouterError> {
		let trimmed = raw.trim_matches('/');
		let key = if trimmed.is_empty() {
			default_route.trim_matches('/').to_string()
		} else {
			trimmed.to_string()
		};

		let invalid = |reason: &str| RouterError::InvalidRoute {
			key: raw.to_string(),
			reason: reason.to_string(),
		};

		if let Some(prefix) = key.strip_suffix('*') {
			if prefix.contains('*') {
				return Err(invalid("wildcard must be the last character"));
			}
			let prefix = prefix.to_string();
			return Ok((key, KeyKind::Wildcard { prefix }));
		}
		if key.contains('*') {
			return Err(invalid("wildcard must be the last character"));
		}

		let mut literal_segments = 0;
		let mut has_params = false;
		for segment in key.split('/') {
			match segment.strip_prefix(':') {
				Some("") => return Err(invalid("parameter segment has no name")),
				Some(_) => has_params = true,
				None => literal_segments += 1,
			}
		}

		if has_params {
			Ok((key, KeyKind::Param { literal_segments }))
		} else {
			Ok((key, KeyKind::Exact))
		}
	}

	/// Registers `entry` under `raw`, replacing an earlier entry with the
	/// same normalized key. Returns the normalized key.
	///
	/// # Errors
	///
	/// See [`RouteRegistry::normalize_key`].
	pub fn insert(
		&mut self,
		raw: &str,
		default_route: &str,
		entry: RouteEntry,
	) -> Result<String, RouterError> {
		let (key, kind) = Self::normalize_key(raw, default_route)?;
		self.cache.borrow_mut().clear();

		if let Some(existing) = self.routes.get_mut(&key) {
			existing.entry = entry;
			return Ok(key);
		}

		let order = self.next_order;
		self.next_order += 1;
		match &kind {
			KeyKind::Exact => {}
			KeyKind::Param { .. } => self.params.push(key.clone()),
			KeyKind::Wildcard { .. } => self.wildcards.push(key.clone()),
		}
		self.routes
			.insert(key.clone(), Registered { kind, entry, order });
		self.sort();
		Ok(key)
	}

	fn sort(&mut self) {
		let routes = &self.routes;
		let rank = |key: &String| {
			routes.get(key).map(|r| {
				let weight = match &r.kind {
					KeyKind::Exact => 0,
					KeyKind::Param { literal_segments } => *literal_segments,
					KeyKind::Wildcard { prefix } => prefix.len(),
				};
				(std::cmp::Reverse(weight), r.order)
			})
		};
		self.params.sort_by_key(rank);
		self.wildcards.sort_by_key(rank);
	}

	/// Returns the entry registered under the normalized `key`.
	pub fn get(&self, key: &str) -> Option<&RouteEntry> {
		self.routes.get(key).map(|r| &r.entry)
	}

	/// Returns the exact entry for `key`, ignoring patterns.
	pub fn get_exact(&self, key: &str) -> Option<&RouteEntry> {
		self.routes
			.get(key)
			.filter(|r| r.kind == KeyKind::Exact)
			.map(|r| &r.entry)
	}

	/// Returns `true` when `raw` normalizes to a registered key.
	pub fn contains(&self, raw: &str, default_route: &str) -> bool {
		Self::normalize_key(raw, default_route)
			.map(|(key, _)| self.routes.contains_key(&key))
			.unwrap_or(false)
	}

	/// Returns parameterized keys in lookup order.
	pub fn param_patterns(&self) -> &[String] {
		&self.params
	}

	/// Returns wildcard keys with their prefixes, in lookup order.
	pub fn wildcard_patterns(&self) -> impl Iterator<Item = (&str, &str)> {
		self.wildcards.iter().filter_map(|key| {
			self.routes.get(key).and_then(|r| match &r.kind {
				KeyKind::Wildcard { prefix } => Some((key.as_str(), prefix.as_str())),
				_ => None,
			})
		})
	}

	pub(crate) fn cached(&self, route: &Route) -> Option<RouteMatch> {
		let cache = self.cache.borrow();
		let (key, params) = cache.get(&route.key())?;
		self.get(key).map(|entry| RouteMatch {
			key: key.clone(),
			entry: entry.clone(),
			params: params.clone(),
		})
	}

	pub(crate) fn remember(&self, route: &Route, found: &RouteMatch) {
		let key = route.key();
		let mut cache = self.cache.borrow_mut();
		if cache.len() >= CACHE_CAPACITY && !cache.contains_key(&key) {
			cache.clear();
		}
		cache.insert(key, (found.key.clone(), found.params.clone()));
	}

	/// Returns the number of cached lookups.
	pub fn cached_len(&self) -> usize {
		self.cache.borrow().len()
	}

	/// Returns the number of registered keys.
	pub fn len(&self) -> usize {
		self.routes.len()
	}

	/// Returns `true` when nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.routes.is_empty()
	}

	/// Removes every registration.
	pub fn clear(&mut self) {
		self.routes.clear();
		self.params.clear();
		self.wildcards.clear();
		self.cache.borrow_mut().clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::handler::Ui;
	use rstest::{fixture, rstest};

	fn entry(label: &'static str) -> RouteEntry {
		RouteEntry::new(move |_route: Route, _ui: Rc<dyn Ui>| async move { label }).meta("label", label)
	}

	fn label(entry: &RouteEntry) -> Option<&str> {
		entry.metadata().get("label").and_then(|v| v.as_str())
	}

	#[fixture]
	fn registry() -> RouteRegistry {
		RouteRegistry::new()
	}

	#[rstest]
	fn test_cache_stays_bounded(mut registry: RouteRegistry) {
		// Arrange
		registry.insert("users/:id", "home", entry("user")).unwrap();

		// Act
		for id in 0..CACHE_CAPACITY * 3 {
			let route = Route {
				section: "users".to_string(),
				subsection: id.to_string(),
				path: format!("/users/{}", id),
				..Route::default()
			};
			let found = crate::parser::find_route_handler(&route, &registry).unwrap();
			assert_eq!(found.params.get("id"), Some(&id.to_string()));
		}

		// Assert
		assert!(registry.cached_len() <= CACHE_CAPACITY);
		assert!(registry.cached_len() > 0);
	}

	#[rstest]
	#[case("/components/buttons/", "components/buttons", KeyKind::Exact)]
	#[case("", "home", KeyKind::Exact)]
	#[case("/", "home", KeyKind::Exact)]
	#[case("components/:name", "components/:name", KeyKind::Param { literal_segments: 1 })]
	#[case("docs/*", "docs/*", KeyKind::Wildcard { prefix: "docs/".to_string() })]
	#[case("*", "*", KeyKind::Wildcard { prefix: String::new() })]
	fn test_normalize_key(#[case] raw: &str, #[case] key: &str, #[case] kind: KeyKind) {
		let (normalized, classified) = RouteRegistry::normalize_key(raw, "home").unwrap();

		assert_eq!(normalized, key);
		assert_eq!(classified, kind);
	}

	#[rstest]
	#[case("docs/*/api")]
	#[case("**")]
	#[case("components/:")]
	fn test_normalize_key_rejects(#[case] raw: &str) {
		let result = RouteRegistry::normalize_key(raw, "home");

		assert!(matches!(result, Err(RouterError::InvalidRoute { .. })));
	}

	#[rstest]
	fn test_reregistration_replaces(mut registry: RouteRegistry) {
		// Arrange
		registry.insert("about", "home", entry("first")).unwrap();

		// Act
		registry.insert("/about/", "home", entry("second")).unwrap();

		// Assert
		assert_eq!(registry.len(), 1);
		assert_eq!(registry.get("about").and_then(label), Some("second"));
	}

	#[rstest]
	fn test_patterns_sorted_by_specificity(mut registry: RouteRegistry) {
		// Arrange
		registry.insert("*", "home", entry("all")).unwrap();
		registry.insert(":a/:b", "home", entry("two-params")).unwrap();
		registry.insert("docs/*", "home", entry("docs")).unwrap();
		registry.insert("components/:name", "home", entry("component")).unwrap();
		registry.insert("docs/api/*", "home", entry("api")).unwrap();

		// Act
		let params = registry.param_patterns().to_vec();
		let wildcards: Vec<&str> = registry.wildcard_patterns().map(|(k, _)| k).collect();

		// Assert
		assert_eq!(params, vec!["components/:name", ":a/:b"]);
		assert_eq!(wildcards, vec!["docs/api/*", "docs/*", "*"]);
	}

	#[rstest]
	fn test_contains_and_exact(mut registry: RouteRegistry) {
		registry.insert("components/:name", "home", entry("component")).unwrap();
		registry.insert("home", "home", entry("home")).unwrap();

		assert!(registry.contains("/", "home"));
		assert!(registry.contains("/components/:name/", "home"));
		assert!(registry.get_exact("components/:name").is_none());
		assert!(registry.get_exact("home").is_some());
	}

	#[rstest]
	fn test_clear_empties_everything(mut registry: RouteRegistry) {
		registry.insert("docs/*", "home", entry("docs")).unwrap();

		registry.clear();

		assert!(registry.is_empty());
		assert_eq!(registry.wildcard_patterns().count(), 0);
	}

	#[rstest]
	fn test_dynamic_title() {
		let entry = entry("x").dynamic_title(|route| format!("{} | Vitrine", route.section));
		let route = Route {
			section: "components".to_string(),
			..Route::default()
		};

		let title = entry.route_title().map(|t| t.resolve(&route));

		assert_eq!(title.as_deref(), Some("components | Vitrine"));
	}
}
