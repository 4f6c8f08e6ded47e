//! Route value types.
//!
//! A [`Route`] is the structured form of a URL path handled by the router:
//! the first path segment is the *section*, the remaining segments form the
//! *subsection*. Routes are plain values; the router never mutates a route
//! it has handed out, it builds a new one instead.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Query-string parameters and `:param` path captures.
pub type Params = BTreeMap<String, String>;

/// A parsed or constructed route.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
	/// First path segment, never empty.
	pub section: String,
	/// Remaining path segments joined by `/`, may be empty.
	pub subsection: String,
	/// Canonical path, always `/` or starting with `/`.
	pub path: String,
	/// Raw input path, only present when the route came from parsing.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub original_path: Option<String>,
	/// Query parameters merged with path captures.
	#[serde(default)]
	pub params: Params,
	/// Raw query string without the leading `?`.
	#[serde(default)]
	pub query: String,
	/// Wall-clock creation time in milliseconds.
	#[serde(default)]
	pub timestamp: u64,
	/// Whether the route was reached through browser back/forward.
	#[serde(default)]
	pub popstate: bool,
}

impl Route {
	/// Returns the registry lookup key, `section/subsection` or just `section`.
	pub fn key(&self) -> String {
		if self.subsection.is_empty() {
			self.section.clone()
		} else {
			format!("{}/{}", self.section, self.subsection)
		}
	}

	/// Returns the canonical path without its leading slash.
	pub fn relative_path(&self) -> &str {
		self.path.trim_start_matches('/')
	}

	/// Returns `true` when both routes point at the same location.
	///
	/// Only `path` and `query` take part in the comparison.
	pub fn same_location(&self, other: &Route) -> bool {
		self.path == other.path && self.query == other.query
	}

	/// Returns a copy of this route with `patch` applied.
	pub fn patched(&self, patch: RoutePatch) -> Route {
		let mut route = self.clone();
		route.apply(patch);
		route
	}

	/// Applies every field present in `patch`, replacing the current value.
	///
	/// `params` is replaced as a whole, not merged key by key.
	pub fn apply(&mut self, patch: RoutePatch) {
		let RoutePatch {
			section,
			subsection,
			path,
			params,
			query,
			popstate,
		} = patch;

		if let Some(section) = section {
			self.section = section;
		}
		if let Some(subsection) = subsection {
			self.subsection = subsection;
		}
		if let Some(path) = path {
			self.path = path;
		}
		if let Some(params) = params {
			self.params = params;
		}
		if let Some(query) = query {
			self.query = query;
		}
		if let Some(popstate) = popstate {
			self.popstate = popstate;
		}
	}
}

/// Partial replacement for a [`Route`], returned by before-hooks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutePatch {
	/// Replacement section.
	pub section: Option<String>,
	/// Replacement subsection.
	pub subsection: Option<String>,
	/// Replacement canonical path.
	pub path: Option<String>,
	/// Replacement parameter map.
	pub params: Option<Params>,
	/// Replacement query string.
	pub query: Option<String>,
	/// Replacement popstate flag.
	pub popstate: Option<bool>,
}

impl RoutePatch {
	/// Creates an empty patch.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the replacement section.
	pub fn section(mut self, section: impl Into<String>) -> Self {
		self.section = Some(section.into());
		self
	}

	/// Sets the replacement subsection.
	pub fn subsection(mut self, subsection: impl Into<String>) -> Self {
		self.subsection = Some(subsection.into());
		self
	}

	/// Sets the replacement path.
	pub fn path(mut self, path: impl Into<String>) -> Self {
		self.path = Some(path.into());
		self
	}

	/// Sets the replacement parameter map.
	pub fn params<I, K, V>(mut self, params: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.params = Some(
			params
				.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		);
		self
	}

	/// Sets the replacement query string.
	pub fn query(mut self, query: impl Into<String>) -> Self {
		self.query = Some(query.into());
		self
	}

	/// Returns `true` when the patch changes nothing.
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}
}
