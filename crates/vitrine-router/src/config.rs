//! Router configuration.
//!
//! [`RouterConfig`] holds every plain-data option of the router and can be
//! deserialized from the camelCase JSON object pages use for configuration.
//! Behavioral options (UI surface, error and not-found handlers) are not
//! data and are set on [`RouterBuilder`](crate::RouterBuilder) instead.

use crate::error::RouterError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default bound of the navigation stack.
pub const DEFAULT_MAX_STACK_SIZE: usize = 20;

/// Section used when a path has no segments.
pub const DEFAULT_ROUTE: &str = "home";

/// How routes are written into the browser URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
	/// `root + path`, using the History API.
	#[default]
	History,
	/// `root + "#" + path`, for hosts that cannot rewrite deep links.
	Hash,
}

/// Plain-data router options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouterConfig {
	/// URL writing mode.
	pub mode: HistoryMode,
	/// Base path the application is mounted under.
	pub root: String,
	/// Keep a trailing slash on canonical paths.
	pub trailing_slash: bool,
	/// Save and restore scroll offsets per route path.
	pub scroll_restoration: bool,
	/// CSS selector of the scrolled element; the window when absent.
	pub scroll_element: Option<String>,
	/// Emit a trace of every navigation phase.
	pub debug: bool,
	/// Bound of the navigation stack.
	pub max_stack_size: usize,
	/// Section used for `/`.
	pub default_route: String,
	/// CSS selector of the element route handlers render into.
	pub content_selector: Option<String>,
	/// Turn clicks on internal links into router navigations.
	pub intercept_links: bool,
	/// Unrecognized keys, kept but unused.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for RouterConfig {
	fn default() -> Self {
		Self {
			mode: HistoryMode::History,
			root: "/".to_string(),
			trailing_slash: false,
			scroll_restoration: true,
			scroll_element: None,
			debug: false,
			max_stack_size: DEFAULT_MAX_STACK_SIZE,
			default_route: DEFAULT_ROUTE.to_string(),
			content_selector: None,
			intercept_links: true,
			extra: BTreeMap::new(),
		}
	}
}

impl RouterConfig {
	/// Parses a configuration from a JSON object.
	///
	/// Missing keys take their default value.
	///
	/// # Errors
	///
	/// Returns [`RouterError::Serialization`] when `json` is not a valid
	/// configuration object.
	pub fn from_json(json: &str) -> Result<Self, RouterError> {
		Ok(serde_json::from_str(json)?)
	}

	/// Returns the root normalized to start and end with `/`.
	pub fn normalized_root(&self) -> String {
		let trimmed = self.root.trim_matches('/');
		if trimmed.is_empty() {
			"/".to_string()
		} else {
			format!("/{}/", trimmed)
		}
	}

	/// Applies every field present in `patch`.
	pub fn merge(&mut self, patch: ConfigPatch) {
		let ConfigPatch {
			mode,
			root,
			trailing_slash,
			scroll_restoration,
			scroll_element,
			debug,
			max_stack_size,
			default_route,
			content_selector,
			intercept_links,
			extra,
		} = patch;

		if let Some(mode) = mode {
			self.mode = mode;
		}
		if let Some(root) = root {
			self.root = root;
		}
		if let Some(trailing_slash) = trailing_slash {
			self.trailing_slash = trailing_slash;
		}
		if let Some(scroll_restoration) = scroll_restoration {
			self.scroll_restoration = scroll_restoration;
		}
		if let Some(scroll_element) = scroll_element {
			self.scroll_element = scroll_element;
		}
		if let Some(debug) = debug {
			self.debug = debug;
		}
		if let Some(max_stack_size) = max_stack_size {
			self.max_stack_size = max_stack_size;
		}
		if let Some(default_route) = default_route {
			self.default_route = default_route;
		}
		if let Some(content_selector) = content_selector {
			self.content_selector = content_selector;
		}
		if let Some(intercept_links) = intercept_links {
			self.intercept_links = intercept_links;
		}
		self.extra.extend(extra);
	}
}

/// Partial configuration accepted by [`Router::configure`](crate::Router::configure).
///
/// `scroll_element` and `content_selector` are doubly optional so that a
/// patch can clear them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigPatch {
	/// New URL writing mode.
	pub mode: Option<HistoryMode>,
	/// New base path.
	pub root: Option<String>,
	/// New trailing slash policy.
	pub trailing_slash: Option<bool>,
	/// Enable or disable scroll restoration.
	pub scroll_restoration: Option<bool>,
	/// New scrolled element selector.
	pub scroll_element: Option<Option<String>>,
	/// Enable or disable navigation traces.
	pub debug: Option<bool>,
	/// New navigation stack bound.
	pub max_stack_size: Option<usize>,
	/// New default section.
	pub default_route: Option<String>,
	/// New content element selector.
	pub content_selector: Option<Option<String>>,
	/// Enable or disable link interception.
	pub intercept_links: Option<bool>,
	/// Additional unrecognized keys.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}

impl ConfigPatch {
	/// Creates an empty patch.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the navigation stack bound.
	pub fn max_stack_size(mut self, size: usize) -> Self {
		self.max_stack_size = Some(size);
		self
	}

	/// Sets the trailing slash policy.
	pub fn trailing_slash(mut self, enabled: bool) -> Self {
		self.trailing_slash = Some(enabled);
		self
	}

	/// Enables or disables scroll restoration.
	pub fn scroll_restoration(mut self, enabled: bool) -> Self {
		self.scroll_restoration = Some(enabled);
		self
	}

	/// Sets the scrolled element selector.
	pub fn scroll_element(mut self, selector: Option<String>) -> Self {
		self.scroll_element = Some(selector);
		self
	}

	/// Sets the default section.
	pub fn default_route(mut self, route: impl Into<String>) -> Self {
		self.default_route = Some(route.into());
		self
	}

	/// Enables or disables navigation traces.
	pub fn debug(mut self, enabled: bool) -> Self {
		self.debug = Some(enabled);
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults() {
		let config = RouterConfig::default();

		assert_eq!(config.mode, HistoryMode::History);
		assert_eq!(config.max_stack_size, 20);
		assert_eq!(config.default_route, "home");
		assert!(config.scroll_restoration);
		assert!(!config.trailing_slash);
	}

	#[rstest]
	fn test_from_json_keeps_unknown_keys() {
		// Arrange
		let json = r#"{
			"mode": "hash",
			"trailingSlash": true,
			"maxStackSize": 5,
			"theme": "dark"
		}"#;

		// Act
		let config = RouterConfig::from_json(json).unwrap();

		// Assert
		assert_eq!(config.mode, HistoryMode::Hash);
		assert!(config.trailing_slash);
		assert_eq!(config.max_stack_size, 5);
		assert_eq!(config.default_route, "home");
		assert_eq!(
			config.extra.get("theme"),
			Some(&serde_json::Value::String("dark".to_string()))
		);
	}

	#[rstest]
	fn test_from_json_rejects_bad_types() {
		let result = RouterConfig::from_json(r#"{ "maxStackSize": "many" }"#);

		assert!(matches!(result, Err(RouterError::Serialization(_))));
	}

	#[rstest]
	#[case("/", "/")]
	#[case("", "/")]
	#[case("/docs", "/docs/")]
	#[case("docs/", "/docs/")]
	#[case("/a/b/", "/a/b/")]
	fn test_normalized_root(#[case] root: &str, #[case] expected: &str) {
		let config = RouterConfig {
			root: root.to_string(),
			..RouterConfig::default()
		};

		assert_eq!(config.normalized_root(), expected);
	}

	#[rstest]
	fn test_merge_only_touches_given_fields() {
		// Arrange
		let mut config = RouterConfig {
			scroll_element: Some("#main".to_string()),
			..RouterConfig::default()
		};

		// Act
		config.merge(ConfigPatch::new().max_stack_size(3).debug(true));

		// Assert
		assert_eq!(config.max_stack_size, 3);
		assert!(config.debug);
		assert_eq!(config.scroll_element.as_deref(), Some("#main"));
		assert_eq!(config.default_route, "home");
	}

	#[rstest]
	fn test_merge_can_clear_selector() {
		let mut config = RouterConfig {
			scroll_element: Some("#main".to_string()),
			..RouterConfig::default()
		};

		config.merge(ConfigPatch::new().scroll_element(None));

		assert!(config.scroll_element.is_none());
	}
}
