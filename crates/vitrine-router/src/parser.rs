//! Path parsing, generation and matching.
//!
//! These functions are pure: they read configuration and the registry but
//! never mutate routes or global state.

use crate::config::RouterConfig;
use crate::platform::now_millis;
use crate::registry::{RouteMatch, RouteRegistry};
use crate::route::{Params, Route};
use tracing::warn;

fn segments(path: &str) -> impl Iterator<Item = &str> {
	path.split('/').filter(|s| !s.is_empty())
}

fn canonical(segments: &[&str], config: &RouterConfig) -> String {
	if segments.is_empty() {
		return "/".to_string();
	}
	let mut path = format!("/{}", segments.join("/"));
	if config.trailing_slash {
		path.push('/');
	}
	path
}

/// Decodes a query string into a parameter map.
///
/// Later duplicates win. Malformed input yields an empty map.
pub fn parse_query(query: &str) -> Params {
	match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
		Ok(pairs) => pairs.into_iter().collect(),
		Err(err) => {
			warn!(query = %query, error = %err, "Ignoring malformed query string");
			Params::new()
		}
	}
}

/// Encodes a parameter map into a query string, without the leading `?`.
pub fn encode_query(params: &Params) -> String {
	serde_urlencoded::to_string(params).unwrap_or_default()
}

/// Parses a path such as `/components/buttons?tab=code` into a [`Route`].
///
/// Empty segments are dropped, a fragment is ignored, and a path without
/// segments maps to the configured default route.
///
/// # Examples
///
/// ```
/// use vitrine_router::{RouterConfig, parse_path};
///
/// let route = parse_path("/components/buttons/?tab=code", &RouterConfig::default());
/// assert_eq!(route.section, "components");
/// assert_eq!(route.subsection, "buttons");
/// assert_eq!(route.path, "/components/buttons");
/// assert_eq!(route.params.get("tab").map(String::as_str), Some("code"));
/// ```
pub fn parse_path(path: &str, config: &RouterConfig) -> Route {
	let without_fragment = path.split_once('#').map_or(path, |(before, _)| before);
	let (path_part, query) = without_fragment
		.split_once('?')
		.unwrap_or((without_fragment, ""));

	let parts: Vec<&str> = segments(path_part).collect();
	let (section, subsection) = match parts.split_first() {
		Some((first, rest)) => (first.to_string(), rest.join("/")),
		None => (config.default_route.clone(), String::new()),
	};

	Route {
		section,
		subsection,
		path: canonical(&parts, config),
		original_path: Some(path.to_string()),
		params: parse_query(query),
		query: query.to_string(),
		timestamp: now_millis(),
		popstate: false,
	}
}

/// Builds the URL path for a section, subsection and parameters.
///
/// Parameters are appended as a query string. The default section without
/// a subsection collapses to a bare `/`, dropping the parameters.
///
/// # Examples
///
/// ```
/// use vitrine_router::{Params, RouterConfig, generate_path};
///
/// let config = RouterConfig::default();
/// let mut params = Params::new();
/// params.insert("tab".to_string(), "code".to_string());
///
/// assert_eq!(generate_path("home", "", &Params::new(), &config), "/");
/// assert_eq!(
/// 	generate_path("components", "buttons", &params, &config),
/// 	"/components/buttons?tab=code"
/// );
/// ```
pub fn generate_path(section: &str, subsection: &str, params: &Params, config: &RouterConfig) -> String {
	let is_default = segments(section).eq(segments(&config.default_route));
	let subsection_parts: Vec<&str> = segments(subsection).collect();
	if is_default && subsection_parts.is_empty() {
		return "/".to_string();
	}

	let parts: Vec<&str> = segments(section).chain(subsection_parts).collect();
	let mut path = canonical(&parts, config);
	if !params.is_empty() {
		path.push('?');
		path.push_str(&encode_query(params));
	}
	path
}

/// Matches `path` against a `:name` pattern, returning the captures.
///
/// Both sides are split on `/` with empty segments dropped. Segment counts
/// must be equal; literal segments must match exactly.
///
/// # Examples
///
/// ```
/// use vitrine_router::match_path_with_params;
///
/// let captures = match_path_with_params("components/:name", "/components/cards").unwrap();
/// assert_eq!(captures.get("name").map(String::as_str), Some("cards"));
/// assert!(match_path_with_params("components/:name", "/docs/cards").is_none());
/// ```
pub fn match_path_with_params(pattern: &str, path: &str) -> Option<Params> {
	let pattern_parts: Vec<&str> = segments(pattern).collect();
	let path_parts: Vec<&str> = segments(path).collect();
	if pattern_parts.len() != path_parts.len() {
		return None;
	}

	let mut captures = Params::new();
	for (expected, actual) in pattern_parts.iter().zip(&path_parts) {
		match expected.strip_prefix(':') {
			Some(name) => {
				captures.insert(name.to_string(), actual.to_string());
			}
			None if expected == actual => {}
			None => return None,
		}
	}
	Some(captures)
}

/// Finds the registration handling `route`.
///
/// Lookup order: exact `section/subsection`, exact `section`,
/// parameterized keys, then wildcard keys, each pattern group ordered by
/// specificity.
pub fn find_route_handler(route: &Route, registry: &RouteRegistry) -> Option<RouteMatch> {
	if let Some(found) = registry.cached(route) {
		return Some(found);
	}

	let key = route.key();
	let exact = |key: &str| {
		registry.get_exact(key).map(|entry| RouteMatch {
			key: key.to_string(),
			entry: entry.clone(),
			params: Params::new(),
		})
	};

	let found = exact(&key)
		.or_else(|| exact(&route.section))
		.or_else(|| {
			registry.param_patterns().iter().find_map(|pattern| {
				let params = match_path_with_params(pattern, &key)?;
				registry.get(pattern).map(|entry| RouteMatch {
					key: pattern.clone(),
					entry: entry.clone(),
					params,
				})
			})
		})
		.or_else(|| {
			registry
				.wildcard_patterns()
				.find(|(_, prefix)| key.starts_with(prefix))
				.and_then(|(pattern, _)| {
					registry.get(pattern).map(|entry| RouteMatch {
						key: pattern.to_string(),
						entry: entry.clone(),
						params: Params::new(),
					})
				})
		})?;

	registry.remember(route, &found);
	Some(found)
}
