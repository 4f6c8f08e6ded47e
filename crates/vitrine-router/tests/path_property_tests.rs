//! Property-based tests for path parsing and generation
//!
//! Uses proptest to verify:
//! 1. Generated paths parse back into the same section and subsection
//! 2. The default route collapses to `/` whatever the parameters
//! 3. A trailing slash never changes the canonical path
//! 4. Query parameters survive a generate/parse cycle

#![cfg(not(target_arch = "wasm32"))]

use proptest::prelude::*;
use vitrine_router::{Params, RouterConfig, generate_path, match_path_with_params, parse_path};

fn segment() -> impl Strategy<Value = String> {
	"[a-z0-9][a-z0-9-]{0,11}"
}

fn subsection() -> impl Strategy<Value = String> {
	prop::collection::vec(segment(), 0..4).prop_map(|parts| parts.join("/"))
}

fn params() -> impl Strategy<Value = Params> {
	prop::collection::btree_map("[a-z]{1,8}", "[ -~]{0,12}", 0..4)
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(200))]

	/// Property: parse(generate(s, t)) yields s and t back
	#[test]
	fn test_generate_then_parse_keeps_route(section in segment(), subsection in subsection()) {
		let config = RouterConfig::default();
		prop_assume!(section != config.default_route);

		let route = parse_path(&generate_path(&section, &subsection, &Params::new(), &config), &config);

		prop_assert_eq!(route.section, section);
		prop_assert_eq!(route.subsection, subsection);
	}

	/// Property: the default route without subsection is `/`, parameters are dropped
	#[test]
	fn test_default_route_collapses(params in params()) {
		let config = RouterConfig::default();

		let path = generate_path(&config.default_route, "", &params, &config);

		prop_assert_eq!(path, "/");
	}

	/// Property: appending a trailing slash leaves the canonical path unchanged
	#[test]
	fn test_trailing_slash_is_ignored(section in segment(), subsection in subsection()) {
		let config = RouterConfig::default();
		let path = format!("/{}/{}", section, subsection);

		let plain = parse_path(&path, &config).path;
		let slashed = parse_path(&format!("{}/", path), &config).path;

		prop_assert_eq!(plain, slashed);
	}

	/// Property: query parameters are encoded and decoded losslessly
	#[test]
	fn test_params_survive(section in segment(), params in params()) {
		let config = RouterConfig::default();
		prop_assume!(section != config.default_route);

		let route = parse_path(&generate_path(&section, "", &params, &config), &config);

		prop_assert_eq!(route.params, params);
	}

	/// Property: a pattern made only of parameters captures every segment
	#[test]
	fn test_all_param_pattern_captures(values in prop::collection::vec(segment(), 1..5)) {
		let pattern = (0..values.len())
			.map(|i| format!(":p{}", i))
			.collect::<Vec<_>>()
			.join("/");
		let path = format!("/{}", values.join("/"));

		let captures = match_path_with_params(&pattern, &path).unwrap();

		for (i, value) in values.iter().enumerate() {
			prop_assert_eq!(captures.get(&format!("p{}", i)), Some(value));
		}
	}
}
