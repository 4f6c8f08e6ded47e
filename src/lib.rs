//! # Vitrine
//!
//! A showcase of UI components for the web.
//!
//! This facade crate gathers the showcase crates behind feature flags.
//!
//! ## Feature Flags
//!
//! - `router` (default) - Client-side router with history and scroll
//!   restoration (via `vitrine-router`)

#[cfg(feature = "router")]
pub mod router;
