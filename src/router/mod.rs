//! # Router Module
//!
//! Pattern compilation, per-route matching and first-match route selection.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling URI templates (`/lead/:id`, `/files/:path+`, `/foo(/bar)`) into
//!   anchored regular expressions when a route is registered
//! - Testing a request's method and path against each route
//! - Extracting and URL-decoding named path parameters
//! - Selecting exactly one route per request, in registration order
//!
//! ## Architecture
//!
//! 1. **Compilation**: [`RouteDefinition::new`] normalizes the template,
//!    splits it into segments and compiles it once. Malformed templates are
//!    rejected with a [`PatternError`].
//!
//! 2. **Matching**: [`RouteTable::select`] walks the routes in registration
//!    order and stops at the first one that accepts the request, returning it
//!    together with a [`RouteMatch`] holding the extracted parameters.
//!
//! ## Example
//!
//! ```rust
//! use gaterouter::router::{RouteDefinition, RouteTable};
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! let route = RouteDefinition::new(&[Method::GET], "/lead/:id")
//!     .expect("valid pattern")
//!     .with_name("lead-get");
//! table.register(route, None);
//!
//! let selection = table.select_path(&Method::GET, "/lead/42").expect("route matches");
//! assert_eq!(selection.index, 0);
//! assert_eq!(selection.matched.get("id").and_then(|v| v.as_str()), Some("42"));
//! ```
//!
//! ## Performance
//!
//! Selection is O(n) in the number of routes; each test is one run of a
//! precompiled expression. Extracted parameters live in a `SmallVec`, so
//! routes with ≤8 placeholders do not allocate a parameter list.

mod core;
mod pattern;
mod route;

pub use core::{
    ArgVec, ParamValue, ParamVec, RouteEntry, RouteMatch, RouteTable, Selection,
    MAX_INLINE_PARAMS,
};
pub use pattern::{normalize_pattern, url_decode, CompiledPattern, PatternError, Placeholder};
pub use route::RouteDefinition;
