//! Router core module - route table and first-match selection.

use http::Method;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::route::RouteDefinition;
use crate::dispatcher::{default_forwarder, Forwarder};
use crate::server::RequestContext;

/// Maximum number of extracted parameters before heap allocation.
/// Most routes have ≤4 placeholders (e.g., `/users/:id/posts/:post`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Value captured by one placeholder.
///
/// Single-segment placeholders (`:id`) yield [`ParamValue::Single`]; greedy
/// placeholders (`:path+`) yield the captured text split on `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Decoded value of a `:name` placeholder
    Single(String),
    /// Decoded segments of a `:name+` placeholder
    Segments(Vec<String>),
}

impl ParamValue {
    /// The scalar value, if this is a single-segment capture.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Single(s) => Some(s),
            ParamValue::Segments(_) => None,
        }
    }

    /// The segment list, if this is a greedy capture.
    #[must_use]
    pub fn segments(&self) -> Option<&[String]> {
        match self {
            ParamValue::Single(_) => None,
            ParamValue::Segments(parts) => Some(parts),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::Segments(value)
    }
}

impl PartialEq<&str> for ParamValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

/// Stack-allocated `(name, value)` storage for one match.
///
/// Names are `Arc<str>` shared with the compiled pattern, so building a
/// match never copies them.
pub type ParamVec = SmallVec<[(Arc<str>, ParamValue); MAX_INLINE_PARAMS]>;

/// Positional argument list handed to gatekeepers and handlers.
pub type ArgVec = SmallVec<[ParamValue; MAX_INLINE_PARAMS]>;

/// Result of successfully matching a request against one route.
///
/// Scoped to a single dispatch: it is returned by value from
/// [`RouteDefinition::matches`] and never stored on the route, so
/// concurrent dispatches of the same route cannot see each other's values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    params: ParamVec,
}

impl RouteMatch {
    pub(crate) fn new(params: ParamVec) -> Self {
        Self { params }
    }

    /// Get an extracted parameter by placeholder name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// Extracted `(name, value)` pairs in placeholder-appearance order
    #[must_use]
    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    /// Values in placeholder-appearance order, the handler's positional args
    #[must_use]
    pub fn args(&self) -> ArgVec {
        self.params.iter().map(|(_, v)| v.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Convert to a `HashMap`.
    /// Note: This allocates - use `get()` in hot paths instead
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, ParamValue> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// One registered route paired with its forwarding function.
pub struct RouteEntry {
    pub(crate) route: RouteDefinition,
    pub(crate) forwarder: Forwarder,
}

impl RouteEntry {
    #[must_use]
    pub fn route(&self) -> &RouteDefinition {
        &self.route
    }

    #[must_use]
    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEntry")
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

/// The entry picked for a request, with the parameters it extracted.
pub struct Selection<'a> {
    /// Registration index of the selected route
    pub index: usize,
    /// The selected route and its forwarding function
    pub entry: &'a RouteEntry,
    /// Parameters extracted by this match
    pub matched: RouteMatch,
}

/// Ordered route table with first-match-wins selection.
///
/// Routes are tested in registration order and the first one whose method
/// set and pattern accept the request is selected. There is no specificity
/// ranking: when two patterns overlap, the one registered first always wins.
///
/// The table only grows; there is no removal API. Index `i` is always the
/// `i`-th registered route.
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    slow_match_threshold: Duration,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("entries", &self.entries)
            .field("slow_match_threshold", &self.slow_match_threshold)
            .finish()
    }
}

impl RouteTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            slow_match_threshold: Duration::from_millis(1),
        }
    }

    /// Selections slower than `threshold` are logged at `warn` instead of `info`.
    #[must_use]
    pub fn with_slow_match_threshold(mut self, threshold: Duration) -> Self {
        self.slow_match_threshold = threshold;
        self
    }

    /// Append a route. Without a forwarding function the default one is
    /// installed, which always invokes the matched route.
    pub fn register(&mut self, route: RouteDefinition, forwarder: Option<Forwarder>) -> &mut RouteEntry {
        info!(
            index = self.entries.len(),
            name = %route.name(),
            methods = ?route.methods(),
            pattern = %route.pattern(),
            custom_forwarding = forwarder.is_some(),
            "Route registered"
        );
        let forwarder = forwarder.unwrap_or_else(default_forwarder);
        self.entries.push(RouteEntry { route, forwarder });
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry registered at `index`, if any
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&RouteEntry> {
        self.entries.get(index)
    }

    /// Entries in registration (= priority) order
    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }

    /// Select the route for a request context.
    #[must_use]
    pub fn select(&self, ctx: &dyn RequestContext) -> Option<Selection<'_>> {
        self.select_path(ctx.method(), ctx.path())
    }

    /// Select the first route accepting `method` and `path`.
    ///
    /// # Returns
    ///
    /// * `Some(Selection)` - the first matching entry in registration order
    /// * `None` - nothing matched; producing a not-found response is up to the caller
    #[must_use]
    pub fn select_path(&self, method: &Method, path: &str) -> Option<Selection<'_>> {
        debug!(
            method = %method,
            path = %path,
            routes_count = self.entries.len(),
            "Route match attempt"
        );

        let match_start = Instant::now();

        for (index, entry) in self.entries.iter().enumerate() {
            let Some(matched) = entry.route.matches(method, path) else {
                continue;
            };
            let match_duration = match_start.elapsed();

            if match_duration > self.slow_match_threshold {
                warn!(
                    method = %method,
                    path = %path,
                    index,
                    name = %entry.route.name(),
                    route_pattern = %entry.route.pattern(),
                    params = ?matched.params(),
                    duration_us = match_duration.as_micros(),
                    "Slow route matching detected"
                );
            } else {
                info!(
                    method = %method,
                    path = %path,
                    index,
                    name = %entry.route.name(),
                    route_pattern = %entry.route.pattern(),
                    params = ?matched.params(),
                    duration_us = match_duration.as_micros(),
                    "Route matched"
                );
            }

            return Some(Selection {
                index,
                entry,
                matched,
            });
        }

        warn!(
            method = %method,
            path = %path,
            duration_us = match_start.elapsed().as_micros(),
            "No route matched"
        );

        None
    }

    /// Literal-plus-placeholder form of every pattern, in registration order.
    #[must_use]
    pub fn patterns(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.route.template()).collect()
    }

    /// One line per route, for diagnostics.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = format!("[routes] count={}\n", self.entries.len());
        for (index, entry) in self.entries.iter().enumerate() {
            let methods: Vec<&str> = entry.route.methods().iter().map(Method::as_str).collect();
            out.push_str(&format!(
                "[route] #{index} {} {} -> {}\n",
                methods.join(","),
                entry.route.pattern(),
                entry.route.name()
            ));
        }
        out
    }
}
