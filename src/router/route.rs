use http::Method;
use std::fmt;
use std::sync::Arc;

use super::core::{ParamVec, ParamValue, RouteMatch};
use super::pattern::{normalize_pattern, split_segments, url_decode, CompiledPattern, PatternError};
use crate::dispatcher::{
    handler, identity_gatekeeper, noop_handler, GateDecision, Gatekeeper, Handler,
};
use crate::server::{RequestContext, Responder};

/// One routable endpoint: methods, URI template, name, handler and gatekeeper.
///
/// Built once during registration. The template is compiled when the
/// definition is created (and again on [`set_pattern`](Self::set_pattern)),
/// so matching a request only runs an already-compiled expression.
#[derive(Clone)]
pub struct RouteDefinition {
    methods: Vec<Method>,
    pattern: String,
    segments: Vec<String>,
    compiled: CompiledPattern,
    name: String,
    handler: Handler,
    gatekeeper: Gatekeeper,
}

impl RouteDefinition {
    /// Create a definition with the no-op handler and the identity gatekeeper.
    ///
    /// An empty `methods` list means `GET`.
    pub fn new(methods: &[Method], pattern: &str) -> Result<Self, PatternError> {
        let pattern = normalize_pattern(pattern);
        let segments = split_segments(&pattern);
        let compiled = CompiledPattern::compile(&segments.join("/"))?;
        Ok(Self {
            methods: Self::apply_methods(methods),
            pattern,
            segments,
            compiled,
            name: String::new(),
            handler: noop_handler(),
            gatekeeper: identity_gatekeeper(),
        })
    }

    fn apply_methods(methods: &[Method]) -> Vec<Method> {
        if methods.is_empty() {
            vec![Method::GET]
        } else {
            methods.to_vec()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_handler<F, R>(mut self, f: F) -> Self
    where
        F: Fn(&[ParamValue], &dyn RequestContext) -> R + Send + Sync + 'static,
        R: Responder + 'static,
    {
        self.handler = handler(f);
        self
    }

    #[must_use]
    pub fn with_gatekeeper<F>(mut self, f: F) -> Self
    where
        F: Fn(&[ParamValue], &dyn RequestContext) -> GateDecision + Send + Sync + 'static,
    {
        self.gatekeeper = Arc::new(f);
        self
    }

    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Replace the method set; an empty list means `GET`.
    pub fn set_methods(&mut self, methods: &[Method]) {
        self.methods = Self::apply_methods(methods);
    }

    /// Add methods to the accepted set.
    pub fn append_methods(&mut self, methods: &[Method]) {
        for method in methods {
            if !self.methods.contains(method) {
                self.methods.push(method.clone());
            }
        }
    }

    /// Exact, case-sensitive method test.
    #[must_use]
    pub fn supports_method(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// The normalized template
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Replace the template, recomputing segments and the compiled expression.
    ///
    /// On error the definition is left unchanged.
    pub fn set_pattern(&mut self, pattern: &str) -> Result<(), PatternError> {
        let pattern = normalize_pattern(pattern);
        let segments = split_segments(&pattern);
        let compiled = CompiledPattern::compile(&segments.join("/"))?;
        self.pattern = pattern;
        self.segments = segments;
        self.compiled = compiled;
        Ok(())
    }

    /// `/`-delimited segments of the template
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Literal-plus-placeholder reconstruction of the template.
    #[must_use]
    pub fn template(&self) -> String {
        self.segments.join("/")
    }

    #[must_use]
    pub fn compiled(&self) -> &CompiledPattern {
        &self.compiled
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn set_handler(&mut self, handler: Handler) {
        self.handler = handler;
    }

    #[must_use]
    pub fn gatekeeper(&self) -> &Gatekeeper {
        &self.gatekeeper
    }

    pub fn set_gatekeeper(&mut self, gatekeeper: Gatekeeper) {
        self.gatekeeper = gatekeeper;
    }

    /// Test this route against a request context.
    #[must_use]
    pub fn matches_request(&self, ctx: &dyn RequestContext) -> Option<RouteMatch> {
        self.matches(ctx.method(), ctx.path())
    }

    /// Test this route against a method and an already-normalized path.
    ///
    /// Every placeholder that captured a value is URL-decoded; greedy ones
    /// are then split on `/`. Placeholders inside an optional group that did
    /// not participate are left out.
    #[must_use]
    pub fn matches(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        if !self.supports_method(method) {
            return None;
        }

        let captures = self.compiled.captures(path)?;

        let mut params = ParamVec::new();
        for (placeholder, raw) in self.compiled.placeholders().iter().zip(captures) {
            let Some(raw) = raw else { continue };
            let decoded = url_decode(raw);
            let value = if placeholder.greedy {
                ParamValue::Segments(decoded.split('/').map(str::to_string).collect())
            } else {
                ParamValue::Single(decoded)
            };
            params.push((Arc::clone(&placeholder.name), value));
        }

        Some(RouteMatch::new(params))
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("methods", &self.methods)
            .field("pattern", &self.pattern)
            .field("name", &self.name)
            .field("expression", &self.compiled.as_str())
            .finish_non_exhaustive()
    }
}
