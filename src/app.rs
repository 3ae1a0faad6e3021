//! Registration façade: one method per HTTP verb, plus dispatch.
//!
//! ```rust
//! use gaterouter::{App, GateDecision, ParamValue, RequestContext, RequestEnv, Response, ResponseBuffer};
//! use http::Method;
//!
//! let mut app = App::new();
//! app.get("/lead/:id", "lead-get", |args: &[ParamValue], _ctx: &dyn RequestContext| {
//!     Response::text(format!("lead {}", args[0].as_str().unwrap_or_default()))
//! })?;
//! app.post("/lead", "lead-post", |args: &[ParamValue], _ctx: &dyn RequestContext| {
//!     Response::text(format!("{} args", args.len()))
//! })?
//! .gatekeeper(|_args: &[ParamValue], _ctx: &dyn RequestContext| GateDecision::replace(["p1", "p2"]));
//!
//! let mut sink = ResponseBuffer::new();
//! let outcome = app.dispatch(&RequestEnv::new(Method::GET, "/lead/7"), &mut sink);
//! assert!(outcome.is_handled());
//! assert_eq!(sink.body_text(), "lead 7");
//! # Ok::<(), gaterouter::PatternError>(())
//! ```

use http::Method;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::dispatcher::{handler, Dispatch, Dispatcher, Forwarder, GateDecision, Invoker};
use crate::middleware::Middleware;
use crate::router::{ParamValue, PatternError, RouteDefinition, RouteEntry, RouteTable};
use crate::runtime_config::RuntimeConfig;
use crate::server::{RequestContext, RequestEnv, Responder, ResponseBuffer, ResponseSink};

/// Route table plus dispatcher.
///
/// Register everything first, then share it (`Arc<App>`) across threads:
/// [`dispatch`](Self::dispatch) takes `&self`.
pub struct App {
    table: RouteTable,
    dispatcher: Dispatcher,
    config: RuntimeConfig,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// App configured from `GATEROUTER_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::with_config(RuntimeConfig::from_env())
    }

    #[must_use]
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            table: RouteTable::new().with_slow_match_threshold(config.slow_match_threshold),
            dispatcher: Dispatcher::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn get<F, R>(&mut self, pattern: &str, name: &str, f: F) -> Result<RouteRef<'_>, PatternError>
    where
        F: Fn(&[ParamValue], &dyn RequestContext) -> R + Send + Sync + 'static,
        R: Responder + 'static,
    {
        self.route(&[Method::GET], pattern, name, f)
    }

    pub fn post<F, R>(&mut self, pattern: &str, name: &str, f: F) -> Result<RouteRef<'_>, PatternError>
    where
        F: Fn(&[ParamValue], &dyn RequestContext) -> R + Send + Sync + 'static,
        R: Responder + 'static,
    {
        self.route(&[Method::POST], pattern, name, f)
    }

    pub fn put<F, R>(&mut self, pattern: &str, name: &str, f: F) -> Result<RouteRef<'_>, PatternError>
    where
        F: Fn(&[ParamValue], &dyn RequestContext) -> R + Send + Sync + 'static,
        R: Responder + 'static,
    {
        self.route(&[Method::PUT], pattern, name, f)
    }

    pub fn patch<F, R>(&mut self, pattern: &str, name: &str, f: F) -> Result<RouteRef<'_>, PatternError>
    where
        F: Fn(&[ParamValue], &dyn RequestContext) -> R + Send + Sync + 'static,
        R: Responder + 'static,
    {
        self.route(&[Method::PATCH], pattern, name, f)
    }

    pub fn delete<F, R>(&mut self, pattern: &str, name: &str, f: F) -> Result<RouteRef<'_>, PatternError>
    where
        F: Fn(&[ParamValue], &dyn RequestContext) -> R + Send + Sync + 'static,
        R: Responder + 'static,
    {
        self.route(&[Method::DELETE], pattern, name, f)
    }

    pub fn head<F, R>(&mut self, pattern: &str, name: &str, f: F) -> Result<RouteRef<'_>, PatternError>
    where
        F: Fn(&[ParamValue], &dyn RequestContext) -> R + Send + Sync + 'static,
        R: Responder + 'static,
    {
        self.route(&[Method::HEAD], pattern, name, f)
    }

    pub fn options<F, R>(&mut self, pattern: &str, name: &str, f: F) -> Result<RouteRef<'_>, PatternError>
    where
        F: Fn(&[ParamValue], &dyn RequestContext) -> R + Send + Sync + 'static,
        R: Responder + 'static,
    {
        self.route(&[Method::OPTIONS], pattern, name, f)
    }

    /// Register `f` for every method in `methods` (empty means `GET`).
    pub fn route<F, R>(
        &mut self,
        methods: &[Method],
        pattern: &str,
        name: &str,
        f: F,
    ) -> Result<RouteRef<'_>, PatternError>
    where
        F: Fn(&[ParamValue], &dyn RequestContext) -> R + Send + Sync + 'static,
        R: Responder + 'static,
    {
        let mut route = RouteDefinition::new(methods, pattern)?.with_name(name);
        route.set_handler(handler(f));
        Ok(RouteRef {
            entry: self.table.register(route, None),
        })
    }

    /// Register a fully built definition. `None` installs the default
    /// forwarding function.
    pub fn add(&mut self, route: RouteDefinition, forwarder: Option<Forwarder>) -> RouteRef<'_> {
        RouteRef {
            entry: self.table.register(route, forwarder),
        }
    }

    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.dispatcher.add_middleware(mw);
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Select and invoke the route for `ctx`, writing its result into `sink`.
    pub fn dispatch(&self, ctx: &dyn RequestContext, sink: &mut dyn ResponseSink) -> Dispatch {
        self.dispatcher.dispatch(&self.table, ctx, sink)
    }

    /// Dispatch an `http::Request`.
    ///
    /// Nothing matching becomes a `404` JSON error. A declined or withheld
    /// dispatch returns whatever was written, which is usually an empty
    /// `200`.
    pub fn handle(&self, req: http::Request<Vec<u8>>) -> Result<http::Response<Vec<u8>>, http::Error> {
        let env = RequestEnv::from_request(req);
        let mut sink = ResponseBuffer::new();
        let outcome = self.dispatch(&env, &mut sink);
        if outcome == Dispatch::NotFound {
            info!(method = %env.method(), path = %env.path(), "Responding 404");
            sink = ResponseBuffer::json_error(
                404,
                &json!({
                    "error": "Not Found",
                    "method": env.method().as_str(),
                    "path": env.path(),
                }),
            );
        }
        sink.into_http()
    }
}

/// Handle on a just-registered route for chaining options.
pub struct RouteRef<'a> {
    entry: &'a mut RouteEntry,
}

impl RouteRef<'_> {
    /// Install the gatekeeper run before the handler.
    pub fn gatekeeper<F>(self, f: F) -> Self
    where
        F: Fn(&[ParamValue], &dyn RequestContext) -> GateDecision + Send + Sync + 'static,
    {
        self.entry.route.set_gatekeeper(Arc::new(f));
        self
    }

    /// Install a custom forwarding function.
    pub fn forwarding<F>(self, f: F) -> Self
    where
        F: Fn(Invoker<'_>, &dyn RequestContext) + Send + Sync + 'static,
    {
        self.entry.forwarder = Arc::new(f);
        self
    }

    /// Accept additional methods.
    pub fn also(self, methods: &[Method]) -> Self {
        self.entry.route.append_methods(methods);
        self
    }

    #[must_use]
    pub fn route(&self) -> &RouteDefinition {
        self.entry.route()
    }
}
