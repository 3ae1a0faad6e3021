//! Dispatcher core module - gatekeeper/handler invocation for a selected route.

use std::cell::Cell;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::middleware::Middleware;
use crate::router::{ParamValue, RouteDefinition, RouteMatch, RouteTable};
use crate::server::{RequestContext, Responder, ResponseSink};

/// Primary route callable: positional params plus the request context,
/// returning the result producer to emit.
pub type Handler = Arc<dyn Fn(&[ParamValue], &dyn RequestContext) -> Box<dyn Responder> + Send + Sync>;

/// Pre-handler with the handler's calling convention.
pub type Gatekeeper = Arc<dyn Fn(&[ParamValue], &dyn RequestContext) -> GateDecision + Send + Sync>;

/// Wraps the whole invoke step for one route. The default calls
/// [`Invoker::invoke`]; a custom one may skip it.
pub type Forwarder = Arc<dyn Fn(Invoker<'_>, &dyn RequestContext) + Send + Sync>;

/// What a gatekeeper wants done with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Call the handler with the original arguments
    Proceed,
    /// Call the handler with these arguments instead. An empty list is
    /// treated like [`GateDecision::Proceed`].
    Replace(Vec<ParamValue>),
    /// Stop: the handler is not called and nothing is emitted
    Decline,
}

impl GateDecision {
    /// Build a [`GateDecision::Replace`] from anything convertible to params.
    pub fn replace<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ParamValue>,
    {
        GateDecision::Replace(args.into_iter().map(Into::into).collect())
    }
}

/// Wrap a closure returning any [`Responder`] as a [`Handler`].
pub fn handler<F, R>(f: F) -> Handler
where
    F: Fn(&[ParamValue], &dyn RequestContext) -> R + Send + Sync + 'static,
    R: Responder + 'static,
{
    Arc::new(
        move |args: &[ParamValue], ctx: &dyn RequestContext| -> Box<dyn Responder> {
            Box::new(f(args, ctx))
        },
    )
}

/// Handler installed when none is supplied: emits nothing.
#[must_use]
pub fn noop_handler() -> Handler {
    handler(|_args: &[ParamValue], _ctx: &dyn RequestContext| ())
}

/// Gatekeeper installed when none is supplied: passes its arguments through.
#[must_use]
pub fn identity_gatekeeper() -> Gatekeeper {
    Arc::new(|_args: &[ParamValue], _ctx: &dyn RequestContext| GateDecision::Proceed)
}

/// Forwarding function installed when none is supplied: always invokes.
#[must_use]
pub fn default_forwarder() -> Forwarder {
    Arc::new(|invoker: Invoker<'_>, _ctx: &dyn RequestContext| invoker.invoke())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InvokeState {
    Pending,
    Declined,
    Responded,
}

/// Handle passed to a forwarding function for one selected route.
///
/// Consumed by [`invoke`](Self::invoke), so a route is invoked at most once
/// per dispatch.
pub struct Invoker<'a> {
    index: usize,
    route: &'a RouteDefinition,
    matched: &'a RouteMatch,
    ctx: &'a dyn RequestContext,
    sink: &'a mut dyn ResponseSink,
    state: &'a Cell<InvokeState>,
}

impl<'a> Invoker<'a> {
    /// Registration index of the route
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn route(&self) -> &RouteDefinition {
        self.route
    }

    /// Parameters extracted for this request
    #[must_use]
    pub fn params(&self) -> &RouteMatch {
        self.matched
    }

    /// Run the gatekeeper, then the handler, then emit the handler's result.
    pub fn invoke(self) {
        let args = self.matched.args();

        let decision = (self.route.gatekeeper())(args.as_slice(), self.ctx);
        let producer = match decision {
            GateDecision::Decline => {
                info!(
                    index = self.index,
                    name = %self.route.name(),
                    "Gatekeeper declined request"
                );
                self.state.set(InvokeState::Declined);
                return;
            }
            GateDecision::Replace(replacement) if !replacement.is_empty() => {
                debug!(
                    index = self.index,
                    name = %self.route.name(),
                    original_args = args.len(),
                    replacement_args = replacement.len(),
                    "Gatekeeper replaced handler arguments"
                );
                (self.route.handler())(replacement.as_slice(), self.ctx)
            }
            GateDecision::Replace(_) | GateDecision::Proceed => {
                (self.route.handler())(args.as_slice(), self.ctx)
            }
        };

        producer.emit(self.sink);
        self.state.set(InvokeState::Responded);
    }
}

/// Outcome of one dispatch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The handler ran and its result was emitted
    Handled { index: usize, name: String },
    /// The gatekeeper declined; nothing was emitted
    Declined { index: usize, name: String },
    /// The forwarding function never invoked the route; nothing was emitted
    Withheld { index: usize, name: String },
    /// No route accepted the request
    NotFound,
}

impl Dispatch {
    #[must_use]
    pub fn is_handled(&self) -> bool {
        matches!(self, Dispatch::Handled { .. })
    }

    /// Registration index of the selected route, if one was selected
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Dispatch::Handled { index, .. }
            | Dispatch::Declined { index, .. }
            | Dispatch::Withheld { index, .. } => Some(*index),
            Dispatch::NotFound => None,
        }
    }

    /// Name of the selected route, if one was selected
    #[must_use]
    pub fn route_name(&self) -> Option<&str> {
        match self {
            Dispatch::Handled { name, .. }
            | Dispatch::Declined { name, .. }
            | Dispatch::Withheld { name, .. } => Some(name),
            Dispatch::NotFound => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Dispatch::Handled { .. } => "handled",
            Dispatch::Declined { .. } => "declined",
            Dispatch::Withheld { .. } => "withheld",
            Dispatch::NotFound => "not_found",
        }
    }
}

/// Runs selection and invocation, wrapped in the configured middleware.
#[derive(Clone, Default)]
pub struct Dispatcher {
    /// Ordered list of middleware observing each dispatch
    pub middlewares: Vec<Arc<dyn Middleware>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add middleware. Hooks run in the order middleware was added.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    /// Select a route for `ctx` and hand it to its forwarding function.
    ///
    /// The sink is written to only when the route's handler runs. A
    /// not-found outcome leaves it untouched; producing the not-found
    /// response is the caller's job.
    pub fn dispatch(
        &self,
        table: &RouteTable,
        ctx: &dyn RequestContext,
        sink: &mut dyn ResponseSink,
    ) -> Dispatch {
        let start = Instant::now();
        for mw in &self.middlewares {
            mw.before(ctx);
        }

        let outcome = match table.select(ctx) {
            None => Dispatch::NotFound,
            Some(selection) => {
                let state = Cell::new(InvokeState::Pending);
                let route = selection.entry.route();
                let invoker = Invoker {
                    index: selection.index,
                    route,
                    matched: &selection.matched,
                    ctx,
                    sink,
                    state: &state,
                };
                (selection.entry.forwarder())(invoker, ctx);

                let index = selection.index;
                let name = route.name().to_string();
                match state.get() {
                    InvokeState::Responded => Dispatch::Handled { index, name },
                    InvokeState::Declined => Dispatch::Declined { index, name },
                    InvokeState::Pending => {
                        info!(index, name = %name, "Forwarding function withheld invocation");
                        Dispatch::Withheld { index, name }
                    }
                }
            }
        };

        let latency = start.elapsed();
        for mw in &self.middlewares {
            mw.after(ctx, &outcome, latency);
        }
        outcome
    }
}
