//! # Dispatcher Module
//!
//! Two-stage invocation of a selected route: gatekeeper first, handler
//! second, with the handler's result producer emitted into the response sink.
//!
//! ## Overview
//!
//! For each request the dispatcher:
//! - Asks the [`RouteTable`](crate::router::RouteTable) for the first route
//!   accepting the request
//! - Hands an [`Invoker`] for that route to the route's forwarding function
//! - Reports what happened as a [`Dispatch`] value
//!
//! ## Invocation protocol
//!
//! 1. The extracted parameters become a positional argument list, in
//!    placeholder order. The request context is always passed alongside.
//! 2. The gatekeeper runs with those arguments and returns a
//!    [`GateDecision`].
//! 3. `Replace` with a non-empty list swaps the handler's arguments for that
//!    list; `Proceed` or an empty `Replace` keeps the originals; `Decline`
//!    stops here and nothing is emitted.
//! 4. The handler returns a [`Responder`](crate::server::Responder) which is
//!    emitted into the sink exactly once.
//!
//! ## Forwarding functions
//!
//! Every route carries a [`Forwarder`] that receives the [`Invoker`] and
//! the request context. The default simply calls [`Invoker::invoke`]. A
//! custom forwarder can withhold invocation, for example when an
//! authorization header is missing, without changing the route's gatekeeper:
//!
//! ```rust
//! use gaterouter::dispatcher::{Forwarder, Invoker};
//! use gaterouter::server::RequestContext;
//! use std::sync::Arc;
//!
//! let require_token: Forwarder = Arc::new(|invoker: Invoker<'_>, ctx: &dyn RequestContext| {
//!     if ctx.header("token-auth").is_some() {
//!         invoker.invoke();
//!     }
//! });
//! # let _ = require_token;
//! ```

mod core;

pub use core::{
    default_forwarder, handler, identity_gatekeeper, noop_handler, Dispatch, Dispatcher,
    Forwarder, GateDecision, Gatekeeper, Handler, Invoker,
};
