//! # gaterouter
//!
//! **gaterouter** is a request-routing engine: it matches an incoming method and path against an
//! ordered set of URI patterns, extracts named path parameters, and runs the selected route's
//! gatekeeper and handler.
//!
//! ## Overview
//!
//! Routes are registered once at startup. Each one carries a set of HTTP methods, a URI template,
//! a display name, a handler, an optional gatekeeper, and an optional forwarding function. For
//! every request exactly one route is selected, the first one registered that accepts it.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`router`]** - Pattern compilation, per-route matching, and the first-match route table
//! - **[`dispatcher`]** - Gatekeeper/handler invocation and forwarding functions
//! - **[`server`]** - The request context, the request environment, result producers, and the response sink
//! - **[`middleware`]** - Observers around each dispatch (tracing, metrics)
//! - **[`app`]** - Registration façade with one method per HTTP verb
//! - **[`manifest`]** - Route lists loaded from YAML or TOML
//! - **[`cli`]** - The `gaterouter` command line
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Caller
//!     participant App
//!     participant Table as RouteTable
//!     participant Fwd as Forwarding function
//!     participant Gate as Gatekeeper
//!     participant Handler
//!     participant Sink as ResponseSink
//!
//!     Caller->>App: dispatch(ctx, sink)
//!     App->>Table: select(ctx)
//!     Table->>Table: test routes in registration order
//!     alt no route accepts the request
//!         Table-->>App: None
//!         App-->>Caller: Dispatch::NotFound
//!     else first match
//!         Table-->>App: Selection { index, entry, matched }
//!         App->>Fwd: (Invoker, ctx)
//!         Fwd->>Gate: invoke(): args + ctx
//!         alt Decline
//!             Gate-->>App: Dispatch::Declined
//!         else Proceed / Replace(args)
//!             Gate->>Handler: original or replacement args + ctx
//!             Handler-->>Sink: Responder::emit (once)
//!         end
//!         App-->>Caller: Dispatch::Handled
//!     end
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use gaterouter::{App, ParamValue, RequestContext, RequestEnv, Response, ResponseBuffer};
//! use http::Method;
//!
//! let mut app = App::new();
//! app.get("/files/:path+", "files", |args: &[ParamValue], _ctx: &dyn RequestContext| {
//!     let parts = args[0].segments().map(<[String]>::len).unwrap_or(0);
//!     Response::text(format!("{parts} segments"))
//! })
//! .expect("valid pattern");
//!
//! let mut sink = ResponseBuffer::new();
//! app.dispatch(&RequestEnv::new(Method::GET, "/files/a/b/c"), &mut sink);
//! assert_eq!(sink.body_text(), "3 segments");
//! ```
//!
//! ## Pattern Syntax
//!
//! | Template          | Matches                 | Extracted                  |
//! |-------------------|-------------------------|----------------------------|
//! | `/lead/:id`       | `/lead/42`              | `id = "42"`                |
//! | `/files/:path+`   | `/files/a/b/c`          | `path = ["a", "b", "c"]`   |
//! | `/foo(/:bar)`     | `/foo`, `/foo/baz`      | `bar = "baz"` when present |
//! | `/`               | `/`, empty path         | nothing                    |
//!
//! Values are URL-decoded. A trailing `/` in a template is dropped at registration.
//!
//! ## Configuration
//!
//! | Variable                   | Default | Meaning                                      |
//! |----------------------------|---------|----------------------------------------------|
//! | `GATEROUTER_LOG_LEVEL`     | `info`  | trace/debug/info/warn/error                  |
//! | `GATEROUTER_LOG_FORMAT`    | `json`  | `json` or `pretty`                           |
//! | `GATEROUTER_LOG_TARGETS`   | unset   | extra `EnvFilter` directives                 |
//! | `GATEROUTER_SLOW_MATCH_US` | `1000`  | slow-selection warning threshold (µs, or hex)|

pub mod app;
pub mod cli;
pub mod dispatcher;
pub mod echo;
pub mod ids;
pub mod logging;
pub mod manifest;
pub mod middleware;
pub mod router;
pub mod runtime_config;
pub mod server;

pub use app::{App, RouteRef};
pub use dispatcher::{Dispatch, Forwarder, GateDecision, Gatekeeper, Handler, Invoker};
pub use ids::RequestId;
pub use manifest::{load_manifest, ManifestRoute, RouteManifest};
pub use router::{ParamValue, PatternError, RouteDefinition, RouteMatch, RouteTable};
pub use server::{
    Emit, JsonResponse, RequestContext, RequestEnv, Responder, Response, ResponseBuffer,
    ResponseSink,
};
