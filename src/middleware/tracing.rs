use std::cell::RefCell;
use std::time::Duration;

use tracing::{field, info_span, span::EnteredSpan};

use super::Middleware;
use crate::dispatcher::Dispatch;
use crate::server::RequestContext;

thread_local! {
    static SPAN_GUARD: RefCell<Option<EnteredSpan>> = const { RefCell::new(None) };
}

/// Opens a `dispatch` span for each request and records the outcome on it.
///
/// The span is entered on the dispatching thread, so every log line emitted
/// by selection, gatekeepers and handlers nests under it.
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, ctx: &dyn RequestContext) {
        let span = info_span!(
            "dispatch",
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
            outcome = field::Empty,
            route = field::Empty,
            latency_us = field::Empty,
        );
        let entered = span.entered();
        SPAN_GUARD.with(|g| {
            // A stale guard means an earlier dispatch on this thread never
            // reached `after`; dropping it exits that span.
            *g.borrow_mut() = Some(entered);
        });
    }

    fn after(&self, _ctx: &dyn RequestContext, outcome: &Dispatch, latency: Duration) {
        SPAN_GUARD.with(|g| {
            if let Some(entered) = g.borrow_mut().take() {
                entered.record("outcome", outcome.as_str());
                if let Some(name) = outcome.route_name() {
                    entered.record("route", name);
                }
                entered.record("latency_us", latency.as_micros() as u64);
            }
        });
    }
}
