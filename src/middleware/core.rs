use std::time::Duration;

use crate::dispatcher::Dispatch;
use crate::server::RequestContext;

/// Observer wrapped around every dispatch.
///
/// Middleware sees the request before selection and the outcome after the
/// forwarding function returns. It cannot short-circuit a dispatch;
/// gatekeepers and forwarding functions do that per route.
pub trait Middleware: Send + Sync {
    fn before(&self, _ctx: &dyn RequestContext) {}
    fn after(&self, _ctx: &dyn RequestContext, _outcome: &Dispatch, _latency: Duration) {}
}
