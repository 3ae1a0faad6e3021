use serde_json::json;

use crate::dispatcher::{handler, Handler};
use crate::router::ParamValue;
use crate::server::{JsonResponse, RequestContext};

/// Handler that echoes what routing saw: route name, method, path,
/// positional args and request parameters.
///
/// Routes loaded from a manifest use it, so `gaterouter match` shows exactly
/// what a real handler would have received.
#[must_use]
pub fn echo_handler(name: &str) -> Handler {
    let name = name.to_string();
    handler(move |args: &[ParamValue], ctx: &dyn RequestContext| {
        JsonResponse::new(json!({
            "route": name,
            "method": ctx.method().as_str(),
            "path": ctx.path(),
            "args": args,
            "params": ctx.params(),
            "request_id": ctx.request_id(),
        }))
    })
}
