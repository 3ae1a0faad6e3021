//! Tests for the dispatch invoker and forwarding functions
//!
//! # Test Coverage
//!
//! - Gatekeeper decisions: proceed, replace, empty replace, decline
//! - Forwarding functions that withhold invocation
//! - Context passed to gatekeepers and handlers
//! - Middleware hooks (metrics, tracing span)
//! - Concurrent dispatch through a shared table

use gaterouter::dispatcher::{Dispatch, Dispatcher, Forwarder, GateDecision, Invoker};
use gaterouter::middleware::{MetricsMiddleware, Middleware, TracingMiddleware};
use gaterouter::router::{ParamValue, RouteDefinition, RouteTable};
use gaterouter::server::{Emit, RequestContext, RequestEnv, Response, ResponseBuffer, ResponseSink};
use http::Method;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

mod common;
use common::CapturedLogs;

type Calls = Arc<Mutex<Vec<Vec<ParamValue>>>>;

/// Route whose handler records its args and echoes them as text.
fn recording_route(methods: &[Method], pattern: &str, name: &str, calls: &Calls) -> RouteDefinition {
    let calls = Arc::clone(calls);
    RouteDefinition::new(methods, pattern)
        .unwrap()
        .with_name(name)
        .with_handler(move |args: &[ParamValue], _ctx: &dyn RequestContext| {
            calls.lock().unwrap().push(args.to_vec());
            let text: Vec<String> = args
                .iter()
                .map(|a| match a {
                    ParamValue::Single(s) => s.clone(),
                    ParamValue::Segments(parts) => parts.join("|"),
                })
                .collect();
            Response::text(text.join(","))
        })
}

fn dispatch(table: &RouteTable, method: Method, target: &str) -> (Dispatch, ResponseBuffer) {
    let env = RequestEnv::new(method, target);
    let mut sink = ResponseBuffer::new();
    let outcome = Dispatcher::new().dispatch(table, &env, &mut sink);
    (outcome, sink)
}

#[test]
fn test_handler_receives_params_in_placeholder_order() {
    let calls = Calls::default();
    let mut table = RouteTable::new();
    table.register(recording_route(&[Method::GET], "/a/:b/c/:d", "ab", &calls), None);

    let (outcome, sink) = dispatch(&table, Method::GET, "/a/1/c/2");
    assert_eq!(outcome, Dispatch::Handled { index: 0, name: "ab".into() });
    assert_eq!(sink.body_text(), "1,2");
    assert_eq!(*calls.lock().unwrap(), vec![vec![ParamValue::from("1"), ParamValue::from("2")]]);
}

#[test]
fn test_gatekeeper_replacement_replaces_args_exactly() {
    let calls = Calls::default();
    let mut table = RouteTable::new();
    let route = recording_route(&[Method::GET], "/lead/:id", "lead", &calls)
        .with_gatekeeper(|_args: &[ParamValue], _ctx: &dyn RequestContext| {
            GateDecision::replace(["p1", "p2"])
        });
    table.register(route, None);

    let (outcome, sink) = dispatch(&table, Method::GET, "/lead/7");
    assert!(outcome.is_handled());
    assert_eq!(sink.body_text(), "p1,p2");
    assert_eq!(calls.lock().unwrap()[0], vec![ParamValue::from("p1"), ParamValue::from("p2")]);
}

#[test]
fn test_empty_replacement_keeps_original_args() {
    let calls = Calls::default();
    let mut table = RouteTable::new();
    let route = recording_route(&[Method::GET], "/lead/:id", "lead", &calls)
        .with_gatekeeper(|_args: &[ParamValue], _ctx: &dyn RequestContext| {
            GateDecision::Replace(Vec::new())
        });
    table.register(route, None);

    let (_, sink) = dispatch(&table, Method::GET, "/lead/7");
    assert_eq!(sink.body_text(), "7");
}

#[test]
fn test_gatekeeper_sees_original_args_and_context() {
    let seen = Arc::new(Mutex::new(None));
    let seen_in_gate = Arc::clone(&seen);
    let mut table = RouteTable::new();
    let route = RouteDefinition::new(&[Method::GET], "/files/:path+")
        .unwrap()
        .with_gatekeeper(move |args: &[ParamValue], ctx: &dyn RequestContext| {
            *seen_in_gate.lock().unwrap() = Some((args.to_vec(), ctx.path().to_string()));
            GateDecision::Proceed
        });
    table.register(route, None);

    let (outcome, sink) = dispatch(&table, Method::GET, "/files/a/b");
    assert!(outcome.is_handled());
    // default handler produces nothing
    assert!(sink.is_empty());
    let (args, path) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(args, vec![ParamValue::Segments(vec!["a".into(), "b".into()])]);
    assert_eq!(path, "/files/a/b");
}

#[test]
fn test_declined_request_skips_handler() {
    let calls = Calls::default();
    let mut table = RouteTable::new();
    let route = recording_route(&[Method::GET], "/admin", "admin", &calls).with_gatekeeper(
        |_args: &[ParamValue], ctx: &dyn RequestContext| {
            if ctx.header("x-admin").is_some() {
                GateDecision::Proceed
            } else {
                GateDecision::Decline
            }
        },
    );
    table.register(route, None);

    let (outcome, sink) = dispatch(&table, Method::GET, "/admin");
    assert_eq!(outcome, Dispatch::Declined { index: 0, name: "admin".into() });
    assert!(sink.is_empty());
    assert!(calls.lock().unwrap().is_empty());

    let env = RequestEnv::new(Method::GET, "/admin").with_header("X-Admin", "1");
    let mut sink = ResponseBuffer::new();
    assert!(Dispatcher::new().dispatch(&table, &env, &mut sink).is_handled());
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[test]
fn test_forwarder_can_withhold_on_missing_header() {
    let calls = Calls::default();
    let mut table = RouteTable::new();
    let require_token: Forwarder = Arc::new(|invoker: Invoker<'_>, ctx: &dyn RequestContext| {
        if ctx.header("token-auth").is_some() {
            invoker.invoke();
        }
    });
    table.register(
        recording_route(&[Method::GET], "/secure/:id", "secure", &calls),
        Some(require_token),
    );

    let (outcome, sink) = dispatch(&table, Method::GET, "/secure/1");
    assert_eq!(outcome, Dispatch::Withheld { index: 0, name: "secure".into() });
    assert_eq!(outcome.as_str(), "withheld");
    assert!(sink.is_empty());
    assert!(calls.lock().unwrap().is_empty());

    let env = RequestEnv::new(Method::GET, "/secure/1").with_header("Token-Auth", "abc");
    let mut sink = ResponseBuffer::new();
    let outcome = Dispatcher::new().dispatch(&table, &env, &mut sink);
    assert!(outcome.is_handled());
    assert_eq!(sink.body_text(), "1");
}

#[test]
fn test_forwarder_sees_selected_route() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_fwd = Arc::clone(&seen);
    let mut table = RouteTable::new();
    table.register(RouteDefinition::new(&[], "/skip").unwrap(), None);
    let forwarder: Forwarder = Arc::new(move |invoker: Invoker<'_>, _ctx: &dyn RequestContext| {
        seen_in_fwd.lock().unwrap().push((
            invoker.index(),
            invoker.route().name().to_string(),
            invoker.params().get("id").and_then(ParamValue::as_str).map(str::to_string),
        ));
        invoker.invoke();
    });
    table.register(
        RouteDefinition::new(&[], "/lead/:id").unwrap().with_name("lead"),
        Some(forwarder),
    );

    let (outcome, _) = dispatch(&table, Method::GET, "/lead/5");
    assert_eq!(outcome.index(), Some(1));
    assert_eq!(outcome.route_name(), Some("lead"));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![(1, "lead".to_string(), Some("5".to_string()))]
    );
}

#[test]
fn test_not_found_leaves_sink_untouched() {
    let calls = Calls::default();
    let mut table = RouteTable::new();
    for m in [Method::GET, Method::POST, Method::PUT] {
        table.register(recording_route(&[m], "/lead/:id", "lead", &calls), None);
    }
    let (outcome, sink) = dispatch(&table, Method::DELETE, "/lead/42");
    assert_eq!(outcome, Dispatch::NotFound);
    assert_eq!(outcome.index(), None);
    assert!(sink.is_empty());
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn test_result_producer_runs_after_handler() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let in_handler = Arc::clone(&order);
    let mut table = RouteTable::new();
    let route = RouteDefinition::new(&[], "/late").unwrap().with_handler(
        move |_args: &[ParamValue], _ctx: &dyn RequestContext| {
            in_handler.lock().unwrap().push("handler");
            let in_emit = Arc::clone(&in_handler);
            Emit(move |sink: &mut dyn ResponseSink| {
                in_emit.lock().unwrap().push("emit");
                sink.status(202);
                sink.body(b"later");
            })
        },
    );
    table.register(route, None);

    let (_, sink) = dispatch(&table, Method::GET, "/late");
    assert_eq!(*order.lock().unwrap(), vec!["handler", "emit"]);
    assert_eq!(sink.status_code(), 202);
    assert_eq!(sink.body_text(), "later");
}

#[test]
fn test_metrics_middleware_counts_outcomes() {
    let calls = Calls::default();
    let mut table = RouteTable::new();
    table.register(recording_route(&[Method::GET], "/ok/:id", "ok", &calls), None);
    table.register(
        recording_route(&[Method::GET], "/no", "no", &calls).with_gatekeeper(
            |_args: &[ParamValue], _ctx: &dyn RequestContext| GateDecision::Decline,
        ),
        None,
    );
    let metrics = Arc::new(MetricsMiddleware::new());
    let mut dispatcher = Dispatcher::new();
    dispatcher.add_middleware(Arc::clone(&metrics) as Arc<dyn Middleware>);

    for target in ["/ok/1", "/ok/2", "/no", "/missing"] {
        let env = RequestEnv::new(Method::GET, target);
        let mut sink = ResponseBuffer::new();
        let _ = dispatcher.dispatch(&table, &env, &mut sink);
    }

    assert_eq!(metrics.request_count(), 4);
    assert_eq!(metrics.handled_count(), 2);
    assert_eq!(metrics.declined_count(), 1);
    assert_eq!(metrics.withheld_count(), 0);
    assert_eq!(metrics.not_found_count(), 1);
    assert_eq!(metrics.route_hits("ok"), 2);
    assert_eq!(metrics.route_hits("no"), 1);
    assert_eq!(metrics.route_hits("missing"), 0);
    assert!(metrics.average_latency() < Duration::from_secs(1));
}

#[test]
fn test_tracing_middleware_wraps_dispatch() {
    let (logs, _guard) = CapturedLogs::install();
    let mut table = RouteTable::new();
    table.register(
        RouteDefinition::new(&[], "/x").unwrap().with_gatekeeper(
            |_args: &[ParamValue], _ctx: &dyn RequestContext| GateDecision::Decline,
        ),
        None,
    );
    let mut dispatcher = Dispatcher::new();
    dispatcher.add_middleware(Arc::new(TracingMiddleware));

    let env = RequestEnv::new(Method::GET, "/x");
    let mut sink = ResponseBuffer::new();
    let outcome = dispatcher.dispatch(&table, &env, &mut sink);
    assert_eq!(outcome.as_str(), "declined");

    let out = logs.contents();
    assert!(out.contains("dispatch"));
    assert!(out.contains("Gatekeeper declined request"));
}

#[test]
fn test_concurrent_dispatch_keeps_params_separate() {
    let calls = Calls::default();
    let mut table = RouteTable::new();
    table.register(recording_route(&[Method::GET], "/lead/:id", "lead", &calls), None);
    let table = Arc::new(table);
    let dispatcher = Arc::new(Dispatcher::new());

    let workers: Vec<_> = (0..8)
        .map(|t| {
            let table = Arc::clone(&table);
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || {
                for i in 0..50 {
                    let id = format!("{t}-{i}");
                    let env = RequestEnv::new(Method::GET, &format!("/lead/{id}"));
                    let mut sink = ResponseBuffer::new();
                    assert!(dispatcher.dispatch(&table, &env, &mut sink).is_handled());
                    assert_eq!(sink.body_text(), id);
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }
    assert_eq!(calls.lock().unwrap().len(), 400);
}
