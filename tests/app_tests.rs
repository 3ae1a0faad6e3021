use gaterouter::middleware::{MetricsMiddleware, Middleware};
use gaterouter::runtime_config::RuntimeConfig;
use gaterouter::{
    App, Dispatch, GateDecision, Invoker, JsonResponse, ParamValue, RequestContext, RequestEnv,
    Response, ResponseBuffer,
};
use http::Method;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

type Seen = Arc<Mutex<Vec<(String, Vec<ParamValue>, String)>>>;

/// The lead resource: GET/PUT by id, POST with a gatekeeper that rewrites
/// the arguments, and no DELETE.
fn lead_app(seen: &Seen) -> App {
    let mut app = App::new();

    let s = Arc::clone(seen);
    app.get("/lead/:id", "lead-get", move |args: &[ParamValue], ctx: &dyn RequestContext| {
        s.lock().unwrap().push(("get".into(), args.to_vec(), ctx.path().to_string()));
        JsonResponse::new(json!({ "id": args[0] }))
    })
    .unwrap();

    let s = Arc::clone(seen);
    app.post("/lead", "lead-post", move |args: &[ParamValue], ctx: &dyn RequestContext| {
        s.lock().unwrap().push(("post".into(), args.to_vec(), ctx.path().to_string()));
        Response::with_status(201, "created")
    })
    .unwrap()
    .gatekeeper(|_args: &[ParamValue], _ctx: &dyn RequestContext| GateDecision::replace(["p1", "p2"]));

    let s = Arc::clone(seen);
    app.put("/lead/:id", "lead-put", move |args: &[ParamValue], ctx: &dyn RequestContext| {
        s.lock().unwrap().push(("put".into(), args.to_vec(), ctx.path().to_string()));
        Response::text("updated")
    })
    .unwrap();

    app
}

fn run(app: &App, env: &RequestEnv) -> (Dispatch, ResponseBuffer) {
    let mut sink = ResponseBuffer::new();
    let outcome = app.dispatch(env, &mut sink);
    (outcome, sink)
}

#[test]
fn test_get_lead_passes_id_and_context() {
    let seen = Seen::default();
    let app = lead_app(&seen);
    let (outcome, sink) = run(&app, &RequestEnv::new(Method::GET, "/lead/7"));

    assert_eq!(outcome, Dispatch::Handled { index: 0, name: "lead-get".into() });
    assert_eq!(sink.header_value("content-type"), Some("application/json"));
    let body: Value = serde_json::from_slice(sink.body_bytes()).unwrap();
    assert_eq!(body, json!({ "id": "7" }));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![("get".to_string(), vec![ParamValue::from("7")], "/lead/7".to_string())]
    );
}

#[test]
fn test_post_lead_uses_gatekeeper_args() {
    let seen = Seen::default();
    let app = lead_app(&seen);
    let (outcome, sink) = run(&app, &RequestEnv::new(Method::POST, "/lead"));

    assert_eq!(outcome.route_name(), Some("lead-post"));
    assert_eq!(sink.status_code(), 201);
    assert_eq!(
        seen.lock().unwrap()[0].1,
        vec![ParamValue::from("p1"), ParamValue::from("p2")]
    );
}

#[test]
fn test_unregistered_method_is_not_found() {
    let seen = Seen::default();
    let app = lead_app(&seen);
    let (outcome, sink) = run(&app, &RequestEnv::new(Method::DELETE, "/lead/42"));
    assert_eq!(outcome, Dispatch::NotFound);
    assert!(sink.is_empty());
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_trailing_slash_on_request_is_ignored() {
    let seen = Seen::default();
    let app = lead_app(&seen);
    let (outcome, _) = run(&app, &RequestEnv::new(Method::PUT, "/lead/9/"));
    assert_eq!(outcome.route_name(), Some("lead-put"));
}

#[test]
fn test_route_with_multiple_methods() {
    let mut app = App::new();
    app.route(&[Method::GET, Method::HEAD], "/status", "status", |_: &[ParamValue], ctx: &dyn RequestContext| {
        Response::text(ctx.method().as_str())
    })
    .unwrap();
    app.route(&[], "/default", "default", |_: &[ParamValue], _: &dyn RequestContext| ())
        .unwrap();

    let (_, sink) = run(&app, &RequestEnv::new(Method::HEAD, "/status"));
    assert_eq!(sink.body_text(), "HEAD");
    assert_eq!(app.table().get(1).unwrap().route().methods(), &[Method::GET]);
}

#[test]
fn test_every_verb_helper_registers_its_method() {
    let mut app = App::new();
    let noop = |_: &[ParamValue], _: &dyn RequestContext| ();
    app.get("/v", "get", noop).unwrap();
    app.post("/v", "post", noop).unwrap();
    app.put("/v", "put", noop).unwrap();
    app.patch("/v", "patch", noop).unwrap();
    app.delete("/v", "delete", noop).unwrap();
    app.head("/v", "head", noop).unwrap();
    app.options("/v", "options", noop).unwrap();

    for (method, name) in [
        (Method::GET, "get"),
        (Method::POST, "post"),
        (Method::PUT, "put"),
        (Method::PATCH, "patch"),
        (Method::DELETE, "delete"),
        (Method::HEAD, "head"),
        (Method::OPTIONS, "options"),
    ] {
        let (outcome, _) = run(&app, &RequestEnv::new(method, "/v"));
        assert_eq!(outcome.route_name(), Some(name));
    }
}

#[test]
fn test_forwarding_on_route_ref() {
    let mut app = App::new();
    app.get("/secure", "secure", |_: &[ParamValue], _: &dyn RequestContext| Response::text("ok"))
        .unwrap()
        .forwarding(|invoker: Invoker<'_>, ctx: &dyn RequestContext| {
            if ctx.header("token-auth") == Some("letmein") {
                invoker.invoke();
            }
        });

    let (outcome, _) = run(&app, &RequestEnv::new(Method::GET, "/secure"));
    assert_eq!(outcome.as_str(), "withheld");

    let env = RequestEnv::new(Method::GET, "/secure").with_header("token-auth", "letmein");
    let (outcome, sink) = run(&app, &env);
    assert!(outcome.is_handled());
    assert_eq!(sink.body_text(), "ok");
}

#[test]
fn test_handle_http_request() {
    let seen = Seen::default();
    let app = lead_app(&seen);
    let req = http::Request::builder()
        .method(Method::GET)
        .uri("/lead/a%20b?x=1")
        .body(Vec::new())
        .unwrap();
    let res = app.handle(req).unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body["id"], "a b");
}

#[test]
fn test_config_threshold_reaches_table() {
    let config = RuntimeConfig {
        slow_match_threshold: Duration::from_micros(5),
    };
    let app = App::with_config(config);
    assert_eq!(app.config().slow_match_threshold, Duration::from_micros(5));
}

#[test]
fn test_shared_app_across_threads() {
    let seen = Seen::default();
    let mut app = lead_app(&seen);
    let metrics = Arc::new(MetricsMiddleware::new());
    app.add_middleware(Arc::clone(&metrics) as Arc<dyn Middleware>);
    let app = Arc::new(app);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let app = Arc::clone(&app);
            thread::spawn(move || {
                for i in 0..25 {
                    let env = RequestEnv::new(Method::GET, &format!("/lead/{t}x{i}"));
                    let mut sink = ResponseBuffer::new();
                    assert!(app.dispatch(&env, &mut sink).is_handled());
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(metrics.route_hits("lead-get"), 100);
    assert_eq!(seen.lock().unwrap().len(), 100);
}
