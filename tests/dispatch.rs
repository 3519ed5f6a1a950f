use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use http::StatusCode;
use waypost::{Bound, Call, Controller, Error, Method, RequestContext, Router};

struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    fn new() -> Self {
        Self(Arc::default())
    }

    fn handler(&self, label: &'static str) -> impl Fn(&mut Call<'_>) + Send + Sync + 'static {
        let log = Arc::clone(&self.0);
        move |call: &mut Call<'_>| {
            let mut entry = label.to_owned();
            for arg in call.args() {
                entry.push(':');
                entry.push_str(arg);
            }
            log.lock().unwrap().push(entry);
        }
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

fn router(method: &str, uri: &str) -> Router {
    Router::init(RequestContext::new(method, uri, ""))
}

#[derive(Default)]
struct Counter {
    hits: usize,
}

impl Controller for Counter {
    fn responds_to(&self, action: &str) -> bool {
        matches!(action, "count" | "report")
    }

    fn call(&mut self, action: &str, call: &mut Call<'_>) -> Result<(), Error> {
        self.hits += 1;
        if action == "report" {
            call.write(self.hits.to_string());
        }
        Ok(())
    }
}

#[test]
fn first_registered_match_is_the_only_one_invoked() {
    let trace = Trace::new();
    let mut r = router("GET", "/docs/intro")
        .get("/docs/:string", trace.handler("p1"))
        .get("/docs/:alpha", trace.handler("p2"))
        .get("/docs/.*", trace.handler("p3"));

    assert_eq!(r.run().unwrap(), 1);
    assert_eq!(trace.take(), ["p1:intro"]);
}

#[test]
fn two_matching_before_handlers_both_run_once_in_order() {
    let trace = Trace::new();
    let mut r = router("POST", "/orders/9")
        .before(&[Method::Post], "/orders/.*", trace.handler("auth"))
        .before(&[Method::Post], "/orders/:number", trace.handler("load"))
        .post("/orders/:number", trace.handler("update"));

    assert_eq!(r.run().unwrap(), 1);
    assert_eq!(trace.take(), ["auth", "load:9", "update:9"]);
}

#[test]
fn no_routes_and_no_fallback_emits_404_without_invocations() {
    let trace = Trace::new();
    let mut r = router("OPTIONS", "/anything")
        .before(&[Method::Get], "/.*", trace.handler("before"))
        .get("/anything", trace.handler("main"));

    assert_eq!(r.run().unwrap(), 0);
    assert_eq!(r.response().status(), StatusCode::NOT_FOUND);
    assert!(trace.take().is_empty());
}

#[test]
fn number_token_rejects_letters() {
    let trace = Trace::new();
    let mut r = router("GET", "/user/abc").get("/user/:number", trace.handler("user"));
    assert_eq!(r.run().unwrap(), 0);

    let mut r = router("GET", "/user/42").get("/user/:number", trace.handler("user"));
    assert_eq!(r.run().unwrap(), 1);
    assert_eq!(trace.take(), ["user:42"]);
}

#[test]
fn one_controller_instance_serves_every_reference_to_its_class() {
    let built = Arc::new(AtomicUsize::new(0));
    let factory = {
        let built = Arc::clone(&built);
        move || {
            built.fetch_add(1, Ordering::SeqCst);
            Counter::default()
        }
    };

    let mut r = router("GET", "/stats")
        .controller("Counter", factory)
        .before(&[Method::Get], "/.*", Bound::new("Counter", "count"))
        .get("/stats", "Counter->report".parse::<Bound>().unwrap());

    assert_eq!(r.run().unwrap(), 1);
    assert_eq!(r.response().body(), b"2");
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn controllers_are_only_built_when_dispatched_to() {
    let built = Arc::new(AtomicUsize::new(0));
    let factory = {
        let built = Arc::clone(&built);
        move || {
            built.fetch_add(1, Ordering::SeqCst);
            Counter::default()
        }
    };

    let mut r = router("GET", "/home")
        .controller("Counter", factory)
        .get("/stats", Bound::new("Counter", "report"))
        .get("/home", |_: &mut Call<'_>| {});

    assert_eq!(r.run().unwrap(), 1);
    assert_eq!(built.load(Ordering::SeqCst), 0);
}

#[test]
fn missing_action_fails_at_dispatch_not_registration() {
    let mut r = router("GET", "/stats")
        .controller("Counter", Counter::default)
        .get("/stats", Bound::new("Counter", "explode"));

    let err = r.run().unwrap_err();
    assert!(matches!(err, Error::NotCallable(ref s) if s == "Counter->explode"));
    assert_eq!(err.to_string(), "'Counter->explode' is not callable");
}

#[test]
fn uncallable_not_found_falls_back_to_404() {
    let mut r = router("GET", "/nope")
        .controller("Counter", Counter::default)
        .set_not_found(Bound::new("Counter", "explode"));

    assert_eq!(r.run().unwrap(), 0);
    assert_eq!(r.response().status(), StatusCode::NOT_FOUND);
}

#[test]
fn not_found_naming_unknown_class_is_an_error() {
    let mut r = router("GET", "/nope").set_not_found(Bound::new("Ghost", "boo"));
    assert!(matches!(r.run(), Err(Error::UnknownClass(c)) if c == "Ghost"));
}

#[test]
fn not_found_controls_the_response() {
    let mut r = router("GET", "/missing")
        .controller("Counter", Counter::default)
        .set_not_found(Bound::new("Counter", "report"));

    assert_eq!(r.run().unwrap(), 0);
    assert_eq!(r.response().status(), StatusCode::OK);
    assert_eq!(r.response().body(), b"1");
}

#[test]
fn script_prefix_and_query_are_ignored_for_matching() {
    let trace = Trace::new();
    let ctx = RequestContext::new("GET", "/shop/index.php/cart/3?coupon=x", "/shop/index.php");
    let mut r = Router::init(ctx).get("/cart/:number/", trace.handler("cart"));

    assert_eq!(r.run().unwrap(), 1);
    assert_eq!(trace.take(), ["cart:3"]);
    assert_eq!(r.path("/checkout"), "/shop/index.php/checkout");
    assert_eq!(r.asset("/css/site.css"), "/shop/css/site.css");
}

#[test]
fn handlers_can_link_and_read_the_request() {
    let ctx = RequestContext::new("GET", "/shop/about", "/shop/index.php");
    let mut r = Router::init(ctx).get("/about", |call: &mut Call<'_>| {
        let link = call.path("/contact");
        let logo = call.asset("logo.png");
        let path = call.request().path_info().to_owned();
        call.write(format!("{path} {link} {logo}"));
    });

    assert_eq!(r.run().unwrap(), 1);
    assert_eq!(r.response().body(), b"/about /shop/contact /shop/logo.png");
}

#[test]
fn duplicate_main_pattern_replaces_only_its_own_method() {
    let trace = Trace::new();
    let build = |method: &str| {
        router(method, "/feed")
            .get_or_post("/feed", trace.handler("old"))
            .get("feed/", trace.handler("new"))
    };

    assert_eq!(build("GET").run().unwrap(), 1);
    assert_eq!(build("POST").run().unwrap(), 1);
    assert_eq!(trace.take(), ["new", "old"]);
}

#[test]
fn duplicate_middleware_registrations_all_run() {
    let trace = Trace::new();
    let mut r = router("GET", "/x")
        .before(&[Method::Get], "/x", trace.handler("b1"))
        .before(&[Method::Get], "/x/", trace.handler("b2"))
        .after(&[Method::Get], "/x", trace.handler("a1"))
        .after(&[Method::Get], "/x", trace.handler("a2"));

    assert_eq!(r.run().unwrap(), 0);
    assert_eq!(trace.take(), ["b1", "b2", "a1", "a2"]);
}
