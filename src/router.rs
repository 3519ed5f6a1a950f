//! The application router.
//!
//! Registration is append-only and chains by value. Patterns are matched in
//! the order they were registered; see [`Router::run`] for how the three
//! phases interact.

use crate::dispatch::{Dispatcher, Tables};
use crate::error::Error;
use crate::handler::{Handler, Target};
use crate::method::Method;
use crate::request::RequestContext;
use crate::resolver::{Controller, Resolver};
use crate::response::Response;
use crate::table::RouteTable;

/// Routes, middleware and controllers for one request, plus the response
/// they produce.
///
/// Build one with [`Router::init`], register routes, then [`run`](Router::run)
/// it once.
///
/// ```rust
/// use waypost::{Call, Method, RequestContext, Router};
///
/// let ctx = RequestContext::new("GET", "/users/42", "");
/// let mut router = Router::init(ctx)
///     .before(&[Method::Get], "/users/.*", |call: &mut Call<'_>| {
///         call.response().set_header("x-seen", "1");
///     })
///     .get("/users/:number", |call: &mut Call<'_>| {
///         let id = call.arg(0).unwrap_or_default().to_owned();
///         call.write(format!("user {id}"));
///     });
///
/// assert_eq!(router.run().unwrap(), 1);
/// assert_eq!(router.response().body(), b"user 42");
/// assert_eq!(router.response().header("x-seen"), Some("1"));
/// ```
pub struct Router {
    request: RequestContext,
    befores: RouteTable,
    routes: RouteTable,
    afters: RouteTable,
    not_found: Option<Target>,
    resolver: Resolver,
    response: Response,
}

impl Router {
    /// Creates a router for the request described by `request`.
    pub fn init(request: RequestContext) -> Self {
        Self {
            request,
            befores: RouteTable::default(),
            routes: RouteTable::keyed(),
            afters: RouteTable::default(),
            not_found: None,
            resolver: Resolver::default(),
            response: Response::new(),
        }
    }

    // ── Registration ──────────────────────────────────────────────────────────

    /// Registers before-middleware: every matching entry runs ahead of the
    /// main routes.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is not a valid regular expression once its tokens
    /// are expanded. The same holds for every registration method below.
    pub fn before(mut self, methods: &[Method], pattern: &str, handler: impl Handler) -> Self {
        self.befores.register(methods, pattern, handler.into_target());
        self
    }

    /// Registers after-middleware: every matching entry runs after the main
    /// routes, whether or not one of them matched.
    pub fn after(mut self, methods: &[Method], pattern: &str, handler: impl Handler) -> Self {
        self.afters.register(methods, pattern, handler.into_target());
        self
    }

    /// Registers a main route for each of `methods`.
    ///
    /// Registering a pattern again for the same method replaces its handler;
    /// the route keeps the position of the first registration.
    pub fn map(mut self, methods: &[Method], pattern: &str, handler: impl Handler) -> Self {
        self.routes.register(methods, pattern, handler.into_target());
        self
    }

    /// Registers a main route for `GET` and `POST`.
    pub fn get_or_post(self, pattern: &str, handler: impl Handler) -> Self {
        self.map(&[Method::Get, Method::Post], pattern, handler)
    }

    pub fn get(self, pattern: &str, handler: impl Handler) -> Self {
        self.map(&[Method::Get], pattern, handler)
    }

    pub fn post(self, pattern: &str, handler: impl Handler) -> Self {
        self.map(&[Method::Post], pattern, handler)
    }

    pub fn put(self, pattern: &str, handler: impl Handler) -> Self {
        self.map(&[Method::Put], pattern, handler)
    }

    pub fn delete(self, pattern: &str, handler: impl Handler) -> Self {
        self.map(&[Method::Delete], pattern, handler)
    }

    pub fn options(self, pattern: &str, handler: impl Handler) -> Self {
        self.map(&[Method::Options], pattern, handler)
    }

    /// Sets the handler run when no main route matches. Without one, an
    /// unmatched request gets a bare `404 Not Found`.
    pub fn set_not_found(mut self, handler: impl Handler) -> Self {
        self.not_found = Some(handler.into_target());
        self
    }

    /// Makes `name` resolvable by [`Bound`](crate::Bound) references.
    ///
    /// `factory` runs at most once per router, the first time a reference
    /// naming `name` is dispatched to.
    pub fn controller<C, F>(mut self, name: &str, factory: F) -> Self
    where
        C: Controller,
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.resolver.register(name, factory);
        self
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Runs the before-middleware, the first matching main route and the
    /// after-middleware for the request's method, in that order.
    ///
    /// Returns the number of main routes handled: `1`, or `0` when none
    /// matched, in which case the not-found handler ran or the response
    /// status is `404`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownClass`] and [`Error::NotCallable`] when a matched
    /// reference cannot be resolved or invoked, and whatever a handler returns.
    /// The pass stops at the first error.
    pub fn run(&mut self) -> Result<usize, Error> {
        let dispatcher = Dispatcher {
            request: &self.request,
            resolver: &mut self.resolver,
            response: &mut self.response,
        };
        dispatcher.run(Tables {
            before: &self.befores,
            main: &self.routes,
            after: &self.afters,
            not_found: self.not_found.as_ref(),
        })
    }

    // ── Request & response ────────────────────────────────────────────────────

    pub fn request(&self) -> &RequestContext { &self.request }
    pub fn response(&self) -> &Response { &self.response }
    pub fn response_mut(&mut self) -> &mut Response { &mut self.response }
    pub fn into_response(self) -> Response { self.response }

    /// See [`RequestContext::path`].
    pub fn path(&self, uri: &str) -> String { self.request.path(uri) }

    /// See [`RequestContext::asset`].
    pub fn asset(&self, uri: &str) -> String { self.request.asset(uri) }

    /// Redirects to `uri`, prefixed with the script path when `relative`.
    /// With `exit`, a later [`run`](Router::run) invokes nothing.
    pub fn redirect(&mut self, uri: &str, relative: bool, exit: bool) {
        let uri = if relative { self.request.path(uri) } else { uri.to_owned() };
        self.response.redirect(&uri, exit);
    }
}
