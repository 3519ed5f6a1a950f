//! # waypost
//!
//! An HTTP router that matches the request path against patterns in the order
//! they were registered, with before/after middleware phases and a not-found
//! fallback.
//!
//! ## How a request is dispatched
//!
//! 1. **Before** middleware: every pattern that matches runs, in order.
//! 2. **Main** routes: the first pattern that matches runs. Only that one.
//! 3. **After** middleware: every pattern that matches runs, in order,
//!    whether or not a main route matched.
//! 4. No main route matched: the not-found handler runs, or the response is a
//!    bare `404`.
//!
//! Patterns are regular expressions anchored at both ends, with three
//! shorthand tokens (`:string`, `:number`, `:alpha`) that capture their
//! segment. Captured segments are the handler's arguments. See [`pattern`]
//! for the token table and the escaping caveat.
//!
//! Handlers are plain functions over a [`Call`], or [`Bound`] references to a
//! named [`Controller`] that is created once per router and reused.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use waypost::{Bound, Call, Controller, Error, Method, Router, Server};
//!
//! #[derive(Default)]
//! struct Blog { views: u64 }
//!
//! impl Controller for Blog {
//!     fn responds_to(&self, action: &str) -> bool {
//!         matches!(action, "index" | "show")
//!     }
//!
//!     fn call(&mut self, action: &str, call: &mut Call<'_>) -> Result<(), Error> {
//!         self.views += 1;
//!         match action {
//!             "show" => call.write(format!("post {}", call.arg(0).unwrap_or("?"))),
//!             _      => call.write("all posts"),
//!         };
//!         Ok(())
//!     }
//! }
//!
//! fn routes(router: Router) -> Router {
//!     router
//!         .controller("Blog", Blog::default)
//!         .before(&[Method::Get, Method::Post], "/admin/.*", require_login)
//!         .get("/blog", Bound::new("Blog", "index"))
//!         .get("/blog/:alpha", Bound::new("Blog", "show"))
//!         .set_not_found(|call: &mut Call<'_>| {
//!             call.response().set_status(http::StatusCode::NOT_FOUND);
//!             call.write("nothing here");
//!         })
//! }
//!
//! fn require_login(call: &mut Call<'_>) {
//!     if call.request().path_info() != "/admin/login" {
//!         call.redirect("/admin/login", true, true);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     Server::bind("0.0.0.0:3000").serve(routes).await.unwrap();
//! }
//! ```

mod dispatch;
mod error;
mod handler;
mod method;
mod request;
mod resolver;
mod response;
mod router;
mod server;
mod table;

pub mod pattern;

pub use error::Error;
pub use handler::{Bound, Call, Handler, IntoOutcome, Target};
pub use method::Method;
pub use request::RequestContext;
pub use resolver::Controller;
pub use response::Response;
pub use router::Router;
pub use server::Server;
