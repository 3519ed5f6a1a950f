//! Handler trait, handler references and the per-invocation [`Call`].
//!
//! # What a route stores
//!
//! A route stores a [`Target`], the handler reference before resolution:
//!
//! ```text
//! fn show(call: &mut Call<'_>) { … }        router.get("/", show)
//!        ↓ Handler blanket impl
//! Target::Direct(Arc<FnHandler(show)>)     invoked as-is
//!
//! Bound::new("Blog", "show")               router.get("/blog", Bound::new(..))
//!        ↓ Handler impl for Bound
//! Target::Bound(Bound { class, action })   resolved at dispatch time
//! ```
//!
//! The same target is cloned into every method bucket it is registered for,
//! so direct handlers sit behind an `Arc`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::Error;
use crate::request::RequestContext;
use crate::response::Response;

// ── Call ──────────────────────────────────────────────────────────────────────

/// Everything a handler gets to work with for one invocation.
pub struct Call<'a> {
    pub(crate) args: &'a [String],
    pub(crate) request: &'a RequestContext,
    pub(crate) response: &'a mut Response,
}

impl<'a> Call<'a> {
    pub(crate) fn new(
        args: &'a [String],
        request: &'a RequestContext,
        response: &'a mut Response,
    ) -> Self {
        Self { args, request, response }
    }

    /// The captured path segments, left to right.
    pub fn args(&self) -> &[String] { self.args }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn request(&self) -> &RequestContext { self.request }

    pub fn response(&mut self) -> &mut Response { &mut *self.response }

    /// Appends to the response body.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) -> &mut Response {
        self.response.write(chunk)
    }

    /// See [`RequestContext::path`].
    pub fn path(&self, uri: &str) -> String { self.request.path(uri) }

    /// See [`RequestContext::asset`].
    pub fn asset(&self, uri: &str) -> String { self.request.asset(uri) }

    /// Redirects to `uri`, prefixed with the script path when `relative`.
    /// With `exit`, nothing else runs after the current handler returns.
    pub fn redirect(&mut self, uri: &str, relative: bool, exit: bool) {
        let uri = if relative { self.request.path(uri) } else { uri.to_owned() };
        self.response.redirect(&uri, exit);
    }
}

// ── Handler outcomes ──────────────────────────────────────────────────────────

/// Return types a handler may have: `()` or `Result<(), Error>`.
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<(), Error>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), Error> { Ok(()) }
}

impl IntoOutcome for Result<(), Error> {
    fn into_outcome(self) -> Result<(), Error> { self }
}

// ── Type erasure ──────────────────────────────────────────────────────────────

#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, call: &mut Call<'_>) -> Result<(), Error>;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

struct FnHandler<F>(F);

impl<F, R> ErasedHandler for FnHandler<F>
where
    F: Fn(&mut Call<'_>) -> R + Send + Sync,
    R: IntoOutcome,
{
    fn call(&self, call: &mut Call<'_>) -> Result<(), Error> {
        (self.0)(call).into_outcome()
    }
}

// ── Handler references ────────────────────────────────────────────────────────

/// A `class->action` reference to a method on a named [`Controller`].
///
/// The controller is created the first time any reference naming its class is
/// resolved, then reused for the life of the router.
///
/// [`Controller`]: crate::Controller
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Bound {
    class: String,
    action: String,
}

impl Bound {
    pub fn new(class: impl Into<String>, action: impl Into<String>) -> Self {
        Self { class: class.into(), action: action.into() }
    }

    pub fn class(&self) -> &str { &self.class }
    pub fn action(&self) -> &str { &self.action }
}

/// Parses `"Class->action"`; only the first `->` separates the two parts.
impl FromStr for Bound {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once("->") {
            Some((class, action)) => Ok(Self::new(class, action)),
            None                  => Err(Error::NotCallable(s.to_owned())),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.class, self.action)
    }
}

/// The handler reference stored with a route.
#[derive(Clone)]
pub enum Target {
    Direct(BoxedHandler),
    Bound(Bound),
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(_)    => f.write_str("Direct(..)"),
            Self::Bound(bound) => f.debug_tuple("Bound").field(bound).finish(),
        }
    }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for everything a route can point at.
///
/// Satisfied by any `Fn(&mut Call<'_>) -> R` where `R` is `()` or
/// `Result<(), Error>`, and by [`Bound`]. Sealed: the set of handler shapes
/// is fixed by this crate.
///
/// Closures need their argument annotated:
///
/// ```rust
/// use waypost::{Call, RequestContext, Router};
///
/// let mut router = Router::init(RequestContext::new("GET", "/hello/ana", ""))
///     .get("/hello/:string", |call: &mut Call<'_>| {
///         let name = call.arg(0).unwrap_or("stranger").to_owned();
///         call.write(format!("hello {name}"));
///     });
///
/// assert_eq!(router.run().unwrap(), 1);
/// assert_eq!(router.response().body(), b"hello ana");
/// ```
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_target(self) -> Target;
}

mod private {
    pub trait Sealed {}
}

impl<F, R> private::Sealed for F
where
    F: Fn(&mut Call<'_>) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
}

impl<F, R> Handler for F
where
    F: Fn(&mut Call<'_>) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    fn into_target(self) -> Target {
        Target::Direct(Arc::new(FnHandler(self)))
    }
}

impl private::Sealed for Bound {}

impl Handler for Bound {
    fn into_target(self) -> Target {
        Target::Bound(self)
    }
}
