//! The three-phase dispatch pass.
//!
//! ```text
//! IDLE → BEFORE → MAIN → AFTER → DONE
//! ```
//!
//! `Before` and `After` run every route whose pattern matches. `Main` stops at
//! the first match. `After` runs whether or not `Main` matched. When `Main`
//! matched nothing, the not-found target runs, or the response becomes a 404.
//!
//! A halted response (a redirect with `exit`) ends the pass right after the
//! handler that halted it.

use http::StatusCode;
use tracing::debug;

use crate::error::Error;
use crate::handler::{Call, Target};
use crate::method::Method;
use crate::request::RequestContext;
use crate::resolver::Resolver;
use crate::response::Response;
use crate::table::{Route, RouteTable};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Phase {
    Before,
    Main,
    After,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::Main   => "main",
            Self::After  => "after",
        }
    }

    fn first_match_only(self) -> bool {
        self == Self::Main
    }
}

/// The routes a pass runs over.
pub(crate) struct Tables<'t> {
    pub(crate) before: &'t RouteTable,
    pub(crate) main: &'t RouteTable,
    pub(crate) after: &'t RouteTable,
    pub(crate) not_found: Option<&'t Target>,
}

/// The mutable state a pass works on.
pub(crate) struct Dispatcher<'r> {
    pub(crate) request: &'r RequestContext,
    pub(crate) resolver: &'r mut Resolver,
    pub(crate) response: &'r mut Response,
}

impl Dispatcher<'_> {
    /// Runs one pass and returns how many main routes were handled (0 or 1).
    pub(crate) fn run(mut self, tables: Tables<'_>) -> Result<usize, Error> {
        let method = self.request.method();

        self.run_phase(Phase::Before, bucket(tables.before, method))?;
        let handled = self.run_phase(Phase::Main, bucket(tables.main, method))?;
        self.run_phase(Phase::After, bucket(tables.after, method))?;

        if handled == 0 && !self.response.is_halted() {
            self.not_found(tables.not_found)?;
        }

        debug!(
            method = self.request.raw_method(),
            path = self.request.path_info(),
            handled,
            status = self.response.status().as_u16(),
            "dispatch complete"
        );
        Ok(handled)
    }

    fn run_phase(&mut self, phase: Phase, routes: &[Route]) -> Result<usize, Error> {
        let mut handled = 0;

        for route in routes {
            if self.response.is_halted() {
                debug!(phase = phase.as_str(), "dispatch halted");
                break;
            }
            let Some(args) = route.matcher.captures(self.request.path_info()) else {
                continue;
            };

            debug!(
                phase = phase.as_str(),
                pattern = route.matcher.pattern(),
                handler = ?route.target,
                "route matched"
            );
            self.invoke(&route.target, &args)?;
            handled += 1;

            if phase.first_match_only() {
                break;
            }
        }

        Ok(handled)
    }

    fn invoke(&mut self, target: &Target, args: &[String]) -> Result<(), Error> {
        let invocable = self.resolver.resolve(target)?;
        invocable.invoke(&mut Call::new(args, self.request, &mut *self.response))
    }

    fn not_found(&mut self, target: Option<&Target>) -> Result<(), Error> {
        if let Some(target) = target {
            let invocable = self.resolver.resolve(target)?;
            if invocable.is_callable() {
                debug!(handler = ?target, "running not-found handler");
                return invocable.invoke(&mut Call::new(&[], self.request, &mut *self.response));
            }
        }

        debug!(path = self.request.path_info(), "no route matched");
        self.response.set_status(StatusCode::NOT_FOUND);
        Ok(())
    }
}

/// A request with an unknown method has no routes in any phase.
fn bucket(table: &RouteTable, method: Option<Method>) -> &[Route] {
    method.and_then(|m| table.bucket(m)).unwrap_or_default()
}
