//! Per-method route tables.
//!
//! One table per dispatch phase. Within a method, routes keep their
//! registration order, which is the order they are tried in.
//!
//! Middleware tables are append-only: every registration is its own entry.
//! The main table is keyed by pattern instead ([`RouteTable::keyed`]), so
//! registering a pattern again replaces its handler and keeps its place.

use std::collections::HashMap;

use crate::handler::Target;
use crate::method::Method;
use crate::pattern::{Matcher, normalize};

#[derive(Clone, Debug)]
pub(crate) struct Route {
    pub(crate) matcher: Matcher,
    pub(crate) target: Target,
}

#[derive(Debug, Default)]
pub(crate) struct RouteTable {
    buckets: HashMap<Method, Vec<Route>>,
    keyed: bool,
}

impl RouteTable {
    /// A table holding at most one route per (method, normalized pattern).
    pub(crate) fn keyed() -> Self {
        Self { keyed: true, ..Self::default() }
    }

    /// Normalizes and compiles `pattern` once, then adds the route to the
    /// bucket of every method in `methods`. In a keyed table an existing
    /// route with the same pattern gets the new target in place.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is not a valid regular expression once its
    /// tokens are expanded.
    pub(crate) fn register(&mut self, methods: &[Method], pattern: &str, target: Target) {
        let pattern = normalize(pattern);
        let matcher = Matcher::compile(&pattern)
            .unwrap_or_else(|e| panic!("invalid route `{pattern}`: {e}"));

        for &method in methods {
            let bucket = self.buckets.entry(method).or_default();

            if self.keyed {
                if let Some(route) = bucket.iter_mut().find(|r| r.matcher.pattern() == pattern) {
                    route.target = target.clone();
                    continue;
                }
            }

            bucket.push(Route {
                matcher: matcher.clone(),
                target: target.clone(),
            });
        }
    }

    pub(crate) fn bucket(&self, method: Method) -> Option<&[Route]> {
        self.buckets.get(&method).map(Vec::as_slice)
    }
}
