//! Handler resolution and the controller instance cache.
//!
//! A [`Bound`](crate::Bound) reference names a controller by class name.
//! The router keeps one factory per name and, the first time a reference to
//! that name is resolved, one instance. Every later resolution of any
//! reference naming the same class reuses that instance, so controller state
//! lives as long as the router.

use std::collections::HashMap;

use tracing::debug;

use crate::error::Error;
use crate::handler::{BoxedHandler, Call, Target};

/// A stateful handler object whose methods are addressed by name.
///
/// ```rust
/// use waypost::{Call, Controller, Error};
///
/// #[derive(Default)]
/// struct Counter { hits: u32 }
///
/// impl Controller for Counter {
///     fn responds_to(&self, action: &str) -> bool {
///         action == "hit"
///     }
///
///     fn call(&mut self, action: &str, call: &mut Call<'_>) -> Result<(), Error> {
///         match action {
///             "hit" => {
///                 self.hits += 1;
///                 call.write(self.hits.to_string());
///                 Ok(())
///             }
///             other => Err(Error::NotCallable(other.to_owned())),
///         }
///     }
/// }
/// ```
pub trait Controller: Send + 'static {
    /// Whether `action` names something [`call`](Self::call) can run.
    fn responds_to(&self, action: &str) -> bool;

    fn call(&mut self, action: &str, call: &mut Call<'_>) -> Result<(), Error>;
}

type Factory = Box<dyn Fn() -> Box<dyn Controller> + Send + Sync>;

#[derive(Default)]
pub(crate) struct Resolver {
    factories: HashMap<String, Factory>,
    instances: HashMap<String, Box<dyn Controller>>,
}

/// A resolved target, ready to be invoked.
pub(crate) enum Invocable<'r> {
    Direct(&'r BoxedHandler),
    Bound {
        instance: &'r mut dyn Controller,
        class: &'r str,
        action: &'r str,
    },
}

impl Resolver {
    /// Registers `factory` under `name`, replacing any earlier one. An
    /// instance already created under `name` is kept.
    pub(crate) fn register<C, F>(&mut self, name: &str, factory: F)
    where
        C: Controller,
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.factories.insert(
            name.to_owned(),
            Box::new(move || Box::new(factory()) as Box<dyn Controller>),
        );
    }

    pub(crate) fn resolve<'r>(&'r mut self, target: &'r Target) -> Result<Invocable<'r>, Error> {
        let bound = match target {
            Target::Direct(handler) => return Ok(Invocable::Direct(handler)),
            Target::Bound(bound)    => bound,
        };

        let factory = self.factories
            .get(bound.class())
            .ok_or_else(|| Error::UnknownClass(bound.class().to_owned()))?;

        let instance = self.instances
            .entry(bound.class().to_owned())
            .or_insert_with(|| {
                debug!(class = bound.class(), "creating controller instance");
                factory()
            });

        Ok(Invocable::Bound {
            instance: instance.as_mut(),
            class: bound.class(),
            action: bound.action(),
        })
    }

    #[cfg(test)]
    pub(crate) fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

impl Invocable<'_> {
    pub(crate) fn is_callable(&self) -> bool {
        match self {
            Self::Direct(_)                    => true,
            Self::Bound { instance, action, .. } => instance.responds_to(action),
        }
    }

    pub(crate) fn invoke(self, call: &mut Call<'_>) -> Result<(), Error> {
        match self {
            Self::Direct(handler) => handler.call(call),
            Self::Bound { instance, class, action } => {
                if !instance.responds_to(action) {
                    return Err(Error::NotCallable(format!("{class}->{action}")));
                }
                instance.call(action, call)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Bound, Handler};
    use crate::request::RequestContext;
    use crate::response::Response;

    #[derive(Default)]
    struct Tally {
        count: u32,
    }

    impl Controller for Tally {
        fn responds_to(&self, action: &str) -> bool {
            action == "bump"
        }

        fn call(&mut self, _action: &str, call: &mut Call<'_>) -> Result<(), Error> {
            self.count += 1;
            call.write(self.count.to_string());
            Ok(())
        }
    }

    fn invoke(resolver: &mut Resolver, target: &Target, response: &mut Response) -> Result<(), Error> {
        let request = RequestContext::new("GET", "/", "");
        let invocable = resolver.resolve(target)?;
        invocable.invoke(&mut Call::new(&[], &request, response))
    }

    #[test]
    fn unknown_class_fails_resolution() {
        let mut resolver = Resolver::default();
        let target = Bound::new("Missing", "x").into_target();
        assert!(matches!(resolver.resolve(&target), Err(Error::UnknownClass(c)) if c == "Missing"));
        assert_eq!(resolver.instance_count(), 0);
    }

    #[test]
    fn instance_is_created_once_and_reused() {
        let mut resolver = Resolver::default();
        resolver.register("Tally", Tally::default);
        let target = Bound::new("Tally", "bump").into_target();

        let mut response = Response::new();
        invoke(&mut resolver, &target, &mut response).unwrap();
        invoke(&mut resolver, &target, &mut response).unwrap();

        assert_eq!(response.body(), b"12");
        assert_eq!(resolver.instance_count(), 1);
    }

    #[test]
    fn missing_action_is_not_callable_at_invoke_time() {
        let mut resolver = Resolver::default();
        resolver.register("Tally", Tally::default);
        let target = Bound::new("Tally", "nope").into_target();

        let invocable = resolver.resolve(&target).unwrap();
        assert!(!invocable.is_callable());

        let mut response = Response::new();
        let err = invoke(&mut resolver, &target, &mut response).unwrap_err();
        assert!(matches!(err, Error::NotCallable(s) if s == "Tally->nope"));
    }

    #[test]
    fn direct_targets_resolve_as_is() {
        let mut resolver = Resolver::default();
        let target = (|call: &mut Call<'_>| { call.write("direct"); }).into_target();

        let mut response = Response::new();
        invoke(&mut resolver, &target, &mut response).unwrap();
        assert_eq!(response.body(), b"direct");
        assert_eq!(resolver.instance_count(), 0);
    }
}
