use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use hyper::Method;

use crate::binding::ParameterBinding;
use crate::error::RouteError;
use crate::token::Token;

use super::controller::{ControllerInvoker, TypedInvoker};
use super::pattern::{join, normalize_request_path, PathPattern};
use super::Controller;

/// A compiled route: method, pattern, target controller and action.
#[derive(Clone)]
pub struct Route {
    method: Method,
    pattern: PathPattern,
    action: Arc<str>,
    name: Option<Arc<str>>,
    order: Option<i32>,
    bindings: Arc<[ParameterBinding]>,
    invoker: Arc<dyn ControllerInvoker>,
    synthesized: bool,
}

impl Route {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn template(&self) -> &str {
        self.pattern.template()
    }

    /// Token the controller is resolved under.
    pub fn controller(&self) -> &Token {
        self.invoker.token()
    }

    pub fn controller_name(&self) -> &'static str {
        self.invoker.type_name()
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn order(&self) -> Option<i32> {
        self.order
    }

    pub fn bindings(&self) -> &[ParameterBinding] {
        &self.bindings
    }

    /// Whether this is a HEAD route derived from a GET route.
    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    pub(crate) fn invoker(&self) -> &dyn ControllerInvoker {
        self.invoker.as_ref()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.template())
            .field("controller", &self.controller_name())
            .field("action", &self.action)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}::{}", self.method, self.pattern, self.invoker.token().short_name(), self.action)
    }
}

/// A successful lookup: the route and its decoded parameters.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: HashMap<String, String>,
}

/// Two routes for the same method whose patterns can match the same path.
/// The earlier one always wins at dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOverlap {
    pub method: Method,
    pub winner: String,
    pub shadowed: String,
}

/// Collects controller routes and compiles them into a [`RouteTable`].
///
/// ```
/// # use std::sync::Arc;
/// # use async_trait::async_trait;
/// # use ferrous_mvc::{ActionReturn, Arguments, Controller, ControllerRoutes, Outcome, RequestContext};
/// use ferrous_mvc::{Method, RouteTableBuilder};
///
/// # struct Users;
/// # #[async_trait]
/// # impl Controller for Users {
/// #     fn routes() -> ControllerRoutes {
/// #         ControllerRoutes::new("/users").get("/:id", "show").get("/active", "active")
/// #     }
/// #     async fn invoke(self: Arc<Self>, _: &str, _: &mut RequestContext, _: Arguments) -> ActionReturn {
/// #         Ok(Outcome::Empty)
/// #     }
/// # }
/// let mut builder = RouteTableBuilder::new();
/// builder.controller::<Users>().synthesize_head(true);
/// let table = builder.build().unwrap();
///
/// // Declared first, so `/users/:id` wins.
/// let found = table.find(&Method::GET, "/users/active").unwrap();
/// assert_eq!(found.route.action(), "show");
/// assert_eq!(found.params["id"], "active");
/// assert!(table.find(&Method::HEAD, "/users/7").is_some());
/// assert_eq!(table.overlaps().len(), 1);
/// ```
pub struct RouteTableBuilder {
    controllers: Vec<(Arc<dyn ControllerInvoker>, super::ControllerRoutes)>,
    synthesize_head: bool,
    warn_on_overlap: bool,
}

impl Default for RouteTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTableBuilder {
    pub fn new() -> Self {
        Self {
            controllers: Vec::new(),
            synthesize_head: false,
            warn_on_overlap: true,
        }
    }

    /// Adds the routes declared by `C`, in declaration order.
    pub fn controller<C: Controller>(&mut self) -> &mut Self {
        self.controllers.push((TypedInvoker::<C>::shared(), C::routes()));
        self
    }

    /// Appends a HEAD route for every GET route.
    pub fn synthesize_head(&mut self, enabled: bool) -> &mut Self {
        self.synthesize_head = enabled;
        self
    }

    /// Logs a warning for every shadowed route when building.
    pub fn warn_on_overlap(&mut self, enabled: bool) -> &mut Self {
        self.warn_on_overlap = enabled;
        self
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }

    /// Compiles every pattern and fixes the match order.
    ///
    /// Routes with an explicit order come first, ascending; the rest keep
    /// registration order. Synthesized HEAD routes are appended last.
    pub fn build(&self) -> Result<RouteTable, RouteError> {
        let mut routes = Vec::new();
        for (invoker, declared) in &self.controllers {
            let (prefix, actions) = declared.clone().into_parts();
            for action in actions {
                let pattern = PathPattern::parse(&join(&prefix, action.path()))?;
                routes.push(Route {
                    method: action.method().clone(),
                    pattern,
                    action: action.action().into(),
                    name: action.name().map(Into::into),
                    order: action.sort_order(),
                    bindings: action.bindings().into(),
                    invoker: invoker.clone(),
                    synthesized: false,
                });
            }
        }

        routes.sort_by_key(|route| (route.order.is_none(), route.order.unwrap_or(0)));

        let mut names = HashSet::new();
        for name in routes.iter().filter_map(|r| r.name.as_deref()) {
            if !names.insert(name) {
                return Err(RouteError::DuplicateName(name.to_string()));
            }
        }

        if self.synthesize_head {
            let heads: Vec<Route> = routes
                .iter()
                .filter(|r| r.method == Method::GET)
                .map(|r| Route {
                    method: Method::HEAD,
                    name: None,
                    synthesized: true,
                    ..r.clone()
                })
                .collect();
            routes.extend(heads);
        }

        let overlaps = find_overlaps(&routes);
        if self.warn_on_overlap {
            for overlap in &overlaps {
                tracing::warn!(
                    method = %overlap.method,
                    winner = %overlap.winner,
                    shadowed = %overlap.shadowed,
                    "route is shadowed by an earlier route"
                );
            }
        }

        tracing::debug!(routes = routes.len(), controllers = self.controllers.len(), "route table built");
        Ok(RouteTable { routes, overlaps })
    }
}

fn find_overlaps(routes: &[Route]) -> Vec<RouteOverlap> {
    let mut overlaps = Vec::new();
    for (i, earlier) in routes.iter().enumerate() {
        if earlier.synthesized {
            continue;
        }
        for later in routes[i + 1..].iter().filter(|r| !r.synthesized) {
            if earlier.method == later.method && earlier.pattern.overlaps(&later.pattern) {
                overlaps.push(RouteOverlap {
                    method: earlier.method.clone(),
                    winner: earlier.template().to_string(),
                    shadowed: later.template().to_string(),
                });
            }
        }
    }
    overlaps
}

/// Immutable, ordered route table. The first matching route wins.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    overlaps: Vec<RouteOverlap>,
}

impl RouteTable {
    /// First route whose method and pattern match. A single trailing `/` on
    /// the request path is ignored.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let path = normalize_request_path(path);
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| route.pattern.matches(path).map(|params| RouteMatch { route, params }))
    }

    /// Whether any route matches the path under some other method.
    pub fn allows_other_method(&self, method: &Method, path: &str) -> bool {
        let path = normalize_request_path(path);
        self.routes
            .iter()
            .any(|route| route.method != *method && route.pattern.matches(path).is_some())
    }

    /// Shadowed routes found at build time.
    pub fn overlaps(&self) -> &[RouteOverlap] {
        &self.overlaps
    }

    /// Builds the path of a named route, percent-encoding each parameter.
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
        let route = self
            .routes
            .iter()
            .find(|r| r.name() == Some(name))
            .ok_or_else(|| RouteError::UrlGeneration {
                name: name.to_string(),
                reason: "no route with this name".to_string(),
            })?;
        route
            .pattern
            .build(params.iter().copied())
            .map_err(|reason| RouteError::UrlGeneration {
                name: name.to_string(),
                reason,
            })
    }

    /// Distinct controller invokers, in first-route order.
    pub(crate) fn invokers(&self) -> Vec<(&dyn ControllerInvoker, Vec<&Route>)> {
        let mut grouped: Vec<(&dyn ControllerInvoker, Vec<&Route>)> = Vec::new();
        for route in self.routes.iter().filter(|r| !r.synthesized) {
            match grouped.iter_mut().find(|(invoker, _)| invoker.token() == route.controller()) {
                Some((_, routes)) => routes.push(route),
                None => grouped.push((route.invoker(), vec![route])),
            }
        }
        grouped
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
