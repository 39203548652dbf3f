use hyper::Method;

use crate::binding::ParameterBinding;

/// One action of a controller: an HTTP method, a path relative to the
/// controller prefix, the action name and its parameter bindings.
///
/// ```
/// use ferrous_mvc::{ActionRoute, ParameterBinding};
///
/// let show = ActionRoute::get("/:id", "show")
///     .named("users.show")
///     .param(ParameterBinding::route("id").number());
/// assert_eq!(show.action(), "show");
/// assert_eq!(show.bindings().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ActionRoute {
    method: Method,
    path: String,
    action: String,
    name: Option<String>,
    order: Option<i32>,
    bindings: Vec<ParameterBinding>,
}

impl ActionRoute {
    pub fn new(method: Method, path: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            action: action.into(),
            name: None,
            order: None,
            bindings: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(Method::GET, path, action)
    }

    pub fn post(path: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(Method::POST, path, action)
    }

    pub fn put(path: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(Method::PUT, path, action)
    }

    pub fn patch(path: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path, action)
    }

    pub fn delete(path: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path, action)
    }

    /// Names the route for [`RouteTable::url_for`](super::RouteTable::url_for).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Moves the route ahead of every route without an explicit order.
    /// Lower values match first.
    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Appends the binding for the next action parameter.
    pub fn param(mut self, binding: ParameterBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn sort_order(&self) -> Option<i32> {
        self.order
    }

    pub fn bindings(&self) -> &[ParameterBinding] {
        &self.bindings
    }
}

/// Route declarations of one controller: a path prefix and its actions in
/// declaration order.
///
/// ```
/// use ferrous_mvc::{ActionRoute, ControllerRoutes, ParameterBinding};
///
/// let routes = ControllerRoutes::new("/users")
///     .get("/", "index")
///     .route(ActionRoute::get("/:id", "show").param(ParameterBinding::route("id").number()))
///     .post("/", "create");
/// assert_eq!(routes.prefix(), "/users");
/// assert_eq!(routes.actions().len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ControllerRoutes {
    prefix: String,
    actions: Vec<ActionRoute>,
}

impl ControllerRoutes {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            actions: Vec::new(),
        }
    }

    pub fn route(mut self, route: ActionRoute) -> Self {
        self.actions.push(route);
        self
    }

    pub fn get(self, path: impl Into<String>, action: impl Into<String>) -> Self {
        self.route(ActionRoute::get(path, action))
    }

    pub fn post(self, path: impl Into<String>, action: impl Into<String>) -> Self {
        self.route(ActionRoute::post(path, action))
    }

    pub fn put(self, path: impl Into<String>, action: impl Into<String>) -> Self {
        self.route(ActionRoute::put(path, action))
    }

    pub fn patch(self, path: impl Into<String>, action: impl Into<String>) -> Self {
        self.route(ActionRoute::patch(path, action))
    }

    pub fn delete(self, path: impl Into<String>, action: impl Into<String>) -> Self {
        self.route(ActionRoute::delete(path, action))
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn actions(&self) -> &[ActionRoute] {
        &self.actions
    }

    pub(crate) fn into_parts(self) -> (String, Vec<ActionRoute>) {
        (self.prefix, self.actions)
    }
}
