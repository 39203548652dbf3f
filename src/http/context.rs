use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::provider::Scope;

use super::{Request, Response};

/// Typed storage for data passed from middleware to handlers.
#[derive(Default)]
pub struct Items {
    map: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Items {
    /// Inserts a value, returning the previous value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok().map(|b| *b))
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.map.get(&TypeId::of::<T>()).and_then(|b| b.downcast_ref::<T>())
    }

    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.map.get_mut(&TypeId::of::<T>()).and_then(|b| b.downcast_mut::<T>())
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|b| b.downcast::<T>().ok().map(|b| *b))
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Debug for Items {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Items").field("len", &self.map.len()).finish()
    }
}

/// Per-request aggregate handed to every middleware and action.
///
/// Holds the inbound request, the outbound response and the request scope.
/// A context lives for exactly one request and is never shared.
///
/// # Examples
///
/// ```
/// use ferrous_mvc::{Method, Request, RequestContext, ServiceCollection};
///
/// struct UserId(u64);
///
/// let provider = ServiceCollection::new().build();
/// let mut ctx = RequestContext::new(Request::new(Method::GET, "/"), provider.create_scope());
/// ctx.items_mut().insert(UserId(7));
/// assert_eq!(ctx.items().get::<UserId>().map(|u| u.0), Some(7));
/// ```
#[derive(Debug)]
pub struct RequestContext {
    pub request: Request,
    pub response: Response,
    services: Scope,
    items: Items,
}

impl RequestContext {
    pub fn new(request: Request, services: Scope) -> Self {
        Self {
            request,
            response: Response::new(),
            services,
            items: Items::default(),
        }
    }

    /// The request scope. Scoped services resolved here live until the request ends.
    pub fn services(&self) -> &Scope {
        &self.services
    }

    pub fn items(&self) -> &Items {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Items {
        &mut self.items
    }

    /// Splits the context into its response, dropping the rest.
    pub fn into_response(self) -> Response {
        self.response
    }
}
