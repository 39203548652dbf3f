use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::binding::Arguments;
use crate::descriptors::{AnyArc, BoxFuture};
use crate::dispatch::ActionReturn;
use crate::error::{BoxError, DispatchError};
use crate::http::RequestContext;
use crate::token::Token;

use super::ControllerRoutes;

/// A routable type whose actions handle requests.
///
/// Controllers are resolved from the request scope under `Token::of::<Self>()`
/// for every matched request, so they must be registered in the container
/// (usually as scoped). [`routes`](Self::routes) declares the prefix and
/// actions; [`invoke`](Self::invoke) runs one action by name.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use ferrous_mvc::routing::action_not_found;
/// use ferrous_mvc::{ActionReturn, Arguments, Controller, ControllerRoutes, Outcome, RequestContext};
///
/// struct Greeter;
///
/// #[async_trait]
/// impl Controller for Greeter {
///     fn routes() -> ControllerRoutes {
///         ControllerRoutes::new("/greet").get("/", "hello")
///     }
///
///     async fn invoke(self: Arc<Self>, action: &str, _ctx: &mut RequestContext, _args: Arguments) -> ActionReturn {
///         match action {
///             "hello" => Ok(Outcome::json("hi")),
///             other => Err(action_not_found::<Self>(other)),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Controller: Send + Sync + 'static {
    fn routes() -> ControllerRoutes
    where
        Self: Sized;

    async fn invoke(self: Arc<Self>, action: &str, ctx: &mut RequestContext, args: Arguments) -> ActionReturn;
}

/// Error for an action name the controller does not implement.
pub fn action_not_found<C: Controller>(action: &str) -> BoxError {
    Box::new(DispatchError::ActionNotFound {
        controller: Token::of::<C>(),
        action: action.to_string(),
    })
}

/// Type-erased entry point stored with each route.
pub(crate) trait ControllerInvoker: Send + Sync {
    fn token(&self) -> &Token;

    fn type_name(&self) -> &'static str;

    /// Whether `instance` is of the controller type this invoker calls.
    fn accepts(&self, instance: &AnyArc) -> bool;

    fn invoke<'a>(
        &'a self,
        instance: AnyArc,
        action: &'a str,
        ctx: &'a mut RequestContext,
        args: Arguments,
    ) -> BoxFuture<'a, Result<ActionReturn, DispatchError>>;
}

pub(crate) struct TypedInvoker<C> {
    token: Token,
    _controller: PhantomData<fn() -> C>,
}

impl<C: Controller> TypedInvoker<C> {
    pub(crate) fn shared() -> Arc<dyn ControllerInvoker> {
        Arc::new(Self {
            token: Token::of::<C>(),
            _controller: PhantomData,
        })
    }
}

impl<C: Controller> ControllerInvoker for TypedInvoker<C> {
    fn token(&self) -> &Token {
        &self.token
    }

    fn type_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn accepts(&self, instance: &AnyArc) -> bool {
        instance.is::<C>()
    }

    fn invoke<'a>(
        &'a self,
        instance: AnyArc,
        action: &'a str,
        ctx: &'a mut RequestContext,
        args: Arguments,
    ) -> BoxFuture<'a, Result<ActionReturn, DispatchError>> {
        Box::pin(async move {
            let controller = instance
                .downcast::<C>()
                .map_err(|_| DispatchError::ControllerMismatch(self.token.clone()))?;
            Ok(controller.invoke(action, ctx, args).await)
        })
    }
}
