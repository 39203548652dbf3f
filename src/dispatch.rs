//! The router middleware: matches a route, resolves the controller from the
//! request scope, binds arguments, invokes the action and finalizes the
//! response from what it returned.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{json, Value};

use crate::binding;
use crate::error::{BoxError, DispatchError};
use crate::http::{RequestContext, StatusCode};
use crate::logger::resolve_logger;
use crate::pipeline::{Middleware, Next};
use crate::results::ActionResult;
use crate::routing::{Route, RouteTable};
use crate::traits::Resolver;

/// What an action returns.
pub enum Outcome {
    /// Nothing: `204 No Content` unless a status was set explicitly.
    Empty,
    /// A JSON body; `null` is treated like [`Outcome::Empty`].
    Value(Value),
    /// A result that writes the response itself.
    Result(Box<dyn ActionResult>),
}

impl Outcome {
    pub fn json(value: impl Into<Value>) -> Self {
        Outcome::Value(value.into())
    }

    /// Serializes `value` into a JSON outcome.
    pub fn serialize<T: serde::Serialize>(value: &T) -> Result<Self, BoxError> {
        Ok(Outcome::Value(serde_json::to_value(value)?))
    }

    pub fn result(result: impl ActionResult) -> Self {
        Outcome::Result(Box::new(result))
    }
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Empty => f.write_str("Empty"),
            Outcome::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Outcome::Result(_) => f.write_str("Result(..)"),
        }
    }
}

/// Return type of every controller action.
pub type ActionReturn = Result<Outcome, BoxError>;

/// Terminal routing stage of the pipeline.
///
/// Falls through to `next` when no route matches, so the pipeline's 404
/// terminal answers. Failures anywhere in dispatch are logged through the
/// scope's [`Logger`](crate::Logger) and answered with
/// `500 {"error":"Internal Server Error"}` if nothing was sent yet.
pub struct RouterMiddleware {
    table: Arc<RouteTable>,
    expose_error_details: bool,
}

impl RouterMiddleware {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self {
            table,
            expose_error_details: false,
        }
    }

    /// Includes the error message in 500 bodies.
    pub fn expose_error_details(mut self, expose: bool) -> Self {
        self.expose_error_details = expose;
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    async fn dispatch(&self, route: &Route, ctx: &mut RequestContext) -> Result<(), DispatchError> {
        let instance = ctx
            .services()
            .resolve(route.controller())
            .await
            .map_err(|source| DispatchError::ControllerUnavailable {
                controller: route.controller().clone(),
                source,
            })?;
        let args = binding::bind(route.bindings(), ctx).await?;
        let returned = route
            .invoker()
            .invoke(instance, route.action(), ctx, args)
            .await?;
        let outcome = returned.map_err(|source| DispatchError::Action {
            action: route.action().to_string(),
            source,
        })?;
        finalize(outcome, ctx).await
    }

    async fn fail(&self, route: &Route, error: DispatchError, ctx: &mut RequestContext) {
        let logger = resolve_logger(ctx.services()).await;
        let message = error.to_string();
        let target = route.to_string();
        logger.error(
            "request dispatch failed",
            &[
                ("route", target.as_str()),
                ("path", ctx.request.path()),
                ("error", message.as_str()),
            ],
        );

        internal_server_error(ctx, self.expose_error_details.then_some(message.as_str()));
    }
}

/// Answers `500` unless a response was already sent.
pub(crate) fn internal_server_error(ctx: &mut RequestContext, message: Option<&str>) {
    if ctx.response.is_sent() {
        return;
    }
    ctx.response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
    match message {
        Some(message) => ctx.response.json(json!({ "error": "Internal Server Error", "message": message })),
        None => ctx.response.json(json!({ "error": "Internal Server Error" })),
    };
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

/// Writes the response for an action's outcome unless the action already did.
async fn finalize(outcome: Outcome, ctx: &mut RequestContext) -> Result<(), DispatchError> {
    match outcome {
        Outcome::Empty | Outcome::Value(Value::Null) => {
            if !ctx.response.is_sent() {
                if !ctx.response.status_explicitly_set() {
                    ctx.response.set_status(StatusCode::NO_CONTENT);
                }
                ctx.response.end();
            }
            Ok(())
        }
        Outcome::Value(value) => {
            if !ctx.response.is_sent() {
                ctx.response.json(value);
            }
            Ok(())
        }
        Outcome::Result(result) => result.execute(ctx).await.map_err(DispatchError::ResultExecution),
    }
}

#[async_trait]
impl Middleware for RouterMiddleware {
    async fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) {
        let Some(found) = self.table.find(ctx.request.method(), ctx.request.path()) else {
            return next.run(ctx).await;
        };
        let route = found.route;
        ctx.request.set_route_params(found.params);
        tracing::debug!(route = %route, "route matched");

        let error = match AssertUnwindSafe(self.dispatch(route, ctx)).catch_unwind().await {
            Ok(Ok(())) => return,
            Ok(Err(error)) => error,
            Err(payload) => DispatchError::Panicked(panic_message(payload.as_ref())),
        };
        self.fail(route, error, ctx).await;
    }
}
