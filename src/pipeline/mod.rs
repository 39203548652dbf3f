//! Ordered middleware pipeline with nested `next` semantics.
//!
//! Middleware run in registration order on the way in and in reverse order
//! on the way out. Each one decides, by whether and when it calls
//! [`Next::run`], if downstream middleware and the terminal endpoint run.
//!
//! ```
//! use ferrous_mvc::{middleware_fn, Method, PipelineBuilder, Request, RequestContext, ServiceCollection};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut builder = PipelineBuilder::new();
//! builder.use_middleware(middleware_fn(|ctx, next| {
//!     Box::pin(async move {
//!         ctx.response.set_header("x-powered-by", "ferrous-mvc");
//!         next.run(ctx).await;
//!     })
//! }));
//! let pipeline = builder.build();
//!
//! let provider = ServiceCollection::new().build();
//! let mut ctx = RequestContext::new(Request::new(Method::GET, "/missing"), provider.create_scope());
//! pipeline.handle(&mut ctx).await;
//!
//! assert_eq!(ctx.response.status().as_u16(), 404);
//! assert_eq!(ctx.response.header("x-powered-by"), Some("ferrous-mvc"));
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::http::{Request, RequestContext, StatusCode};

mod compose;
mod logging;

pub use compose::{middleware_fn, Branch, FnMiddleware, Map};
pub use logging::RequestLogging;

/// A pipeline stage.
///
/// # Examples
///
/// ```
/// use ferrous_mvc::{Middleware, Next, RequestContext};
/// use async_trait::async_trait;
///
/// struct RequireApiKey;
///
/// #[async_trait]
/// impl Middleware for RequireApiKey {
///     async fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) {
///         if ctx.request.header("x-api-key").is_none() {
///             ctx.response.set_status(ferrous_mvc::StatusCode::UNAUTHORIZED);
///             ctx.response.end();
///             return;
///         }
///         next.run(ctx).await;
///     }
/// }
/// ```
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn handle(&self, ctx: &mut RequestContext, next: Next<'_>);
}

/// The rest of the pipeline after the current middleware.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    terminal: &'a dyn Middleware,
}

/// Endpoint behind a terminal; calling `next` from a terminal does nothing.
struct End;

#[async_trait]
impl Middleware for End {
    async fn handle(&self, _ctx: &mut RequestContext, _next: Next<'_>) {}
}

static END: End = End;

impl<'a> Next<'a> {
    fn new(chain: &'a [Arc<dyn Middleware>], terminal: &'a dyn Middleware) -> Self {
        Self { chain, terminal }
    }

    /// Runs the downstream middleware and, after them, the terminal endpoint.
    pub async fn run(self, ctx: &mut RequestContext) {
        match self.chain.split_first() {
            Some((head, rest)) => head.handle(ctx, Next::new(rest, self.terminal)).await,
            None => self.terminal.handle(ctx, Next::new(&[], &END)).await,
        }
    }

    /// Number of middleware still to run, excluding the terminal.
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }
}

/// Default terminal: responds `404 {"error":"Not Found"}` if nothing was sent.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotFound;

#[async_trait]
impl Middleware for NotFound {
    async fn handle(&self, ctx: &mut RequestContext, _next: Next<'_>) {
        if ctx.response.is_sent() {
            return;
        }
        ctx.response.set_status(StatusCode::NOT_FOUND);
        ctx.response.json(json!({ "error": "Not Found" }));
    }
}

/// A built, immutable pipeline. Cheap to clone.
#[derive(Clone)]
pub struct Pipeline {
    middleware: Arc<[Arc<dyn Middleware>]>,
    terminal: Arc<dyn Middleware>,
}

impl Pipeline {
    /// Runs the request through every middleware and the terminal.
    pub async fn handle(&self, ctx: &mut RequestContext) {
        Next::new(&self.middleware, self.terminal.as_ref()).run(ctx).await;
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }
}

/// Collects middleware in order and folds them into a [`Pipeline`].
pub struct PipelineBuilder {
    middleware: Vec<Arc<dyn Middleware>>,
    terminal: Arc<dyn Middleware>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            middleware: Vec::new(),
            terminal: Arc::new(NotFound),
        }
    }

    /// Appends a middleware.
    pub fn use_middleware<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared middleware.
    pub fn use_shared(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// Appends a closure middleware; see [`middleware_fn`].
    pub fn use_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> crate::BoxFuture<'a, ()> + Send + Sync + 'static,
    {
        self.use_middleware(middleware_fn(f))
    }

    /// Appends `middleware`, run only for paths under `prefix`.
    ///
    /// `/api` matches `/api` and `/api/users` but not `/apiary`.
    pub fn map<M: Middleware>(&mut self, prefix: impl Into<String>, middleware: M) -> &mut Self {
        self.use_middleware(Map::new(prefix, middleware))
    }

    /// Appends an independent sub-pipeline that runs instead of the rest of
    /// this pipeline when `predicate` matches. The sub-pipeline has its own
    /// 404 terminal.
    pub fn branch<P, C>(&mut self, predicate: P, configure: C) -> &mut Self
    where
        P: Fn(&Request) -> bool + Send + Sync + 'static,
        C: FnOnce(&mut PipelineBuilder),
    {
        let mut sub = PipelineBuilder::new();
        configure(&mut sub);
        self.use_middleware(Branch::new(predicate, sub.build()))
    }

    /// Replaces the terminal endpoint (defaults to [`NotFound`]).
    pub fn terminal<M: Middleware>(&mut self, terminal: M) -> &mut Self {
        self.terminal = Arc::new(terminal);
        self
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            middleware: self.middleware.into(),
            terminal: self.terminal,
        }
    }
}
