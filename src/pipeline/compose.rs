//! Combinators: closure middleware, prefix maps and predicate branches.

use async_trait::async_trait;

use crate::descriptors::BoxFuture;
use crate::http::{Request, RequestContext};

use super::{Middleware, Next, Pipeline};

/// Middleware backed by a closure returning a boxed future.
pub struct FnMiddleware<F> {
    f: F,
}

/// Adapts a closure into a [`Middleware`].
///
/// The closure receives the context and the continuation and must box its
/// future:
///
/// ```
/// use ferrous_mvc::middleware_fn;
///
/// let timing = middleware_fn(|ctx, next| {
///     Box::pin(async move {
///         let started = std::time::Instant::now();
///         next.run(ctx).await;
///         tracing::debug!(elapsed = ?started.elapsed(), "request finished");
///     })
/// });
/// ```
pub fn middleware_fn<F>(f: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    FnMiddleware { f }
}

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    async fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) {
        (self.f)(ctx, next).await
    }
}

/// Runs the inner middleware only for paths under a prefix.
pub struct Map<M> {
    prefix: String,
    inner: M,
}

impl<M: Middleware> Map<M> {
    pub fn new(prefix: impl Into<String>, inner: M) -> Self {
        let mut prefix = prefix.into();
        while prefix.len() > 1 && prefix.ends_with('/') {
            prefix.pop();
        }
        Self { prefix, inner }
    }

    fn applies(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

#[async_trait]
impl<M: Middleware> Middleware for Map<M> {
    async fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) {
        if self.applies(ctx.request.path()) {
            self.inner.handle(ctx, next).await
        } else {
            next.run(ctx).await
        }
    }
}

/// Runs an independent sub-pipeline when a predicate over the request matches.
pub struct Branch<P> {
    predicate: P,
    pipeline: Pipeline,
}

impl<P> Branch<P>
where
    P: Fn(&Request) -> bool + Send + Sync + 'static,
{
    pub fn new(predicate: P, pipeline: Pipeline) -> Self {
        Self { predicate, pipeline }
    }
}

#[async_trait]
impl<P> Middleware for Branch<P>
where
    P: Fn(&Request) -> bool + Send + Sync + 'static,
{
    async fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) {
        if (self.predicate)(&ctx.request) {
            self.pipeline.handle(ctx).await
        } else {
            next.run(ctx).await
        }
    }
}
