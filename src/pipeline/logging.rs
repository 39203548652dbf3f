use std::time::Instant;

use async_trait::async_trait;
use tracing::Instrument;

use crate::http::RequestContext;

use super::{Middleware, Next};

/// Logs every request with method, path, status and elapsed time.
///
/// Downstream work runs inside a `request` span carrying the method, the
/// path and the request scope id, so events emitted by handlers and by the
/// container are correlated per request.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogging;

impl RequestLogging {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for RequestLogging {
    async fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) {
        let started = Instant::now();
        let span = tracing::info_span!(
            "request",
            method = %ctx.request.method(),
            path = %ctx.request.path(),
            scope = ctx.services().id(),
        );

        next.run(ctx).instrument(span.clone()).await;

        let status = ctx.response.status().as_u16();
        let elapsed = started.elapsed();
        span.in_scope(|| {
            if status >= 500 {
                tracing::warn!(status, ?elapsed, "request failed");
            } else {
                tracing::info!(status, ?elapsed, "request completed");
            }
        });
    }
}
