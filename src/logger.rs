//! Pluggable logging sink used by the router for action failures.
//!
//! Register an implementation as `dyn Logger` to route framework messages
//! elsewhere; when none is registered, [`TracingLogger`] forwards to
//! `tracing`.
//!
//! ```
//! use std::sync::Arc;
//! use ferrous_mvc::{Logger, NoopLogger, ServiceCollection};
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton_trait::<dyn Logger>(Arc::new(NoopLogger));
//! ```

use std::fmt::Write;
use std::sync::Arc;

use crate::traits::Resolver;

/// Key/value metadata attached to a log message.
pub type Meta<'a> = &'a [(&'a str, &'a str)];

pub trait Logger: Send + Sync + 'static {
    fn debug(&self, message: &str, meta: Meta<'_>);
    fn info(&self, message: &str, meta: Meta<'_>);
    fn warn(&self, message: &str, meta: Meta<'_>);
    fn error(&self, message: &str, meta: Meta<'_>);
}

/// Forwards to `tracing` events under the `ferrous_mvc` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

fn render(meta: Meta<'_>) -> String {
    let mut out = String::new();
    for (i, (key, value)) in meta.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{}={}", key, value);
    }
    out
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str, meta: Meta<'_>) {
        tracing::debug!(target: "ferrous_mvc", meta = %render(meta), "{}", message);
    }

    fn info(&self, message: &str, meta: Meta<'_>) {
        tracing::info!(target: "ferrous_mvc", meta = %render(meta), "{}", message);
    }

    fn warn(&self, message: &str, meta: Meta<'_>) {
        tracing::warn!(target: "ferrous_mvc", meta = %render(meta), "{}", message);
    }

    fn error(&self, message: &str, meta: Meta<'_>) {
        tracing::error!(target: "ferrous_mvc", meta = %render(meta), "{}", message);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _message: &str, _meta: Meta<'_>) {}
    fn info(&self, _message: &str, _meta: Meta<'_>) {}
    fn warn(&self, _message: &str, _meta: Meta<'_>) {}
    fn error(&self, _message: &str, _meta: Meta<'_>) {}
}

/// The registered `dyn Logger`, or [`TracingLogger`] when none resolves.
pub(crate) async fn resolve_logger<R: Resolver + ?Sized>(resolver: &R) -> Arc<dyn Logger> {
    match resolver.try_get_trait::<dyn Logger>().await {
        Ok(Some(logger)) => logger,
        _ => Arc::new(TracingLogger),
    }
}
