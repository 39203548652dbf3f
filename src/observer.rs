//! Diagnostic observers for service resolution.
//!
//! Observers receive a callback when a registered service starts resolving,
//! when it resolves, and when it fails. They are attached to the
//! [`ServiceCollection`](crate::ServiceCollection) before `build()` and
//! shared by the provider and every scope.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::token::Token;

/// Observer trait for dependency injection resolution events.
///
/// Observer calls are made inline during resolution. Keep implementations
/// lightweight.
///
/// # Examples
///
/// ```
/// use ferrous_mvc::{DiError, DiObserver, ServiceCollection, Token};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// struct PrintObserver;
///
/// impl DiObserver for PrintObserver {
///     fn resolving(&self, token: &Token) {
///         println!("resolving {}", token);
///     }
///
///     fn resolved(&self, token: &Token, duration: Duration) {
///         println!("resolved {} in {:?}", token, duration);
///     }
///
///     fn failed(&self, token: &Token, error: &DiError) {
///         println!("{} failed: {}", token, error);
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(PrintObserver));
/// let provider = services.build();
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a registered service is looked up in its cache or built.
    fn resolving(&self, token: &Token);

    /// Called after the service resolved successfully.
    fn resolved(&self, token: &Token, duration: Duration);

    /// Called when resolution of a registered service fails.
    fn failed(&self, token: &Token, error: &DiError) {
        let _ = (token, error);
    }
}

/// Registered observers. Zero cost when empty.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, token: &Token) {
        for observer in &self.observers {
            observer.resolving(token);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, token: &Token, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(token, duration);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, token: &Token, error: &DiError) {
        for observer in &self.observers {
            observer.failed(token, error);
        }
    }
}

/// Built-in observer that emits `tracing` events.
///
/// Resolutions are logged at `TRACE`, failures at `DEBUG` (the failure itself
/// is still returned to the caller).
///
/// # Examples
///
/// ```
/// use ferrous_mvc::{ServiceCollection, LoggingObserver};
/// use std::sync::Arc;
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(LoggingObserver::new()));
/// let provider = services.build();
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self {
            prefix: "di".to_string(),
        }
    }

    /// Creates a logging observer whose events carry a custom `source` field.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, token: &Token) {
        tracing::trace!(source = %self.prefix, token = %token, "resolving service");
    }

    fn resolved(&self, token: &Token, duration: Duration) {
        tracing::trace!(source = %self.prefix, token = %token, ?duration, "resolved service");
    }

    fn failed(&self, token: &Token, error: &DiError) {
        tracing::debug!(source = %self.prefix, token = %token, %error, "service resolution failed");
    }
}

/// Observer that counts resolutions, failures and total resolution time.
///
/// ```
/// use ferrous_mvc::{MetricsObserver, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let metrics = Arc::new(MetricsObserver::new());
/// let mut services = ServiceCollection::new();
/// services.add_singleton(1u32);
/// services.add_observer(metrics.clone());
///
/// let provider = services.build();
/// provider.get::<u32>().await.unwrap();
/// let _ = provider.get::<u64>().await;
///
/// assert_eq!(metrics.resolution_count(), 1);
/// assert_eq!(metrics.failure_count(), 0);
/// # }
/// ```
#[derive(Default)]
pub struct MetricsObserver {
    resolution_count: AtomicU64,
    failure_count: AtomicU64,
    total_resolution_nanos: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolution_count(&self) -> u64 {
        self.resolution_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Average resolution time in nanoseconds.
    pub fn average_resolution_nanos(&self) -> u64 {
        let count = self.resolution_count();
        if count == 0 {
            0
        } else {
            self.total_resolution_nanos.load(Ordering::Relaxed) / count
        }
    }
}

impl DiObserver for MetricsObserver {
    fn resolving(&self, _token: &Token) {}

    fn resolved(&self, _token: &Token, duration: Duration) {
        self.resolution_count.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.total_resolution_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    fn failed(&self, _token: &Token, _error: &DiError) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }
}
