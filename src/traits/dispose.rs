//! Disposal traits for resource cleanup.

/// Trait for synchronous resource disposal.
///
/// Services registered with a dispose hook are torn down in LIFO order
/// when their owning scope (or, for singletons, the provider) is disposed.
///
/// # Examples
///
/// ```
/// use ferrous_mvc::{Dispose, ServiceCollection};
///
/// struct RequestCache;
///
/// impl Dispose for RequestCache {
///     fn dispose(&self) {
///         println!("dropping cached entries");
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped_disposable_factory::<RequestCache, _, _>(|_| async { Ok(RequestCache) });
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}

/// Trait for asynchronous resource disposal.
///
/// Async disposal hooks run before sync hooks, both in LIFO order.
///
/// # Examples
///
/// ```
/// use ferrous_mvc::{AsyncDispose, Lifetime, ServiceCollection, ServiceDescriptor, Token};
/// use async_trait::async_trait;
///
/// struct Connection;
///
/// #[async_trait]
/// impl AsyncDispose for Connection {
///     async fn dispose(&self) {
///         println!("closing connection");
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.register(
///     ServiceDescriptor::factory(Token::of::<Connection>(), Lifetime::Scoped, |_| async { Ok(Connection) })
///         .with_async_dispose::<Connection>(),
/// );
/// ```
#[async_trait::async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    /// Perform asynchronous cleanup of resources.
    async fn dispose(&self);
}
