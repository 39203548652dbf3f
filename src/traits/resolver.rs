//! Resolver traits for service resolution.

use std::sync::Arc;

use async_trait::async_trait;

use crate::descriptors::{AnyArc, BoxFuture};
use crate::error::{DiError, DiResult};
use crate::token::Token;

/// Core resolver trait for object-safe service resolution.
///
/// Implemented by the root [`ServiceProvider`](crate::ServiceProvider), by
/// every [`Scope`](crate::Scope) and by the [`ResolverContext`](crate::ResolverContext)
/// handed to factories. Most callers use the [`Resolver`] extension instead.
pub trait ResolverCore: Send + Sync {
    /// Resolves `token` honoring its lifetime.
    ///
    /// # Returns
    ///
    /// * `Ok(AnyArc)` - The resolved service wrapped in `Arc<dyn Any>`
    /// * `Err(DiError)` - not registered, circular, or a failed dependency
    fn resolve_any<'a>(&'a self, token: &'a Token) -> BoxFuture<'a, DiResult<AnyArc>>;

    /// Whether a descriptor is registered for `token`.
    fn has_service(&self, token: &Token) -> bool;
}

/// High-level resolver interface with typed helpers.
///
/// Every [`ResolverCore`] gets these methods through a blanket implementation.
///
/// # Examples
///
/// ```
/// use ferrous_mvc::{ServiceCollection, Resolver, Token};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// struct FixedClock;
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 { 42 }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut services = ServiceCollection::new();
/// services.add_singleton(8080u16);
/// services.add_singleton_trait::<dyn Clock>(Arc::new(FixedClock));
/// services.add_named_singleton("greeting", "hello".to_string());
///
/// let provider = services.build();
/// assert_eq!(*provider.get::<u16>().await.unwrap(), 8080);
/// assert_eq!(provider.get_trait::<dyn Clock>().await.unwrap().now(), 42);
/// assert_eq!(provider.get_named::<String>("greeting").await.unwrap().as_str(), "hello");
/// assert!(provider.try_resolve(&Token::name("missing")).await.unwrap().is_none());
/// # }
/// ```
#[async_trait]
pub trait Resolver: ResolverCore {
    /// Resolves `token`, failing with [`DiError::NotFound`] when it is not registered.
    async fn resolve(&self, token: &Token) -> DiResult<AnyArc> {
        self.resolve_any(token).await
    }

    /// Resolves `token`, returning `Ok(None)` when it is not registered.
    ///
    /// Construction failures of a registered service are still errors.
    async fn try_resolve(&self, token: &Token) -> DiResult<Option<AnyArc>> {
        if !self.has_service(token) {
            return Ok(None);
        }
        self.resolve_any(token).await.map(Some)
    }

    /// Resolves `token` and downcasts it to `T`.
    async fn resolve_required<T: Send + Sync + 'static>(&self, token: &Token) -> DiResult<Arc<T>> {
        let any = self.resolve_any(token).await?;
        any.downcast::<T>().map_err(|_| DiError::TypeMismatch {
            token: token.clone(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Resolves the concrete type `T`.
    async fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.resolve_required::<T>(&Token::of::<T>()).await
    }

    /// Resolves the concrete type `T` if it is registered.
    async fn try_get<T: Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        let token = Token::of::<T>();
        if !self.has_service(&token) {
            return Ok(None);
        }
        self.resolve_required::<T>(&token).await.map(Some)
    }

    /// Resolves the trait binding `T` (for example `dyn Logger`).
    async fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let token = Token::of_trait::<T>();
        let any = self.resolve_any(&token).await?;
        any.downcast::<Arc<T>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| DiError::TypeMismatch {
                token,
                expected: std::any::type_name::<T>(),
            })
    }

    /// Resolves the trait binding `T` if it is registered.
    async fn try_get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        if !self.has_service(&Token::of_trait::<T>()) {
            return Ok(None);
        }
        self.get_trait::<T>().await.map(Some)
    }

    /// Resolves a string-token registration as `T`.
    async fn get_named<T: Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<T>> {
        self.resolve_required::<T>(&Token::name(name)).await
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
