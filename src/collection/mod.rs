//! Service collection module for dependency injection.
//!
//! This module contains the ServiceCollection type and related functionality
//! for registering services and building service providers.

use std::future::Future;
use std::sync::Arc;

use crate::descriptors::{Injectable, ServiceDescriptor};
use crate::error::DiResult;
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::provider::{ResolverContext, ServiceProvider};
use crate::registry::ServiceRegistry;
use crate::token::{Symbol, Token};
use crate::traits::Dispose;

pub mod module_system;

pub use module_system::{ServiceCollectionExt, ServiceCollectionModuleExt, ServiceModule};

/// Service collection for registering services before building a provider.
///
/// Registrations are appended in order; when several registrations share a
/// token the last one wins at resolution time. Call [`build`](Self::build)
/// once to freeze the registrations into a [`ServiceProvider`].
///
/// # Examples
///
/// ```
/// use ferrous_mvc::{ServiceCollection, Resolver};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut services = ServiceCollection::new();
/// services.add_singleton(42usize);
/// services.add_transient_factory::<String, _, _>(|r| async move {
///     r.get::<usize>().await.map(|n| format!("Value: {}", n))
/// });
///
/// let provider = services.build();
/// assert_eq!(provider.get::<String>().await.unwrap().as_str(), "Value: 42");
/// # }
/// ```
#[derive(Default)]
pub struct ServiceCollection {
    registry: ServiceRegistry,
    observers: Observers,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self::default()
    }

    // ----- Generic registration -----

    /// Appends a descriptor.
    pub fn register(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        self.registry.register(descriptor);
        self
    }

    /// Appends a descriptor only if its token is not registered yet.
    ///
    /// Returns `true` when the descriptor was added.
    pub fn try_register(&mut self, descriptor: ServiceDescriptor) -> bool {
        if self.registry.contains(descriptor.token()) {
            return false;
        }
        self.registry.register(descriptor);
        true
    }

    /// Removes every registration for the descriptor's token, then registers it.
    ///
    /// Returns how many registrations were removed.
    pub fn replace(&mut self, descriptor: ServiceDescriptor) -> usize {
        self.registry.replace(descriptor)
    }

    /// Removes every registration for `token`.
    pub fn remove(&mut self, token: &Token) -> usize {
        self.registry.remove(token)
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.registry.contains(token)
    }

    /// Registered descriptors in registration order, duplicates included.
    pub fn descriptors(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.registry.iter()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Registers a pre-built value under an explicit token.
    pub fn add_instance<T: Send + Sync + 'static>(&mut self, token: Token, value: T) -> &mut Self {
        self.register(ServiceDescriptor::instance(token, value))
    }

    /// Registers an async factory under an explicit token.
    pub fn add_factory<T, F, Fut>(&mut self, token: Token, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.register(ServiceDescriptor::factory(token, lifetime, factory))
    }

    // ----- Concrete types -----

    /// Registers a singleton instance.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_mvc::{ServiceCollection, Resolver};
    /// use std::sync::Arc;
    ///
    /// struct Config { port: u16 }
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Config { port: 8080 });
    ///
    /// let provider = services.build();
    /// let a = provider.get::<Config>().await.unwrap();
    /// let b = provider.create_scope().get::<Config>().await.unwrap();
    /// assert_eq!(a.port, 8080);
    /// assert!(Arc::ptr_eq(&a, &b));
    /// # }
    /// ```
    pub fn add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.add_instance(Token::of::<T>(), value)
    }

    /// Registers a singleton instance unless `T` is already registered.
    pub fn try_add_singleton<T: Send + Sync + 'static>(&mut self, value: T) -> bool {
        self.try_register(ServiceDescriptor::instance(Token::of::<T>(), value))
    }

    /// Registers a singleton factory. The factory runs at most once per provider.
    pub fn add_singleton_factory<T, F, Fut>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.add_factory(Token::of::<T>(), Lifetime::Singleton, factory)
    }

    /// Registers a scoped factory. The factory runs at most once per scope.
    pub fn add_scoped_factory<T, F, Fut>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.add_factory(Token::of::<T>(), Lifetime::Scoped, factory)
    }

    /// Registers a transient factory. The factory runs on every resolution.
    pub fn add_transient_factory<T, F, Fut>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.add_factory(Token::of::<T>(), Lifetime::Transient, factory)
    }

    /// Registers a singleton factory whose instance is disposed by
    /// [`ServiceProvider::dispose_all`].
    pub fn add_singleton_disposable_factory<T, F, Fut>(&mut self, factory: F) -> &mut Self
    where
        T: Dispose,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.register(ServiceDescriptor::factory(Token::of::<T>(), Lifetime::Singleton, factory).with_dispose::<T>())
    }

    /// Registers a scoped factory whose instances are disposed with their scope.
    pub fn add_scoped_disposable_factory<T, F, Fut>(&mut self, factory: F) -> &mut Self
    where
        T: Dispose,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.register(ServiceDescriptor::factory(Token::of::<T>(), Lifetime::Scoped, factory).with_dispose::<T>())
    }

    /// Registers a transient factory whose instances are disposed with the scope that built them.
    ///
    /// Instances resolved directly from the root provider are not tracked and
    /// never disposed by the container.
    pub fn add_transient_disposable_factory<T, F, Fut>(&mut self, factory: F) -> &mut Self
    where
        T: Dispose,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.register(ServiceDescriptor::factory(Token::of::<T>(), Lifetime::Transient, factory).with_dispose::<T>())
    }

    // ----- Constructors -----

    /// Registers `T` as a singleton built from its dependency manifest.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_mvc::{Dependencies, DependencyManifest, DiResult, Injectable, Resolver, ServiceCollection};
    /// use std::sync::Arc;
    ///
    /// struct Database { url: String }
    /// struct Repository { db: Arc<Database> }
    ///
    /// impl Injectable for Repository {
    ///     fn manifest() -> DependencyManifest {
    ///         DependencyManifest::new().inject::<Database>()
    ///     }
    ///     fn construct(deps: Dependencies) -> DiResult<Self> {
    ///         Ok(Self { db: deps.get(0)? })
    ///     }
    /// }
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let mut services = ServiceCollection::new();
    /// services.add_singleton(Database { url: "sqlite::memory:".into() });
    /// services.add_scoped_type::<Repository>();
    ///
    /// let provider = services.build();
    /// let repo = provider.create_scope().get::<Repository>().await.unwrap();
    /// assert_eq!(repo.db.url, "sqlite::memory:");
    /// # }
    /// ```
    pub fn add_singleton_type<T: Injectable>(&mut self) -> &mut Self {
        self.register(ServiceDescriptor::constructor::<T>(Lifetime::Singleton))
    }

    /// Registers `T` as a scoped service built from its dependency manifest.
    pub fn add_scoped_type<T: Injectable>(&mut self) -> &mut Self {
        self.register(ServiceDescriptor::constructor::<T>(Lifetime::Scoped))
    }

    /// Registers `T` as a transient service built from its dependency manifest.
    pub fn add_transient_type<T: Injectable>(&mut self) -> &mut Self {
        self.register(ServiceDescriptor::constructor::<T>(Lifetime::Transient))
    }

    // ----- Trait bindings -----

    /// Registers a singleton trait implementation.
    ///
    /// The binding is resolved with [`Resolver::get_trait`](crate::Resolver::get_trait).
    pub fn add_singleton_trait<T: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<T>) -> &mut Self {
        self.add_instance(Token::of_trait::<T>(), value)
    }

    /// Registers a trait factory with the given lifetime.
    pub fn add_trait_factory<T, F, Fut>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<Arc<T>>> + Send + 'static,
    {
        self.add_factory(Token::of_trait::<T>(), lifetime, factory)
    }

    pub fn add_singleton_trait_factory<T, F, Fut>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<Arc<T>>> + Send + 'static,
    {
        self.add_trait_factory(Lifetime::Singleton, factory)
    }

    pub fn add_scoped_trait_factory<T, F, Fut>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<Arc<T>>> + Send + 'static,
    {
        self.add_trait_factory(Lifetime::Scoped, factory)
    }

    pub fn add_transient_trait_factory<T, F, Fut>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<Arc<T>>> + Send + 'static,
    {
        self.add_trait_factory(Lifetime::Transient, factory)
    }

    // ----- Named and symbol tokens -----

    /// Registers a singleton under a string token.
    pub fn add_named_singleton<T: Send + Sync + 'static>(&mut self, name: impl Into<Arc<str>>, value: T) -> &mut Self {
        self.add_instance(Token::name(name), value)
    }

    pub fn add_named_singleton_factory<T, F, Fut>(&mut self, name: impl Into<Arc<str>>, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.add_factory(Token::name(name), Lifetime::Singleton, factory)
    }

    pub fn add_named_scoped_factory<T, F, Fut>(&mut self, name: impl Into<Arc<str>>, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.add_factory(Token::name(name), Lifetime::Scoped, factory)
    }

    pub fn add_named_transient_factory<T, F, Fut>(&mut self, name: impl Into<Arc<str>>, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.add_factory(Token::name(name), Lifetime::Transient, factory)
    }

    /// Registers a singleton under an opaque symbol token.
    ///
    /// ```
    /// use ferrous_mvc::{Resolver, ServiceCollection, Symbol, Token};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let primary = Symbol::new("db");
    /// let replica = Symbol::new("db");
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_symbol_singleton(primary.clone(), "primary".to_string());
    /// services.add_symbol_singleton(replica.clone(), "replica".to_string());
    ///
    /// let provider = services.build();
    /// let db = provider.resolve_required::<String>(&Token::from(primary)).await.unwrap();
    /// assert_eq!(db.as_str(), "primary");
    /// # }
    /// ```
    pub fn add_symbol_singleton<T: Send + Sync + 'static>(&mut self, symbol: Symbol, value: T) -> &mut Self {
        self.add_instance(Token::Symbol(symbol), value)
    }

    pub fn add_symbol_factory<T, F, Fut>(&mut self, symbol: Symbol, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        self.add_factory(Token::Symbol(symbol), lifetime, factory)
    }

    // ----- Observers and build -----

    /// Adds a resolution observer shared by the provider and all its scopes.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Freezes the registrations into a [`ServiceProvider`].
    ///
    /// Nothing is instantiated here; services are built lazily on first use.
    pub fn build(self) -> ServiceProvider {
        let registry = self.registry.freeze();
        tracing::debug!(
            singletons = registry.singleton_count,
            scoped = registry.scoped_count,
            "service provider built"
        );
        ServiceProvider::new(registry, self.observers)
    }
}
