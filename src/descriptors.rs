//! Service descriptors: what a token resolves to, and for how long.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;
use crate::token::Token;
use crate::traits::{AsyncDispose, Dispose};

/// Type-erased shared instance as stored in the caches.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Type-erased async factory.
pub type FactoryFn = Arc<dyn Fn(ResolverContext) -> BoxFuture<'static, DiResult<AnyArc>> + Send + Sync>;

type BuildFn = Arc<dyn Fn(Dependencies) -> DiResult<AnyArc> + Send + Sync>;

/// How a descriptor produces its instance. Exactly one source per descriptor.
#[derive(Clone)]
pub enum ServiceSource {
    /// Pre-built instance, returned as-is.
    Instance(AnyArc),
    /// Factory invoked with the resolving scope as its dependency source.
    Factory(FactoryFn),
    /// Constructor whose dependencies are declared by a manifest.
    Constructor(ConstructorSpec),
}

impl fmt::Debug for ServiceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceSource::Instance(_) => f.write_str("Instance"),
            ServiceSource::Factory(_) => f.write_str("Factory"),
            ServiceSource::Constructor(spec) => f
                .debug_struct("Constructor")
                .field("type_name", &spec.type_name)
                .field("manifest", &spec.manifest)
                .finish(),
        }
    }
}

/// Constructor plus the ordered list of tokens it needs.
#[derive(Clone)]
pub struct ConstructorSpec {
    pub(crate) type_name: &'static str,
    pub(crate) manifest: DependencyManifest,
    pub(crate) build: BuildFn,
}

impl ConstructorSpec {
    /// Constructor spec for an [`Injectable`] type.
    pub fn of<T: Injectable>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            manifest: T::manifest(),
            build: Arc::new(|deps| T::construct(deps).map(|v| Arc::new(v) as AnyArc)),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn manifest(&self) -> &DependencyManifest {
        &self.manifest
    }
}

/// Ordered (parameter index -> token) declarations for a constructor.
///
/// Tokens are always declared explicitly; there is no reflection. A manifest
/// may declare an arity larger than the indices it covers, which leaves a
/// parameter without a token. Resolving such a constructor fails with
/// [`DiError::UndeclaredDependency`] before any dependency is built.
///
/// ```rust
/// use ferrous_mvc::{DependencyManifest, Token};
///
/// struct Database;
/// let manifest = DependencyManifest::new()
///     .inject::<Database>()
///     .inject_token(Token::name("connection_string"));
/// assert_eq!(manifest.arity(), 2);
/// assert_eq!(manifest.tokens("Repo").unwrap()[1], Token::name("connection_string"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyManifest {
    arity: usize,
    entries: Vec<(usize, Token)>,
}

impl DependencyManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the next parameter as the concrete type `T`.
    pub fn inject<T: Send + Sync + 'static>(self) -> Self {
        self.inject_token(Token::of::<T>())
    }

    /// Declares the next parameter as the trait binding `T`.
    pub fn inject_trait<T: ?Sized + Send + Sync + 'static>(self) -> Self {
        self.inject_token(Token::of_trait::<T>())
    }

    /// Declares the next parameter with an explicit token.
    pub fn inject_token(self, token: Token) -> Self {
        let index = self.arity;
        self.at(index, token)
    }

    /// Declares (or overrides) the token of parameter `index`.
    pub fn at(mut self, index: usize, token: Token) -> Self {
        self.entries.retain(|(i, _)| *i != index);
        self.entries.push((index, token));
        self.arity = self.arity.max(index + 1);
        self
    }

    /// Declares the total parameter count, including undeclared parameters.
    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = self.arity.max(arity);
        self
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Tokens in parameter order, or the first parameter without one.
    pub fn tokens(&self, constructor: &'static str) -> DiResult<Vec<Token>> {
        (0..self.arity)
            .map(|index| {
                self.entries
                    .iter()
                    .find(|(i, _)| *i == index)
                    .map(|(_, token)| token.clone())
                    .ok_or(DiError::UndeclaredDependency { constructor, index })
            })
            .collect()
    }
}

/// Resolved constructor arguments, in manifest order.
pub struct Dependencies {
    constructor: &'static str,
    values: Vec<(Token, AnyArc)>,
}

impl Dependencies {
    pub(crate) fn new(constructor: &'static str, values: Vec<(Token, AnyArc)>) -> Self {
        Self { constructor, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The argument at `index` as a concrete type.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        let (token, value) = self.slot(index)?;
        value.clone().downcast::<T>().map_err(|_| DiError::TypeMismatch {
            token: token.clone(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// The argument at `index` as a trait object.
    pub fn get_trait<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        let (token, value) = self.slot(index)?;
        value
            .clone()
            .downcast::<Arc<T>>()
            .map(|boxed| (*boxed).clone())
            .map_err(|_| DiError::TypeMismatch {
                token: token.clone(),
                expected: std::any::type_name::<T>(),
            })
    }

    fn slot(&self, index: usize) -> DiResult<&(Token, AnyArc)> {
        self.values.get(index).ok_or(DiError::UndeclaredDependency {
            constructor: self.constructor,
            index,
        })
    }
}

/// A type the container can construct from a declared dependency manifest.
///
/// ```rust
/// use ferrous_mvc::{Dependencies, DependencyManifest, DiResult, Injectable};
/// use std::sync::Arc;
///
/// struct Database;
/// struct UserRepository { db: Arc<Database> }
///
/// impl Injectable for UserRepository {
///     fn manifest() -> DependencyManifest {
///         DependencyManifest::new().inject::<Database>()
///     }
///
///     fn construct(deps: Dependencies) -> DiResult<Self> {
///         Ok(Self { db: deps.get::<Database>(0)? })
///     }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Dependency tokens in constructor-parameter order.
    fn manifest() -> DependencyManifest {
        DependencyManifest::new()
    }

    fn construct(deps: Dependencies) -> DiResult<Self>;
}

/// Teardown hook recorded when a disposable instance is created.
#[derive(Clone)]
pub enum DisposeHook {
    Sync(Arc<dyn Fn(&AnyArc) + Send + Sync>),
    Async(Arc<dyn Fn(AnyArc) -> BoxFuture<'static, ()> + Send + Sync>),
}

impl DisposeHook {
    pub(crate) fn sync<T: Dispose>() -> Self {
        DisposeHook::Sync(Arc::new(|any: &AnyArc| {
            if let Some(service) = any.downcast_ref::<T>() {
                service.dispose();
            }
        }))
    }

    pub(crate) fn asynchronous<T: AsyncDispose>() -> Self {
        DisposeHook::Async(Arc::new(|any: AnyArc| {
            Box::pin(async move {
                if let Ok(service) = any.downcast::<T>() {
                    service.dispose().await;
                }
            })
        }))
    }
}

/// Service descriptor: a token bound to a source and a lifetime.
///
/// Descriptors are immutable once created; replacing a registration means
/// removing the old descriptor and registering a new one.
///
/// # Examples
///
/// ```rust
/// use ferrous_mvc::{Lifetime, ServiceDescriptor, ServiceRegistry, Token};
///
/// let mut registry = ServiceRegistry::new();
/// registry.register(ServiceDescriptor::instance(Token::name("port"), 8080u16));
/// registry.register(ServiceDescriptor::instance(Token::name("port"), 9090u16));
///
/// let found = registry.find_descriptor(&Token::name("port")).unwrap();
/// assert_eq!(found.lifetime(), Lifetime::Singleton);
/// assert_eq!(registry.len(), 2);
/// ```
#[derive(Clone)]
pub struct ServiceDescriptor {
    token: Token,
    lifetime: Lifetime,
    source: ServiceSource,
    dispose: Option<DisposeHook>,
    impl_name: Option<&'static str>,
}

impl ServiceDescriptor {
    /// Descriptor with an explicit source.
    pub fn new(token: Token, lifetime: Lifetime, source: ServiceSource) -> Self {
        let impl_name = match &source {
            ServiceSource::Constructor(spec) => Some(spec.type_name),
            _ => None,
        };
        Self {
            token,
            lifetime,
            source,
            dispose: None,
            impl_name,
        }
    }

    /// Pre-built instance. Instances are process-wide and tagged `Singleton`.
    pub fn instance<T: Send + Sync + 'static>(token: Token, value: T) -> Self {
        let mut descriptor = Self::new(token, Lifetime::Singleton, ServiceSource::Instance(Arc::new(value)));
        descriptor.impl_name = Some(std::any::type_name::<T>());
        descriptor
    }

    /// Async factory descriptor.
    pub fn factory<T, F, Fut>(token: Token, lifetime: Lifetime, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(ResolverContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DiResult<T>> + Send + 'static,
    {
        let factory = Arc::new(factory);
        let erased: FactoryFn = Arc::new(move |ctx| {
            let fut = factory(ctx);
            Box::pin(async move { fut.await.map(|v| Arc::new(v) as AnyArc) })
        });
        let mut descriptor = Self::new(token, lifetime, ServiceSource::Factory(erased));
        descriptor.impl_name = Some(std::any::type_name::<T>());
        descriptor
    }

    /// Constructor descriptor for an [`Injectable`] type, keyed by its own type token.
    pub fn constructor<T: Injectable>(lifetime: Lifetime) -> Self {
        Self::new(
            Token::of::<T>(),
            lifetime,
            ServiceSource::Constructor(ConstructorSpec::of::<T>()),
        )
    }

    /// Runs [`Dispose::dispose`] when the owning scope or provider is disposed.
    pub fn with_dispose<T: Dispose>(mut self) -> Self {
        self.dispose = Some(DisposeHook::sync::<T>());
        self
    }

    /// Runs [`AsyncDispose::dispose`] when the owning scope or provider is disposed.
    pub fn with_async_dispose<T: AsyncDispose>(mut self) -> Self {
        self.dispose = Some(DisposeHook::asynchronous::<T>());
        self
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn source(&self) -> &ServiceSource {
        &self.source
    }

    pub(crate) fn dispose_hook(&self) -> Option<&DisposeHook> {
        self.dispose.as_ref()
    }

    pub fn is_disposable(&self) -> bool {
        self.dispose.is_some()
    }

    /// Implementation type name, when known.
    pub fn impl_name(&self) -> Option<&'static str> {
        self.impl_name
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("token", &self.token)
            .field("lifetime", &self.lifetime)
            .field("source", &self.source)
            .field("disposable", &self.dispose.is_some())
            .finish()
    }
}
