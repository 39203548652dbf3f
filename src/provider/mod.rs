//! Service provider module for dependency injection.
//!
//! This module contains the [`ServiceProvider`] (the root resolver), the
//! resolution algorithm shared by the provider, every [`Scope`] and every
//! [`ResolverContext`], and the per-scope cache state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::descriptors::{AnyArc, BoxFuture, Dependencies, DisposeHook, ServiceDescriptor, ServiceSource};
use crate::error::{DiError, DiResult};
use crate::internal::{DisposeBag, ResolutionChain};
use crate::observer::Observers;
use crate::registry::{FrozenRegistry, Registered, Slot};
use crate::token::Token;
use crate::traits::ResolverCore;

pub mod context;
pub mod scope;

pub use context::ResolverContext;
pub use scope::Scope;

/// Service provider for resolving dependencies from the DI container.
///
/// The provider owns the singleton cache and acts as the root scope: scoped
/// services resolved directly from it are cached for the provider's lifetime.
/// Request-level isolation comes from [`create_scope`](Self::create_scope).
///
/// # Thread Safety
///
/// `ServiceProvider` is cheap to clone (it is an `Arc` internally) and can be
/// shared across tasks. Singleton construction is single-flight: concurrent
/// first resolutions of the same singleton run its factory exactly once.
///
/// # Examples
///
/// ```
/// use ferrous_mvc::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut collection = ServiceCollection::new();
/// collection.add_singleton(Database { url: "postgres://localhost".to_string() });
/// collection.add_transient_factory::<UserService, _, _>(|resolver| async move {
///     resolver.get::<Database>().await.map(|db| UserService { db })
/// });
///
/// let provider = collection.build();
/// let user_service = provider.get::<UserService>().await.unwrap();
/// assert_eq!(user_service.db.url, "postgres://localhost");
/// # }
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    registry: FrozenRegistry,
    singletons: Box<[OnceCell<AnyArc>]>,
    root_scope: ScopeState,
    singleton_disposers: Mutex<DisposeBag>,
    observers: Observers,
    disposed: AtomicBool,
}

/// Scoped cache plus the teardown hooks of everything built in one scope.
pub(crate) struct ScopeState {
    cells: Box<[OnceCell<AnyArc>]>,
    disposers: Mutex<DisposeBag>,
}

impl ScopeState {
    pub(crate) fn new(scoped_count: usize) -> Self {
        Self {
            cells: empty_cells(scoped_count),
            disposers: Mutex::new(DisposeBag::default()),
        }
    }

    /// Takes the pending hooks out of the lock and runs them.
    pub(crate) async fn dispose(&self) {
        let bag = std::mem::take(&mut *self.disposers.lock());
        bag.run_all_reverse().await;
    }

    pub(crate) fn pending_disposals(&self) -> usize {
        self.disposers.lock().len()
    }
}

fn empty_cells(count: usize) -> Box<[OnceCell<AnyArc>]> {
    (0..count).map(|_| OnceCell::new()).collect::<Vec<_>>().into_boxed_slice()
}

/// The resolver a resolution runs against: the root or one scope.
#[derive(Clone)]
pub(crate) enum ResolverTarget {
    Root(ServiceProvider),
    Scope(Scope),
}

impl ResolverTarget {
    fn provider(&self) -> &ServiceProvider {
        match self {
            ResolverTarget::Root(provider) => provider,
            ResolverTarget::Scope(scope) => scope.provider(),
        }
    }

    fn state(&self) -> &ScopeState {
        match self {
            ResolverTarget::Root(provider) => &provider.inner.root_scope,
            ResolverTarget::Scope(scope) => scope.state(),
        }
    }
}

impl ServiceProvider {
    pub(crate) fn new(registry: FrozenRegistry, observers: Observers) -> Self {
        let singletons = empty_cells(registry.singleton_count);
        let root_scope = ScopeState::new(registry.scoped_count);
        Self {
            inner: Arc::new(ProviderInner {
                registry,
                singletons,
                root_scope,
                singleton_disposers: Mutex::new(DisposeBag::default()),
                observers,
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Creates a new scope for resolving scoped services.
    ///
    /// Each scope keeps its own cache of scoped services while sharing the
    /// provider's singletons.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_mvc::{ServiceCollection, Resolver};
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    ///
    /// struct RequestId(usize);
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let counter = Arc::new(AtomicUsize::new(0));
    /// let c = counter.clone();
    ///
    /// let mut collection = ServiceCollection::new();
    /// collection.add_scoped_factory::<RequestId, _, _>(move |_| {
    ///     let id = c.fetch_add(1, Ordering::SeqCst);
    ///     async move { Ok(RequestId(id)) }
    /// });
    ///
    /// let provider = collection.build();
    /// let scope1 = provider.create_scope();
    /// let scope2 = provider.create_scope();
    ///
    /// let a = scope1.get::<RequestId>().await.unwrap();
    /// let b = scope1.get::<RequestId>().await.unwrap();
    /// let c = scope2.get::<RequestId>().await.unwrap();
    ///
    /// assert!(Arc::ptr_eq(&a, &b));
    /// assert!(!Arc::ptr_eq(&a, &c));
    /// # }
    /// ```
    pub fn create_scope(&self) -> Scope {
        Scope::new(self.clone(), ScopeState::new(self.inner.registry.scoped_count))
    }

    /// Winning descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.inner.registry.effective()
    }

    /// Disposes everything the provider owns.
    ///
    /// Scoped services built against the root run first, then
    /// singletons; each group runs async hooks before sync hooks, in reverse
    /// creation order. Calling this more than once is a no-op.
    pub async fn dispose_all(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.root_scope.dispose().await;
        let bag = std::mem::take(&mut *self.inner.singleton_disposers.lock());
        tracing::debug!(count = bag.len(), "disposing singletons");
        bag.run_all_reverse().await;
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Human-readable dump of the effective registrations.
    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        for descriptor in self.descriptors() {
            let _ = writeln!(
                out,
                "{:<40} {:<9} {}",
                descriptor.token().to_string(),
                descriptor.lifetime().as_str(),
                descriptor.impl_name().unwrap_or("?"),
            );
        }
        out
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_any<'a>(&'a self, token: &'a Token) -> BoxFuture<'a, DiResult<AnyArc>> {
        Box::pin(async move {
            let target = ResolverTarget::Root(self.clone());
            resolve(&target, token, &ResolutionChain::default()).await
        })
    }

    fn has_service(&self, token: &Token) -> bool {
        self.inner.registry.get(token).is_some()
    }
}

impl Drop for ProviderInner {
    fn drop(&mut self) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        let pending = self.singleton_disposers.get_mut().len() + self.root_scope.disposers.get_mut().len();
        if pending > 0 {
            tracing::warn!(pending, "service provider dropped without dispose_all(); teardown hooks skipped");
        }
    }
}

/// Resolves `token` against `target`.
///
/// `chain` holds the tokens whose construction is in progress; its head is
/// the service that asked for `token`. Failures are wrapped with that
/// requester so the error names both sides of the broken edge.
pub(crate) fn resolve<'a>(
    target: &'a ResolverTarget,
    token: &'a Token,
    chain: &'a ResolutionChain,
) -> BoxFuture<'a, DiResult<AnyArc>> {
    Box::pin(async move {
        let result = resolve_registered(target, token, chain).await;
        match (result, chain.current()) {
            (Err(e), Some(parent)) => Err(e.required_by(token.clone(), parent.clone())),
            (result, _) => result,
        }
    })
}

async fn resolve_registered(target: &ResolverTarget, token: &Token, chain: &ResolutionChain) -> DiResult<AnyArc> {
    let inner = &target.provider().inner;
    let registered = inner
        .registry
        .get(token)
        .ok_or_else(|| DiError::NotFound(token.clone()))?;

    let observe = inner.observers.has_observers();
    let started = observe.then(|| {
        inner.observers.resolving(token);
        Instant::now()
    });

    let result = match chain.enter(token) {
        Ok(entered) => resolve_in_slot(target, registered, &entered).await,
        Err(e) => Err(e),
    };

    if let Some(started) = started {
        match &result {
            Ok(_) => inner.observers.resolved(token, started.elapsed()),
            Err(e) => inner.observers.failed(token, e),
        }
    }
    result
}

async fn resolve_in_slot(target: &ResolverTarget, registered: &Registered, chain: &ResolutionChain) -> DiResult<AnyArc> {
    match registered.slot {
        Slot::Singleton(index) => {
            let provider = target.provider();
            // Singletons never capture a request scope.
            let root = ResolverTarget::Root(provider.clone());
            provider.inner.singletons[index]
                .get_or_try_init(|| async {
                    let value = construct(&root, registered, chain).await?;
                    if let Some(hook) = owned_hook(registered) {
                        provider.inner.singleton_disposers.lock().push(hook, value.clone());
                    }
                    Ok(value)
                })
                .await
                .cloned()
        }
        Slot::Scoped(index) => target.state().cells[index]
            .get_or_try_init(|| async {
                let value = construct(target, registered, chain).await?;
                track(target, registered, &value);
                Ok(value)
            })
            .await
            .cloned(),
        Slot::None => {
            let value = construct(target, registered, chain).await?;
            // The root bag is only drained at shutdown; root-level transients are the caller's.
            if let ResolverTarget::Scope(_) = target {
                track(target, registered, &value);
            }
            Ok(value)
        }
    }
}

/// Pre-built instances belong to the caller and are never disposed by the container.
fn owned_hook(registered: &Registered) -> Option<&DisposeHook> {
    match registered.descriptor.source() {
        ServiceSource::Instance(_) => None,
        _ => registered.descriptor.dispose_hook(),
    }
}

fn track(target: &ResolverTarget, registered: &Registered, value: &AnyArc) {
    if let Some(hook) = owned_hook(registered) {
        target.state().disposers.lock().push(hook, value.clone());
    }
}

async fn construct(target: &ResolverTarget, registered: &Registered, chain: &ResolutionChain) -> DiResult<AnyArc> {
    match registered.descriptor.source() {
        ServiceSource::Instance(value) => Ok(value.clone()),
        ServiceSource::Factory(factory) => factory(ResolverContext::new(target.clone(), chain.clone())).await,
        ServiceSource::Constructor(spec) => {
            let tokens = spec.manifest.tokens(spec.type_name)?;
            let mut values = Vec::with_capacity(tokens.len());
            for dependency in tokens {
                let value = resolve(target, &dependency, chain).await?;
                values.push((dependency, value));
            }
            (spec.build)(Dependencies::new(spec.type_name, values))
        }
    }
}
