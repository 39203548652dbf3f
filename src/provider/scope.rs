//! Scoped service resolution and lifecycle management.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::descriptors::{AnyArc, BoxFuture};
use crate::error::DiResult;
use crate::internal::ResolutionChain;
use crate::token::Token;
use crate::traits::ResolverCore;

use super::{resolve, ResolverTarget, ScopeState, ServiceProvider};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Scoped service container for request-scoped dependency resolution.
///
/// A `Scope` caches scoped services for its own lifetime while resolving
/// singletons from the root provider. The router creates one per request.
///
/// # Lifetime Behavior
///
/// - **Singleton**: Resolved and cached in the root provider (shared across all scopes)
/// - **Scoped**: Resolved and cached within this specific scope
/// - **Transient**: Created fresh on every resolution (no caching)
///
/// `Scope` is a shared handle: clones refer to the same cache. Call
/// [`dispose`](Self::dispose) when the unit of work ends to run the teardown
/// hooks of everything built inside it.
///
/// # Examples
///
/// ```
/// use ferrous_mvc::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct DatabaseConnection(String);
/// struct UserService { db: Arc<DatabaseConnection> }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut collection = ServiceCollection::new();
/// collection.add_scoped_factory::<DatabaseConnection, _, _>(|_| async {
///     Ok(DatabaseConnection("connection-123".to_string()))
/// });
/// collection.add_transient_factory::<UserService, _, _>(|resolver| async move {
///     resolver.get::<DatabaseConnection>().await.map(|db| UserService { db })
/// });
///
/// let provider = collection.build();
/// let scope = provider.create_scope();
///
/// let user1 = scope.get::<UserService>().await.unwrap();
/// let user2 = scope.get::<UserService>().await.unwrap();
/// assert!(!Arc::ptr_eq(&user1, &user2));
/// assert!(Arc::ptr_eq(&user1.db, &user2.db));
/// scope.dispose().await;
/// # }
/// ```
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    id: u64,
    root: ServiceProvider,
    state: ScopeState,
    disposed: AtomicBool,
}

impl Scope {
    pub(crate) fn new(root: ServiceProvider, state: ScopeState) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
                root,
                state,
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Process-unique scope identifier, useful for log correlation.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// The root provider this scope was created from.
    pub fn provider(&self) -> &ServiceProvider {
        &self.inner.root
    }

    /// Creates a sibling scope with a fresh cache from the same provider.
    pub fn create_scope(&self) -> Scope {
        self.inner.root.create_scope()
    }

    /// Number of teardown hooks waiting for [`dispose`](Self::dispose).
    pub fn pending_disposals(&self) -> usize {
        self.inner.state.pending_disposals()
    }

    /// Runs the teardown hooks of every scoped and transient service built in
    /// this scope: async hooks first, then sync hooks, both in reverse
    /// creation order. Calling this more than once is a no-op.
    pub async fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::trace!(scope = self.inner.id, pending = self.pending_disposals(), "disposing scope");
        self.inner.state.dispose().await;
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    pub(crate) fn state(&self) -> &ScopeState {
        &self.inner.state
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl ResolverCore for Scope {
    fn resolve_any<'a>(&'a self, token: &'a Token) -> BoxFuture<'a, DiResult<AnyArc>> {
        Box::pin(async move {
            let target = ResolverTarget::Scope(self.clone());
            resolve(&target, token, &ResolutionChain::default()).await
        })
    }

    fn has_service(&self, token: &Token) -> bool {
        self.inner.root.has_service(token)
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        if !self.disposed.load(Ordering::Acquire) && self.state.pending_disposals() > 0 {
            tracing::warn!(
                scope = self.id,
                pending = self.state.pending_disposals(),
                "scope dropped without dispose(); teardown hooks skipped"
            );
        }
    }
}
