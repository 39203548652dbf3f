//! Resolver context for dependency injection.

use crate::descriptors::{AnyArc, BoxFuture};
use crate::error::DiResult;
use crate::internal::ResolutionChain;
use crate::token::Token;
use crate::traits::ResolverCore;

use super::{resolve, ResolverTarget, Scope, ServiceProvider};

/// Context passed to factory functions for resolving dependencies.
///
/// The context resolves against the same target as the resolution that
/// invoked the factory (the root provider for singletons, the requesting
/// scope otherwise) and carries the chain of services under construction,
/// so a factory that asks for one of its own ancestors fails with a
/// circular-dependency error instead of recursing.
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
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
/// services.add_transient_factory::<UserService, _, _>(|resolver| async move {
///     resolver.get::<Database>().await.map(|db| UserService { db })
/// });
/// ```
#[derive(Clone)]
pub struct ResolverContext {
    target: ResolverTarget,
    chain: ResolutionChain,
}

impl ResolverContext {
    pub(crate) fn new(target: ResolverTarget, chain: ResolutionChain) -> Self {
        Self { target, chain }
    }

    /// The scope this resolution runs in, or `None` at the root.
    pub fn scope(&self) -> Option<&Scope> {
        match &self.target {
            ResolverTarget::Scope(scope) => Some(scope),
            ResolverTarget::Root(_) => None,
        }
    }

    pub fn provider(&self) -> &ServiceProvider {
        self.target.provider()
    }

    /// Token of the service whose factory received this context.
    pub fn requested(&self) -> Option<&Token> {
        self.chain.current()
    }
}

impl ResolverCore for ResolverContext {
    fn resolve_any<'a>(&'a self, token: &'a Token) -> BoxFuture<'a, DiResult<AnyArc>> {
        resolve(&self.target, token, &self.chain)
    }

    fn has_service(&self, token: &Token) -> bool {
        self.provider().has_service(token)
    }
}
