//! Service lifetime definitions.

/// Service lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use ferrous_mvc::{ServiceCollection, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { db_url: String }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut services = ServiceCollection::new();
/// services.add_singleton(Database { url: "postgres://localhost".to_string() });
/// services.add_scoped_factory::<Repository, _, _>(|r| async move {
///     let db = r.get::<Database>().await?;
///     Ok::<_, ferrous_mvc::DiError>(Repository { db_url: db.url.clone() })
/// });
///
/// let provider = services.build();
/// let scope1 = provider.create_scope();
/// let scope2 = provider.create_scope();
///
/// // Singleton: same instance across scopes
/// let db1 = provider.get::<Database>().await.unwrap();
/// let db2 = scope1.get::<Database>().await.unwrap();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// // Scoped: same within a scope, different across scopes
/// let repo1a = scope1.get::<Repository>().await.unwrap();
/// let repo1b = scope1.get::<Repository>().await.unwrap();
/// let repo2 = scope2.get::<Repository>().await.unwrap();
/// assert!(Arc::ptr_eq(&repo1a, &repo1b));
/// assert!(!Arc::ptr_eq(&repo1a, &repo2));
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Single instance per root provider, cached forever
    ///
    /// Constructed lazily on first use and shared across all scopes and
    /// threads. Scopes never construct singletons themselves; they delegate
    /// to the root provider.
    Singleton,
    /// Single instance per scope, cached for scope lifetime
    ///
    /// The root provider acts as its own scope for root-level resolution
    /// (for example during startup validation).
    Scoped,
    /// New instance per resolution, never cached
    Transient,
}

impl Lifetime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        }
    }
}

impl std::fmt::Display for Lifetime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
