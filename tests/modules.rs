/// Tests for the modular service registration system
///
/// Feature modules bundle a controller with the services it needs. Both the
/// consuming `add_module` and the in-place `add_module_mut` forms are covered.

use ferrous_mvc::{
    DiError, DiResult, Resolver, ServiceCollection, ServiceCollectionExt, ServiceCollectionModuleExt,
    ServiceModule, Token,
};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Config {
    name: String,
    value: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "test-config".to_string(),
            value: 42,
        }
    }
}

struct DatabaseService {
    config: Arc<Config>,
    connection_id: String,
}

impl DatabaseService {
    fn new(config: Arc<Config>) -> Self {
        Self {
            connection_id: format!("conn-{}", config.value),
            config,
        }
    }

    fn get_data(&self) -> String {
        format!("Data from {} ({})", self.config.name, self.connection_id)
    }
}

struct CacheService {
    cache_size: usize,
}

struct BusinessService {
    db: Arc<DatabaseService>,
    cache: Arc<CacheService>,
}

impl BusinessService {
    fn process(&self) -> String {
        format!("{} | cache size {}", self.db.get_data(), self.cache.cache_size)
    }
}

struct CoreModule;

impl ServiceModule for CoreModule {
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
        services.add_singleton(Config::default());
        services.add_singleton_factory::<DatabaseService, _, _>(|r| async move {
            r.get::<Config>().await.map(DatabaseService::new)
        });
        Ok(())
    }
}

struct CacheModule {
    size: usize,
}

impl ServiceModule for CacheModule {
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
        let size = self.size;
        services.add_scoped_factory::<CacheService, _, _>(move |_| async move { Ok(CacheService { cache_size: size }) });
        Ok(())
    }
}

struct BusinessModule;

impl ServiceModule for BusinessModule {
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
        services.add_scoped_factory::<BusinessService, _, _>(|r| async move {
            let db = r.get::<DatabaseService>().await?;
            let cache = r.get::<CacheService>().await?;
            Ok::<_, DiError>(BusinessService { db, cache })
        });
        Ok(())
    }
}

struct RejectingModule;

impl ServiceModule for RejectingModule {
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
        services.add_singleton(1u8);
        Err(DiError::factory(Token::name("rejecting-module"), "missing connection string"))
    }
}

#[tokio::test]
async fn test_chained_modules() {
    let provider = ServiceCollection::new()
        .add_module(CoreModule)
        .and_then(|sc| sc.add_module(CacheModule { size: 100 }))
        .and_then(|sc| sc.add_module(BusinessModule))
        .unwrap()
        .build();

    let scope = provider.create_scope();
    let business = scope.get::<BusinessService>().await.unwrap();
    assert_eq!(business.process(), "Data from test-config (conn-42) | cache size 100");
    scope.dispose().await;
}

#[tokio::test]
async fn test_in_place_modules() {
    let mut services = ServiceCollection::new();
    services
        .add_module_mut(CoreModule)
        .unwrap()
        .add_module_mut(CacheModule { size: 8 })
        .unwrap();
    services.add_module_mut(BusinessModule).unwrap();
    assert_eq!(services.len(), 4);

    let provider = services.build();
    let scope = provider.create_scope();
    assert_eq!(scope.get::<CacheService>().await.unwrap().cache_size, 8);
    scope.dispose().await;
}

#[tokio::test]
async fn test_modules_share_singletons() {
    let provider = ServiceCollection::new()
        .add_module(CoreModule)
        .and_then(|sc| sc.add_module(CacheModule { size: 1 }))
        .and_then(|sc| sc.add_module(BusinessModule))
        .unwrap()
        .build();

    let a = provider.create_scope();
    let b = provider.create_scope();
    let first = a.get::<BusinessService>().await.unwrap();
    let second = b.get::<BusinessService>().await.unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.db, &second.db));
    a.dispose().await;
    b.dispose().await;
}

#[test]
fn test_module_error_propagates() {
    let result = ServiceCollection::new().add_module(RejectingModule);
    match result {
        Err(DiError::Factory { message, .. }) => assert_eq!(message, "missing connection string"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("module should have failed"),
    }

    let mut services = ServiceCollection::new();
    assert!(services.add_module_mut(RejectingModule).is_err());
    // Registrations made before the failure stay in the collection.
    assert!(services.contains(&Token::of::<u8>()));
}

#[tokio::test]
async fn test_later_module_overrides_earlier() {
    struct OverrideModule;

    impl ServiceModule for OverrideModule {
        fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
            services.add_singleton(Config {
                name: "override".to_string(),
                value: 7,
            });
            Ok(())
        }
    }

    let provider = ServiceCollection::new()
        .add_module(CoreModule)
        .and_then(|sc| sc.add_module(OverrideModule))
        .unwrap()
        .build();

    let db = provider.get::<DatabaseService>().await.unwrap();
    assert_eq!(db.get_data(), "Data from override (conn-7)");
}
