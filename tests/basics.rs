use ferrous_mvc::{
    Dependencies, DependencyManifest, DiError, DiResult, Injectable, Lifetime, Resolver, ServiceCollection,
    ServiceDescriptor, Symbol, Token,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn test_concrete_singleton() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(42usize);
    sc.add_singleton("hello".to_string());

    let sp = sc.build();

    let num1 = sp.get::<usize>().await.unwrap();
    let num2 = sp.get::<usize>().await.unwrap();
    let str1 = sp.get::<String>().await.unwrap();
    let str2 = sp.get::<String>().await.unwrap();

    assert_eq!(*num1, 42);
    assert_eq!(*str1, "hello");
    assert!(Arc::ptr_eq(&num1, &num2)); // Same instance
    assert!(Arc::ptr_eq(&str1, &str2)); // Same instance
}

#[tokio::test]
async fn test_factory_with_dependencies() {
    #[derive(Debug)]
    struct Config {
        port: u16,
    }

    #[derive(Debug)]
    struct Server {
        config: Arc<Config>,
        name: String,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Config { port: 8080 });
    sc.add_singleton_factory::<Server, _, _>(|r| async move {
        r.get::<Config>().await.map(|config| Server {
            config,
            name: "MyServer".to_string(),
        })
    });

    let sp = sc.build();
    let server = sp.get::<Server>().await.unwrap();

    assert_eq!(server.config.port, 8080);
    assert_eq!(server.name, "MyServer");
}

#[tokio::test]
async fn test_transient_creates_new_instances() {
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();

    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<String, _, _>(move |_| {
        let n = counter_clone.fetch_add(1, Ordering::SeqCst) + 1;
        async move { Ok(format!("instance-{}", n)) }
    });

    let sp = sc.build();

    let a = sp.get::<String>().await.unwrap();
    let b = sp.get::<String>().await.unwrap();
    let c = sp.get::<String>().await.unwrap();

    assert_eq!(*a, "instance-1");
    assert_eq!(*b, "instance-2");
    assert_eq!(*c, "instance-3");
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_last_registration_wins() {
    let mut sc = ServiceCollection::new();
    sc.add_named_singleton("greeting", "hello".to_string());
    sc.add_named_singleton("greeting", "hi".to_string());

    let sp = sc.build();
    assert_eq!(sp.get_named::<String>("greeting").await.unwrap().as_str(), "hi");
    assert_eq!(sp.descriptors().count(), 1);
}

#[tokio::test]
async fn test_try_register_keeps_first() {
    let mut sc = ServiceCollection::new();
    assert!(sc.try_add_singleton(1u8));
    assert!(!sc.try_add_singleton(2u8));
    assert_eq!(*sc.build().get::<u8>().await.unwrap(), 1);
}

#[tokio::test]
async fn test_remove_and_replace() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(1u16);
    sc.add_singleton(2u16);
    assert_eq!(sc.replace(ServiceDescriptor::instance(Token::of::<u16>(), 3u16)), 2);
    assert_eq!(sc.len(), 1);
    assert_eq!(*sc.build().get::<u16>().await.unwrap(), 3);

    let mut sc = ServiceCollection::new();
    sc.add_singleton(1u16);
    assert_eq!(sc.remove(&Token::of::<u16>()), 1);
    assert!(!sc.contains(&Token::of::<u16>()));
}

#[tokio::test]
async fn test_not_found_and_try_resolve() {
    let sp = ServiceCollection::new().build();

    match sp.get::<u64>().await {
        Err(DiError::NotFound(token)) => assert_eq!(token, Token::of::<u64>()),
        other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
    }
    assert!(sp.try_get::<u64>().await.unwrap().is_none());
    assert!(sp.try_resolve(&Token::name("missing")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_type_mismatch_on_named_token() {
    let mut sc = ServiceCollection::new();
    sc.add_named_singleton("port", 8080u16);
    let sp = sc.build();

    assert!(matches!(
        sp.get_named::<String>("port").await,
        Err(DiError::TypeMismatch { .. })
    ));
}

#[tokio::test]
async fn test_symbols_are_distinct_tokens() {
    let primary = Symbol::new("db");
    let replica = Symbol::new("db");

    let mut sc = ServiceCollection::new();
    sc.add_symbol_singleton(primary.clone(), "primary".to_string());
    sc.add_symbol_singleton(replica.clone(), "replica".to_string());
    let sp = sc.build();

    let a = sp.resolve_required::<String>(&Token::from(primary)).await.unwrap();
    let b = sp.resolve_required::<String>(&Token::from(replica)).await.unwrap();
    assert_eq!(a.as_str(), "primary");
    assert_eq!(b.as_str(), "replica");
}

trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}

struct English;

impl Greeter for English {
    fn greet(&self) -> String {
        "hello".to_string()
    }
}

#[tokio::test]
async fn test_trait_bindings() {
    let mut sc = ServiceCollection::new();
    sc.add_scoped_trait_factory::<dyn Greeter, _, _>(|_| async { Ok(Arc::new(English) as Arc<dyn Greeter>) });
    let sp = sc.build();

    let scope = sp.create_scope();
    let a = scope.get_trait::<dyn Greeter>().await.unwrap();
    let b = scope.get_trait::<dyn Greeter>().await.unwrap();
    assert_eq!(a.greet(), "hello");
    assert!(Arc::ptr_eq(&a, &b));
    scope.dispose().await;
}

struct Database {
    url: String,
}

struct Repository {
    db: Arc<Database>,
    greeter: Arc<dyn Greeter>,
}

impl Injectable for Repository {
    fn manifest() -> DependencyManifest {
        DependencyManifest::new().inject::<Database>().inject_trait::<dyn Greeter>()
    }

    fn construct(deps: Dependencies) -> DiResult<Self> {
        Ok(Self {
            db: deps.get::<Database>(0)?,
            greeter: deps.get_trait::<dyn Greeter>(1)?,
        })
    }
}

#[tokio::test]
async fn test_constructor_with_manifest() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(Database { url: "postgres://localhost".to_string() });
    sc.add_singleton_trait::<dyn Greeter>(Arc::new(English));
    sc.add_transient_type::<Repository>();

    let sp = sc.build();
    let repo = sp.get::<Repository>().await.unwrap();
    assert_eq!(repo.db.url, "postgres://localhost");
    assert_eq!(repo.greeter.greet(), "hello");

    let descriptor = sp.descriptors().find(|d| d.token() == &Token::of::<Repository>()).unwrap();
    assert_eq!(descriptor.lifetime(), Lifetime::Transient);
}

#[tokio::test]
async fn test_factory_error_is_reported() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<Database, _, _>(|_| async {
        Err(DiError::factory(Token::of::<Database>(), "connection refused"))
    });
    let sp = sc.build();

    let err = sp.get::<Database>().await.err().unwrap();
    assert!(err.to_string().contains("connection refused"));
}
