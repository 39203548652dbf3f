use ferrous_mvc::{Dependencies, DependencyManifest, DiError, DiResult, Injectable, Resolver, ServiceCollection, Token};
use std::sync::Arc;

fn circular_path(err: &DiError) -> Vec<String> {
    match err.root_cause() {
        DiError::Circular(path) => path.iter().map(|t| t.short_name().to_string()).collect(),
        other => panic!("expected a circular dependency, got {}", other),
    }
}

#[tokio::test]
async fn test_self_circular_dependency() {
    struct Loop;

    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<Loop, _, _>(|r| async move { r.get::<Loop>().await.map(|_| Loop) });
    let sp = sc.build();

    let err = sp.get::<Loop>().await.err().unwrap();
    assert_eq!(circular_path(&err), ["Loop", "Loop"]);
}

#[tokio::test]
async fn test_two_level_circular() {
    struct A;
    struct B;

    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<A, _, _>(|r| async move { r.get::<B>().await.map(|_| A) });
    sc.add_singleton_factory::<B, _, _>(|r| async move { r.get::<A>().await.map(|_| B) });
    let sp = sc.build();

    let err = sp.get::<A>().await.err().unwrap();
    assert_eq!(circular_path(&err), ["A", "B", "A"]);

    // The outer error names the failing dependency and who asked for it.
    match &err {
        DiError::DependencyFailed { token, requested_by, .. } => {
            assert_eq!(token, &Token::of::<B>());
            assert_eq!(requested_by, &Token::of::<A>());
        }
        other => panic!("expected DependencyFailed, got {}", other),
    }
}

struct X;
struct Y;
struct Z;

impl Injectable for X {
    fn manifest() -> DependencyManifest {
        DependencyManifest::new().inject::<Y>()
    }
    fn construct(_: Dependencies) -> DiResult<Self> {
        Ok(X)
    }
}

impl Injectable for Y {
    fn manifest() -> DependencyManifest {
        DependencyManifest::new().inject::<Z>()
    }
    fn construct(_: Dependencies) -> DiResult<Self> {
        Ok(Y)
    }
}

impl Injectable for Z {
    fn manifest() -> DependencyManifest {
        DependencyManifest::new().inject::<X>()
    }
    fn construct(_: Dependencies) -> DiResult<Self> {
        Ok(Z)
    }
}

#[tokio::test]
async fn test_three_level_circular_constructors() {
    let mut sc = ServiceCollection::new();
    sc.add_scoped_type::<X>();
    sc.add_scoped_type::<Y>();
    sc.add_scoped_type::<Z>();
    let sp = sc.build();

    let scope = sp.create_scope();
    let err = scope.get::<Y>().await.err().unwrap();
    assert_eq!(circular_path(&err), ["Y", "Z", "X", "Y"]);

    let chain: Vec<&str> = err.dependency_chain().iter().map(|t| t.short_name()).collect();
    assert_eq!(chain, ["Y", "Z", "X", "Y"]);
    scope.dispose().await;
}

#[tokio::test]
async fn test_circular_with_traits() {
    trait First: Send + Sync {}
    trait Second: Send + Sync {}
    struct FirstImpl;
    struct SecondImpl;
    impl First for FirstImpl {}
    impl Second for SecondImpl {}

    let mut sc = ServiceCollection::new();
    sc.add_transient_trait_factory::<dyn First, _, _>(|r| async move {
        r.get_trait::<dyn Second>().await.map(|_| Arc::new(FirstImpl) as Arc<dyn First>)
    });
    sc.add_transient_trait_factory::<dyn Second, _, _>(|r| async move {
        r.get_trait::<dyn First>().await.map(|_| Arc::new(SecondImpl) as Arc<dyn Second>)
    });
    let sp = sc.build();

    let err = sp.get_trait::<dyn First>().await.err().unwrap();
    assert!(matches!(err.root_cause(), DiError::Circular(path) if path.len() == 3));
}

#[tokio::test]
async fn test_diamond_is_not_circular() {
    struct Shared;
    struct Left(#[allow(dead_code)] Arc<Shared>);
    struct Right(#[allow(dead_code)] Arc<Shared>);
    struct Top;

    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<Shared, _, _>(|_| async { Ok(Shared) });
    sc.add_transient_factory::<Left, _, _>(|r| async move { r.get::<Shared>().await.map(Left) });
    sc.add_transient_factory::<Right, _, _>(|r| async move { r.get::<Shared>().await.map(Right) });
    sc.add_transient_factory::<Top, _, _>(|r| async move {
        r.get::<Left>().await?;
        r.get::<Right>().await?;
        Ok::<_, DiError>(Top)
    });
    let sp = sc.build();

    assert!(sp.get::<Top>().await.is_ok());
}

#[tokio::test]
async fn test_failed_dependency_names_token_and_requester() {
    struct Missing;
    struct Service;

    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<Service, _, _>(|r| async move { r.get::<Missing>().await.map(|_| Service) });
    let sp = sc.build();

    let err = sp.get::<Service>().await.err().unwrap();
    let message = err.to_string();
    assert!(message.contains("Missing"), "{}", message);
    assert!(message.contains("Service"), "{}", message);
    assert!(matches!(err.root_cause(), DiError::NotFound(token) if token == &Token::of::<Missing>()));
}

#[tokio::test]
async fn test_undeclared_constructor_parameter() {
    struct Partial;

    impl Injectable for Partial {
        fn manifest() -> DependencyManifest {
            DependencyManifest::new().inject::<u8>().with_arity(2)
        }
        fn construct(_: Dependencies) -> DiResult<Self> {
            Ok(Partial)
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(1u8);
    sc.add_transient_type::<Partial>();
    let sp = sc.build();

    match sp.get::<Partial>().await {
        Err(DiError::UndeclaredDependency { index, .. }) => assert_eq!(index, 1),
        other => panic!("expected UndeclaredDependency, got {:?}", other.map(|_| ())),
    }
}
