/// Concurrent access integration tests
///
/// These tests verify that the container behaves correctly when many tasks
/// resolve at once: singletons are built exactly once, scopes stay isolated
/// and requests handled in parallel never see each other's state.

use async_trait::async_trait;
use ferrous_mvc::{
    ActionReturn, ActionRoute, ApplicationBuilder, Arguments, Controller, ControllerRoutes, Method, Outcome, ParameterBinding,
    Request, RequestContext, Resolver, ServiceCollection, StatusCode,
};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct SlowSingleton {
    id: usize,
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_singleton_built_once_under_contention() {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<SlowSingleton, _, _>(move |_| {
        let id = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(SlowSingleton { id })
        }
    });
    let sp = sc.build();

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let sp = sp.clone();
            tokio::spawn(async move {
                // Half the tasks come through a scope, half through the root.
                if i % 2 == 0 {
                    sp.get::<SlowSingleton>().await
                } else {
                    let scope = sp.create_scope();
                    let result = scope.get::<SlowSingleton>().await;
                    scope.dispose().await;
                    result
                }
            })
        })
        .collect();

    let mut instances = Vec::new();
    for handle in handles {
        instances.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(instances.iter().all(|s| Arc::ptr_eq(s, &instances[0])));
    assert_eq!(instances[0].id, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scoped_built_once_per_scope_under_contention() {
    struct Session;

    let builds = Arc::new(AtomicUsize::new(0));
    let counter = builds.clone();

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<Session, _, _>(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        async {
            tokio::task::yield_now().await;
            Ok(Session)
        }
    });
    let sp = sc.build();
    let scope = sp.create_scope();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let scope = scope.clone();
            tokio::spawn(async move { scope.get::<Session>().await })
        })
        .collect();

    let mut sessions = Vec::new();
    for handle in handles {
        sessions.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(sessions.iter().all(|s| Arc::ptr_eq(s, &sessions[0])));
    scope.dispose().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scopes_are_isolated_across_tasks() {
    struct Counter {
        count: AtomicU32,
    }

    let mut sc = ServiceCollection::new();
    sc.add_scoped_factory::<Counter, _, _>(|_| async {
        Ok(Counter {
            count: AtomicU32::new(0),
        })
    });
    let sp = sc.build();

    let handles: Vec<_> = (0..8u32)
        .map(|n| {
            let sp = sp.clone();
            tokio::spawn(async move {
                let scope = sp.create_scope();
                for _ in 0..=n {
                    let counter = scope.get::<Counter>().await.unwrap();
                    counter.count.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
                let total = scope.get::<Counter>().await.unwrap().count.load(Ordering::SeqCst);
                scope.dispose().await;
                (n, total)
            })
        })
        .collect();

    for handle in handles {
        let (n, total) = handle.await.unwrap();
        assert_eq!(total, n + 1);
    }
}

struct Echo;

#[async_trait]
impl Controller for Echo {
    fn routes() -> ControllerRoutes {
        ControllerRoutes::new("/echo").route(ActionRoute::get("/:value", "echo").param(ParameterBinding::route("value")))
    }

    async fn invoke(self: Arc<Self>, _: &str, _: &mut RequestContext, args: Arguments) -> ActionReturn {
        tokio::task::yield_now().await;
        Ok(Outcome::json(args.string(0).unwrap_or_default()))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_requests_get_their_own_params() {
    let mut builder = ApplicationBuilder::new();
    builder.services().add_scoped_factory::<Echo, _, _>(|_| async { Ok(Echo) });
    builder.controller::<Echo>();
    let app = builder.build().await.unwrap();

    let handles: Vec<_> = (0..24)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let response = app.handle(Request::new(Method::GET, format!("/echo/v{}", i))).await;
                (i, response)
            })
        })
        .collect();

    for handle in handles {
        let (i, response) = handle.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body_text().unwrap(), format!("\"v{}\"", i));
    }
    app.shutdown().await;
}
