#![no_main]

use ferrous_mvc::{DiError, Lifetime, Resolver, ServiceCollection, ServiceDescriptor, Token};
use libfuzzer_sys::fuzz_target;

// Each byte pair (node, edge) registers node `n % 16` depending on `e % 16`.
// A 0xFF edge marks a leaf.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let mut services = ServiceCollection::new();
    for pair in data.chunks(2).take(32) {
        let node = pair[0] % 16;
        let edge = pair.get(1).copied().unwrap_or(0xFF);
        let lifetime = match node % 3 {
            0 => Lifetime::Singleton,
            1 => Lifetime::Scoped,
            _ => Lifetime::Transient,
        };
        let token = Token::name(format!("n{}", node));
        if edge == 0xFF {
            services.register(ServiceDescriptor::factory(token, lifetime, move |_| async move { Ok(node) }));
        } else {
            let dependency = format!("n{}", edge % 16);
            services.register(ServiceDescriptor::factory(token, lifetime, move |r| {
                let dependency = dependency.clone();
                async move { r.get_named::<u8>(&dependency).await.map(|_| node) }
            }));
        }
    }
    let provider = services.build();

    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    runtime.block_on(async {
        let scope = provider.create_scope();
        for node in 0..16u8 {
            match scope.get_named::<u8>(&format!("n{}", node)).await {
                Ok(value) => assert_eq!(*value, node),
                Err(err) => match err.root_cause() {
                    DiError::NotFound(_) => {}
                    DiError::Circular(path) => assert_eq!(path.first(), path.last()),
                    other => panic!("unexpected error: {}", other),
                },
            }
        }
        scope.dispose().await;
        provider.dispose_all().await;
    });
});
