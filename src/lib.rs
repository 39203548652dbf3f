//! # ferrous-mvc
//!
//! Request-processing runtime for server applications: an async dependency
//! injection container with lifetime-scoped object graphs, an ordered
//! middleware pipeline, and a declarative router that dispatches to
//! controller actions.
//!
//! ## Features
//!
//! - **Type-safe lifetimes**: Singleton, Scoped, and Transient services
//! - **Explicit dependency manifests**: constructors declare their tokens, no reflection
//! - **Single-flight singletons**: concurrent first use constructs once
//! - **Circular dependency detection**: errors carry the full resolution path
//! - **Request scopes**: one scope per request, with teardown hooks
//! - **Middleware pipeline**: nested `next` semantics with `map` and `branch`
//! - **Routing**: first-match-wins route table with parameter binding and coercion
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_mvc::{ServiceCollection, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut services = ServiceCollection::new();
//! services.add_singleton(Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! services.add_transient_factory::<UserService, _, _>(|resolver| async move {
//!     resolver.get::<Database>().await.map(|db| UserService { db })
//! });
//!
//! let provider = services.build();
//! let user_service = provider.get::<UserService>().await.unwrap();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! # }
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: Created once and shared across the entire application
//! - **Scoped**: Created once per scope (one scope per request)
//! - **Transient**: Created fresh on every resolution
//!
//! ## Serving requests
//!
//! ```rust
//! use ferrous_mvc::{
//!     ActionReturn, ApplicationBuilder, Arguments, Controller, ControllerRoutes, Request,
//!     RequestContext, Method, Outcome,
//! };
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct HealthController;
//!
//! #[async_trait]
//! impl Controller for HealthController {
//!     fn routes() -> ControllerRoutes {
//!         ControllerRoutes::new("/health").get("/", "status")
//!     }
//!
//!     async fn invoke(self: Arc<Self>, _action: &str, _ctx: &mut RequestContext, _args: Arguments) -> ActionReturn {
//!         Ok(Outcome::json("ok"))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut builder = ApplicationBuilder::new();
//! builder.services().add_scoped_factory::<HealthController, _, _>(|_| async { Ok(HealthController) });
//! builder.controller::<HealthController>();
//! let app = builder.build().await.unwrap();
//!
//! let response = app.handle(Request::new(Method::GET, "/health")).await;
//! assert_eq!(response.status().as_u16(), 200);
//! # }
//! ```

use std::sync::Arc;

pub mod app;
pub mod binding;
pub mod collection;
pub mod config;
pub mod descriptors;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod lifetime;
pub mod logger;
pub mod observer;
pub mod pipeline;
pub mod provider;
pub mod registry;
pub mod results;
pub mod routing;
pub mod token;
pub mod traits;
pub mod validation;

mod internal;

pub use app::{Application, ApplicationBuilder};
pub use binding::{Arguments, BindingSource, ParamType, ParameterBinding};
pub use collection::{ServiceCollection, ServiceCollectionExt, ServiceCollectionModuleExt, ServiceModule};
pub use config::{init_tracing, RuntimeOptions};
pub use descriptors::{
    AnyArc, BoxFuture, ConstructorSpec, Dependencies, DependencyManifest, Injectable, ServiceDescriptor,
    ServiceSource,
};
pub use dispatch::{ActionReturn, Outcome, RouterMiddleware};
pub use error::{BoxError, ConfigError, DiError, DiResult, DispatchError, RouteError, StartupError};
pub use http::{Method, Request, RequestContext, Response, StatusCode};
pub use lifetime::Lifetime;
pub use logger::{Logger, NoopLogger, TracingLogger};
pub use observer::{DiObserver, LoggingObserver, MetricsObserver};
pub use pipeline::{middleware_fn, Middleware, Next, NotFound, Pipeline, PipelineBuilder, RequestLogging};
pub use provider::{ResolverContext, Scope, ServiceProvider};
pub use registry::ServiceRegistry;
pub use results::{ActionResult, Content, Json, NoContent, Redirect, Status};
pub use routing::{ActionRoute, Controller, ControllerRoutes, RouteMatch, RouteTable, RouteTableBuilder};
pub use token::{Symbol, Token};
pub use traits::{AsyncDispose, Dispose, Resolver, ResolverCore};
pub use validation::{ValidationIssue, ValidationReport};

// ===== Options Pattern =====

/// Options interface for dependency injection.
///
/// Implemented by [`Options<T>`]; resolve `Options<T>` and call `get()`.
pub trait IOptions<T>: Send + Sync + 'static {
    fn get(&self) -> Arc<T>;
}

/// Immutable, validated options value.
///
/// Options are built once, on first resolution, and remain immutable thereafter.
///
/// # Examples
///
/// ```
/// use ferrous_mvc::{Options, Resolver, ServiceCollection};
///
/// #[derive(Default)]
/// struct DatabaseConfig {
///     url: String,
///     pool_size: u32,
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut services = ServiceCollection::new();
/// services
///     .add_options::<DatabaseConfig>()
///     .configure(|c| {
///         c.url = "postgres://localhost".into();
///         c.pool_size = 10;
///     })
///     .validate(|c| if c.pool_size == 0 { Err("pool_size must be positive".into()) } else { Ok(()) })
///     .register();
///
/// let provider = services.build();
/// let config = provider.get::<Options<DatabaseConfig>>().await.unwrap();
/// assert_eq!(config.get().pool_size, 10);
/// # }
/// ```
pub struct Options<T> {
    inner: Arc<T>,
}

impl<T> Options<T> {
    pub fn new(value: T) -> Self {
        Self { inner: Arc::new(value) }
    }

    pub fn value(&self) -> &Arc<T> {
        &self.inner
    }

    pub fn get(&self) -> Arc<T> {
        self.inner.clone()
    }
}

impl<T> IOptions<T> for Options<T>
where
    T: Send + Sync + 'static,
{
    fn get(&self) -> Arc<T> {
        self.inner.clone()
    }
}

type MutateFn<T> = Arc<dyn Fn(&mut T) + Send + Sync>;
type ValidateFn<T> = Arc<dyn Fn(&T) -> Result<(), String> + Send + Sync>;

/// Fluent builder for [`Options<T>`].
///
/// Steps run in this order when `Options<T>` is first resolved: the default
/// value, every `configure`, every `post_configure`, then every `validate`.
/// A failed validation resolves to [`DiError::InvalidOptions`].
pub struct OptionsBuilder<'a, T>
where
    T: Send + Sync + 'static,
{
    services: &'a mut ServiceCollection,
    default_maker: Option<Arc<dyn Fn() -> T + Send + Sync>>,
    configures: Vec<MutateFn<T>>,
    post_configures: Vec<MutateFn<T>>,
    validates: Vec<ValidateFn<T>>,
}

impl<'a, T> OptionsBuilder<'a, T>
where
    T: Default + Send + Sync + 'static,
{
    fn new(services: &'a mut ServiceCollection) -> Self {
        Self {
            services,
            default_maker: None,
            configures: Vec::new(),
            post_configures: Vec::new(),
            validates: Vec::new(),
        }
    }

    /// Provide a custom initial value (otherwise `T::default()`).
    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.default_maker = Some(Arc::new(f));
        self
    }

    /// Uses a JSON document (for example a parsed config file) as the initial value.
    ///
    /// A document that does not deserialize into `T` fails validation.
    pub fn bind_json(mut self, document: serde_json::Value) -> Self
    where
        T: serde::de::DeserializeOwned,
    {
        if let Err(e) = serde_json::from_value::<T>(document.clone()) {
            let message = e.to_string();
            self.validates.push(Arc::new(move |_| Err(message.clone())));
        }
        self.default_maker = Some(Arc::new(move || {
            serde_json::from_value::<T>(document.clone()).unwrap_or_default()
        }));
        self
    }

    /// Adds a configuration step.
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.configures.push(Arc::new(f));
        self
    }

    /// Adds a step that runs after every `configure` step.
    pub fn post_configure<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.post_configures.push(Arc::new(f));
        self
    }

    /// Adds a validation rule; `Err(message)` rejects the options.
    pub fn validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validates.push(Arc::new(f));
        self
    }

    /// Registers `Options<T>` as a singleton.
    pub fn register(self) {
        let OptionsBuilder {
            services,
            default_maker,
            configures,
            post_configures,
            validates,
        } = self;

        services.add_singleton_factory::<Options<T>, _, _>(move |_| {
            let result = build_options(&default_maker, &configures, &post_configures, &validates);
            async move { result }
        });
    }
}

fn build_options<T: Default>(
    default_maker: &Option<Arc<dyn Fn() -> T + Send + Sync>>,
    configures: &[MutateFn<T>],
    post_configures: &[MutateFn<T>],
    validates: &[ValidateFn<T>],
) -> DiResult<Options<T>> {
    let mut value = match default_maker {
        Some(make) => make(),
        None => T::default(),
    };
    for step in configures.iter().chain(post_configures) {
        step(&mut value);
    }
    for rule in validates {
        rule(&value).map_err(|message| DiError::InvalidOptions {
            type_name: std::any::type_name::<T>(),
            message,
        })?;
    }
    Ok(Options::new(value))
}

impl ServiceCollection {
    /// Start building `Options<T>`. Call `.register()` to finalize.
    pub fn add_options<T>(&mut self) -> OptionsBuilder<'_, T>
    where
        T: Default + Send + Sync + 'static,
    {
        OptionsBuilder::new(self)
    }
}
