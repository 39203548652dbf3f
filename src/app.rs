//! Application assembly: services, middleware and controllers in, a
//! request handler out.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::collection::ServiceCollection;
use crate::config::RuntimeOptions;
use crate::dispatch::{internal_server_error, panic_message, RouterMiddleware};
use crate::error::StartupError;
use crate::http::{Request, RequestContext, Response};
use crate::pipeline::{Middleware, Pipeline, PipelineBuilder};
use crate::provider::ServiceProvider;
use crate::routing::{Controller, RouteTable, RouteTableBuilder};
use crate::validation;

/// Collects everything an [`Application`] is built from.
///
/// Middleware run in the order they are added; the router is appended after
/// all of them, and the 404 terminal after the router.
pub struct ApplicationBuilder {
    services: ServiceCollection,
    pipeline: PipelineBuilder,
    routes: RouteTableBuilder,
    options: RuntimeOptions,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self::with_options(RuntimeOptions::default())
    }

    pub fn with_options(options: RuntimeOptions) -> Self {
        Self {
            services: ServiceCollection::new(),
            pipeline: PipelineBuilder::new(),
            routes: RouteTableBuilder::new(),
            options,
        }
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut RuntimeOptions {
        &mut self.options
    }

    pub fn services(&mut self) -> &mut ServiceCollection {
        &mut self.services
    }

    /// The middleware pipeline, for `map`, `branch` and closures.
    pub fn pipeline(&mut self) -> &mut PipelineBuilder {
        &mut self.pipeline
    }

    pub fn use_middleware<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.pipeline.use_middleware(middleware);
        self
    }

    /// Routes the actions of `C`. The controller itself must be registered
    /// in [`services`](Self::services).
    pub fn controller<C: Controller>(&mut self) -> &mut Self {
        self.routes.controller::<C>();
        self
    }

    /// Compiles routes, builds the provider and, when enabled, validates
    /// registrations and controllers before returning.
    pub async fn build(self) -> Result<Application, StartupError> {
        let Self {
            services,
            mut pipeline,
            mut routes,
            options,
        } = self;

        let table = Arc::new(
            routes
                .synthesize_head(options.synthesize_head)
                .warn_on_overlap(options.warn_on_route_overlap)
                .build()?,
        );
        let provider = services.build();

        if options.validate_on_build {
            let report = validation::validate(&provider, &table).await;
            if !report.is_ok() {
                tracing::error!(errors = report.errors().count(), "startup validation failed");
                return Err(StartupError::Validation(report));
            }
        }

        pipeline.use_middleware(RouterMiddleware::new(table.clone()).expose_error_details(options.expose_error_details));
        let pipeline = pipeline.build();

        tracing::info!(
            routes = table.len(),
            middleware = pipeline.len(),
            services = provider.descriptors().count(),
            "application built"
        );
        Ok(Application {
            provider,
            pipeline,
            routes: table,
            options,
        })
    }
}

/// A built application. Cheap to clone; clones share the provider.
#[derive(Clone)]
pub struct Application {
    provider: ServiceProvider,
    pipeline: Pipeline,
    routes: Arc<RouteTable>,
    options: RuntimeOptions,
}

impl Application {
    /// Handles one request in its own scope, disposed before returning.
    ///
    /// A panic in middleware is logged and answered with `500` if nothing was
    /// sent; the scope is disposed either way.
    pub async fn handle(&self, request: Request) -> Response {
        let scope = self.provider.create_scope();
        let mut ctx = RequestContext::new(request, scope.clone());
        if let Err(payload) = AssertUnwindSafe(self.pipeline.handle(&mut ctx)).catch_unwind().await {
            let message = panic_message(payload.as_ref());
            tracing::error!(path = ctx.request.path(), panic = %message, "request pipeline panicked");
            let details = self.options.expose_error_details.then_some(message.as_str());
            internal_server_error(&mut ctx, details);
        }
        scope.dispose().await;
        ctx.into_response()
    }

    pub fn provider(&self) -> &ServiceProvider {
        &self.provider
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Disposes singletons and root-level scoped services.
    pub async fn shutdown(&self) {
        self.provider.dispose_all().await;
    }
}
