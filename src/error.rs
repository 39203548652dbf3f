//! Error types for the container, the route table and request dispatch.

use thiserror::Error;

use crate::token::Token;

/// Boxed error returned by controller actions and result executors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependency injection errors
///
/// Represents the various error conditions that can occur during service
/// registration, resolution, or container operations. All of them are
/// configuration errors: they indicate a wiring mistake and are never retried.
///
/// # Examples
///
/// ```rust
/// use ferrous_mvc::{DiError, ServiceCollection, Resolver, Token};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = ServiceCollection::new().build();
/// match provider.get::<String>().await {
///     Err(DiError::NotFound(token)) => {
///         assert_eq!(token, Token::of::<String>());
///     }
///     _ => unreachable!(),
/// }
/// # }
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// Service not registered
    #[error("service not registered: {0}")]
    NotFound(Token),
    /// The registered instance is not of the requested type
    #[error("type mismatch for {token}: expected {expected}")]
    TypeMismatch {
        token: Token,
        expected: &'static str,
    },
    /// Circular dependency detected (includes path)
    #[error("circular dependency: {}", format_path(.0))]
    Circular(Vec<Token>),
    /// A dependency of a constructor or factory could not be built
    #[error("failed to resolve {token} required by {requested_by}: {source}")]
    DependencyFailed {
        token: Token,
        requested_by: Token,
        #[source]
        source: Box<DiError>,
    },
    /// A constructor parameter has no declared token
    #[error("constructor {constructor} declares no dependency token for parameter {index}")]
    UndeclaredDependency {
        constructor: &'static str,
        index: usize,
    },
    /// A factory or constructor reported a failure of its own
    #[error("factory for {token} failed: {message}")]
    Factory { token: Token, message: String },
    /// Options validation rejected the configured value
    #[error("options {type_name} failed validation: {message}")]
    InvalidOptions {
        type_name: &'static str,
        message: String,
    },
    /// Maximum recursion depth exceeded
    #[error("max resolution depth {0} exceeded")]
    DepthExceeded(usize),
}

fn format_path(path: &[Token]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl DiError {
    /// Shorthand for a factory-reported failure.
    pub fn factory(token: Token, message: impl Into<String>) -> Self {
        DiError::Factory {
            token,
            message: message.into(),
        }
    }

    /// Wraps this error with the token that failed and the service that asked for it.
    pub(crate) fn required_by(self, token: Token, requested_by: Token) -> Self {
        DiError::DependencyFailed {
            token,
            requested_by,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error of a `DependencyFailed` chain.
    pub fn root_cause(&self) -> &DiError {
        let mut current = self;
        while let DiError::DependencyFailed { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns the chain of tokens from the outermost requester down to the failing token.
    pub fn dependency_chain(&self) -> Vec<&Token> {
        let mut chain = Vec::new();
        let mut current = self;
        while let DiError::DependencyFailed {
            token,
            requested_by,
            source,
        } = current
        {
            if chain.is_empty() {
                chain.push(requested_by);
            }
            chain.push(token);
            current = source;
        }
        chain
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;

/// Errors raised while compiling the route table.
#[derive(Debug, Clone, Error)]
pub enum RouteError {
    /// A path template could not be compiled into a matcher
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    /// Two routes declare the same name
    #[error("duplicate route name {0:?}")]
    DuplicateName(String),
    /// `url_for` was asked for an unknown route or was missing a parameter
    #[error("cannot build url for route {name:?}: {reason}")]
    UrlGeneration { name: String, reason: String },
}

/// Per-request failures caught at the router boundary.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The controller could not be resolved from the request scope
    #[error("controller {controller} could not be resolved: {source}")]
    ControllerUnavailable {
        controller: Token,
        #[source]
        source: DiError,
    },
    /// The resolved instance is not the controller type the route expects
    #[error("resolved instance for {0} is not a controller of the routed type")]
    ControllerMismatch(Token),
    /// The route names an action the controller does not implement
    #[error("action {action:?} is not invocable on {controller}")]
    ActionNotFound { controller: Token, action: String },
    /// A `service` parameter could not be resolved
    #[error("parameter {index} could not be bound: {source}")]
    Binding {
        index: usize,
        #[source]
        source: DiError,
    },
    /// The action itself failed
    #[error("action {action:?} failed: {source}")]
    Action {
        action: String,
        #[source]
        source: BoxError,
    },
    /// The returned result failed while writing the response
    #[error("result execution failed: {0}")]
    ResultExecution(#[source] BoxError),
    /// Binding, the action or its result panicked
    #[error("dispatch panicked: {0}")]
    Panicked(String),
}

/// Errors raised while loading runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid runtime options: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid log filter {filter:?}: {reason}")]
    LogFilter { filter: String, reason: String },
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}

/// Errors that prevent an application from being built.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("startup validation failed:\n{0}")]
    Validation(crate::validation::ValidationReport),
}
