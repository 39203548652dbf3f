//! Startup validation of registrations and routed controllers.
//!
//! Two passes feed one [`ValidationReport`]:
//!
//! - **Static**: constructor manifests are checked against the effective
//!   registrations. Missing and undeclared dependencies and constructor
//!   cycles are errors; a singleton constructor depending on a scoped service
//!   is a warning (it captures the root-level instance).
//! - **Controllers**: every routed controller is resolved once from a
//!   throwaway scope, so wiring mistakes surface before traffic is accepted.
//!
//! # Examples
//!
//! ```
//! use ferrous_mvc::validation::{analyze, ValidationIssue};
//! use ferrous_mvc::{DependencyManifest, Dependencies, DiResult, Injectable, ServiceCollection};
//!
//! struct Mailer;
//! struct Signup;
//!
//! impl Injectable for Signup {
//!     fn manifest() -> DependencyManifest {
//!         DependencyManifest::new().inject::<Mailer>()
//!     }
//!     fn construct(_deps: Dependencies) -> DiResult<Self> {
//!         Ok(Signup)
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_scoped_type::<Signup>();
//! let report = analyze(&services.build());
//!
//! assert!(!report.is_ok());
//! assert!(matches!(report.errors().next(), Some(ValidationIssue::MissingDependency { .. })));
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::descriptors::ServiceSource;
use crate::error::DiError;
use crate::lifetime::Lifetime;
use crate::provider::ServiceProvider;
use crate::routing::RouteTable;
use crate::token::Token;
use crate::traits::Resolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single finding.
#[derive(Debug, Clone)]
pub enum ValidationIssue {
    /// A routed controller failed to resolve
    ControllerUnresolvable {
        controller: Token,
        routes: Vec<String>,
        error: DiError,
    },
    /// The registration for a controller token produces another type
    ControllerMismatch {
        controller: Token,
        expected: &'static str,
    },
    /// A constructor depends on a token nothing registers
    MissingDependency { service: Token, dependency: Token },
    /// A constructor parameter has no declared token
    UndeclaredDependency { service: Token, index: usize },
    /// Constructors that depend on each other in a cycle
    CircularDependency { cycle: Vec<Token> },
    /// A singleton constructor depends on a scoped service
    SingletonDependsOnScoped { singleton: Token, scoped: Token },
}

impl ValidationIssue {
    pub fn severity(&self) -> Severity {
        match self {
            ValidationIssue::SingletonDependsOnScoped { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::ControllerUnresolvable {
                controller,
                routes,
                error,
            } => write!(
                f,
                "controller {} (routes: {}) cannot be resolved: {}",
                controller,
                routes.join(", "),
                error
            ),
            ValidationIssue::ControllerMismatch { controller, expected } => {
                write!(f, "registration for {} does not produce {}", controller, expected)
            }
            ValidationIssue::MissingDependency { service, dependency } => {
                write!(f, "{} depends on {}, which is not registered", service, dependency)
            }
            ValidationIssue::UndeclaredDependency { service, index } => {
                write!(f, "{} declares no token for constructor parameter {}", service, index)
            }
            ValidationIssue::CircularDependency { cycle } => {
                let path: Vec<String> = cycle.iter().map(ToString::to_string).collect();
                write!(f, "circular constructor dependency: {}", path.join(" -> "))
            }
            ValidationIssue::SingletonDependsOnScoped { singleton, scoped } => write!(
                f,
                "singleton {} depends on scoped {}; it will hold the root-level instance",
                singleton, scoped
            ),
        }
    }
}

/// Findings of a validation run.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// `true` when there are no errors. Warnings do not count.
    pub fn is_ok(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity() == Severity::Warning)
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for issue in &self.issues {
            let label = match issue.severity() {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            writeln!(f, "  {}: {}", label, issue)?;
        }
        Ok(())
    }
}

/// Checks constructor manifests against the effective registrations.
pub fn analyze(provider: &ServiceProvider) -> ValidationReport {
    let mut report = ValidationReport::default();
    let lifetimes: HashMap<&Token, Lifetime> = provider
        .descriptors()
        .map(|d| (d.token(), d.lifetime()))
        .collect();

    let mut edges: HashMap<&Token, Vec<Token>> = HashMap::new();
    for descriptor in provider.descriptors() {
        let ServiceSource::Constructor(spec) = descriptor.source() else {
            continue;
        };
        let service = descriptor.token();
        let tokens = match spec.manifest().tokens(spec.type_name()) {
            Ok(tokens) => tokens,
            Err(DiError::UndeclaredDependency { index, .. }) => {
                report.push(ValidationIssue::UndeclaredDependency {
                    service: service.clone(),
                    index,
                });
                continue;
            }
            Err(_) => continue,
        };

        for dependency in &tokens {
            match lifetimes.get(dependency) {
                None => report.push(ValidationIssue::MissingDependency {
                    service: service.clone(),
                    dependency: dependency.clone(),
                }),
                Some(Lifetime::Scoped) if descriptor.lifetime() == Lifetime::Singleton => {
                    report.push(ValidationIssue::SingletonDependsOnScoped {
                        singleton: service.clone(),
                        scoped: dependency.clone(),
                    })
                }
                Some(_) => {}
            }
        }
        edges.insert(service, tokens);
    }

    for cycle in find_cycles(&edges) {
        report.push(ValidationIssue::CircularDependency { cycle });
    }
    report
}

fn find_cycles(edges: &HashMap<&Token, Vec<Token>>) -> Vec<Vec<Token>> {
    fn visit<'a>(
        current: &'a Token,
        edges: &'a HashMap<&Token, Vec<Token>>,
        visited: &mut HashSet<&'a Token>,
        path: &mut Vec<&'a Token>,
        cycles: &mut Vec<Vec<Token>>,
    ) {
        if let Some(start) = path.iter().position(|t| *t == current) {
            let mut cycle: Vec<Token> = path[start..].iter().map(|t| (*t).clone()).collect();
            cycle.push(current.clone());
            cycles.push(cycle);
            return;
        }
        if !visited.insert(current) {
            return;
        }
        path.push(current);
        if let Some(next) = edges.get(current) {
            for dependency in next {
                visit(dependency, edges, visited, path, cycles);
            }
        }
        path.pop();
    }

    // Sorted for a deterministic report.
    let mut roots: Vec<&Token> = edges.keys().copied().collect();
    roots.sort();

    let mut visited = HashSet::new();
    let mut cycles = Vec::new();
    for root in roots {
        visit(root, edges, &mut visited, &mut Vec::new(), &mut cycles);
    }
    cycles
}

/// Resolves every routed controller once from a throwaway scope.
pub async fn validate_controllers(provider: &ServiceProvider, table: &RouteTable) -> ValidationReport {
    let mut report = ValidationReport::default();
    let scope = provider.create_scope();
    for (invoker, routes) in table.invokers() {
        match scope.resolve(invoker.token()).await {
            Ok(instance) if invoker.accepts(&instance) => {}
            Ok(_) => report.push(ValidationIssue::ControllerMismatch {
                controller: invoker.token().clone(),
                expected: invoker.type_name(),
            }),
            Err(error) => report.push(ValidationIssue::ControllerUnresolvable {
                controller: invoker.token().clone(),
                routes: routes.iter().map(|r| format!("{} {}", r.method(), r.template())).collect(),
                error,
            }),
        }
    }
    scope.dispose().await;
    report
}

/// Static analysis followed by controller resolution.
pub async fn validate(provider: &ServiceProvider, table: &RouteTable) -> ValidationReport {
    let mut report = analyze(provider);
    report.issues.extend(validate_controllers(provider, table).await.issues);
    for warning in report.warnings() {
        tracing::warn!("{}", warning);
    }
    report
}
