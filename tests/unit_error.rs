/// Unit tests for the error types and their messages

use ferrous_mvc::{ConfigError, DiError, DiResult, DispatchError, RouteError, Token};
use std::error::Error;

#[test]
fn test_error_display_not_found() {
    let error = DiError::NotFound(Token::name("TestService"));
    assert_eq!(error.to_string(), "service not registered: \"TestService\"");
}

#[test]
fn test_error_display_type_mismatch() {
    let error = DiError::TypeMismatch {
        token: Token::name("port"),
        expected: "alloc::string::String",
    };
    let display_str = error.to_string();
    assert!(display_str.contains("\"port\""));
    assert!(display_str.contains("alloc::string::String"));
}

#[test]
fn test_error_display_circular() {
    let path = vec![Token::name("ServiceA"), Token::name("ServiceB"), Token::name("ServiceA")];
    let error = DiError::Circular(path);
    assert_eq!(
        error.to_string(),
        "circular dependency: \"ServiceA\" -> \"ServiceB\" -> \"ServiceA\""
    );
}

#[test]
fn test_error_display_empty_circular_path() {
    assert_eq!(DiError::Circular(vec![]).to_string(), "circular dependency: ");
}

#[test]
fn test_error_display_depth_exceeded() {
    assert_eq!(DiError::DepthExceeded(1024).to_string(), "max resolution depth 1024 exceeded");
}

#[test]
fn test_dependency_failed_chain() {
    let inner = DiError::NotFound(Token::name("cache"));
    let error = DiError::DependencyFailed {
        token: Token::name("repo"),
        requested_by: Token::name("controller"),
        source: Box::new(DiError::DependencyFailed {
            token: Token::name("cache"),
            requested_by: Token::name("repo"),
            source: Box::new(inner),
        }),
    };

    assert!(matches!(error.root_cause(), DiError::NotFound(t) if t == &Token::name("cache")));
    let chain: Vec<String> = error.dependency_chain().iter().map(|t| t.to_string()).collect();
    assert_eq!(chain, ["\"controller\"", "\"repo\"", "\"cache\""]);

    // std::error::Error::source walks the same chain
    let source = error.source().unwrap();
    assert!(source.to_string().contains("\"cache\""));
}

#[test]
fn test_factory_shorthand() {
    let error = DiError::factory(Token::name("db"), "timeout");
    assert_eq!(error.to_string(), "factory for \"db\" failed: timeout");
}

#[test]
fn test_diresult_ok_and_err() {
    let ok: DiResult<i32> = Ok(42);
    assert_eq!(ok.unwrap(), 42);

    let err: DiResult<i32> = Err(DiError::DepthExceeded(1));
    assert!(err.is_err());
}

#[test]
fn test_error_clone() {
    let error = DiError::NotFound(Token::of::<u8>());
    let cloned = error.clone();
    assert_eq!(error.to_string(), cloned.to_string());
}

#[test]
fn test_route_errors() {
    let error = RouteError::DuplicateName("users.show".to_string());
    assert_eq!(error.to_string(), "duplicate route name \"users.show\"");

    let error = RouteError::InvalidPattern {
        pattern: "/a/:".to_string(),
        reason: "invalid parameter name \"\"".to_string(),
    };
    assert!(error.to_string().starts_with("invalid route pattern \"/a/:\""));
}

#[test]
fn test_dispatch_error_sources() {
    let error = DispatchError::ControllerUnavailable {
        controller: Token::name("users"),
        source: DiError::NotFound(Token::name("users")),
    };
    assert!(error.source().is_some());

    let error = DispatchError::Action {
        action: "show".to_string(),
        source: "boom".into(),
    };
    assert_eq!(error.to_string(), "action \"show\" failed: boom");
}

#[test]
fn test_config_error_from_json() {
    let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: ConfigError = parse.into();
    assert!(matches!(error, ConfigError::Parse(_)));
}
