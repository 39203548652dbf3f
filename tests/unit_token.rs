/// Unit tests for service tokens

use ferrous_mvc::{Symbol, Token};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

trait Logger {}

fn hash_of(token: &Token) -> u64 {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_type_token_display() {
    assert_eq!(Token::of::<String>().to_string(), "alloc::string::String");
    assert_eq!(Token::of::<String>().short_name(), "String");
    assert_eq!(Token::of::<Vec<u8>>().short_name(), "Vec");
}

#[test]
fn test_trait_token_display() {
    let token = Token::of_trait::<dyn Logger>();
    assert!(token.display_name().contains("Logger"));
    assert_ne!(token, Token::of::<dyn Logger>());
}

#[test]
fn test_name_token_is_quoted() {
    let token = Token::from("database_url");
    assert_eq!(token, Token::name("database_url"));
    assert_eq!(token.to_string(), "\"database_url\"");
    assert_eq!(token.short_name(), "database_url");
}

#[test]
fn test_symbols_compare_by_identity() {
    let a = Symbol::new("clock");
    let b = Symbol::new("clock");
    assert_eq!(Token::from(a.clone()), Token::from(a.clone()));
    assert_ne!(Token::from(a.clone()), Token::from(b));
    assert_eq!(a.description(), "clock");
}

#[test]
fn test_kinds_never_collide() {
    let tokens = [
        Token::of::<u32>(),
        Token::of_trait::<dyn Logger>(),
        Token::name("u32"),
        Token::from(Symbol::new("u32")),
    ];
    let unique: HashSet<_> = tokens.iter().cloned().collect();
    assert_eq!(unique.len(), tokens.len());
}

#[test]
fn test_equal_tokens_hash_equal() {
    assert_eq!(hash_of(&Token::of::<u64>()), hash_of(&Token::of::<u64>()));
    assert_eq!(hash_of(&Token::name("x")), hash_of(&Token::from(String::from("x"))));
}

#[test]
fn test_tokens_are_ordered() {
    let mut tokens = vec![Token::name("b"), Token::name("a")];
    tokens.sort();
    assert_eq!(tokens, [Token::name("a"), Token::name("b")]);
}
