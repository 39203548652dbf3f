//! Service tokens: the keys used for registration and lookup.

use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Token for service storage and lookup.
///
/// A token identifies a service in the registry. Lookups are by token
/// equality, so two registrations with the same token are the "same"
/// service and the later one wins.
///
/// # Token Kinds
///
/// - **Type**: Concrete types (structs, enums, primitives)
/// - **Trait**: `dyn Trait` bindings, stored as `Arc<Arc<dyn Trait>>`
/// - **Name**: Free-form string tokens
/// - **Symbol**: Opaque, process-unique tokens
///
/// # Examples
///
/// ```rust
/// use ferrous_mvc::{Symbol, Token};
///
/// let by_type = Token::of::<u32>();
/// let by_name = Token::name("database_url");
/// let by_symbol = Token::from(Symbol::new("clock"));
///
/// assert_eq!(by_type, Token::of::<u32>());
/// assert_eq!(by_name, Token::name("database_url"));
/// assert_ne!(by_symbol, Token::from(Symbol::new("clock")));
/// assert_eq!(by_name.to_string(), "\"database_url\"");
/// ```
#[derive(Debug, Clone)]
pub enum Token {
    /// Concrete type token with TypeId and name for diagnostics
    Type(TypeId, &'static str),
    /// Trait object token (trait objects have no usable TypeId of their own)
    Trait(&'static str),
    /// String token
    Name(Arc<str>),
    /// Opaque symbol token
    Symbol(Symbol),
}

impl Token {
    /// Token for the concrete type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Token::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Token for the trait object type `T` (e.g. `dyn Logger`).
    #[inline]
    pub fn of_trait<T: ?Sized + 'static>() -> Self {
        Token::Trait(std::any::type_name::<T>())
    }

    /// String token.
    pub fn name(name: impl Into<Arc<str>>) -> Self {
        Token::Name(name.into())
    }

    /// Human-readable name used in diagnostics.
    pub fn display_name(&self) -> &str {
        match self {
            Token::Type(_, name) => name,
            Token::Trait(name) => name,
            Token::Name(name) => name,
            Token::Symbol(symbol) => symbol.description(),
        }
    }

    /// Short name of a type token: the path segment after the last `::`.
    pub fn short_name(&self) -> &str {
        let full = self.display_name();
        match self {
            Token::Type(..) | Token::Trait(..) => {
                let base = full.split('<').next().unwrap_or(full);
                base.rsplit("::").next().unwrap_or(base)
            }
            _ => full,
        }
    }
}

impl PartialEq for Token {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // TypeId comparison only; the name is diagnostics
            (Token::Type(a, _), Token::Type(b, _)) => a == b,
            (Token::Trait(a), Token::Trait(b)) => a == b,
            (Token::Name(a), Token::Name(b)) => a == b,
            (Token::Symbol(a), Token::Symbol(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Token {}

impl std::hash::Hash for Token {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Token::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Token::Trait(name) => {
                1u8.hash(state);
                name.hash(state);
            }
            Token::Name(name) => {
                2u8.hash(state);
                name.hash(state);
            }
            Token::Symbol(symbol) => {
                3u8.hash(state);
                symbol.id.hash(state);
            }
        }
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        fn rank(token: &Token) -> u8 {
            match token {
                Token::Type(..) => 0,
                Token::Trait(..) => 1,
                Token::Name(..) => 2,
                Token::Symbol(..) => 3,
            }
        }

        match (self, other) {
            (Token::Type(a, _), Token::Type(b, _)) => a.cmp(b),
            (Token::Trait(a), Token::Trait(b)) => a.cmp(b),
            (Token::Name(a), Token::Name(b)) => a.cmp(b),
            (Token::Symbol(a), Token::Symbol(b)) => a.id.cmp(&b.id),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Type(_, name) | Token::Trait(name) => f.write_str(name),
            Token::Name(name) => write!(f, "{:?}", &**name),
            Token::Symbol(symbol) => write!(f, "{}", symbol),
        }
    }
}

impl From<&'static str> for Token {
    fn from(name: &'static str) -> Self {
        Token::Name(Arc::from(name))
    }
}

impl From<String> for Token {
    fn from(name: String) -> Self {
        Token::Name(Arc::from(name))
    }
}

impl From<Symbol> for Token {
    fn from(symbol: Symbol) -> Self {
        Token::Symbol(symbol)
    }
}

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// Opaque token that is only equal to its own clones.
///
/// The description is for diagnostics; two symbols created with the same
/// description are still different tokens.
#[derive(Debug, Clone)]
pub struct Symbol {
    id: u64,
    description: Arc<str>,
}

impl Symbol {
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}
