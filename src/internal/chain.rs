//! Resolution chain used for circular dependency detection.
//!
//! The chain travels with each [`ResolverContext`](crate::ResolverContext)
//! instead of living in a thread-local, because an async resolution may hop
//! threads at every `.await`.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::token::Token;

const MAX_DEPTH: usize = 1024;

struct Link {
    token: Token,
    parent: Option<Arc<Link>>,
}

/// Immutable, shareable stack of the tokens currently being resolved.
#[derive(Clone, Default)]
pub(crate) struct ResolutionChain {
    head: Option<Arc<Link>>,
    depth: usize,
}

impl ResolutionChain {
    /// Pushes `token`, failing if it is already being resolved further up.
    pub(crate) fn enter(&self, token: &Token) -> DiResult<ResolutionChain> {
        if self.contains(token) {
            let mut path = self.path();
            path.push(token.clone());
            return Err(DiError::Circular(path));
        }
        if self.depth >= MAX_DEPTH {
            return Err(DiError::DepthExceeded(self.depth));
        }
        Ok(ResolutionChain {
            head: Some(Arc::new(Link {
                token: token.clone(),
                parent: self.head.clone(),
            })),
            depth: self.depth + 1,
        })
    }

    /// Token whose construction is in progress, if any.
    pub(crate) fn current(&self) -> Option<&Token> {
        self.head.as_deref().map(|link| &link.token)
    }

    fn contains(&self, token: &Token) -> bool {
        let mut link = self.head.as_deref();
        while let Some(current) = link {
            if &current.token == token {
                return true;
            }
            link = current.parent.as_deref();
        }
        false
    }

    /// Tokens from the outermost resolution to the innermost.
    pub(crate) fn path(&self) -> Vec<Token> {
        let mut path = Vec::with_capacity(self.depth);
        let mut link = self.head.as_deref();
        while let Some(current) = link {
            path.push(current.token.clone());
            link = current.parent.as_deref();
        }
        path.reverse();
        path
    }
}
