//! Ordered service registry and its frozen, slot-indexed form.

use ahash::AHashMap;

use crate::descriptors::ServiceDescriptor;
use crate::lifetime::Lifetime;
use crate::token::Token;

/// Ordered, append-only list of service descriptors.
///
/// Registration order is preserved. When several descriptors share a token
/// the **last** one wins, so a later registration overrides an earlier one
/// without removing it. Lookups are linear; the registry is built once at
/// startup and frozen into an indexed form by [`ServiceCollection::build`].
///
/// [`ServiceCollection::build`]: crate::ServiceCollection::build
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    descriptors: Vec<ServiceDescriptor>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a descriptor.
    pub fn register(&mut self, descriptor: ServiceDescriptor) {
        self.descriptors.push(descriptor);
    }

    /// The last descriptor registered for `token`.
    pub fn find_descriptor(&self, token: &Token) -> Option<&ServiceDescriptor> {
        self.descriptors.iter().rev().find(|d| d.token() == token)
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.descriptors.iter().any(|d| d.token() == token)
    }

    /// Removes every descriptor for `token`, returning how many were removed.
    pub fn remove(&mut self, token: &Token) -> usize {
        let before = self.descriptors.len();
        self.descriptors.retain(|d| d.token() != token);
        before - self.descriptors.len()
    }

    /// Removes all descriptors for the token and registers the new one.
    pub fn replace(&mut self, descriptor: ServiceDescriptor) -> usize {
        let removed = self.remove(descriptor.token());
        self.register(descriptor);
        removed
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.descriptors.iter()
    }

    /// Freezes the registry: assigns cache slots and indexes the winning descriptor per token.
    pub(crate) fn freeze(self) -> FrozenRegistry {
        let mut entries = Vec::with_capacity(self.descriptors.len());
        let mut index = AHashMap::with_capacity(self.descriptors.len());
        let mut singleton_count = 0;
        let mut scoped_count = 0;

        for (position, descriptor) in self.descriptors.into_iter().enumerate() {
            let slot = match descriptor.lifetime() {
                Lifetime::Singleton => {
                    singleton_count += 1;
                    Slot::Singleton(singleton_count - 1)
                }
                Lifetime::Scoped => {
                    scoped_count += 1;
                    Slot::Scoped(scoped_count - 1)
                }
                Lifetime::Transient => Slot::None,
            };
            // Later registrations overwrite the index entry: last wins
            index.insert(descriptor.token().clone(), position);
            entries.push(Registered { descriptor, slot });
        }

        FrozenRegistry {
            entries,
            index,
            singleton_count,
            scoped_count,
        }
    }
}

impl FromIterator<ServiceDescriptor> for ServiceRegistry {
    fn from_iter<I: IntoIterator<Item = ServiceDescriptor>>(iter: I) -> Self {
        Self {
            descriptors: iter.into_iter().collect(),
        }
    }
}

/// Cache slot assigned to a registration at freeze time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Singleton(usize),
    Scoped(usize),
    None,
}

pub(crate) struct Registered {
    pub(crate) descriptor: ServiceDescriptor,
    pub(crate) slot: Slot,
}

/// Read-only registry shared by the root provider and every scope.
pub(crate) struct FrozenRegistry {
    entries: Vec<Registered>,
    index: AHashMap<Token, usize>,
    pub(crate) singleton_count: usize,
    pub(crate) scoped_count: usize,
}

impl FrozenRegistry {
    #[inline]
    pub(crate) fn get(&self, token: &Token) -> Option<&Registered> {
        self.index.get(token).map(|&position| &self.entries[position])
    }

    /// Descriptors that win their token lookup, in registration order.
    pub(crate) fn effective(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(position, reg)| self.index.get(reg.descriptor.token()) == Some(position))
            .map(|(_, reg)| &reg.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_registration_overrides_earlier() {
        let mut registry = ServiceRegistry::new();
        registry.register(ServiceDescriptor::instance(Token::name("greeting"), "hello"));
        registry.register(ServiceDescriptor::instance(Token::name("greeting"), "hi"));

        let found = registry.find_descriptor(&Token::name("greeting")).unwrap();
        assert_eq!(found.impl_name(), Some("&str"));
        assert_eq!(registry.len(), 2);

        let frozen = registry.freeze();
        let reg = frozen.get(&Token::name("greeting")).unwrap();
        assert_eq!(reg.slot, Slot::Singleton(1));
        assert_eq!(frozen.effective().count(), 1);
    }

    #[test]
    fn remove_and_replace() {
        let mut registry = ServiceRegistry::new();
        registry.register(ServiceDescriptor::instance(Token::name("a"), 1u8));
        registry.register(ServiceDescriptor::instance(Token::name("a"), 2u8));
        registry.register(ServiceDescriptor::instance(Token::name("b"), 3u8));

        assert_eq!(registry.remove(&Token::name("a")), 2);
        assert!(!registry.contains(&Token::name("a")));
        assert_eq!(registry.replace(ServiceDescriptor::instance(Token::name("b"), 4u8)), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn freeze_assigns_slots_per_lifetime() {
        let mut registry = ServiceRegistry::new();
        registry.register(ServiceDescriptor::factory(Token::name("s1"), Lifetime::Scoped, |_| async { Ok(1u8) }));
        registry.register(ServiceDescriptor::factory(Token::name("t"), Lifetime::Transient, |_| async { Ok(1u8) }));
        registry.register(ServiceDescriptor::factory(Token::name("s2"), Lifetime::Scoped, |_| async { Ok(1u8) }));
        let frozen = registry.freeze();
        assert_eq!(frozen.scoped_count, 2);
        assert_eq!(frozen.singleton_count, 0);
        assert_eq!(frozen.get(&Token::name("s2")).unwrap().slot, Slot::Scoped(1));
        assert_eq!(frozen.get(&Token::name("t")).unwrap().slot, Slot::None);
    }
}
