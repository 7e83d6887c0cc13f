//! Deduplication registry: at-most-once registration for named fragments.
//!
//! The registry is global to one assembled tree. It maps each distinct
//! [`DedupKey`] to the node the fragment was first registered on, so a later
//! mount of the same identity can alias the first instantiation's exports
//! instead of re-running registration side effects.

use hashbrown::HashMap;

use crate::assembly::NodeId;
use crate::fragment::{FragmentIdentity, Seed};

/// Identity key for deduplication: name plus optional seed.
///
/// Anonymous fragments never reach the registry; every mount of an anonymous
/// fragment registers. Two keys sharing a name but differing in seed are
/// distinct by design — the seed is part of identity, and a seedless key
/// never matches a seeded one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    name: String,
    seed: Option<Seed>,
}

impl From<FragmentIdentity> for DedupKey {
    fn from(identity: FragmentIdentity) -> Self {
        Self {
            name: identity.name,
            seed: identity.seed,
        }
    }
}

impl DedupKey {
    /// The identity name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The seed component, if any.
    #[must_use]
    pub fn seed(&self) -> Option<Seed> {
        self.seed
    }
}

/// Tracks which fragment identities have already registered in this tree.
#[derive(Debug, Default)]
pub struct DeduplicationRegistry {
    entries: HashMap<DedupKey, NodeId>,
    seed_types: HashMap<String, &'static str>,
}

impl DeduplicationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node a key was first registered on, if any.
    ///
    /// A hit means the current mount must skip registration and alias the
    /// returned node's exports.
    #[must_use]
    pub fn existing(&self, key: &DedupKey) -> Option<NodeId> {
        self.entries.get(key).copied()
    }

    /// Records a completed registration.
    pub fn record(&mut self, key: DedupKey, node: NodeId) {
        if let Some(seed) = key.seed {
            self.seed_types.insert(key.name.clone(), seed.type_name());
        }
        self.entries.insert(key, node);
    }

    /// Checks a key's seed type against earlier mounts of the same name.
    ///
    /// # Errors
    ///
    /// Returns `(first, second)` type names when the name was previously
    /// seeded with a value of a different type.
    pub fn check_seed_type(&self, key: &DedupKey) -> Result<(), (&'static str, &'static str)> {
        let Some(seed) = key.seed else {
            return Ok(());
        };
        match self.seed_types.get(&key.name) {
            Some(&first) if first != seed.type_name() => Err((first, seed.type_name())),
            _ => Ok(()),
        }
    }

    /// Number of distinct identities registered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
