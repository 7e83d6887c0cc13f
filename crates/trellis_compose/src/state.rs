//! Shared state slots and capability records.
//!
//! Two kinds of values travel from a fragment to the requests that resolve
//! through it:
//!
//! - **Shared state** ([`StateSlot`]) — a named, mutable value shared *by
//!   reference* with every route and handler below the declaring node. The
//!   engine provides no implicit locking beyond the slot's `RwLock` and no
//!   transactional isolation: concurrent mutation discipline is the
//!   responsibility of the code using the slot. This is an explicit,
//!   unenforced contract.
//! - **Capabilities** ([`CapabilityRecord`]) — named, immutable values
//!   exposed to descendants as typed context fields. Capability names are
//!   resolved into arena indices at assembly time, so request-time lookup is
//!   a table hit plus a downcast.
//!
//! # Example
//!
//! ```
//! use trellis_compose::state::StateSlot;
//!
//! let slot = StateSlot::new("counter", 0u64);
//! *slot.write::<u64>().unwrap() += 1;
//! assert_eq!(*slot.read::<u64>().unwrap(), 1);
//! ```

use core::any::Any;
use std::sync::Arc;

use downcast_rs::{DowncastSync, impl_downcast};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::assembly::NodeId;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised when accessing a shared state slot.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// No slot with the requested name is visible.
    #[error("shared state not found: {0}")]
    NotFound(String),

    /// The slot holds a value of a different type than requested.
    #[error("shared state '{name}' holds {stored}, not {requested}")]
    TypeMismatch {
        /// Slot name.
        name: String,
        /// Type name of the stored value.
        stored: &'static str,
        /// Type name the caller asked for.
        requested: &'static str,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// StateSlot
// ─────────────────────────────────────────────────────────────────────────────

/// A single named shared-state value.
///
/// Cloning a slot clones the reference, not the value: all clones observe
/// the same underlying data. Slots are handed by reference to every
/// concurrent request that resolves the declaring node.
#[derive(Clone)]
pub struct StateSlot {
    name: Arc<str>,
    type_name: &'static str,
    data: Arc<RwLock<Box<dyn Any + Send + Sync>>>,
}

impl StateSlot {
    /// Creates a slot holding the given value.
    pub fn new<T: Any + Send + Sync>(name: impl Into<Arc<str>>, value: T) -> Self {
        Self {
            name: name.into(),
            type_name: core::any::type_name::<T>(),
            data: Arc::new(RwLock::new(Box::new(value))),
        }
    }

    /// The slot's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name of the stored value, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Acquires a read guard on the value.
    ///
    /// Blocks while a writer holds the slot; concurrent readers coexist.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::TypeMismatch`] if `T` is not the stored type.
    pub fn read<T: Any + Send + Sync>(&self) -> Result<StateRef<'_, T>, StateError> {
        let guard = self.data.read();
        if !guard.is::<T>() {
            return Err(StateError::TypeMismatch {
                name: self.name.to_string(),
                stored: self.type_name,
                requested: core::any::type_name::<T>(),
            });
        }
        Ok(StateRef {
            guard,
            _marker: core::marker::PhantomData,
        })
    }

    /// Acquires a write guard on the value.
    ///
    /// Blocks while any other guard is held.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::TypeMismatch`] if `T` is not the stored type.
    pub fn write<T: Any + Send + Sync>(&self) -> Result<StateRefMut<'_, T>, StateError> {
        let guard = self.data.write();
        if !guard.is::<T>() {
            return Err(StateError::TypeMismatch {
                name: self.name.to_string(),
                stored: self.type_name,
                requested: core::any::type_name::<T>(),
            });
        }
        Ok(StateRefMut {
            guard,
            _marker: core::marker::PhantomData,
        })
    }
}

impl core::fmt::Debug for StateSlot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StateSlot")
            .field("name", &self.name)
            .field("type", &self.type_name)
            .finish()
    }
}

/// RAII guard for read access to a [`StateSlot`].
pub struct StateRef<'a, T> {
    guard: RwLockReadGuard<'a, Box<dyn Any + Send + Sync>>,
    _marker: core::marker::PhantomData<&'a T>,
}

impl<T: Any> core::ops::Deref for StateRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // The type was checked when the guard was created.
        self.guard
            .downcast_ref::<T>()
            .expect("state slot type mismatch (this is a bug)")
    }
}

/// RAII guard for write access to a [`StateSlot`].
pub struct StateRefMut<'a, T> {
    guard: RwLockWriteGuard<'a, Box<dyn Any + Send + Sync>>,
    _marker: core::marker::PhantomData<&'a mut T>,
}

impl<T: Any> core::ops::Deref for StateRefMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // The type was checked when the guard was created.
        self.guard
            .downcast_ref::<T>()
            .expect("state slot type mismatch (this is a bug)")
    }
}

impl<T: Any> core::ops::DerefMut for StateRefMut<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // The type was checked when the guard was created.
        self.guard
            .downcast_mut::<T>()
            .expect("state slot type mismatch (this is a bug)")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Capabilities
// ─────────────────────────────────────────────────────────────────────────────

/// A value that can be exposed as a capability or context field.
///
/// Any `Send + Sync + 'static` type qualifies via the blanket impl.
pub trait CapabilityValue: DowncastSync {}
impl_downcast!(sync CapabilityValue);

impl<T: Any + Send + Sync> CapabilityValue for T {}

/// Index of a capability record in the assembly-wide arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilityId(pub(crate) usize);

impl CapabilityId {
    /// Returns the underlying arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// An exposed capability: name, providing node, value.
pub struct CapabilityRecord {
    pub(crate) name: Arc<str>,
    pub(crate) provider: NodeId,
    pub(crate) value: Arc<dyn CapabilityValue>,
}

impl CapabilityRecord {
    /// The capability's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node that exposed this capability.
    #[must_use]
    pub fn provider(&self) -> NodeId {
        self.provider
    }

    /// Downcasts the value to a concrete type.
    #[must_use]
    pub fn value<T: CapabilityValue>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl core::fmt::Debug for CapabilityRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CapabilityRecord")
            .field("name", &self.name)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}
