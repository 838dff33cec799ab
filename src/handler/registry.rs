//! Resolver storage referenced from the trie.

use crate::value::Value;

use super::results::{RequestKind, Resolved};
use super::traits::InstanceResolver;

/// Key of a resolver in a [`ResolverTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolverHandle(u32);

impl ResolverHandle {
    /// The raw slot index.
    pub fn index(self) -> u32 {
        self.0
    }
}

struct Slot {
    resolver: Box<dyn InstanceResolver>,
    refs: usize,
}

/// Reference-counted resolvers.
///
/// Every instance node in the trie holds one reference. When the last one
/// is released the resolver's [`release`](InstanceResolver::release) hook
/// runs and its slot is reused.
#[derive(Default)]
pub struct ResolverTable {
    slots: Vec<Option<Slot>>,
    free: Vec<u32>,
}

impl ResolverTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a resolver with no references yet.
    pub fn insert(&mut self, resolver: Box<dyn InstanceResolver>) -> ResolverHandle {
        let slot = Slot { resolver, refs: 0 };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx as usize] = Some(slot);
                ResolverHandle(idx)
            }
            None => {
                self.slots.push(Some(slot));
                ResolverHandle((self.slots.len() - 1) as u32)
            }
        }
    }

    /// Add a reference. Returns false for a stale handle.
    pub fn acquire(&mut self, handle: ResolverHandle) -> bool {
        match self.slot_mut(handle) {
            Some(slot) => {
                slot.refs += 1;
                true
            }
            None => false,
        }
    }

    /// Drop a reference, freeing the resolver once none remain.
    pub fn release(&mut self, handle: ResolverHandle) {
        let Some(slot) = self.slot_mut(handle) else {
            return;
        };
        slot.refs = slot.refs.saturating_sub(1);
        if slot.refs == 0 {
            self.discard(handle);
        }
    }

    /// Free an unreferenced resolver. Referenced resolvers are kept.
    pub fn remove_unused(&mut self, handle: ResolverHandle) -> bool {
        match self.slot_mut(handle) {
            Some(slot) if slot.refs == 0 => {
                self.discard(handle);
                true
            }
            _ => false,
        }
    }

    fn discard(&mut self, handle: ResolverHandle) {
        if let Some(mut slot) = self.slots[handle.0 as usize].take() {
            slot.resolver.release();
            self.free.push(handle.0);
        }
    }

    /// Number of references held on `handle`.
    pub fn refs(&self, handle: ResolverHandle) -> usize {
        self.slots
            .get(handle.0 as usize)
            .and_then(Option::as_ref)
            .map_or(0, |slot| slot.refs)
    }

    /// True if `handle` names a stored resolver.
    pub fn contains(&self, handle: ResolverHandle) -> bool {
        matches!(self.slots.get(handle.0 as usize), Some(Some(_)))
    }

    /// Number of live resolvers.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// True if no resolver is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call the resolver behind `handle`.
    ///
    /// A stale handle resolves to `noSuchObject`.
    pub fn resolve(
        &mut self,
        handle: ResolverHandle,
        kind: RequestKind,
        suffix: &[u32],
        value: Option<&Value>,
    ) -> Resolved {
        match self.slot_mut(handle) {
            Some(slot) => slot.resolver.resolve(kind, suffix, value),
            None => Resolved {
                value: Value::NoSuchObject,
                ..Resolved::value(Value::Null)
            },
        }
    }

    fn slot_mut(&mut self, handle: ResolverHandle) -> Option<&mut Slot> {
        self.slots.get_mut(handle.0 as usize).and_then(Option::as_mut)
    }
}

impl std::fmt::Debug for ResolverTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverTable")
            .field("live", &self.len())
            .finish()
    }
}
