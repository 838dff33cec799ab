//! Sorted OID storage with GETNEXT lookup.

use crate::error::ErrorStatus;
use crate::oid::Oid;
use crate::value::Value;

use super::results::{RequestKind, Resolved, SetResult};
use super::traits::InstanceResolver;

/// OID-keyed values kept in lexicographic order.
///
/// An `OidTable<Value>` is itself an [`InstanceResolver`]: register it at a
/// table column or scalar and key its entries by instance suffix. GET and
/// GETNEXT read from it, while SET replaces existing entries only, so the
/// key set stays fixed once registered.
///
/// # Example
///
/// ```rust
/// use smart_snmp::handler::OidTable;
/// use smart_snmp::mib::Mib;
/// use smart_snmp::{Value, oid};
///
/// let mut column = OidTable::new();
/// column.insert(oid!(1), Value::from("eth0"));
/// column.insert(oid!(2), Value::from("eth1"));
///
/// let mut mib = Mib::new();
/// // ifDescr
/// mib.register(&oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2), column).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct OidTable<V> {
    entries: Vec<(Oid, V)>,
}

impl<V> OidTable<V> {
    /// Create a new empty OID table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create an OID table with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert an OID-value pair, maintaining sorted order.
    ///
    /// If the OID already exists, its value is replaced.
    pub fn insert(&mut self, oid: Oid, value: V) {
        match self.search(oid.arcs()) {
            Ok(idx) => self.entries[idx].1 = value,
            Err(idx) => self.entries.insert(idx, (oid, value)),
        }
    }

    /// Remove an OID from the table.
    ///
    /// Returns the removed value if the OID was present.
    pub fn remove(&mut self, oid: &Oid) -> Option<V> {
        match self.search(oid.arcs()) {
            Ok(idx) => Some(self.entries.remove(idx).1),
            Err(_) => None,
        }
    }

    /// Get the value for an exact OID match.
    pub fn get(&self, oid: &Oid) -> Option<&V> {
        self.get_arcs(oid.arcs())
    }

    /// Get the value stored under `arcs`.
    pub fn get_arcs(&self, arcs: &[u32]) -> Option<&V> {
        match self.search(arcs) {
            Ok(idx) => Some(&self.entries[idx].1),
            Err(_) => None,
        }
    }

    /// Mutable access to the value stored under `arcs`.
    pub fn get_arcs_mut(&mut self, arcs: &[u32]) -> Option<&mut V> {
        match self.search(arcs) {
            Ok(idx) => Some(&mut self.entries[idx].1),
            Err(_) => None,
        }
    }

    /// Get the lexicographically next OID and value after the given OID.
    ///
    /// Returns `None` if there are no OIDs greater than the given one.
    pub fn get_next(&self, oid: &Oid) -> Option<(&Oid, &V)> {
        self.get_next_arcs(oid.arcs())
    }

    /// [`get_next`](Self::get_next) over a raw arc slice.
    pub fn get_next_arcs(&self, arcs: &[u32]) -> Option<(&Oid, &V)> {
        match self.search(arcs) {
            Ok(idx) => {
                // Exact match, return the next one
                self.entries.get(idx + 1).map(|(o, v)| (o, v))
            }
            Err(idx) => {
                // No exact match, return the entry at insertion point
                self.entries.get(idx).map(|(o, v)| (o, v))
            }
        }
    }

    /// The smallest entry.
    pub fn first(&self) -> Option<(&Oid, &V)> {
        self.entries.first().map(|(o, v)| (o, v))
    }

    fn search(&self, arcs: &[u32]) -> Result<usize, usize> {
        self.entries.binary_search_by(|(o, _)| o.arcs().cmp(arcs))
    }

    /// Get the number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries from the table.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over all OID-value pairs in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = (&Oid, &V)> {
        self.entries.iter().map(|(o, v)| (o, v))
    }
}

impl<V> Default for OidTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceResolver for OidTable<Value> {
    fn resolve(&mut self, kind: RequestKind, suffix: &[u32], value: Option<&Value>) -> Resolved {
        match kind {
            RequestKind::Get => self
                .get_arcs(suffix)
                .map(|v| Resolved::value(v.clone()))
                .unwrap_or_else(Resolved::no_such_instance),
            RequestKind::GetNext => {
                let next = if suffix.is_empty() {
                    self.first()
                } else {
                    self.get_next_arcs(suffix)
                };
                next.map(|(o, v)| Resolved::next(o.clone(), v.clone()))
                    .unwrap_or_else(Resolved::end_of_view)
            }
            RequestKind::Set => {
                let Some(new) = value else {
                    return Resolved::error(ErrorStatus::GenErr);
                };
                match self.get_arcs_mut(suffix) {
                    Some(slot) if slot.tag() != new.tag() => SetResult::WrongType.into(),
                    Some(slot) => {
                        *slot = new.clone();
                        Resolved::value(new.clone())
                    }
                    None => SetResult::NoCreation.into(),
                }
            }
        }
    }
}
