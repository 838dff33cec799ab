//! Per-principal MIB views.
//!
//! A view is an OID subtree. Each community (v1/v2c) or user (v3) maps to a
//! list of read views and a list of write views. Requests from a principal
//! with no entry are answered with `noAccess`.
//!
//! # Example
//!
//! ```rust
//! use smart_snmp::agent::ViewTable;
//! use smart_snmp::oid;
//!
//! let views = ViewTable::new()
//!     // Read-only access to system and interfaces
//!     .community("public", [oid!(1, 3, 6, 1, 2, 1, 1), oid!(1, 3, 6, 1, 2, 1, 2)], [])
//!     // Full access
//!     .community("private", [oid!(1, 3, 6, 1)], [oid!(1, 3, 6, 1)])
//!     .user("admin", [oid!(1, 3, 6, 1)], [oid!(1, 3, 6, 1, 4, 1)]);
//! ```

use bytes::Bytes;
use subtle::ConstantTimeEq;

use crate::handler::RequestContext;
use crate::oid::{INTERNET, Oid};

/// Decides which views a request may use.
pub trait AccessPolicy: Send {
    /// The views for the principal behind `ctx`, or `None` to refuse it.
    fn lookup(&self, ctx: &RequestContext) -> Option<&AccessEntry>;
}

/// Read and write views of one principal.
///
/// Both lists are kept sorted with covered subtrees removed, so at most one
/// view contains any given OID.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessEntry {
    read: Vec<Oid>,
    write: Vec<Oid>,
}

impl AccessEntry {
    /// Create an entry from read and write views.
    pub fn new(
        read: impl IntoIterator<Item = Oid>,
        write: impl IntoIterator<Item = Oid>,
    ) -> Self {
        Self {
            read: normalize(read.into_iter().collect()),
            write: normalize(write.into_iter().collect()),
        }
    }

    /// Read views, in ascending order.
    pub fn read_views(&self) -> &[Oid] {
        &self.read
    }

    /// Write views, in ascending order.
    pub fn write_views(&self) -> &[Oid] {
        &self.write
    }

    /// The read view containing `oid`, if any.
    pub fn read_view_for(&self, oid: &Oid) -> Option<&Oid> {
        covering(&self.read, oid)
    }

    /// The write view containing `oid`, if any.
    pub fn write_view_for(&self, oid: &Oid) -> Option<&Oid> {
        covering(&self.write, oid)
    }
}

fn covering<'a>(views: &'a [Oid], oid: &Oid) -> Option<&'a Oid> {
    views.iter().find(|view| oid.starts_with(view))
}

/// Sort views and drop any view lying inside an earlier one.
fn normalize(mut views: Vec<Oid>) -> Vec<Oid> {
    views.sort();
    let mut kept: Vec<Oid> = Vec::with_capacity(views.len());
    for view in views {
        // After sorting, a covering view always precedes what it covers.
        if kept.last().is_some_and(|last| view.starts_with(last)) {
            continue;
        }
        kept.push(view);
    }
    kept
}

/// Everything under `1.3.6.1` is visible to every principal.
#[derive(Debug, Clone)]
pub struct OpenAccess {
    entry: AccessEntry,
}

impl OpenAccess {
    /// Read and write access to the whole tree.
    pub fn new() -> Self {
        let root = Oid::from_slice(&INTERNET);
        Self {
            entry: AccessEntry::new([root.clone()], [root]),
        }
    }

    /// Read access to the whole tree, no writes.
    pub fn read_only() -> Self {
        Self {
            entry: AccessEntry::new([Oid::from_slice(&INTERNET)], []),
        }
    }
}

impl Default for OpenAccess {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessPolicy for OpenAccess {
    fn lookup(&self, _ctx: &RequestContext) -> Option<&AccessEntry> {
        Some(&self.entry)
    }
}

/// Views keyed by community string and by user name.
#[derive(Debug, Clone, Default)]
pub struct ViewTable {
    communities: Vec<(Bytes, AccessEntry)>,
    users: Vec<(Bytes, AccessEntry)>,
}

impl ViewTable {
    /// Create an empty table, which refuses every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add views for a v1/v2c community.
    pub fn community(
        mut self,
        name: impl Into<Bytes>,
        read: impl IntoIterator<Item = Oid>,
        write: impl IntoIterator<Item = Oid>,
    ) -> Self {
        self.communities
            .push((name.into(), AccessEntry::new(read, write)));
        self
    }

    /// Add views for a v3 user.
    pub fn user(
        mut self,
        name: impl Into<Bytes>,
        read: impl IntoIterator<Item = Oid>,
        write: impl IntoIterator<Item = Oid>,
    ) -> Self {
        self.users.push((name.into(), AccessEntry::new(read, write)));
        self
    }

    /// True if no principal is configured.
    pub fn is_empty(&self) -> bool {
        self.communities.is_empty() && self.users.is_empty()
    }
}

impl AccessPolicy for ViewTable {
    fn lookup(&self, ctx: &RequestContext) -> Option<&AccessEntry> {
        let entries = if ctx.is_community() {
            &self.communities
        } else {
            &self.users
        };
        // Compare against every entry so timing does not reveal which matched.
        let candidate: &[u8] = &ctx.security_name;
        let mut found = None;
        for (name, entry) in entries {
            if bool::from(name.ct_eq(candidate)) && found.is_none() {
                found = Some(entry);
            }
        }
        found
    }
}
