//! Registered MIB objects.
//!
//! [`Mib`] pairs the OID trie with the resolvers its instance nodes refer
//! to. Every OID lives under `1.3.6.1`; registrations elsewhere are refused.

mod tree;

pub use tree::MibTree;

use crate::error::{Error, ErrorStatus, RegisterErrorKind, Result};
use crate::handler::{InstanceResolver, RequestKind, ResolverHandle, ResolverTable};
use crate::oid::{INTERNET, Oid};
use crate::value::Value;
use crate::varbind::VarBind;

/// Outcome of a trie search.
///
/// `oid` is the instance found (GETNEXT) or the OID asked for (GET/SET).
/// Misses are reported in-band through exception values.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub oid: Oid,
    pub status: ErrorStatus,
    pub value: Value,
}

impl SearchResult {
    pub(crate) fn exception(oid: Oid, value: Value) -> Self {
        Self {
            oid,
            status: ErrorStatus::NoError,
            value,
        }
    }

    /// True for a value that is neither an exception nor an error.
    pub fn is_hit(&self) -> bool {
        !self.status.is_error() && !self.value.is_exception()
    }

    /// True if the walk ran off the end of its scope.
    pub fn is_end_of_view(&self) -> bool {
        matches!(self.value, Value::EndOfMibView)
    }

    /// Convert to a variable binding.
    pub fn into_varbind(self) -> VarBind {
        VarBind::new(self.oid, self.value)
    }
}

/// The trie together with its resolvers.
#[derive(Debug)]
pub struct Mib {
    tree: MibTree,
    resolvers: ResolverTable,
    root: Oid,
}

impl Default for Mib {
    fn default() -> Self {
        Self::new()
    }
}

impl Mib {
    /// Create an empty MIB.
    pub fn new() -> Self {
        Self {
            tree: MibTree::new(),
            resolvers: ResolverTable::new(),
            root: Oid::from_slice(&INTERNET),
        }
    }

    /// The `1.3.6.1` root every search is scoped to by default.
    pub fn root(&self) -> &Oid {
        &self.root
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Store a resolver for sharing across several registrations.
    ///
    /// The resolver is dropped when the last registration using it goes
    /// away; one that is never registered stays until
    /// [`discard_resolver`](Self::discard_resolver).
    pub fn add_resolver(&mut self, resolver: impl InstanceResolver + 'static) -> ResolverHandle {
        self.resolvers.insert(Box::new(resolver))
    }

    /// Drop a resolver that no registration refers to.
    pub fn discard_resolver(&mut self, handle: ResolverHandle) -> bool {
        self.resolvers.remove_unused(handle)
    }

    /// Register `resolver` at `oid`.
    pub fn register(
        &mut self,
        oid: &Oid,
        resolver: impl InstanceResolver + 'static,
    ) -> Result<ResolverHandle> {
        let handle = self.resolvers.insert(Box::new(resolver));
        match self.register_handle(oid, handle) {
            Ok(()) => Ok(handle),
            Err(e) => {
                self.resolvers.remove_unused(handle);
                Err(e)
            }
        }
    }

    /// Register an already stored resolver at `oid`.
    ///
    /// Fails with [`RegisterErrorKind::UnknownResolver`] if `handle` was
    /// discarded or released.
    pub fn register_handle(&mut self, oid: &Oid, handle: ResolverHandle) -> Result<()> {
        if !self.resolvers.contains(handle) {
            tracing::warn!(target: "smart_snmp::mib", %oid, handle = handle.index(), "registration with unknown resolver");
            return Err(Error::Registration {
                oid: oid.clone(),
                kind: RegisterErrorKind::UnknownResolver,
            });
        }
        if let Err(e) = self.tree.register(oid, handle) {
            tracing::warn!(target: "smart_snmp::mib", %oid, error = %e, "registration refused");
            return Err(e);
        }
        self.resolvers.acquire(handle);
        tracing::debug!(target: "smart_snmp::mib", %oid, handle = handle.index(), "registered");
        Ok(())
    }

    /// Remove `oid` and everything below it.
    ///
    /// Returns false if nothing was registered there.
    pub fn unregister(&mut self, oid: &Oid) -> bool {
        let Some(handles) = self.tree.unregister(oid) else {
            return false;
        };
        tracing::debug!(target: "smart_snmp::mib", %oid, instances = handles.len(), "unregistered");
        for handle in handles {
            self.resolvers.release(handle);
        }
        true
    }

    /// Exact lookup under the root.
    pub fn search_exact(
        &mut self,
        oid: &Oid,
        kind: RequestKind,
        value: Option<&Value>,
    ) -> SearchResult {
        self.tree
            .search_exact(&mut self.resolvers, &self.root, oid, kind, value)
    }

    /// Exact lookup restricted to `scope`.
    pub fn search_exact_in(
        &mut self,
        scope: &Oid,
        oid: &Oid,
        kind: RequestKind,
        value: Option<&Value>,
    ) -> SearchResult {
        self.tree
            .search_exact(&mut self.resolvers, scope, oid, kind, value)
    }

    /// Next instance after `oid` under the root.
    pub fn search_next(&mut self, oid: &Oid) -> SearchResult {
        self.tree.search_next(&mut self.resolvers, &self.root, oid)
    }

    /// Next instance after `oid` restricted to `scope`.
    pub fn search_next_in(&mut self, scope: &Oid, oid: &Oid) -> SearchResult {
        self.tree.search_next(&mut self.resolvers, scope, oid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{OidTable, Resolved};
    use crate::oid;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Tracked(Arc<AtomicUsize>);

    impl InstanceResolver for Tracked {
        fn resolve(&mut self, _: RequestKind, _: &[u32], _: Option<&Value>) -> Resolved {
            Resolved::value(1)
        }

        fn release(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_table_column_walk() {
        let mut column = OidTable::new();
        column.insert(oid!(1), Value::from("eth0"));
        column.insert(oid!(2), Value::from("eth1"));

        let mut mib = Mib::new();
        let base = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2);
        mib.register(&base, column).unwrap();

        let first = mib.search_next(&oid!(1, 3, 6, 1, 2, 1, 2));
        assert_eq!(first.oid, base.child(1));
        assert_eq!(first.value, Value::from("eth0"));
        let second = mib.search_next(&first.oid);
        assert_eq!(second.oid, base.child(2));
        assert!(mib.search_next(&second.oid).is_end_of_view());

        let get = mib.search_exact(&base.child(2), RequestKind::Get, None);
        assert_eq!(get.value, Value::from("eth1"));
    }

    #[test]
    fn test_shared_resolver_released_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut mib = Mib::new();
        let handle = mib.add_resolver(Tracked(released.clone()));
        mib.register_handle(&oid!(1, 3, 6, 1, 4, 1, 1, 1), handle)
            .unwrap();
        mib.register_handle(&oid!(1, 3, 6, 1, 4, 1, 1, 2), handle)
            .unwrap();

        assert!(mib.unregister(&oid!(1, 3, 6, 1, 4, 1, 1, 1)));
        assert_eq!(released.load(Ordering::SeqCst), 0);
        assert!(mib.unregister(&oid!(1, 3, 6, 1, 4, 1, 1)));
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(mib.is_empty());
    }

    #[test]
    fn test_register_discarded_handle_refused() {
        let mut mib = Mib::new();
        let stale = mib.add_resolver(OidTable::<Value>::new());
        assert!(mib.discard_resolver(stale));

        let err = mib
            .register_handle(&oid!(1, 3, 6, 1, 4, 1, 1), stale)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Registration {
                kind: RegisterErrorKind::UnknownResolver,
                ..
            }
        ));
        assert!(mib.is_empty());

        // The reused slot serves only the registration made with it.
        let mut table = OidTable::new();
        table.insert(oid!(0), Value::from("unrelated"));
        let fresh = mib.add_resolver(table);
        assert_eq!(fresh, stale);
        mib.register_handle(&oid!(1, 3, 6, 1, 4, 1, 2), fresh)
            .unwrap();
        let get = mib.search_exact(&oid!(1, 3, 6, 1, 4, 1, 1, 0), RequestKind::Get, None);
        assert_eq!(get.value, Value::NoSuchObject);
    }

    #[test]
    fn test_released_handle_refused() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut mib = Mib::new();
        let handle = mib
            .register(&oid!(1, 3, 6, 1, 4, 1, 1), Tracked(released.clone()))
            .unwrap();
        assert!(mib.unregister(&oid!(1, 3, 6, 1, 4, 1, 1)));
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(
            mib.register_handle(&oid!(1, 3, 6, 1, 4, 1, 2), handle)
                .is_err()
        );
        assert!(mib.is_empty());
    }

    #[test]
    fn test_failed_register_drops_resolver() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut mib = Mib::new();
        mib.register(&oid!(1, 3, 6, 1, 4, 1, 1), Tracked(released.clone()))
            .unwrap();
        assert!(
            mib.register(&oid!(1, 3, 6, 1, 4, 1, 1), Tracked(released.clone()))
                .is_err()
        );
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(mib.len(), 1);
    }
}
