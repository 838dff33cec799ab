//! Instance resolution for registered MIB objects.
//!
//! - [`InstanceResolver`] - Trait the trie calls for every instance node
//! - [`RequestKind`], [`Resolved`], [`SetResult`] - Resolver inputs and outputs
//! - [`ResolverTable`], [`ResolverHandle`] - Resolver storage the trie refers to
//! - [`OidTable`] - Sorted values that resolve GET, GETNEXT and SET by suffix
//! - [`RequestContext`] - Information about the incoming request
//!
//! # Overview
//!
//! Objects are registered in a [`Mib`](crate::mib::Mib) at an OID under
//! `1.3.6.1`. A request for `registered_oid + suffix` reaches the resolver
//! with just the suffix, so one resolver can serve a whole table column.
//!
//! ```rust
//! use smart_snmp::handler::{RequestKind, Resolved};
//! use smart_snmp::mib::Mib;
//! use smart_snmp::value::Value;
//! use smart_snmp::{Oid, oid};
//!
//! let mut mib = Mib::new();
//! mib.register(
//!     &oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
//!     |kind: RequestKind, suffix: &[u32], _: Option<&Value>| match kind {
//!         RequestKind::Get if suffix.is_empty() => Resolved::value("router"),
//!         RequestKind::GetNext if suffix.is_empty() => Resolved::next(Oid::empty(), "router"),
//!         _ => Resolved::no_such_instance(),
//!     },
//! )
//! .unwrap();
//! ```

mod context;
mod oid_table;
mod registry;
mod results;
mod traits;

pub use context::RequestContext;
pub use oid_table::OidTable;
pub use registry::{ResolverHandle, ResolverTable};
pub use results::{RequestKind, Resolved, SetResult};
pub use traits::InstanceResolver;
