//! Resolver trait.

use crate::value::Value;

use super::results::{RequestKind, Resolved};

/// Resolves instances below a registered OID.
///
/// The trie stores a handle to a resolver at each instance node and calls it
/// with the part of the requested OID that lies below the registered OID.
/// For a scalar registered at `sysDescr.0` that suffix is empty; for a table
/// column it is the row index.
///
/// Resolvers run synchronously on the request path and must not block.
///
/// # GETNEXT
///
/// For [`RequestKind::GetNext`] the resolver returns the first instance whose
/// suffix sorts after the one given (any instance at all for an empty suffix)
/// and reports that instance in [`Resolved::suffix`]. When nothing follows,
/// return [`Resolved::end_of_view`] and the trie moves on to the next
/// registration.
///
/// # SET
///
/// For [`RequestKind::Set`] the submitted value is passed in `value`. A
/// resolver that does not support writes returns
/// [`SetResult::NotWritable`](super::SetResult::NotWritable), or simply an
/// exception value, which the agent reports as `notWritable`.
///
/// # Example
///
/// ```rust
/// use smart_snmp::handler::{InstanceResolver, RequestKind, Resolved, SetResult};
/// use smart_snmp::oid::Oid;
/// use smart_snmp::value::Value;
///
/// struct Uptime(u32);
///
/// impl InstanceResolver for Uptime {
///     fn resolve(&mut self, kind: RequestKind, suffix: &[u32], _value: Option<&Value>) -> Resolved {
///         match kind {
///             RequestKind::Get if suffix.is_empty() => Resolved::value(Value::TimeTicks(self.0)),
///             RequestKind::GetNext if suffix.is_empty() => {
///                 Resolved::next(Oid::empty(), Value::TimeTicks(self.0))
///             }
///             RequestKind::Set => SetResult::NotWritable.into(),
///             RequestKind::Get => Resolved::no_such_instance(),
///             RequestKind::GetNext => Resolved::end_of_view(),
///         }
///     }
/// }
/// ```
pub trait InstanceResolver: Send {
    /// Resolve one instance.
    fn resolve(&mut self, kind: RequestKind, suffix: &[u32], value: Option<&Value>) -> Resolved;

    /// Called once the last registration referring to this resolver is gone.
    fn release(&mut self) {}
}

impl<F> InstanceResolver for F
where
    F: FnMut(RequestKind, &[u32], Option<&Value>) -> Resolved + Send,
{
    fn resolve(&mut self, kind: RequestKind, suffix: &[u32], value: Option<&Value>) -> Resolved {
        self(kind, suffix, value)
    }
}
