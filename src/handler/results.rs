//! Result types for instance resolvers.

use crate::error::ErrorStatus;
use crate::oid::Oid;
use crate::value::Value;

/// Which operation the trie is resolving an instance for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Exact read of the given instance suffix.
    Get,
    /// Read of the first instance after the given suffix.
    ///
    /// An empty suffix asks for the first instance the resolver holds.
    GetNext,
    /// Write intent, with the submitted value.
    Set,
}

/// Outcome of one resolver call.
///
/// `suffix` is only consulted for [`RequestKind::GetNext`]: it names the
/// instance that `value` belongs to, relative to the registered OID. `None`
/// is read as the empty suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub status: ErrorStatus,
    pub value: Value,
    pub suffix: Option<Oid>,
}

impl Resolved {
    /// A successful read of `value`.
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            status: ErrorStatus::NoError,
            value: value.into(),
            suffix: None,
        }
    }

    /// A successful GETNEXT hit at instance `suffix`.
    pub fn next(suffix: impl Into<Oid>, value: impl Into<Value>) -> Self {
        Self {
            status: ErrorStatus::NoError,
            value: value.into(),
            suffix: Some(suffix.into()),
        }
    }

    /// The instance does not exist.
    pub fn no_such_instance() -> Self {
        Self {
            status: ErrorStatus::NoError,
            value: Value::NoSuchInstance,
            suffix: None,
        }
    }

    /// Nothing follows the requested suffix.
    pub fn end_of_view() -> Self {
        Self {
            status: ErrorStatus::NoError,
            value: Value::EndOfMibView,
            suffix: None,
        }
    }

    /// The operation failed with `status`.
    pub fn error(status: ErrorStatus) -> Self {
        Self {
            status,
            value: Value::Null,
            suffix: None,
        }
    }

    /// True if this carries a real value with no error.
    pub fn is_hit(&self) -> bool {
        !self.status.is_error() && !self.value.is_exception()
    }
}

impl From<SetResult> for Resolved {
    fn from(result: SetResult) -> Self {
        Self {
            status: result.to_error_status(),
            value: Value::Null,
            suffix: None,
        }
    }
}

/// Result of a write attempt.
///
/// Maps to SNMPv2c error statuses (RFC 3416).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetResult {
    /// Accepted.
    Ok,
    /// Access denied.
    NoAccess,
    /// The object exists but is read-only.
    NotWritable,
    /// Wrong ASN.1 type for this object.
    WrongType,
    /// Value has wrong length.
    WrongLength,
    /// Value is out of range or otherwise invalid.
    WrongValue,
    /// The row cannot be created.
    NoCreation,
    /// Conflicts with other managed objects.
    InconsistentValue,
    /// Required resources unavailable.
    ResourceUnavailable,
    /// The commit could not be applied.
    CommitFailed,
}

impl SetResult {
    /// Check if this result indicates success.
    pub fn is_ok(&self) -> bool {
        matches!(self, SetResult::Ok)
    }

    /// Convert to the PDU error status.
    pub fn to_error_status(&self) -> ErrorStatus {
        match self {
            SetResult::Ok => ErrorStatus::NoError,
            SetResult::NoAccess => ErrorStatus::NoAccess,
            SetResult::NotWritable => ErrorStatus::NotWritable,
            SetResult::WrongType => ErrorStatus::WrongType,
            SetResult::WrongLength => ErrorStatus::WrongLength,
            SetResult::WrongValue => ErrorStatus::WrongValue,
            SetResult::NoCreation => ErrorStatus::NoCreation,
            SetResult::InconsistentValue => ErrorStatus::InconsistentValue,
            SetResult::ResourceUnavailable => ErrorStatus::ResourceUnavailable,
            SetResult::CommitFailed => ErrorStatus::CommitFailed,
        }
    }
}
