//! SET processing.

use crate::error::ErrorStatus;
use crate::handler::RequestKind;
use crate::mib::Mib;
use crate::pdu::Pdu;

use super::{AccessEntry, FirstError};

/// Handle a SET request.
///
/// Every binding is offered to its resolver in order. A binding outside the
/// principal's write views is `noAccess`; a binding whose resolver answers
/// with an exception value (no such object, no such instance) is
/// `notWritable`. The first failing binding sets the error status and index.
/// The response echoes the submitted bindings unchanged.
pub(super) fn set(mib: &mut Mib, views: &AccessEntry, request: &Pdu) -> Pdu {
    let mut first = FirstError::default();

    for (index, vb) in request.varbinds.iter().enumerate() {
        let status = match views.write_view_for(&vb.oid) {
            None => ErrorStatus::NoAccess,
            Some(view) => {
                let result = mib.search_exact_in(view, &vb.oid, RequestKind::Set, Some(&vb.value));
                if result.status.is_error() {
                    result.status
                } else if result.value.is_exception() {
                    ErrorStatus::NotWritable
                } else {
                    ErrorStatus::NoError
                }
            }
        };
        if status.is_error() {
            tracing::debug!(target: "smart_snmp::agent", { snmp.request_id = request.request_id, snmp.oid = %vb.oid, %status }, "set rejected");
        }
        first.record(status, index + 1);
    }

    first.into_response(request.request_id, request.varbinds.clone())
}
