//! GET, GETNEXT and GETBULK processing.

use crate::error::ErrorStatus;
use crate::handler::RequestKind;
use crate::message::Message;
use crate::mib::{Mib, SearchResult};
use crate::oid::Oid;
use crate::pdu::Pdu;
use crate::value::Value;
use crate::varbind::VarBind;

use super::{AccessEntry, FirstError};

/// Exact lookup through the read views.
///
/// Views are walked in order; the walk stops at the first view that holds
/// the OID, or once the OID sorts before the view. An OID outside every
/// view is `noSuchObject`.
pub(super) fn get_one(mib: &mut Mib, views: &AccessEntry, oid: &Oid) -> SearchResult {
    for view in views.read_views() {
        if oid < view {
            break;
        }
        if oid.starts_with(view) {
            return mib.search_exact_in(view, oid, RequestKind::Get, None);
        }
    }
    SearchResult {
        oid: oid.clone(),
        status: ErrorStatus::NoError,
        value: Value::NoSuchObject,
    }
}

/// First instance after `oid` in any read view.
///
/// When every view is exhausted the queried OID comes back with
/// `endOfMibView`.
pub(super) fn get_next_one(mib: &mut Mib, views: &AccessEntry, oid: &Oid) -> SearchResult {
    for view in views.read_views() {
        let result = mib.search_next_in(view, oid);
        if !result.is_end_of_view() {
            return result;
        }
    }
    SearchResult {
        oid: oid.clone(),
        status: ErrorStatus::NoError,
        value: Value::EndOfMibView,
    }
}

pub(super) fn get(mib: &mut Mib, views: &AccessEntry, request: &Pdu) -> Pdu {
    let mut first = FirstError::default();
    let mut varbinds = Vec::with_capacity(request.varbinds.len());
    for (index, vb) in request.varbinds.iter().enumerate() {
        let result = get_one(mib, views, &vb.oid);
        first.record(result.status, index + 1);
        varbinds.push(result.into_varbind());
    }
    first.into_response(request.request_id, varbinds)
}

pub(super) fn get_next(mib: &mut Mib, views: &AccessEntry, request: &Pdu) -> Pdu {
    let mut first = FirstError::default();
    let mut varbinds = Vec::with_capacity(request.varbinds.len());
    for (index, vb) in request.varbinds.iter().enumerate() {
        let result = get_next_one(mib, views, &vb.oid);
        first.record(result.status, index + 1);
        varbinds.push(result.into_varbind());
    }
    first.into_response(request.request_id, varbinds)
}

/// GETBULK (RFC 3416 Section 4.2.3).
///
/// The first `non_repeaters` bindings get one GETNEXT each. The remaining
/// bindings are walked `max_repetitions` times, repetition-major, each step
/// continuing from the previous result. The walk ends early once a whole
/// repetition is `endOfMibView`, or when the next binding would push the
/// response in `frame` past `max_size`.
pub(super) fn get_bulk(
    mib: &mut Mib,
    views: &AccessEntry,
    request: &Pdu,
    frame: &Message,
    max_size: usize,
) -> Pdu {
    let non_repeaters = request.non_repeaters().min(request.varbinds.len());
    let max_repetitions = request.max_repetitions();
    let (fixed, repeated) = request.varbinds.split_at(non_repeaters);

    let mut out = BulkBuffer::new(frame, max_size);
    let mut first = FirstError::default();

    for vb in fixed {
        let result = get_next_one(mib, views, &vb.oid);
        first.record(result.status, out.len() + 1);
        if !out.push(result.into_varbind()) {
            return out.finish(request, first);
        }
    }

    let mut cursors: Vec<Oid> = repeated.iter().map(|vb| vb.oid.clone()).collect();
    for _ in 0..max_repetitions {
        if cursors.is_empty() {
            break;
        }
        let mut all_ended = true;
        for cursor in cursors.iter_mut() {
            let result = get_next_one(mib, views, cursor);
            if !result.is_end_of_view() {
                all_ended = false;
            }
            first.record(result.status, out.len() + 1);
            cursor.clone_from(&result.oid);
            if !out.push(result.into_varbind()) {
                return out.finish(request, first);
            }
        }
        if all_ended {
            break;
        }
    }
    out.finish(request, first)
}

/// Response bindings with a running size check.
struct BulkBuffer<'a> {
    frame: &'a Message,
    max_size: usize,
    content_len: usize,
    varbinds: Vec<VarBind>,
}

impl<'a> BulkBuffer<'a> {
    fn new(frame: &'a Message, max_size: usize) -> Self {
        Self {
            frame,
            max_size,
            content_len: 0,
            varbinds: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.varbinds.len()
    }

    /// Append `vb` if the response still fits. Returns false when full.
    fn push(&mut self, vb: VarBind) -> bool {
        let grown = self.content_len + vb.encoded_len();
        if self.frame.encoded_len_with(grown) > self.max_size {
            tracing::debug!(target: "smart_snmp::agent", { snmp.varbind_count = self.varbinds.len(), max = self.max_size }, "GETBULK response truncated");
            return false;
        }
        self.content_len = grown;
        self.varbinds.push(vb);
        true
    }

    fn finish(self, request: &Pdu, first: FirstError) -> Pdu {
        first.into_response(request.request_id, self.varbinds)
    }
}
