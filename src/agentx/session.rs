//! Sub-agent side of an AgentX session.

use std::time::Instant;

use bytes::Bytes;

use crate::agent::FirstError;
use crate::error::{Error, ErrorStatus, Result};
use crate::handler::RequestKind;
use crate::mib::{Mib, SearchResult};
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;

use super::header::{Header, PduType, flags};
use super::pdu::{AgentxPdu, CloseReason, Payload, SearchRange, admin_error};

/// Registration priority sent with every Register and Unregister.
pub const DEFAULT_PRIORITY: u8 = 127;

/// Where the session is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session id assigned yet.
    Opening,
    Open,
    Closed,
}

/// An AgentX sub-agent session.
///
/// Builds the PDUs the sub-agent sends to its master and answers the
/// requests the master forwards, resolving them against a [`Mib`].
#[derive(Debug)]
pub struct SubAgent {
    id: Oid,
    descr: Bytes,
    session_id: u32,
    packet_id: u32,
    state: SessionState,
    start: Instant,
}

impl SubAgent {
    /// Create a session identified by `id` and described by `descr`.
    pub fn new(id: Oid, descr: impl Into<Bytes>) -> Self {
        Self {
            id,
            descr: descr.into(),
            session_id: 0,
            packet_id: 0,
            state: SessionState::Opening,
            start: Instant::now(),
        }
    }

    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Hundredths of a second since the session was created.
    pub fn sys_uptime(&self) -> u32 {
        (self.start.elapsed().as_millis() / 10) as u32
    }

    fn next_header(&mut self, pdu_type: PduType) -> Header {
        self.packet_id = self.packet_id.wrapping_add(1);
        Header::new(pdu_type, self.session_id, 0, self.packet_id)
    }

    /// Open PDU.
    pub fn open_pdu(&mut self) -> Bytes {
        let header = self.next_header(PduType::Open);
        AgentxPdu::new(
            header,
            Payload::Open {
                timeout: 0,
                id: self.id.clone(),
                descr: self.descr.clone(),
            },
        )
        .encode()
    }

    /// Close PDU. The session counts as closed once it is built.
    pub fn close_pdu(&mut self, reason: CloseReason) -> Bytes {
        let header = self.next_header(PduType::Close);
        self.state = SessionState::Closed;
        AgentxPdu::new(
            header,
            Payload::Close {
                reason: reason as u8,
            },
        )
        .encode()
    }

    /// Register PDU for `subtree`.
    ///
    /// `range` is `(range_subid, upper_bound)`: the 1-based arc of `subtree`
    /// that varies up to `upper_bound`.
    pub fn register_pdu(&mut self, subtree: &Oid, range: Option<(u8, u32)>) -> Bytes {
        let mut header = self.next_header(PduType::Register);
        header.flags |= flags::INSTANCE_REGISTRATION;
        let (range_subid, upper_bound) = split_range(range);
        AgentxPdu::new(
            header,
            Payload::Register {
                timeout: 0,
                priority: DEFAULT_PRIORITY,
                range_subid,
                subtree: subtree.clone(),
                upper_bound,
            },
        )
        .encode()
    }

    /// Unregister PDU for `subtree`.
    pub fn unregister_pdu(&mut self, subtree: &Oid, range: Option<(u8, u32)>) -> Bytes {
        let mut header = self.next_header(PduType::Unregister);
        header.flags |= flags::INSTANCE_REGISTRATION;
        let (range_subid, upper_bound) = split_range(range);
        AgentxPdu::new(
            header,
            Payload::Unregister {
                priority: DEFAULT_PRIORITY,
                range_subid,
                subtree: subtree.clone(),
                upper_bound,
            },
        )
        .encode()
    }

    /// Ping PDU.
    pub fn ping_pdu(&mut self) -> Bytes {
        let header = self.next_header(PduType::Ping);
        AgentxPdu::new(header, Payload::Ping).encode()
    }

    /// Decode an incoming PDU and answer it.
    ///
    /// Returns the encoded reply, or `None` if the PDU needs no reply or
    /// could not be decoded.
    pub fn handle_pdu(&mut self, mib: &mut Mib, data: &[u8]) -> Option<Bytes> {
        let pdu = match AgentxPdu::decode(data) {
            Ok(pdu) => pdu,
            Err(e) => {
                tracing::debug!(target: "smart_snmp::agentx", { agentx.session_id = self.session_id, error = %e }, "dropping undecodable PDU");
                return None;
            }
        };
        self.handle(mib, &pdu).map(|reply| reply.encode())
    }

    /// Answer a decoded PDU.
    pub fn handle(&mut self, mib: &mut Mib, pdu: &AgentxPdu) -> Option<AgentxPdu> {
        let header = &pdu.header;
        tracing::trace!(target: "smart_snmp::agentx", { agentx.session_id = header.session_id, agentx.packet_id = header.packet_id, agentx.pdu_type = %header.pdu_type }, "received PDU");

        if pdu.context.is_some() && is_request(&pdu.payload) {
            tracing::debug!(target: "smart_snmp::agentx", { agentx.session_id = header.session_id, agentx.packet_id = header.packet_id }, "non-default context not supported");
            return Some(self.response(header, admin_error::UNSUPPORTED_CONTEXT, 0, Vec::new()));
        }

        let (first, varbinds) = match &pdu.payload {
            Payload::Get(ranges) => get(mib, ranges),
            Payload::GetNext(ranges) => get_next(mib, ranges),
            Payload::GetBulk {
                non_repeaters,
                max_repetitions,
                ranges,
            } => get_bulk(mib, ranges, *non_repeaters, *max_repetitions),
            Payload::TestSet(varbinds) => test_set(mib, varbinds),
            Payload::CommitSet | Payload::UndoSet | Payload::CleanupSet => {
                (FirstError::default(), Vec::new())
            }
            Payload::Response { error, index, .. } => {
                self.on_response(header, *error, *index);
                return None;
            }
            Payload::Close { reason } => {
                tracing::info!(target: "smart_snmp::agentx", { agentx.session_id = self.session_id, reason }, "session closed by master");
                self.state = SessionState::Closed;
                return None;
            }
            _ => {
                tracing::debug!(target: "smart_snmp::agentx", { agentx.pdu_type = %header.pdu_type }, "ignoring PDU");
                return None;
            }
        };

        let (status, index) = first.get();
        Some(self.response(header, status.as_i32() as u16, index as u16, varbinds))
    }

    /// Response mirroring `header`, keeping only its byte-order flag.
    fn response(
        &self,
        header: &Header,
        error: u16,
        index: u16,
        varbinds: Vec<VarBind>,
    ) -> AgentxPdu {
        let reply = Header {
            pdu_type: PduType::Response,
            flags: header.flags & flags::NETWORK_BYTE_ORDER,
            payload_length: 0,
            ..*header
        };
        AgentxPdu::new(
            reply,
            Payload::Response {
                sys_uptime: self.sys_uptime(),
                error,
                index,
                varbinds,
            },
        )
    }

    fn on_response(&mut self, header: &Header, error: u16, index: u16) {
        if error != 0 {
            let name = admin_error::name(error)
                .map(str::to_owned)
                .unwrap_or_else(|| ErrorStatus::from_i32(i32::from(error)).to_string());
            tracing::warn!(target: "smart_snmp::agentx", { agentx.session_id = header.session_id, agentx.packet_id = header.packet_id, error = %name, index }, "master reported an error");
            return;
        }
        if self.state == SessionState::Opening {
            tracing::info!(target: "smart_snmp::agentx", { agentx.session_id = header.session_id }, "session open");
            self.state = SessionState::Open;
        }
        self.session_id = header.session_id;
    }

    /// Apply the master's Response to our Open.
    ///
    /// Fails if the master refused the session.
    pub fn accept_open_response(&mut self, pdu: &AgentxPdu) -> Result<()> {
        match &pdu.payload {
            Payload::Response { error: 0, .. } => {
                self.on_response(&pdu.header, 0, 0);
                Ok(())
            }
            Payload::Response { error, .. } => Err(Error::Session(
                format!(
                    "open refused: {}",
                    admin_error::name(*error).unwrap_or("unknown error")
                )
                .into(),
            )),
            _ => Err(Error::Session(
                format!("expected Response to Open, got {}", pdu.header.pdu_type).into(),
            )),
        }
    }
}

fn split_range(range: Option<(u8, u32)>) -> (u8, Option<u32>) {
    match range {
        Some((subid, bound)) if subid != 0 => (subid, Some(bound)),
        _ => (0, None),
    }
}

fn end_of_range(range: &SearchRange) -> SearchResult {
    SearchResult::exception(range.start.clone(), Value::EndOfMibView)
}

/// First instance in `range`.
///
/// An included start is tried exactly before searching past it. A result
/// beyond the end comes back as `endOfMibView` at the range start.
fn next_in_range(mib: &mut Mib, range: &SearchRange) -> SearchResult {
    if range.include {
        let exact = mib.search_exact(&range.start, RequestKind::Get, None);
        if exact.is_hit() && range.within_end(&exact.oid) {
            return exact;
        }
    }
    let result = mib.search_next(&range.start);
    if result.status.is_error() {
        return result;
    }
    if result.is_hit() && range.within_end(&result.oid) {
        return result;
    }
    end_of_range(range)
}

fn get(mib: &mut Mib, ranges: &[SearchRange]) -> (FirstError, Vec<VarBind>) {
    let mut first = FirstError::default();
    let mut varbinds = Vec::with_capacity(ranges.len());
    for (index, range) in ranges.iter().enumerate() {
        let result = mib.search_exact(&range.start, RequestKind::Get, None);
        first.record(result.status, index + 1);
        varbinds.push(result.into_varbind());
    }
    (first, varbinds)
}

fn get_next(mib: &mut Mib, ranges: &[SearchRange]) -> (FirstError, Vec<VarBind>) {
    let mut first = FirstError::default();
    let mut varbinds = Vec::with_capacity(ranges.len());
    for (index, range) in ranges.iter().enumerate() {
        let result = next_in_range(mib, range);
        first.record(result.status, index + 1);
        varbinds.push(result.into_varbind());
    }
    (first, varbinds)
}

fn get_bulk(
    mib: &mut Mib,
    ranges: &[SearchRange],
    non_repeaters: u16,
    max_repetitions: u16,
) -> (FirstError, Vec<VarBind>) {
    let split = usize::from(non_repeaters).min(ranges.len());
    let (fixed, repeated) = ranges.split_at(split);
    let mut first = FirstError::default();
    let mut varbinds = Vec::new();

    for range in fixed {
        let result = next_in_range(mib, range);
        first.record(result.status, varbinds.len() + 1);
        varbinds.push(result.into_varbind());
    }

    let mut cursors: Vec<SearchRange> = repeated.to_vec();
    for _ in 0..max_repetitions {
        if cursors.is_empty() {
            break;
        }
        let mut all_ended = true;
        for cursor in cursors.iter_mut() {
            let result = next_in_range(mib, cursor);
            if !result.is_end_of_view() {
                all_ended = false;
                cursor.start.clone_from(&result.oid);
                cursor.include = false;
            }
            first.record(result.status, varbinds.len() + 1);
            varbinds.push(result.into_varbind());
        }
        if all_ended {
            break;
        }
    }
    (first, varbinds)
}

/// TestSet: every binding goes to its resolver as a SET, echoed back.
/// Requests answered from the MIB, and therefore scoped to a context.
fn is_request(payload: &Payload) -> bool {
    matches!(
        payload,
        Payload::Get(_) | Payload::GetNext(_) | Payload::GetBulk { .. } | Payload::TestSet(_)
    )
}

fn test_set(mib: &mut Mib, varbinds: &[VarBind]) -> (FirstError, Vec<VarBind>) {
    let mut first = FirstError::default();
    for (index, vb) in varbinds.iter().enumerate() {
        let result = mib.search_exact(&vb.oid, RequestKind::Set, Some(&vb.value));
        let status = if result.status.is_error() {
            result.status
        } else if result.value.is_exception() {
            ErrorStatus::NotWritable
        } else {
            ErrorStatus::NoError
        };
        first.record(status, index + 1);
    }
    (first, varbinds.to_vec())
}
