//! SNMP agent core.
//!
//! [`Agent`] turns one request datagram into at most one response datagram.
//! It owns the [`Mib`] and an [`AccessPolicy`]; it does no I/O itself (see
//! [`transport`](crate::transport) for the UDP loop).
//!
//! # Example
//!
//! ```rust
//! use smart_snmp::agent::{Agent, ViewTable};
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
//!
//! let mut agent = Agent::builder()
//!     .views(ViewTable::new().community("public", [oid!(1, 3, 6, 1)], []))
//!     .mib(mib)
//!     .build();
//!
//! // Malformed input never produces a reply.
//! assert!(agent.handle_datagram(&[0x30, 0x00]).is_none());
//! ```

mod request;
mod set_handler;
mod view;

pub use view::{AccessEntry, AccessPolicy, OpenAccess, ViewTable};

use std::net::SocketAddr;
use std::time::Instant;

use bytes::Bytes;

use crate::error::ErrorStatus;
use crate::handler::RequestContext;
use crate::message::{HeaderData, Message, ScopedPdu, UsmSecurityParams, V3Message, flags};
use crate::mib::Mib;
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

/// Default response size limit (Ethernet MTU minus IP/UDP headers).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1472;

/// Smallest message size every SNMP entity must accept (RFC 3417).
pub const MIN_MAX_MESSAGE_SIZE: usize = 484;

/// usmStatsUnknownEngineIDs.0, reported to discovery requests.
const USM_STATS_UNKNOWN_ENGINE_IDS: [u32; 11] = [1, 3, 6, 1, 6, 3, 15, 1, 1, 4, 0];

/// Builder for [`Agent`].
pub struct AgentBuilder {
    engine_id: Option<Bytes>,
    engine_boots: u32,
    max_message_size: usize,
    access: Option<Box<dyn AccessPolicy>>,
    mib: Mib,
}

impl AgentBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - Engine ID: a text-format local engine ID
    /// - Engine boots: 1
    /// - Max message size: 1472 bytes
    /// - Access: [`OpenAccess`] (any community or user may read and write)
    /// - An empty [`Mib`]
    pub fn new() -> Self {
        Self {
            engine_id: None,
            engine_boots: 1,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            access: None,
            mib: Mib::new(),
        }
    }

    /// Set the SNMPv3 engine ID placed in v3 responses.
    pub fn engine_id(mut self, engine_id: impl Into<Bytes>) -> Self {
        self.engine_id = Some(engine_id.into());
        self
    }

    /// Set the engine boot counter placed in v3 responses.
    pub fn engine_boots(mut self, boots: u32) -> Self {
        self.engine_boots = boots;
        self
    }

    /// Set the maximum response size.
    ///
    /// Values below 484 are raised to 484. GETBULK responses are truncated
    /// to fit; other responses that do not fit become `tooBig`.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size.max(MIN_MAX_MESSAGE_SIZE);
        self
    }

    /// Use a custom access policy.
    pub fn access(mut self, policy: impl AccessPolicy + 'static) -> Self {
        self.access = Some(Box::new(policy));
        self
    }

    /// Use per-community and per-user views.
    pub fn views(self, views: ViewTable) -> Self {
        self.access(views)
    }

    /// Start from a pre-populated MIB.
    pub fn mib(mut self, mib: Mib) -> Self {
        self.mib = mib;
        self
    }

    /// Build the agent.
    pub fn build(self) -> Agent {
        let engine_id = self.engine_id.unwrap_or_else(default_engine_id);
        Agent {
            mib: self.mib,
            access: self
                .access
                .unwrap_or_else(|| Box::new(OpenAccess::default())),
            engine_id,
            engine_boots: self.engine_boots,
            engine_start: Instant::now(),
            max_message_size: self.max_message_size,
            unknown_engine_ids: 0,
        }
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// RFC 3411 text-format engine ID: enterprise bit set, format 4, text.
fn default_engine_id() -> Bytes {
    let mut id = vec![0x80, 0x00, 0x00, 0x00, 0x04];
    id.extend_from_slice(b"smart-snmp");
    Bytes::from(id)
}

/// SNMP agent.
///
/// Processing is synchronous and request-at-a-time; wrap the agent in a
/// mutex to share it between transports.
pub struct Agent {
    mib: Mib,
    access: Box<dyn AccessPolicy>,
    engine_id: Bytes,
    engine_boots: u32,
    engine_start: Instant,
    max_message_size: usize,
    unknown_engine_ids: u32,
}

impl Agent {
    /// Create a builder for configuring the agent.
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// The MIB served by this agent.
    pub fn mib(&self) -> &Mib {
        &self.mib
    }

    /// Mutable access to the MIB, for (un)registering objects at runtime.
    pub fn mib_mut(&mut self) -> &mut Mib {
        &mut self.mib
    }

    /// The engine ID.
    pub fn engine_id(&self) -> &[u8] {
        &self.engine_id
    }

    /// Seconds since the agent was built.
    pub fn engine_time(&self) -> u32 {
        u32::try_from(self.engine_start.elapsed().as_secs()).unwrap_or(u32::MAX)
    }

    /// The configured response size limit.
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Process one datagram and return the response, if any.
    ///
    /// Malformed datagrams, non-request PDUs and encrypted v3 messages are
    /// dropped without a reply.
    pub fn handle_datagram(&mut self, data: &[u8]) -> Option<Bytes> {
        self.handle_datagram_from(data, None)
    }

    /// [`handle_datagram`](Self::handle_datagram) with the sender's address
    /// made available to the access policy.
    pub fn handle_datagram_from(
        &mut self,
        data: &[u8],
        source: Option<SocketAddr>,
    ) -> Option<Bytes> {
        let message = match Message::decode(Bytes::copy_from_slice(data)) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(target: "smart_snmp::agent", { snmp.source = ?source, error = %e }, "dropping malformed datagram");
                return None;
            }
        };

        let pdu_type = message.pdu().pdu_type;
        if !pdu_type.is_request() {
            tracing::debug!(target: "smart_snmp::agent", { snmp.source = ?source, snmp.pdu_type = %pdu_type }, "ignoring non-request PDU");
            return None;
        }
        if pdu_type == PduType::GetBulkRequest && message.version() == Version::V1 {
            tracing::debug!(target: "smart_snmp::agent", { snmp.source = ?source }, "ignoring GETBULK in SNMPv1");
            return None;
        }

        let ctx = request_context(&message, source);
        tracing::trace!(target: "smart_snmp::agent", {
            snmp.source = ?source,
            snmp.version = %ctx.version,
            snmp.request_id = ctx.request_id,
            snmp.pdu_type = %pdu_type,
            snmp.varbind_count = message.pdu().varbinds.len(),
        }, "request");

        if let Message::V3(v3) = &message
            && v3.scoped_pdu.pdu.varbinds.is_empty()
        {
            return self.discovery_report(v3);
        }

        let frame = self.response_frame(message);
        let max_size = self.response_limit(&frame);
        let request = frame.pdu().clone();
        let frame = frame.with_pdu(Pdu::response(request.request_id, ErrorStatus::NoError, 0, Vec::new()));

        let response = match self.access.lookup(&ctx) {
            None => {
                tracing::debug!(target: "smart_snmp::agent", { snmp.source = ?source, snmp.version = %ctx.version }, "unknown community or user");
                refused(&request)
            }
            Some(entry) => {
                let mib = &mut self.mib;
                match request.pdu_type {
                    PduType::GetRequest => request::get(mib, entry, &request),
                    PduType::GetNextRequest => request::get_next(mib, entry, &request),
                    PduType::SetRequest => set_handler::set(mib, entry, &request),
                    _ => request::get_bulk(mib, entry, &request, &frame, max_size),
                }
            }
        };

        let response = if ctx.version == Version::V1 {
            v1_response(&request, response)
        } else {
            response
        };

        let frame = frame.with_pdu(response);
        let size = frame.encoded_len();
        if size > max_size {
            tracing::debug!(target: "smart_snmp::agent", { snmp.request_id = request.request_id, size, max = max_size }, "response too big");
            let too_big = Pdu::response(request.request_id, ErrorStatus::TooBig, 0, Vec::new());
            return Some(frame.with_pdu(too_big).encode());
        }
        Some(frame.encode())
    }

    /// Rewrite the request framing into response framing.
    fn response_frame(&self, message: Message) -> Message {
        match message {
            Message::Community(m) => Message::Community(m),
            Message::V3(m) => Message::V3(V3Message::new(
                HeaderData::new(m.header.msg_id, m.header.msg_max_size, 0),
                self.security_params(m.security.user_name.clone()),
                ScopedPdu::new(
                    self.engine_id.clone(),
                    m.scoped_pdu.context_name.clone(),
                    m.scoped_pdu.pdu,
                ),
            )),
        }
    }

    fn security_params(&self, user_name: Bytes) -> UsmSecurityParams {
        UsmSecurityParams {
            engine_id: self.engine_id.clone(),
            engine_boots: self.engine_boots,
            engine_time: self.engine_time(),
            user_name,
            ..UsmSecurityParams::default()
        }
    }

    /// Our limit, lowered to the manager's msgMaxSize for v3.
    fn response_limit(&self, frame: &Message) -> usize {
        match frame {
            Message::V3(m) => usize::try_from(m.header.msg_max_size)
                .ok()
                .filter(|size| *size >= MIN_MAX_MESSAGE_SIZE)
                .map_or(self.max_message_size, |size| size.min(self.max_message_size)),
            Message::Community(_) => self.max_message_size,
        }
    }

    /// Answer an empty v3 request with our engine parameters.
    fn discovery_report(&mut self, request: &V3Message) -> Option<Bytes> {
        if request.header.msg_flags & flags::REPORTABLE == 0 {
            tracing::debug!(target: "smart_snmp::agent", "discovery request not reportable");
            return None;
        }
        self.unknown_engine_ids = self.unknown_engine_ids.wrapping_add(1);

        let report = Pdu {
            pdu_type: PduType::Report,
            ..Pdu::response(
                request.scoped_pdu.pdu.request_id,
                ErrorStatus::NoError,
                0,
                vec![VarBind::new(
                    Oid::from_slice(&USM_STATS_UNKNOWN_ENGINE_IDS),
                    Value::Counter32(self.unknown_engine_ids),
                )],
            )
        };
        let message = V3Message::new(
            HeaderData::new(request.header.msg_id, request.header.msg_max_size, 0),
            self.security_params(request.security.user_name.clone()),
            ScopedPdu::new(self.engine_id.clone(), Bytes::new(), report),
        );
        tracing::debug!(target: "smart_snmp::agent", { snmp.msg_id = request.header.msg_id }, "sending discovery report");
        Some(message.encode())
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("mib", &self.mib)
            .field("max_message_size", &self.max_message_size)
            .field("engine_boots", &self.engine_boots)
            .finish_non_exhaustive()
    }
}

fn request_context(message: &Message, source: Option<SocketAddr>) -> RequestContext {
    let pdu = message.pdu();
    let (security_name, context_name) = match message {
        Message::Community(m) => (m.community.clone(), Bytes::new()),
        Message::V3(m) => (
            m.security.user_name.clone(),
            m.scoped_pdu.context_name.clone(),
        ),
    };
    RequestContext {
        source,
        version: message.version(),
        security_name,
        context_name,
        request_id: pdu.request_id,
        pdu_type: pdu.pdu_type,
    }
}

/// `noAccess` with the request bindings echoed.
fn refused(request: &Pdu) -> Pdu {
    let index = if request.varbinds.is_empty() { 0 } else { 1 };
    Pdu::response(
        request.request_id,
        ErrorStatus::NoAccess,
        index,
        request.varbinds.clone(),
    )
}

/// Map a v2 response onto v1 semantics (RFC 2576 Section 4.3).
///
/// Exceptions become `noSuchName` at the first affected binding, and v2-only
/// error statuses fold into their v1 equivalents. Errors echo the request.
fn v1_response(request: &Pdu, response: Pdu) -> Pdu {
    let status = response.error_status_enum();
    if status.is_error() {
        return Pdu::response(
            request.request_id,
            v1_status(status),
            response.error_index,
            request.varbinds.clone(),
        );
    }
    match response
        .varbinds
        .iter()
        .position(|vb| vb.value.is_exception())
    {
        Some(pos) => Pdu::response(
            request.request_id,
            ErrorStatus::NoSuchName,
            pos as i32 + 1,
            request.varbinds.clone(),
        ),
        None => response,
    }
}

fn v1_status(status: ErrorStatus) -> ErrorStatus {
    match status {
        ErrorStatus::NoAccess
        | ErrorStatus::NotWritable
        | ErrorStatus::NoCreation
        | ErrorStatus::InconsistentName
        | ErrorStatus::AuthorizationError => ErrorStatus::NoSuchName,
        ErrorStatus::WrongType
        | ErrorStatus::WrongLength
        | ErrorStatus::WrongEncoding
        | ErrorStatus::WrongValue
        | ErrorStatus::InconsistentValue => ErrorStatus::BadValue,
        ErrorStatus::ResourceUnavailable | ErrorStatus::CommitFailed | ErrorStatus::UndoFailed => {
            ErrorStatus::GenErr
        }
        other => other,
    }
}

/// Tracks the first failing binding of a request.
#[derive(Debug, Default)]
pub(crate) struct FirstError {
    status: Option<(ErrorStatus, i32)>,
}

impl FirstError {
    /// Record `status` for the binding at 1-based `index` unless an earlier
    /// binding already failed.
    pub(crate) fn record(&mut self, status: ErrorStatus, index: usize) {
        if status.is_error() && self.status.is_none() {
            self.status = Some((status, index as i32));
        }
    }

    /// The recorded status and index, or `(noError, 0)`.
    pub(crate) fn get(&self) -> (ErrorStatus, i32) {
        self.status.unwrap_or((ErrorStatus::NoError, 0))
    }

    pub(crate) fn into_response(self, request_id: i32, varbinds: Vec<VarBind>) -> Pdu {
        let (status, index) = self.get();
        Pdu::response(request_id, status, index, varbinds)
    }
}
