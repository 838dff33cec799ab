//! AgentX PDUs (RFC 2741 Section 6.2).

use bytes::{Bytes, BytesMut};

use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use crate::value::MAX_VALUE_LEN;
use crate::varbind::VarBind;

use super::codec::{Reader, Writer};
use super::header::{HEADER_LEN, Header, PduType, flags};

/// Longest accepted context string.
pub const MAX_CONTEXT_LEN: usize = 40;

/// A GET/GETNEXT/GETBULK search range.
///
/// An empty `end` places no upper bound on the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRange {
    pub start: Oid,
    pub include: bool,
    pub end: Oid,
    pub end_include: bool,
}

impl SearchRange {
    /// Range from `start` to `end`, `end` excluded.
    pub fn new(start: Oid, include: bool, end: Oid) -> Self {
        Self {
            start,
            include,
            end,
            end_include: false,
        }
    }

    /// True if `oid` lies below the upper bound.
    pub fn within_end(&self, oid: &Oid) -> bool {
        if self.end.is_empty() {
            return true;
        }
        if self.end_include {
            oid <= &self.end
        } else {
            oid < &self.end
        }
    }

    fn read(r: &mut Reader) -> Result<Self> {
        let (start, include) = r.read_oid(DecodeErrorKind::SearchRangeOidLength)?;
        let (end, end_include) = r.read_oid(DecodeErrorKind::SearchRangeOidLength)?;
        Ok(Self {
            start,
            include,
            end,
            end_include,
        })
    }

    fn write(&self, w: &mut Writer) {
        w.put_oid(&self.start, self.include);
        w.put_oid(&self.end, self.end_include);
    }
}

/// Reasons carried by a Close PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CloseReason {
    Other = 1,
    ParseError = 2,
    ProtocolError = 3,
    Timeouts = 4,
    Shutdown = 5,
    ByManager = 6,
}

impl CloseReason {
    pub fn from_u8(code: u8) -> Option<Self> {
        Some(match code {
            1 => Self::Other,
            2 => Self::ParseError,
            3 => Self::ProtocolError,
            4 => Self::Timeouts,
            5 => Self::Shutdown,
            6 => Self::ByManager,
            _ => return None,
        })
    }
}

/// Administrative `res.error` codes a master agent may return.
pub mod admin_error {
    pub const OPEN_FAILED: u16 = 256;
    pub const NOT_OPEN: u16 = 257;
    pub const INDEX_WRONG_TYPE: u16 = 258;
    pub const INDEX_ALREADY_ALLOCATED: u16 = 259;
    pub const INDEX_NONE_AVAILABLE: u16 = 260;
    pub const INDEX_NOT_ALLOCATED: u16 = 261;
    pub const UNSUPPORTED_CONTEXT: u16 = 262;
    pub const DUPLICATE_REGISTRATION: u16 = 263;
    pub const UNKNOWN_REGISTRATION: u16 = 264;
    pub const UNKNOWN_AGENT_CAPS: u16 = 265;
    pub const PARSE_ERROR: u16 = 266;
    pub const REQUEST_DENIED: u16 = 267;
    pub const PROCESSING_ERROR: u16 = 268;

    /// Name of an administrative error, for logging.
    pub fn name(code: u16) -> Option<&'static str> {
        Some(match code {
            OPEN_FAILED => "openFailed",
            NOT_OPEN => "notOpen",
            INDEX_WRONG_TYPE => "indexWrongType",
            INDEX_ALREADY_ALLOCATED => "indexAlreadyAllocated",
            INDEX_NONE_AVAILABLE => "indexNoneAvailable",
            INDEX_NOT_ALLOCATED => "indexNotAllocated",
            UNSUPPORTED_CONTEXT => "unsupportedContext",
            DUPLICATE_REGISTRATION => "duplicateRegistration",
            UNKNOWN_REGISTRATION => "unknownRegistration",
            UNKNOWN_AGENT_CAPS => "unknownAgentCaps",
            PARSE_ERROR => "parseError",
            REQUEST_DENIED => "requestDenied",
            PROCESSING_ERROR => "processingError",
            _ => return None,
        })
    }
}

/// PDU body by type.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Open {
        timeout: u8,
        id: Oid,
        descr: Bytes,
    },
    Close {
        reason: u8,
    },
    Register {
        timeout: u8,
        priority: u8,
        range_subid: u8,
        subtree: Oid,
        upper_bound: Option<u32>,
    },
    Unregister {
        priority: u8,
        range_subid: u8,
        subtree: Oid,
        upper_bound: Option<u32>,
    },
    Get(Vec<SearchRange>),
    GetNext(Vec<SearchRange>),
    GetBulk {
        non_repeaters: u16,
        max_repetitions: u16,
        ranges: Vec<SearchRange>,
    },
    TestSet(Vec<VarBind>),
    CommitSet,
    UndoSet,
    CleanupSet,
    Ping,
    Response {
        sys_uptime: u32,
        error: u16,
        index: u16,
        varbinds: Vec<VarBind>,
    },
    /// A PDU this sub-agent does not act on, kept as raw bytes.
    Other(Bytes),
}

/// A complete AgentX PDU.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentxPdu {
    pub header: Header,
    /// Non-default context, for PDU types that allow one.
    pub context: Option<Bytes>,
    pub payload: Payload,
}

impl AgentxPdu {
    pub fn new(header: Header, payload: Payload) -> Self {
        Self {
            header,
            context: None,
            payload,
        }
    }

    /// Decode one PDU occupying all of `data`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        Self::decode_bytes(Bytes::copy_from_slice(data))
    }

    /// Decode one PDU occupying all of `data`, without copying.
    pub fn decode_bytes(mut data: Bytes) -> Result<Self> {
        let header = Header::decode(&data)?;
        let total = HEADER_LEN + header.payload_length as usize;
        if data.len() < total {
            return Err(Error::decode(
                HEADER_LEN,
                DecodeErrorKind::InsufficientData {
                    needed: total,
                    available: data.len(),
                },
            ));
        }
        if data.len() > total {
            return Err(Error::decode(
                total,
                DecodeErrorKind::TrailingData {
                    extra: data.len() - total,
                },
            ));
        }

        let body = data.split_off(HEADER_LEN);
        let mut r = Reader::new(body, header.byte_order(), HEADER_LEN);

        let context = if header.has_context() {
            Some(r.read_octet_string(MAX_CONTEXT_LEN, DecodeErrorKind::PduContextLength)?)
        } else {
            None
        };

        let payload = read_payload(header.pdu_type, &mut r)?;
        if !r.is_empty() {
            return Err(Error::decode(
                r.offset(),
                DecodeErrorKind::TrailingData {
                    extra: r.remaining(),
                },
            ));
        }

        Ok(Self {
            header,
            context,
            payload,
        })
    }

    /// Encode the PDU, filling in the payload length and the context flag.
    pub fn encode(&self) -> Bytes {
        let mut header = self.header;
        let mut w = Writer::new(header.byte_order());

        let context = self
            .context
            .as_ref()
            .filter(|_| header.pdu_type.allows_context());
        match context {
            Some(context) => {
                header.flags |= flags::NON_DEFAULT_CONTEXT;
                w.put_octet_string(context);
            }
            None => header.flags &= !flags::NON_DEFAULT_CONTEXT,
        }

        write_payload(&self.payload, &mut w);

        let body = w.into_inner();
        header.payload_length = body.len() as u32;
        let mut out = BytesMut::with_capacity(HEADER_LEN + body.len());
        header.encode(&mut out);
        out.extend_from_slice(&body);
        out.freeze()
    }
}

fn read_ranges(r: &mut Reader) -> Result<Vec<SearchRange>> {
    let mut ranges = Vec::new();
    while !r.is_empty() {
        ranges.push(SearchRange::read(r)?);
    }
    Ok(ranges)
}

fn read_upper_bound(r: &mut Reader, range_subid: u8) -> Result<Option<u32>> {
    if range_subid == 0 {
        return Ok(None);
    }
    Ok(Some(r.read_u32()?))
}

fn read_payload(pdu_type: PduType, r: &mut Reader) -> Result<Payload> {
    Ok(match pdu_type {
        PduType::Open => {
            let timeout = r.read_u8()?;
            r.skip(3)?;
            let (id, _) = r.read_oid(DecodeErrorKind::VarbindOidLength)?;
            let descr = r.read_octet_string(MAX_VALUE_LEN, DecodeErrorKind::VarbindValueLength)?;
            Payload::Open { timeout, id, descr }
        }
        PduType::Close => {
            let reason = r.read_u8()?;
            r.skip(3)?;
            Payload::Close { reason }
        }
        PduType::Register => {
            let timeout = r.read_u8()?;
            let priority = r.read_u8()?;
            let range_subid = r.read_u8()?;
            r.skip(1)?;
            let (subtree, _) = r.read_oid(DecodeErrorKind::SearchRangeOidLength)?;
            let upper_bound = read_upper_bound(r, range_subid)?;
            Payload::Register {
                timeout,
                priority,
                range_subid,
                subtree,
                upper_bound,
            }
        }
        PduType::Unregister => {
            r.skip(1)?;
            let priority = r.read_u8()?;
            let range_subid = r.read_u8()?;
            r.skip(1)?;
            let (subtree, _) = r.read_oid(DecodeErrorKind::SearchRangeOidLength)?;
            let upper_bound = read_upper_bound(r, range_subid)?;
            Payload::Unregister {
                priority,
                range_subid,
                subtree,
                upper_bound,
            }
        }
        PduType::Get => Payload::Get(read_ranges(r)?),
        PduType::GetNext => Payload::GetNext(read_ranges(r)?),
        PduType::GetBulk => {
            let non_repeaters = r.read_u16()?;
            let max_repetitions = r.read_u16()?;
            Payload::GetBulk {
                non_repeaters,
                max_repetitions,
                ranges: read_ranges(r)?,
            }
        }
        PduType::TestSet => Payload::TestSet(r.read_varbinds()?),
        PduType::CommitSet => Payload::CommitSet,
        PduType::UndoSet => Payload::UndoSet,
        PduType::CleanupSet => Payload::CleanupSet,
        PduType::Ping => Payload::Ping,
        PduType::Response => {
            let sys_uptime = r.read_u32()?;
            let error = r.read_u16()?;
            let index = r.read_u16()?;
            Payload::Response {
                sys_uptime,
                error,
                index,
                varbinds: r.read_varbinds()?,
            }
        }
        PduType::Notify
        | PduType::IndexAllocate
        | PduType::IndexDeallocate
        | PduType::AddAgentCaps
        | PduType::RemoveAgentCaps => Payload::Other(r.read_rest()),
    })
}

fn write_payload(payload: &Payload, w: &mut Writer) {
    match payload {
        Payload::Open { timeout, id, descr } => {
            w.put_u8(*timeout);
            w.put_zeros(3);
            w.put_oid(id, false);
            w.put_octet_string(descr);
        }
        Payload::Close { reason } => {
            w.put_u8(*reason);
            w.put_zeros(3);
        }
        Payload::Register {
            timeout,
            priority,
            range_subid,
            subtree,
            upper_bound,
        } => {
            w.put_u8(*timeout);
            w.put_u8(*priority);
            w.put_u8(*range_subid);
            w.put_u8(0);
            w.put_oid(subtree, false);
            if *range_subid != 0 {
                w.put_u32(upper_bound.unwrap_or(0));
            }
        }
        Payload::Unregister {
            priority,
            range_subid,
            subtree,
            upper_bound,
        } => {
            w.put_u8(0);
            w.put_u8(*priority);
            w.put_u8(*range_subid);
            w.put_u8(0);
            w.put_oid(subtree, false);
            if *range_subid != 0 {
                w.put_u32(upper_bound.unwrap_or(0));
            }
        }
        Payload::Get(ranges) | Payload::GetNext(ranges) => {
            for range in ranges {
                range.write(w);
            }
        }
        Payload::GetBulk {
            non_repeaters,
            max_repetitions,
            ranges,
        } => {
            w.put_u16(*non_repeaters);
            w.put_u16(*max_repetitions);
            for range in ranges {
                range.write(w);
            }
        }
        Payload::TestSet(varbinds) => {
            for vb in varbinds {
                w.put_varbind(vb);
            }
        }
        Payload::CommitSet | Payload::UndoSet | Payload::CleanupSet | Payload::Ping => {}
        Payload::Response {
            sys_uptime,
            error,
            index,
            varbinds,
        } => {
            w.put_u32(*sys_uptime);
            w.put_u16(*error);
            w.put_u16(*index);
            for vb in varbinds {
                w.put_varbind(vb);
            }
        }
        Payload::Other(raw) => w.put_slice(raw),
    }
}
