//! AgentX PDU header (RFC 2741 Section 6.1).

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{DecodeErrorKind, Error, Result};

use super::codec::ByteOrder;

/// Size of the fixed header.
pub const HEADER_LEN: usize = 20;

/// The only protocol version.
pub const AGENTX_VERSION: u8 = 1;

/// Header flag bits.
pub mod flags {
    /// Register a single instance rather than a subtree.
    pub const INSTANCE_REGISTRATION: u8 = 0x01;
    pub const NEW_INDEX: u8 = 0x02;
    pub const ANY_INDEX: u8 = 0x04;
    /// A context octet string follows the header.
    pub const NON_DEFAULT_CONTEXT: u8 = 0x08;
    /// Multi-byte fields are big-endian.
    pub const NETWORK_BYTE_ORDER: u8 = 0x10;
}

/// AgentX PDU type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PduType {
    Open = 1,
    Close = 2,
    Register = 3,
    Unregister = 4,
    Get = 5,
    GetNext = 6,
    GetBulk = 7,
    TestSet = 8,
    CommitSet = 9,
    UndoSet = 10,
    CleanupSet = 11,
    Notify = 12,
    Ping = 13,
    IndexAllocate = 14,
    IndexDeallocate = 15,
    AddAgentCaps = 16,
    RemoveAgentCaps = 17,
    Response = 18,
}

impl PduType {
    /// Look up a type code.
    pub fn from_u8(code: u8) -> Option<Self> {
        Some(match code {
            1 => Self::Open,
            2 => Self::Close,
            3 => Self::Register,
            4 => Self::Unregister,
            5 => Self::Get,
            6 => Self::GetNext,
            7 => Self::GetBulk,
            8 => Self::TestSet,
            9 => Self::CommitSet,
            10 => Self::UndoSet,
            11 => Self::CleanupSet,
            12 => Self::Notify,
            13 => Self::Ping,
            14 => Self::IndexAllocate,
            15 => Self::IndexDeallocate,
            16 => Self::AddAgentCaps,
            17 => Self::RemoveAgentCaps,
            18 => Self::Response,
            _ => return None,
        })
    }

    /// True for PDUs that may carry a non-default context.
    pub fn allows_context(self) -> bool {
        !matches!(
            self,
            Self::Open
                | Self::Close
                | Self::CommitSet
                | Self::UndoSet
                | Self::CleanupSet
                | Self::Response
        )
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Fixed AgentX header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub pdu_type: PduType,
    pub flags: u8,
    pub session_id: u32,
    pub transaction_id: u32,
    pub packet_id: u32,
    pub payload_length: u32,
}

impl Header {
    /// Create a header in network byte order with an empty payload.
    pub fn new(pdu_type: PduType, session_id: u32, transaction_id: u32, packet_id: u32) -> Self {
        Self {
            version: AGENTX_VERSION,
            pdu_type,
            flags: flags::NETWORK_BYTE_ORDER,
            session_id,
            transaction_id,
            packet_id,
            payload_length: 0,
        }
    }

    /// Byte order of the multi-byte fields.
    pub fn byte_order(&self) -> ByteOrder {
        ByteOrder::from_flags(self.flags)
    }

    /// True if a context string follows the header.
    pub fn has_context(&self) -> bool {
        self.flags & flags::NON_DEFAULT_CONTEXT != 0 && self.pdu_type.allows_context()
    }

    /// Decode the first [`HEADER_LEN`] bytes of `data`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::decode(
                0,
                DecodeErrorKind::InsufficientData {
                    needed: HEADER_LEN,
                    available: data.len(),
                },
            ));
        }
        let mut buf = &data[..HEADER_LEN];
        let version = buf.get_u8();
        if version != AGENTX_VERSION {
            return Err(Error::decode(0, DecodeErrorKind::AgentxHeader));
        }
        let type_code = buf.get_u8();
        let pdu_type = PduType::from_u8(type_code)
            .ok_or_else(|| Error::decode(1, DecodeErrorKind::AgentxPduType(type_code)))?;
        let flags = buf.get_u8();
        let _reserved = buf.get_u8();

        let order = ByteOrder::from_flags(flags);
        let mut word = || match order {
            ByteOrder::Network => buf.get_u32(),
            ByteOrder::Native => buf.get_u32_le(),
        };
        let session_id = word();
        let transaction_id = word();
        let packet_id = word();
        let payload_length = word();

        Ok(Self {
            version,
            pdu_type,
            flags,
            session_id,
            transaction_id,
            packet_id,
            payload_length,
        })
    }

    /// Append the header to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.version);
        buf.put_u8(self.pdu_type as u8);
        buf.put_u8(self.flags);
        buf.put_u8(0);
        for word in [
            self.session_id,
            self.transaction_id,
            self.packet_id,
            self.payload_length,
        ] {
            match self.byte_order() {
                ByteOrder::Network => buf.put_u32(word),
                ByteOrder::Native => buf.put_u32_le(word),
            }
        }
    }
}
