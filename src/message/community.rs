//! Community-based SNMP message format (v1/v2c).
//!
//! V1 and V2c messages share the same structure:
//! `SEQUENCE { version INTEGER, community OCTET STRING, pdu PDU }`
//!
//! The only difference is the version number (0 for v1, 1 for v2c).

use crate::ber::{Decoder, EncodeBuf, integer_len, tlv_len};
use crate::error::{DecodeContext, DecodeErrorKind, Result};
use crate::pdu::Pdu;
use crate::version::Version;
use bytes::Bytes;

/// Maximum community string length.
pub const MAX_COMMUNITY_LEN: usize = 40;

/// Community-based SNMP message (v1/v2c).
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityMessage {
    /// SNMP version (V1 or V2c)
    pub version: Version,
    /// Community string
    pub community: Bytes,
    /// Protocol data unit
    pub pdu: Pdu,
}

impl CommunityMessage {
    /// Create a new community message.
    pub fn new(version: Version, community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            version,
            community: community.into(),
            pdu,
        }
    }

    /// Encode into an existing buffer.
    pub fn encode_to(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.community);
            buf.push_integer(self.version.as_i32());
        });
    }

    /// Encode to BER.
    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::with_capacity(self.encoded_len());
        self.encode_to(&mut buf);
        buf.finish()
    }

    /// Encoded size, computed without encoding.
    pub fn encoded_len(&self) -> usize {
        self.wrap_len(self.pdu.encoded_len())
    }

    /// Encoded size with a varbind list of `varbind_content_len` content bytes.
    pub fn encoded_len_with(&self, varbind_content_len: usize) -> usize {
        self.wrap_len(self.pdu.encoded_len_with(varbind_content_len))
    }

    fn wrap_len(&self, pdu_len: usize) -> usize {
        tlv_len(integer_len(self.version.as_i32()) + tlv_len(self.community.len()) + pdu_len)
    }

    /// Decode the fields following the version.
    pub(crate) fn decode_from_sequence(seq: &mut Decoder, version: Version) -> Result<Self> {
        let community = seq
            .read_octet_string_bounded(MAX_COMMUNITY_LEN, DecodeErrorKind::ContextNameLength)
            .field(DecodeErrorKind::Community)?;
        let pdu = Pdu::decode(seq)?;

        Ok(CommunityMessage {
            version,
            community,
            pdu,
        })
    }

    /// Consume and return the PDU.
    pub fn into_pdu(self) -> Pdu {
        self.pdu
    }
}
