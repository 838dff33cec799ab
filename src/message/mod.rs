//! SNMP message wrappers.
//!
//! Messages encapsulate PDUs with version and authentication information.
//!
//! # Message Types
//!
//! - [`CommunityMessage`] - V1/V2c messages with community string
//! - [`V3Message`] - V3 messages with USM framing (no crypto)

mod community;
mod v3;

pub use community::{CommunityMessage, MAX_COMMUNITY_LEN};
pub use v3::{
    HeaderData, MAX_AUTH_PARAMS_LEN, MAX_CONTEXT_ENGINE_ID_LEN, MAX_CONTEXT_NAME_LEN,
    MAX_ENGINE_ID_LEN, MAX_PRIV_PARAMS_LEN, MAX_USER_NAME_LEN, ScopedPdu, USM_SECURITY_MODEL,
    UsmSecurityParams, V3Message, flags,
};

use crate::ber::{Decoder, tag};
use crate::error::{DecodeContext, DecodeErrorKind, Error, Result};
use crate::pdu::Pdu;
use crate::version::Version;
use bytes::Bytes;

/// Decoded SNMP message (any version).
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// SNMPv1 or SNMPv2c message with community string
    Community(CommunityMessage),
    /// SNMPv3 message
    V3(V3Message),
}

impl Message {
    /// Get a reference to the PDU.
    pub fn pdu(&self) -> &Pdu {
        match self {
            Message::Community(m) => &m.pdu,
            Message::V3(m) => m.pdu(),
        }
    }

    /// Get the SNMP version.
    pub fn version(&self) -> Version {
        match self {
            Message::Community(m) => m.version,
            Message::V3(_) => Version::V3,
        }
    }

    /// Encode to BER.
    pub fn encode(&self) -> Bytes {
        match self {
            Message::Community(m) => m.encode(),
            Message::V3(m) => m.encode(),
        }
    }

    /// Encoded size, computed without encoding.
    pub fn encoded_len(&self) -> usize {
        match self {
            Message::Community(m) => m.encoded_len(),
            Message::V3(m) => m.encoded_len(),
        }
    }

    /// Encoded size with a varbind list of `varbind_content_len` content bytes.
    pub fn encoded_len_with(&self, varbind_content_len: usize) -> usize {
        match self {
            Message::Community(m) => m.encoded_len_with(varbind_content_len),
            Message::V3(m) => m.encoded_len_with(varbind_content_len),
        }
    }

    /// Replace the PDU, keeping the framing.
    pub fn with_pdu(self, pdu: Pdu) -> Self {
        match self {
            Message::Community(mut m) => {
                m.pdu = pdu;
                Message::Community(m)
            }
            Message::V3(mut m) => {
                m.scoped_pdu.pdu = pdu;
                Message::V3(m)
            }
        }
    }

    /// Decode a message from a complete datagram.
    ///
    /// The outer tag must be SEQUENCE and its length must account for every
    /// byte of `data`.
    pub fn decode(data: Bytes) -> Result<Self> {
        let mut decoder = Decoder::new(data);
        if decoder.peek_tag() != Some(tag::universal::SEQUENCE) {
            return Err(Error::decode(0, DecodeErrorKind::PduType));
        }
        let mut seq = decoder.read_sequence().field(DecodeErrorKind::PduLength)?;
        if !decoder.is_empty() {
            return Err(Error::decode(
                decoder.offset(),
                DecodeErrorKind::TrailingData {
                    extra: decoder.remaining(),
                },
            ));
        }

        let version_offset = seq.offset();
        let version_num = seq.read_integer().field(DecodeErrorKind::Version)?;
        let version = Version::from_i32(version_num)
            .ok_or_else(|| Error::decode(version_offset, DecodeErrorKind::Version))?;

        match version {
            Version::V1 | Version::V2c => {
                let msg = CommunityMessage::decode_from_sequence(&mut seq, version)?;
                Ok(Message::Community(msg))
            }
            Version::V3 => {
                let msg = V3Message::decode_from_sequence(&mut seq)?;
                Ok(Message::V3(msg))
            }
        }
    }
}

impl From<CommunityMessage> for Message {
    fn from(msg: CommunityMessage) -> Self {
        Message::Community(msg)
    }
}

impl From<V3Message> for Message {
    fn from(msg: V3Message) -> Self {
        Message::V3(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::pdu::PduType;
    use crate::varbind::VarBind;

    fn get_v2c() -> CommunityMessage {
        CommunityMessage::new(
            Version::V2c,
            Bytes::from_static(b"public"),
            Pdu::request(
                PduType::GetRequest,
                42,
                vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0))],
            ),
        )
    }

    #[test]
    fn test_community_roundtrip() {
        let msg = get_v2c();
        let bytes = msg.encode();
        assert_eq!(bytes.len(), msg.encoded_len());
        let decoded = Message::decode(bytes).unwrap();
        assert_eq!(decoded.version(), Version::V2c);
        assert_eq!(decoded, Message::Community(msg));
    }

    #[test]
    fn test_outer_tag_must_be_sequence() {
        let mut bytes = get_v2c().encode().to_vec();
        bytes[0] = 0x31;
        let err = Message::decode(Bytes::from(bytes)).unwrap_err();
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::PduType));
    }

    #[test]
    fn test_outer_length_must_match_datagram() {
        let mut bytes = get_v2c().encode().to_vec();
        bytes.push(0x00);
        assert!(matches!(
            Message::decode(Bytes::from(bytes.clone())).unwrap_err().decode_kind(),
            Some(DecodeErrorKind::TrailingData { extra: 1 })
        ));

        bytes.truncate(bytes.len() - 2);
        assert_eq!(
            Message::decode(Bytes::from(bytes)).unwrap_err().decode_kind(),
            Some(DecodeErrorKind::PduLength)
        );
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut msg = get_v2c();
        msg.version = Version::V1;
        let mut bytes = msg.encode().to_vec();
        // version INTEGER content byte follows 30 LL 02 01
        bytes[4] = 2;
        let err = Message::decode(Bytes::from(bytes)).unwrap_err();
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::Version));
    }

    #[test]
    fn test_community_over_40_bytes_rejected() {
        let mut msg = get_v2c();
        msg.community = Bytes::from(vec![b'x'; MAX_COMMUNITY_LEN + 1]);
        let err = Message::decode(msg.encode()).unwrap_err();
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::ContextNameLength));
    }

    #[test]
    fn test_encoded_len_with_tracks_length_prefix_growth() {
        let msg = Message::Community(get_v2c());
        // Push the varbind list past the short-form length boundary
        let big = msg.with_pdu(Pdu::request(
            PduType::Response,
            42,
            vec![VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), "x".repeat(200).into())],
        ));
        let content = big.pdu().varbinds[0].encoded_len();
        assert_eq!(big.encoded_len_with(content), big.encode().len());
    }
}
