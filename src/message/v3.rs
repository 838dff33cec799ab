//! SNMPv3 message format (RFC 3412) with USM framing.
//!
//! ```text
//! SEQUENCE {
//!     INTEGER version (3)
//!     SEQUENCE msgGlobalData {
//!         INTEGER msgID
//!         INTEGER msgMaxSize
//!         OCTET STRING msgFlags (1 byte)
//!         INTEGER msgSecurityModel
//!     }
//!     OCTET STRING msgSecurityParameters (wrapping a USM SEQUENCE)
//!     SEQUENCE ScopedPDU { contextEngineID, contextName, PDU }
//! }
//! ```
//!
//! Only plaintext scoped PDUs are understood. An encrypted scoped PDU
//! arrives as an OCTET STRING and fails with `ScopedPduSeq`.

use bytes::Bytes;

use crate::ber::{Decoder, EncodeBuf, integer_len, tag, tlv_len, unsigned32_len};
use crate::error::{DecodeContext, DecodeErrorKind, Error, Result};
use crate::pdu::Pdu;
use crate::version::Version;

/// User-based Security Model number.
pub const USM_SECURITY_MODEL: i32 = 3;

/// Maximum engine id length.
pub const MAX_ENGINE_ID_LEN: usize = 32;
/// Maximum USM user name length.
pub const MAX_USER_NAME_LEN: usize = 40;
/// Maximum authentication parameters length.
pub const MAX_AUTH_PARAMS_LEN: usize = 40;
/// Maximum privacy parameters length.
pub const MAX_PRIV_PARAMS_LEN: usize = 40;
/// Maximum context engine id length.
pub const MAX_CONTEXT_ENGINE_ID_LEN: usize = 32;
/// Maximum context name length.
pub const MAX_CONTEXT_NAME_LEN: usize = 40;

/// msgFlags bits.
pub mod flags {
    pub const AUTH: u8 = 0x01;
    pub const PRIV: u8 = 0x02;
    pub const REPORTABLE: u8 = 0x04;
}

/// Message global data header (msgGlobalData).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderData {
    /// Message identifier for request/response correlation
    pub msg_id: i32,
    /// Maximum message size the sender can accept
    pub msg_max_size: i32,
    /// Raw msgFlags byte
    pub msg_flags: u8,
    /// Security model (USM = 3)
    pub msg_security_model: i32,
}

impl HeaderData {
    /// Create a USM header.
    pub fn new(msg_id: i32, msg_max_size: i32, msg_flags: u8) -> Self {
        Self {
            msg_id,
            msg_max_size,
            msg_flags,
            msg_security_model: USM_SECURITY_MODEL,
        }
    }

    /// True if the sender asked for privacy.
    pub fn is_encrypted(&self) -> bool {
        self.msg_flags & flags::PRIV != 0
    }

    fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            buf.push_integer(self.msg_security_model);
            buf.push_octet_string(&[self.msg_flags]);
            buf.push_integer(self.msg_max_size);
            buf.push_integer(self.msg_id);
        });
    }

    fn encoded_len(&self) -> usize {
        tlv_len(
            integer_len(self.msg_id)
                + integer_len(self.msg_max_size)
                + tlv_len(1)
                + integer_len(self.msg_security_model),
        )
    }

    fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut seq = decoder
            .read_sequence()
            .field(DecodeErrorKind::GlobalDataSeq)?;

        let msg_id = seq.read_integer().field(DecodeErrorKind::GlobalId)?;
        let msg_max_size = seq.read_integer().field(DecodeErrorKind::GlobalSize)?;

        let flags_offset = seq.offset();
        let flag_bytes = seq
            .read_octet_string()
            .field(DecodeErrorKind::GlobalFlags)?;
        let Some(&msg_flags) = flag_bytes.first() else {
            return Err(Error::decode(flags_offset, DecodeErrorKind::GlobalFlags));
        };

        let model_offset = seq.offset();
        let msg_security_model = seq.read_integer().field(DecodeErrorKind::GlobalModel)?;
        if msg_security_model != USM_SECURITY_MODEL {
            return Err(Error::decode(model_offset, DecodeErrorKind::GlobalModel));
        }

        Ok(Self {
            msg_id,
            msg_max_size,
            msg_flags,
            msg_security_model,
        })
    }
}

/// USM security parameters (RFC 3414 Section 2.4).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UsmSecurityParams {
    /// Authoritative engine ID
    pub engine_id: Bytes,
    /// Engine boot count
    pub engine_boots: u32,
    /// Engine time (seconds since last boot)
    pub engine_time: u32,
    /// User name
    pub user_name: Bytes,
    /// Authentication parameters
    pub auth_params: Bytes,
    /// Privacy parameters
    pub priv_params: Bytes,
}

impl UsmSecurityParams {
    fn encode_inner(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            buf.push_octet_string(&self.priv_params);
            buf.push_octet_string(&self.auth_params);
            buf.push_octet_string(&self.user_name);
            buf.push_unsigned32(tag::universal::INTEGER, self.engine_time);
            buf.push_unsigned32(tag::universal::INTEGER, self.engine_boots);
            buf.push_octet_string(&self.engine_id);
        });
    }

    fn inner_len(&self) -> usize {
        tlv_len(
            tlv_len(self.engine_id.len())
                + unsigned32_len(self.engine_boots)
                + unsigned32_len(self.engine_time)
                + tlv_len(self.user_name.len())
                + tlv_len(self.auth_params.len())
                + tlv_len(self.priv_params.len()),
        )
    }

    /// Encode as the msgSecurityParameters OCTET STRING.
    fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(tag::universal::OCTET_STRING, |buf| self.encode_inner(buf));
    }

    fn encoded_len(&self) -> usize {
        tlv_len(self.inner_len())
    }

    fn decode(decoder: &mut Decoder) -> Result<Self> {
        let len = decoder
            .expect_tag(tag::universal::OCTET_STRING)
            .field(DecodeErrorKind::SecurityParams)?;
        let mut wrapped = decoder
            .sub_decoder(len)
            .field(DecodeErrorKind::SecurityParams)?;
        let mut seq = wrapped
            .read_sequence()
            .field(DecodeErrorKind::SecuritySeq)?;

        let engine_id = seq
            .read_octet_string_bounded(MAX_ENGINE_ID_LEN, DecodeErrorKind::EngineIdLength)
            .field(DecodeErrorKind::EngineId)?;
        let engine_boots = seq.read_integer().field(DecodeErrorKind::EngineBoots)?;
        let engine_time = seq.read_integer().field(DecodeErrorKind::EngineTime)?;
        let user_name = seq
            .read_octet_string_bounded(MAX_USER_NAME_LEN, DecodeErrorKind::UserNameLength)
            .field(DecodeErrorKind::UserName)?;
        let auth_params = seq
            .read_octet_string_bounded(MAX_AUTH_PARAMS_LEN, DecodeErrorKind::AuthParamsLength)
            .field(DecodeErrorKind::AuthParams)?;
        let priv_params = seq
            .read_octet_string_bounded(MAX_PRIV_PARAMS_LEN, DecodeErrorKind::PrivParamsLength)
            .field(DecodeErrorKind::PrivParams)?;

        Ok(Self {
            engine_id,
            engine_boots: engine_boots.max(0) as u32,
            engine_time: engine_time.max(0) as u32,
            user_name,
            auth_params,
            priv_params,
        })
    }
}

/// Scoped PDU (contextEngineID + contextName + PDU).
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedPdu {
    /// Context engine ID
    pub context_engine_id: Bytes,
    /// Context name
    pub context_name: Bytes,
    /// The PDU
    pub pdu: Pdu,
}

impl ScopedPdu {
    /// Create a new scoped PDU.
    pub fn new(
        context_engine_id: impl Into<Bytes>,
        context_name: impl Into<Bytes>,
        pdu: Pdu,
    ) -> Self {
        Self {
            context_engine_id: context_engine_id.into(),
            context_name: context_name.into(),
            pdu,
        }
    }

    fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.context_name);
            buf.push_octet_string(&self.context_engine_id);
        });
    }

    fn wrap_len(&self, pdu_len: usize) -> usize {
        tlv_len(tlv_len(self.context_engine_id.len()) + tlv_len(self.context_name.len()) + pdu_len)
    }

    fn decode(decoder: &mut Decoder) -> Result<Self> {
        if decoder.peek_tag() == Some(tag::universal::OCTET_STRING) {
            tracing::debug!(target: "smart_snmp::ber", { snmp.offset = decoder.offset() }, "encrypted scoped PDU not supported");
        }
        let mut seq = decoder
            .read_sequence()
            .field(DecodeErrorKind::ScopedPduSeq)?;

        let context_engine_id = seq
            .read_octet_string_bounded(MAX_CONTEXT_ENGINE_ID_LEN, DecodeErrorKind::ContextIdLength)
            .field(DecodeErrorKind::ContextEngineId)?;
        let context_name = seq
            .read_octet_string_bounded(MAX_CONTEXT_NAME_LEN, DecodeErrorKind::ContextNameLength)
            .field(DecodeErrorKind::ContextName)?;
        let pdu = Pdu::decode(&mut seq)?;

        Ok(Self {
            context_engine_id,
            context_name,
            pdu,
        })
    }
}

/// SNMPv3 message.
#[derive(Debug, Clone, PartialEq)]
pub struct V3Message {
    /// Global data (header)
    pub header: HeaderData,
    /// USM security parameters
    pub security: UsmSecurityParams,
    /// Plaintext scoped PDU
    pub scoped_pdu: ScopedPdu,
}

impl V3Message {
    /// Create a new V3 message.
    pub fn new(header: HeaderData, security: UsmSecurityParams, scoped_pdu: ScopedPdu) -> Self {
        Self {
            header,
            security,
            scoped_pdu,
        }
    }

    /// The PDU.
    pub fn pdu(&self) -> &Pdu {
        &self.scoped_pdu.pdu
    }

    /// Encode into an existing buffer.
    pub fn encode_to(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            self.scoped_pdu.encode(buf);
            self.security.encode(buf);
            self.header.encode(buf);
            buf.push_integer(Version::V3.as_i32());
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
        self.wrap_len(self.scoped_pdu.pdu.encoded_len())
    }

    /// Encoded size with a varbind list of `varbind_content_len` content bytes.
    pub fn encoded_len_with(&self, varbind_content_len: usize) -> usize {
        self.wrap_len(self.scoped_pdu.pdu.encoded_len_with(varbind_content_len))
    }

    fn wrap_len(&self, pdu_len: usize) -> usize {
        tlv_len(
            integer_len(Version::V3.as_i32())
                + self.header.encoded_len()
                + self.security.encoded_len()
                + self.scoped_pdu.wrap_len(pdu_len),
        )
    }

    /// Decode the fields following the version.
    pub(crate) fn decode_from_sequence(seq: &mut Decoder) -> Result<Self> {
        let header = HeaderData::decode(seq)?;
        let security = UsmSecurityParams::decode(seq)?;
        let scoped_pdu = ScopedPdu::decode(seq)?;
        Ok(Self {
            header,
            security,
            scoped_pdu,
        })
    }
}
