//! Variable binding (VarBind) type.
//!
//! A VarBind pairs an OID with a value.

use crate::ber::{Decoder, EncodeBuf, tlv_len};
use crate::error::{DecodeContext, DecodeErrorKind, Result};
use crate::oid::Oid;
use crate::value::Value;

/// Variable binding - an OID-value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    /// The object identifier.
    pub oid: Oid,
    /// The value.
    pub value: Value,
}

impl VarBind {
    /// Create a new VarBind.
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }

    /// Create a VarBind with a NULL value (for GET requests).
    pub fn null(oid: Oid) -> Self {
        Self {
            oid,
            value: Value::Null,
        }
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            self.value.encode(buf);
            buf.push_oid(&self.oid);
        });
    }

    /// Exact encoded size of this VarBind, computed without encoding.
    ///
    /// Used to keep GETBULK responses within the negotiated message size.
    pub fn encoded_len(&self) -> usize {
        tlv_len(self.content_len())
    }

    fn content_len(&self) -> usize {
        tlv_len(self.oid.ber_content_len()) + self.value.ber_len()
    }

    /// Decode from BER.
    ///
    /// Failures are labelled with the varbind field they occurred in. An OID
    /// over the arc limit reports `VarbindOidLength`; an oversized value
    /// reports `VarbindValueLength`.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut seq = decoder
            .read_sequence()
            .field(DecodeErrorKind::VarBindSeq)?;
        let oid = seq.read_oid().field_bounded(
            DecodeErrorKind::VarBindOidType,
            DecodeErrorKind::VarbindOidLength,
        )?;
        let value = Value::decode(&mut seq).field_bounded(
            DecodeErrorKind::VarBindValue,
            DecodeErrorKind::VarbindValueLength,
        )?;
        Ok(VarBind { oid, value })
    }
}

impl std::fmt::Display for VarBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.oid, self.value)
    }
}

/// Encode a list of VarBinds.
pub fn encode_varbind_list(buf: &mut EncodeBuf, varbinds: &[VarBind]) {
    buf.push_sequence(|buf| {
        // Encode in reverse order since we're using reverse buffer
        for vb in varbinds.iter().rev() {
            vb.encode(buf);
        }
    });
}

/// Encoded size of a varbind list SEQUENCE.
pub fn varbind_list_len(varbinds: &[VarBind]) -> usize {
    tlv_len(varbinds.iter().map(VarBind::encoded_len).sum())
}

/// Decode a list of VarBinds.
pub fn decode_varbind_list(decoder: &mut Decoder) -> Result<Vec<VarBind>> {
    let mut seq = decoder
        .read_sequence()
        .field(DecodeErrorKind::VarBindListSeq)?;
    let mut varbinds = Vec::new();

    while !seq.is_empty() {
        varbinds.push(VarBind::decode(&mut seq)?);
    }

    Ok(varbinds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::tag;
    use crate::oid;
    use bytes::Bytes;

    fn encode_list(varbinds: &[VarBind]) -> Bytes {
        let mut buf = EncodeBuf::new();
        encode_varbind_list(&mut buf, varbinds);
        buf.finish()
    }

    #[test]
    fn test_varbind_list_with_exceptions() {
        let varbinds = vec![
            VarBind::new(
                oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
                Value::OctetString(Bytes::from_static(b"Linux router")),
            ),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 99, 0), Value::NoSuchObject),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(123456)),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 100, 0), Value::EndOfMibView),
        ];

        let bytes = encode_list(&varbinds);
        assert_eq!(bytes.len(), varbind_list_len(&varbinds));
        let mut decoder = Decoder::new(bytes);
        let decoded = decode_varbind_list(&mut decoder).unwrap();

        assert_eq!(varbinds, decoded);
        assert!(decoded[1].value.is_exception());
        assert!(!decoded[2].value.is_exception());
    }

    #[test]
    fn test_varbind_list_empty() {
        let bytes = encode_list(&[]);
        assert_eq!(&bytes[..], &[0x30, 0x00]);
        let mut decoder = Decoder::new(bytes);
        assert!(decode_varbind_list(&mut decoder).unwrap().is_empty());
    }

    #[test]
    fn test_encoded_len_matches_for_large_values() {
        let vb = VarBind::new(
            oid!(1, 3, 6, 1, 4, 1, 99999, 1),
            Value::OctetString(Bytes::from(vec![b'x'; 300])),
        );
        let mut buf = EncodeBuf::new();
        vb.encode(&mut buf);
        assert_eq!(buf.len(), vb.encoded_len());
    }

    #[test]
    fn test_oid_with_65_arcs_reports_varbind_oid_length() {
        let arcs: Vec<u32> = std::iter::repeat_n(1, 65).collect();
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            buf.push_null();
            buf.push_oid(&Oid::from_slice(&arcs));
        });
        let mut decoder = Decoder::new(buf.finish());
        let err = VarBind::decode(&mut decoder).unwrap_err();
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::VarbindOidLength));
    }

    #[test]
    fn test_value_of_1025_bytes_reports_varbind_value_length() {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            buf.push_octet_string(&[0u8; 1025]);
            buf.push_oid(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0));
        });
        let mut decoder = Decoder::new(buf.finish());
        let err = VarBind::decode(&mut decoder).unwrap_err();
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::VarbindValueLength));
    }

    #[test]
    fn test_missing_oid_reports_oid_site() {
        let mut buf = EncodeBuf::new();
        buf.push_sequence(|buf| {
            buf.push_null();
            buf.push_integer(5);
        });
        let mut decoder = Decoder::new(buf.finish());
        let err = VarBind::decode(&mut decoder).unwrap_err();
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::VarBindOidType));
    }

    #[test]
    fn test_bad_list_tag_reports_list_site() {
        let mut decoder = Decoder::from_slice(&[tag::universal::OCTET_STRING, 0x00]);
        let err = decode_varbind_list(&mut decoder).unwrap_err();
        assert_eq!(err.decode_kind(), Some(DecodeErrorKind::VarBindListSeq));
    }

    #[test]
    fn test_varbind_display() {
        let vb = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::Integer(42));
        assert_eq!(vb.to_string(), "1.3.6.1.2.1.1.1.0 = 42");
        let vb = VarBind::null(oid!(1, 3, 6, 1));
        assert_eq!(vb.value, Value::Null);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_oid() -> impl Strategy<Value = Oid> {
            prop::collection::vec(any::<u32>(), 0..60).prop_map(|rest| {
                let mut oid = Oid::from_slice(&[1, 3, 6, 1]);
                oid.extend_from_slice(&rest);
                oid
            })
        }

        fn arb_value() -> impl Strategy<Value = Value> {
            prop_oneof![
                any::<i32>().prop_map(Value::Integer),
                prop::collection::vec(any::<u8>(), 0..=1024)
                    .prop_map(|v| Value::OctetString(Bytes::from(v))),
                Just(Value::Null),
                arb_oid().prop_map(Value::ObjectIdentifier),
                any::<[u8; 4]>().prop_map(Value::IpAddress),
                any::<u32>().prop_map(Value::Counter32),
                any::<u32>().prop_map(Value::Gauge32),
                any::<u32>().prop_map(Value::TimeTicks),
                any::<u64>().prop_map(Value::Counter64),
                Just(Value::NoSuchObject),
                Just(Value::NoSuchInstance),
                Just(Value::EndOfMibView),
            ]
        }

        proptest! {
            #[test]
            fn test_encoded_len_matches_encoding(oid in arb_oid(), value in arb_value()) {
                let vb = VarBind::new(oid, value);
                let mut buf = EncodeBuf::new();
                vb.encode(&mut buf);
                prop_assert_eq!(vb.encoded_len(), buf.len());

                let mut decoder = Decoder::new(buf.finish());
                prop_assert_eq!(VarBind::decode(&mut decoder).unwrap(), vb);
            }
        }
    }
}
