//! SNMP value types.
//!
//! The `Value` enum represents every type the agent accepts on the wire plus
//! the three exception markers that only ever appear in results.

use crate::ber::{Decoder, EncodeBuf, integer_len, integer64_len, tag, tlv_len, unsigned32_len};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// Maximum length of an OCTET STRING or Opaque payload.
///
/// Checked against the declared length before any content is read.
pub const MAX_VALUE_LEN: usize = 1024;

/// Type tag of a [`Value`].
///
/// The numeric codes are the BER tags. AgentX varbind type codes use the
/// same numbers as 16-bit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueTag {
    Integer = tag::universal::INTEGER,
    OctetString = tag::universal::OCTET_STRING,
    Null = tag::universal::NULL,
    ObjectIdentifier = tag::universal::OBJECT_IDENTIFIER,
    IpAddress = tag::application::IP_ADDRESS,
    Counter32 = tag::application::COUNTER32,
    Gauge32 = tag::application::GAUGE32,
    TimeTicks = tag::application::TIMETICKS,
    Opaque = tag::application::OPAQUE,
    Counter64 = tag::application::COUNTER64,
    NoSuchObject = tag::context::NO_SUCH_OBJECT,
    NoSuchInstance = tag::context::NO_SUCH_INSTANCE,
    EndOfMibView = tag::context::END_OF_MIB_VIEW,
}

impl ValueTag {
    /// Look up a tag code.
    pub fn from_code(code: u16) -> Option<Self> {
        let Ok(code) = u8::try_from(code) else {
            return None;
        };
        Some(match code {
            tag::universal::INTEGER => Self::Integer,
            tag::universal::OCTET_STRING => Self::OctetString,
            tag::universal::NULL => Self::Null,
            tag::universal::OBJECT_IDENTIFIER => Self::ObjectIdentifier,
            tag::application::IP_ADDRESS => Self::IpAddress,
            tag::application::COUNTER32 => Self::Counter32,
            tag::application::GAUGE32 => Self::Gauge32,
            tag::application::TIMETICKS => Self::TimeTicks,
            tag::application::OPAQUE => Self::Opaque,
            tag::application::COUNTER64 => Self::Counter64,
            tag::context::NO_SUCH_OBJECT => Self::NoSuchObject,
            tag::context::NO_SUCH_INSTANCE => Self::NoSuchInstance,
            tag::context::END_OF_MIB_VIEW => Self::EndOfMibView,
            _ => return None,
        })
    }

    /// The numeric tag code.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// True for the three result-only markers.
    pub const fn is_exception(self) -> bool {
        tag::is_exception(self as u8)
    }
}

/// SNMP value.
///
/// Represents all SNMP data types including SMIv2 types and exception values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// INTEGER (ASN.1 primitive, signed 32-bit)
    Integer(i32),
    /// OCTET STRING, at most [`MAX_VALUE_LEN`] bytes.
    OctetString(Bytes),
    /// NULL
    Null,
    /// OBJECT IDENTIFIER
    ObjectIdentifier(Oid),
    /// IpAddress (4 bytes, big-endian)
    IpAddress([u8; 4]),
    /// Counter32 (unsigned 32-bit, wrapping)
    Counter32(u32),
    /// Gauge32 / Unsigned32 (unsigned 32-bit, non-wrapping)
    Gauge32(u32),
    /// TimeTicks (hundredths of seconds)
    TimeTicks(u32),
    /// Opaque (legacy, arbitrary bytes)
    Opaque(Bytes),
    /// Counter64 (unsigned 64-bit, wrapping). Not valid in SNMPv1.
    Counter64(u64),
    /// The object does not exist.
    NoSuchObject,
    /// The object exists but the instance does not.
    NoSuchInstance,
    /// No object follows the requested OID in the view.
    EndOfMibView,
}

impl Value {
    /// The value's type tag.
    pub fn tag(&self) -> ValueTag {
        match self {
            Value::Integer(_) => ValueTag::Integer,
            Value::OctetString(_) => ValueTag::OctetString,
            Value::Null => ValueTag::Null,
            Value::ObjectIdentifier(_) => ValueTag::ObjectIdentifier,
            Value::IpAddress(_) => ValueTag::IpAddress,
            Value::Counter32(_) => ValueTag::Counter32,
            Value::Gauge32(_) => ValueTag::Gauge32,
            Value::TimeTicks(_) => ValueTag::TimeTicks,
            Value::Opaque(_) => ValueTag::Opaque,
            Value::Counter64(_) => ValueTag::Counter64,
            Value::NoSuchObject => ValueTag::NoSuchObject,
            Value::NoSuchInstance => ValueTag::NoSuchInstance,
            Value::EndOfMibView => ValueTag::EndOfMibView,
        }
    }

    /// Try to get as i32.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u32 (Counter32, Gauge32, TimeTicks, or non-negative Integer).
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v),
            Value::Integer(v) if *v >= 0 => Some(*v as u32),
            _ => None,
        }
    }

    /// Try to get as bytes (OctetString or Opaque).
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(data) | Value::Opaque(data) => Some(data),
            _ => None,
        }
    }

    /// Try to get as UTF-8 string.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Try to get as OID.
    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    /// Check if this is an exception value (NoSuchObject, NoSuchInstance, EndOfMibView).
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        match self {
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(data) => buf.push_octet_string(data),
            Value::Null => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_ip_address(*addr),
            Value::Counter32(v) => buf.push_unsigned32(tag::application::COUNTER32, *v),
            Value::Gauge32(v) => buf.push_unsigned32(tag::application::GAUGE32, *v),
            Value::TimeTicks(v) => buf.push_unsigned32(tag::application::TIMETICKS, *v),
            Value::Opaque(data) => buf.push_primitive(tag::application::OPAQUE, data),
            Value::Counter64(v) => buf.push_integer64(*v),
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {
                buf.push_length(0);
                buf.push_tag(self.tag().code());
            }
        }
    }

    /// Encoded BER size, computed without encoding.
    pub fn ber_len(&self) -> usize {
        match self {
            Value::Integer(v) => integer_len(*v),
            Value::OctetString(data) | Value::Opaque(data) => tlv_len(data.len()),
            Value::Null | Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => 2,
            Value::ObjectIdentifier(oid) => tlv_len(oid.ber_content_len()),
            Value::IpAddress(_) => tlv_len(4),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => unsigned32_len(*v),
            Value::Counter64(v) => integer64_len(*v),
        }
    }

    /// Decode from BER.
    ///
    /// Octet strings and opaques longer than [`MAX_VALUE_LEN`] fail with
    /// `ValueTooLong` before their content is read.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let tag_offset = decoder.offset();
        let tag = decoder.read_tag()?;
        if tag == tag::universal::OCTET_STRING_CONSTRUCTED {
            return Err(Error::decode(
                tag_offset,
                DecodeErrorKind::ConstructedOctetString,
            ));
        }
        let len = decoder.read_length()?;

        match tag {
            tag::universal::INTEGER => Ok(Value::Integer(decoder.read_integer_value(len)?)),
            tag::universal::OCTET_STRING => {
                Ok(Value::OctetString(read_bounded(decoder, len)?))
            }
            tag::universal::NULL => {
                if len != 0 {
                    return Err(Error::decode(
                        decoder.offset(),
                        DecodeErrorKind::InvalidNull,
                    ));
                }
                Ok(Value::Null)
            }
            tag::universal::OBJECT_IDENTIFIER => {
                Ok(Value::ObjectIdentifier(decoder.read_oid_value(len)?))
            }
            tag::application::IP_ADDRESS => {
                if len != 4 {
                    return Err(Error::decode(
                        decoder.offset(),
                        DecodeErrorKind::InvalidIpAddressLength { length: len },
                    ));
                }
                let data = decoder.read_bytes(4)?;
                Ok(Value::IpAddress([data[0], data[1], data[2], data[3]]))
            }
            tag::application::COUNTER32 => {
                Ok(Value::Counter32(decoder.read_unsigned32_value(len)?))
            }
            tag::application::GAUGE32 => Ok(Value::Gauge32(decoder.read_unsigned32_value(len)?)),
            tag::application::TIMETICKS => {
                Ok(Value::TimeTicks(decoder.read_unsigned32_value(len)?))
            }
            tag::application::OPAQUE => Ok(Value::Opaque(read_bounded(decoder, len)?)),
            tag::application::COUNTER64 => {
                Ok(Value::Counter64(decoder.read_integer64_value(len)?))
            }
            tag::context::NO_SUCH_OBJECT
            | tag::context::NO_SUCH_INSTANCE
            | tag::context::END_OF_MIB_VIEW => {
                decoder.read_bytes(len)?;
                Ok(match tag {
                    tag::context::NO_SUCH_OBJECT => Value::NoSuchObject,
                    tag::context::NO_SUCH_INSTANCE => Value::NoSuchInstance,
                    _ => Value::EndOfMibView,
                })
            }
            other => Err(Error::decode(
                tag_offset,
                DecodeErrorKind::UnknownValueTag(u16::from(other)),
            )),
        }
    }
}

fn read_bounded(decoder: &mut Decoder, len: usize) -> Result<Bytes> {
    if len > MAX_VALUE_LEN {
        return Err(Error::decode(
            decoder.offset(),
            DecodeErrorKind::ValueTooLong {
                length: len,
                max: MAX_VALUE_LEN,
            },
        ));
    }
    decoder.read_bytes(len)
}

struct Hex<'a>(&'a [u8]);

impl std::fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(data) => match std::str::from_utf8(data) {
                Ok(s) => write!(f, "{}", s),
                Err(_) => write!(f, "0x{}", Hex(data)),
            },
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress(addr) => {
                write!(f, "{}.{}.{}.{}", addr[0], addr[1], addr[2], addr[3])
            }
            Value::Counter32(v) | Value::Gauge32(v) => write!(f, "{}", v),
            Value::TimeTicks(v) => {
                let secs = v / 100;
                let days = secs / 86400;
                let hours = (secs % 86400) / 3600;
                let mins = (secs % 3600) / 60;
                let s = secs % 60;
                write!(f, "{}d {}h {}m {}s", days, hours, mins, s)
            }
            Value::Opaque(data) => write!(f, "Opaque(0x{})", Hex(data)),
            Value::Counter64(v) => write!(f, "{}", v),
            Value::NoSuchObject => write!(f, "noSuchObject"),
            Value::NoSuchInstance => write!(f, "noSuchInstance"),
            Value::EndOfMibView => write!(f, "endOfMibView"),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::OctetString(Bytes::from(s))
    }
}

impl From<&[u8]> for Value {
    fn from(data: &[u8]) -> Self {
        Value::OctetString(Bytes::copy_from_slice(data))
    }
}

impl From<Bytes> for Value {
    fn from(data: Bytes) -> Self {
        Value::OctetString(data)
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Counter64(v)
    }
}

impl From<[u8; 4]> for Value {
    fn from(addr: [u8; 4]) -> Self {
        Value::IpAddress(addr)
    }
}

impl From<std::net::Ipv4Addr> for Value {
    fn from(addr: std::net::Ipv4Addr) -> Self {
        Value::IpAddress(addr.octets())
    }
}
