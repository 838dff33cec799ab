//! AgentX field encoding (RFC 2741 Section 5).
//!
//! Integers are fixed width in the byte order the header selects. OIDs
//! carry a 4-byte preamble and may drop a leading `1.3.6.1.<prefix>`.
//! Octet strings are length prefixed and padded to a 4-byte boundary.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::{INTERNET, MAX_OID_LEN, Oid};
use crate::value::{MAX_VALUE_LEN, Value, ValueTag};
use crate::varbind::VarBind;

use super::header::flags;

/// Byte order of multi-byte fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Big-endian, flagged by `NETWORK_BYTE_ORDER`.
    #[default]
    Network,
    /// Little-endian.
    Native,
}

impl ByteOrder {
    /// Byte order selected by header flags.
    pub fn from_flags(header_flags: u8) -> Self {
        if header_flags & flags::NETWORK_BYTE_ORDER != 0 {
            Self::Network
        } else {
            Self::Native
        }
    }

    /// The matching header flag bit.
    pub fn flag(self) -> u8 {
        match self {
            Self::Network => flags::NETWORK_BYTE_ORDER,
            Self::Native => 0,
        }
    }
}

/// Padding after `len` bytes to reach a 4-byte boundary.
fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

/// Cursor over an AgentX payload.
///
/// Offsets in errors count from the start of the PDU.
pub struct Reader {
    buf: Bytes,
    offset: usize,
    order: ByteOrder,
}

impl Reader {
    /// Read `buf`, whose first byte sits at `offset` within the PDU.
    pub fn new(buf: Bytes, order: ByteOrder, offset: usize) -> Self {
        Self { buf, offset, order }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn need(&self, n: usize) -> Result<()> {
        if self.buf.len() < n {
            return Err(Error::decode(
                self.offset,
                DecodeErrorKind::InsufficientData {
                    needed: n,
                    available: self.buf.len(),
                },
            ));
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.need(1)?;
        self.offset += 1;
        Ok(self.buf.get_u8())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.need(2)?;
        self.offset += 2;
        Ok(match self.order {
            ByteOrder::Network => self.buf.get_u16(),
            ByteOrder::Native => self.buf.get_u16_le(),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.need(4)?;
        self.offset += 4;
        Ok(match self.order {
            ByteOrder::Network => self.buf.get_u32(),
            ByteOrder::Native => self.buf.get_u32_le(),
        })
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.need(8)?;
        self.offset += 8;
        Ok(match self.order {
            ByteOrder::Network => self.buf.get_u64(),
            ByteOrder::Native => self.buf.get_u64_le(),
        })
    }

    /// Skip reserved bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.need(n)?;
        self.offset += n;
        self.buf.advance(n);
        Ok(())
    }

    /// Take the rest of the payload.
    pub fn read_rest(&mut self) -> Bytes {
        self.offset += self.buf.len();
        std::mem::take(&mut self.buf)
    }

    /// Read an OID and its `include` flag.
    ///
    /// The arc count, including an expanded prefix, is checked against
    /// [`MAX_OID_LEN`] before any sub-identifier is read; a violation is
    /// reported as `bound`.
    pub fn read_oid(&mut self, bound: DecodeErrorKind) -> Result<(Oid, bool)> {
        let start = self.offset;
        let n_subid = self.read_u8()? as usize;
        let prefix = self.read_u8()?;
        let include = self.read_u8()? != 0;
        let _reserved = self.read_u8()?;

        let prefix_len = if prefix != 0 { INTERNET.len() + 1 } else { 0 };
        if prefix_len + n_subid > MAX_OID_LEN {
            tracing::debug!(target: "smart_snmp::agentx", { snmp.offset = start, n_subid, prefix }, "OID exceeds arc limit");
            return Err(Error::decode(start, bound));
        }
        self.need(n_subid * 4)?;

        let mut arcs = Vec::with_capacity(prefix_len + n_subid);
        if prefix != 0 {
            arcs.extend_from_slice(&INTERNET);
            arcs.push(u32::from(prefix));
        }
        for _ in 0..n_subid {
            arcs.push(self.read_u32()?);
        }
        Ok((Oid::new(arcs), include))
    }

    /// Read a length-prefixed, padded octet string of at most `max` bytes.
    pub fn read_octet_string(&mut self, max: usize, bound: DecodeErrorKind) -> Result<Bytes> {
        let start = self.offset;
        let len = self.read_u32()? as usize;
        if len > max {
            tracing::debug!(target: "smart_snmp::agentx", { snmp.offset = start, len, max }, "octet string exceeds bound");
            return Err(Error::decode(start, bound));
        }
        let pad = padding(len);
        self.need(len + pad)?;
        let data = self.buf.split_to(len);
        self.buf.advance(pad);
        self.offset += len + pad;
        Ok(data)
    }

    /// Read the data of a value of type `code`.
    pub fn read_value(&mut self, code: u16) -> Result<Value> {
        let start = self.offset;
        let tag = ValueTag::from_code(code)
            .ok_or_else(|| Error::decode(start, DecodeErrorKind::UnknownValueTag(code)))?;
        Ok(match tag {
            ValueTag::Integer => Value::Integer(self.read_u32()? as i32),
            ValueTag::Counter32 => Value::Counter32(self.read_u32()?),
            ValueTag::Gauge32 => Value::Gauge32(self.read_u32()?),
            ValueTag::TimeTicks => Value::TimeTicks(self.read_u32()?),
            ValueTag::Counter64 => Value::Counter64(self.read_u64()?),
            ValueTag::OctetString => Value::OctetString(
                self.read_octet_string(MAX_VALUE_LEN, DecodeErrorKind::VarbindValueLength)?,
            ),
            ValueTag::Opaque => Value::Opaque(
                self.read_octet_string(MAX_VALUE_LEN, DecodeErrorKind::VarbindValueLength)?,
            ),
            ValueTag::IpAddress => {
                let data = self.read_octet_string(MAX_VALUE_LEN, DecodeErrorKind::VarbindValueLength)?;
                let addr: [u8; 4] = data.as_ref().try_into().map_err(|_| {
                    Error::decode(
                        start,
                        DecodeErrorKind::InvalidIpAddressLength { length: data.len() },
                    )
                })?;
                Value::IpAddress(addr)
            }
            ValueTag::ObjectIdentifier => {
                Value::ObjectIdentifier(self.read_oid(DecodeErrorKind::VarbindOidLength)?.0)
            }
            ValueTag::Null => Value::Null,
            ValueTag::NoSuchObject => Value::NoSuchObject,
            ValueTag::NoSuchInstance => Value::NoSuchInstance,
            ValueTag::EndOfMibView => Value::EndOfMibView,
        })
    }

    /// Read a variable binding: type, reserved, name, data.
    pub fn read_varbind(&mut self) -> Result<VarBind> {
        let code = self.read_u16()?;
        let _reserved = self.read_u16()?;
        let (oid, _) = self.read_oid(DecodeErrorKind::VarbindOidLength)?;
        let value = self.read_value(code)?;
        Ok(VarBind::new(oid, value))
    }

    /// Read variable bindings until the payload is exhausted.
    pub fn read_varbinds(&mut self) -> Result<Vec<VarBind>> {
        let mut varbinds = Vec::new();
        while !self.is_empty() {
            varbinds.push(self.read_varbind()?);
        }
        Ok(varbinds)
    }
}

/// Builder for an AgentX payload.
#[derive(Debug, Default)]
pub struct Writer {
    buf: BytesMut,
    order: ByteOrder,
}

impl Writer {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            buf: BytesMut::new(),
            order,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> BytesMut {
        self.buf
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn put_u16(&mut self, v: u16) {
        match self.order {
            ByteOrder::Network => self.buf.put_u16(v),
            ByteOrder::Native => self.buf.put_u16_le(v),
        }
    }

    pub fn put_u32(&mut self, v: u32) {
        match self.order {
            ByteOrder::Network => self.buf.put_u32(v),
            ByteOrder::Native => self.buf.put_u32_le(v),
        }
    }

    pub fn put_u64(&mut self, v: u64) {
        match self.order {
            ByteOrder::Network => self.buf.put_u64(v),
            ByteOrder::Native => self.buf.put_u64_le(v),
        }
    }

    pub fn put_slice(&mut self, data: &[u8]) {
        self.buf.put_slice(data);
    }

    pub fn put_zeros(&mut self, n: usize) {
        self.buf.put_bytes(0, n);
    }

    /// Write an OID, compacting a `1.3.6.1.<1..=255>` head into the prefix byte.
    pub fn put_oid(&mut self, oid: &Oid, include: bool) {
        let arcs = oid.arcs();
        let (prefix, tail) = match arcs {
            [1, 3, 6, 1, p @ 1..=255, rest @ ..] => (*p as u8, rest),
            _ => (0, arcs),
        };
        self.put_u8(tail.len() as u8);
        self.put_u8(prefix);
        self.put_u8(u8::from(include));
        self.put_u8(0);
        for &arc in tail {
            self.put_u32(arc);
        }
    }

    pub fn put_octet_string(&mut self, data: &[u8]) {
        self.put_u32(data.len() as u32);
        self.buf.put_slice(data);
        self.put_zeros(padding(data.len()));
    }

    /// Write the data of `value` (its type goes in the varbind header).
    pub fn put_value(&mut self, value: &Value) {
        match value {
            Value::Integer(v) => self.put_u32(*v as u32),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => self.put_u32(*v),
            Value::Counter64(v) => self.put_u64(*v),
            Value::OctetString(data) | Value::Opaque(data) => self.put_octet_string(data),
            Value::IpAddress(addr) => self.put_octet_string(addr),
            Value::ObjectIdentifier(oid) => self.put_oid(oid, false),
            Value::Null | Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {}
        }
    }

    pub fn put_varbind(&mut self, vb: &VarBind) {
        self.put_u16(u16::from(vb.value.tag().code()));
        self.put_u16(0);
        self.put_oid(&vb.oid, false);
        self.put_value(&vb.value);
    }
}
