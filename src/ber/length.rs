//! BER length encoding and decoding.
//!
//! Length encoding follows X.690 Section 8.1.3:
//! - Short form: single byte, bit 8=0, value 0-127
//! - Long form: initial byte (bit 8=1, bits 7-1=count), then `count` big-endian bytes
//! - Indefinite form (0x80) is rejected, as is any count above four

use crate::error::{DecodeErrorKind, Error, Result};

/// Largest content length accepted by the decoder.
///
/// A UDP datagram cannot carry more than this, so anything larger is malformed.
pub const MAX_LENGTH: usize = 0xFFFF;

/// Encode a length value (returns bytes in reverse order for prepending).
///
/// Uses short form for lengths <= 127, long form otherwise.
pub fn encode_length(len: usize) -> ([u8; 5], usize) {
    let mut buf = [0u8; 5];
    let count = length_len(len);

    if count == 1 {
        buf[0] = len as u8;
        return (buf, 1);
    }

    let octets = count - 1;
    for (i, slot) in buf.iter_mut().enumerate().take(octets) {
        *slot = (len >> (8 * i)) as u8;
    }
    buf[octets] = 0x80 | octets as u8;
    (buf, count)
}

/// Number of bytes `encode_length(len)` produces.
pub const fn length_len(len: usize) -> usize {
    if len <= 0x7F {
        1
    } else if len <= 0xFF {
        2
    } else if len <= 0xFFFF {
        3
    } else if len <= 0xFF_FFFF {
        4
    } else {
        5
    }
}

/// Total size of a TLV whose content is `content_len` bytes (single-byte tag).
pub const fn tlv_len(content_len: usize) -> usize {
    1 + length_len(content_len) + content_len
}

/// Decode a length from bytes, returning (length, bytes_consumed).
///
/// The `base_offset` parameter is used to report error offsets correctly
/// when this is called from within a decoder.
pub fn decode_length(data: &[u8], base_offset: usize) -> Result<(usize, usize)> {
    let Some(&first) = data.first() else {
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    };

    if first == 0x80 {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::IndefiniteLength,
        ));
    }

    if first & 0x80 == 0 {
        return Ok((first as usize, 1));
    }

    let num_octets = (first & 0x7F) as usize;
    if num_octets > 4 {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::LengthTooLong { octets: num_octets },
        ));
    }

    if data.len() < 1 + num_octets {
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    }

    let len = data[1..=num_octets]
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);

    if len > MAX_LENGTH {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::LengthExceedsMax {
                length: len,
                max: MAX_LENGTH,
            },
        ));
    }

    Ok((len, 1 + num_octets))
}
