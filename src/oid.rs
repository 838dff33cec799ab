//! Object Identifier (OID) type.
//!
//! OIDs are stored as `SmallVec<[u32; 16]>` to avoid heap allocation for common OIDs.
//! Ordering is lexicographic over arcs, with a strict prefix sorting first.

use crate::error::{DecodeErrorKind, Error, OidErrorKind, Result};
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of arcs (sub-identifiers) an OID may carry.
///
/// Enforced while decoding (BER and AgentX) before any arc is stored, and by
/// MIB registration.
pub const MAX_OID_LEN: usize = 64;

/// The `internet` prefix every registered object lives under.
pub const INTERNET: [u32; 4] = [1, 3, 6, 1];

/// Object Identifier.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from arc values.
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    ///
    /// # Examples
    ///
    /// ```
    /// use smart_snmp::oid::Oid;
    ///
    /// let oid = Oid::from_slice(&[1, 3, 6, 1, 2, 1, 1, 1, 0]);
    /// assert_eq!(oid.to_string(), "1.3.6.1.2.1.1.1.0");
    /// ```
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse an OID from dotted string notation (e.g., "1.3.6.1.2.1.1.1.0").
    ///
    /// A leading dot is accepted. Empty components and non-numeric arcs are rejected.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.strip_prefix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Err(Error::invalid_oid_with_input(OidErrorKind::Empty, s));
        }

        let mut arcs = SmallVec::new();
        for part in trimmed.split('.') {
            let arc: u32 = part.parse().map_err(|_| {
                Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s.to_string())
            })?;
            arcs.push(arc);
        }

        let oid = Self { arcs };
        oid.validate_length()?;
        Ok(oid)
    }

    /// Get the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Get the number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Check if the OID is empty.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Check if this OID starts with another OID.
    pub fn starts_with(&self, other: &Oid) -> bool {
        self.arcs.starts_with(&other.arcs)
    }

    /// Check if this OID lives under 1.3.6.1.
    pub fn is_internet(&self) -> bool {
        self.arcs.len() > INTERNET.len() && self.arcs.starts_with(&INTERNET)
    }

    /// Create a child OID by appending an arc.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Append arcs in place.
    pub fn extend_from_slice(&mut self, arcs: &[u32]) {
        self.arcs.extend_from_slice(arcs);
    }

    /// Validate that the OID doesn't exceed [`MAX_OID_LEN`].
    pub fn validate_length(&self) -> Result<()> {
        if self.arcs.len() > MAX_OID_LEN {
            return Err(Error::invalid_oid(OidErrorKind::TooManyArcs {
                count: self.arcs.len(),
                max: MAX_OID_LEN,
            }));
        }
        Ok(())
    }

    /// Encode to BER content bytes.
    ///
    /// OID encoding (X.690 Section 8.19):
    /// - First two arcs encoded as (arc1 * 40) + arc2 using base-128
    /// - Remaining arcs encoded as base-128 variable length
    ///
    /// The empty OID encodes as zero content bytes.
    pub fn to_ber_smallvec(&self) -> SmallVec<[u8; 64]> {
        let mut bytes = SmallVec::new();

        match self.arcs.as_slice() {
            [] => {}
            [first] => encode_subidentifier(&mut bytes, first.saturating_mul(40)),
            [first, second, rest @ ..] => {
                encode_subidentifier(
                    &mut bytes,
                    first.saturating_mul(40).saturating_add(*second),
                );
                for &arc in rest {
                    encode_subidentifier(&mut bytes, arc);
                }
            }
        }

        bytes
    }

    /// Number of BER content bytes `to_ber_smallvec` produces.
    pub fn ber_content_len(&self) -> usize {
        match self.arcs.as_slice() {
            [] => 0,
            [first] => subidentifier_len(first.saturating_mul(40)),
            [first, second, rest @ ..] => {
                subidentifier_len(first.saturating_mul(40).saturating_add(*second))
                    + rest.iter().map(|&a| subidentifier_len(a)).sum::<usize>()
            }
        }
    }

    /// Decode from BER content bytes.
    ///
    /// Rejects OIDs longer than [`MAX_OID_LEN`] before storing the offending arc.
    pub fn from_ber(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::empty());
        }

        let mut arcs: SmallVec<[u32; 16]> = SmallVec::new();

        // First subidentifier encodes arc1*40 + arc2
        let (first_subid, consumed) = decode_subidentifier(data, 0)?;
        if first_subid < 40 {
            arcs.push(0);
            arcs.push(first_subid);
        } else if first_subid < 80 {
            arcs.push(1);
            arcs.push(first_subid - 40);
        } else {
            arcs.push(2);
            arcs.push(first_subid - 80);
        }

        let mut i = consumed;
        while i < data.len() {
            if arcs.len() == MAX_OID_LEN {
                return Err(Error::decode(
                    i,
                    DecodeErrorKind::OidTooLong {
                        count: arcs.len() + 1,
                        max: MAX_OID_LEN,
                    },
                ));
            }
            let (arc, bytes_consumed) = decode_subidentifier(&data[i..], i)?;
            arcs.push(arc);
            i += bytes_consumed;
        }

        Ok(Self { arcs })
    }
}

/// Encode a subidentifier in base-128 variable length.
#[inline]
fn encode_subidentifier(bytes: &mut SmallVec<[u8; 64]>, value: u32) {
    let count = subidentifier_len(value);
    for i in (0..count).rev() {
        let mut byte = ((value >> (i * 7)) & 0x7F) as u8;
        if i > 0 {
            byte |= 0x80; // Continuation bit
        }
        bytes.push(byte);
    }
}

#[inline]
fn subidentifier_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0xFFF_FFFF => 4,
        _ => 5,
    }
}

/// Decode a subidentifier, returning (value, bytes_consumed).
fn decode_subidentifier(data: &[u8], base: usize) -> Result<(u32, usize)> {
    let mut value: u32 = 0;

    for (i, &byte) in data.iter().enumerate() {
        if value > (u32::MAX >> 7) {
            return Err(Error::decode(base + i, DecodeErrorKind::IntegerOverflow));
        }
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    Err(Error::decode(
        base + data.len(),
        DecodeErrorKind::InvalidOidEncoding,
    ))
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.arcs.cmp(&other.arcs)
    }
}

/// Macro to create an OID from literal arcs.
///
/// # Examples
///
/// ```
/// use smart_snmp::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.to_string(), "1.3.6.1.2.1.1.1.0");
/// assert!(sys_descr.starts_with(&oid!(1, 3, 6, 1, 2, 1, 1)));
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let oid = Oid::parse("1.3.6.1.2.1.1.1.0").unwrap();
        assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1, 1, 1, 0]);
        assert_eq!(Oid::parse(".1.3.6").unwrap().arcs(), &[1, 3, 6]);
        assert!(Oid::parse("1..3").is_err());
        assert!(Oid::parse("1.x").is_err());
        assert!(Oid::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_more_than_max_arcs() {
        let s = vec!["1"; MAX_OID_LEN + 1].join(".");
        assert!(Oid::parse(&s).is_err());
        let s = vec!["1"; MAX_OID_LEN].join(".");
        assert!(Oid::parse(&s).is_ok());
    }

    #[test]
    fn test_ordering_prefix_sorts_first() {
        assert!(oid!(1, 3, 6, 1) < oid!(1, 3, 6, 1, 0));
        assert!(oid!(1, 3, 6, 1, 2) < oid!(1, 3, 6, 1, 10));
        assert!(oid!(1, 3, 6, 2) > oid!(1, 3, 6, 1, 99, 99));
        assert_eq!(oid!(1, 3).cmp(&oid!(1, 3)), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_is_internet() {
        assert!(oid!(1, 3, 6, 1, 2).is_internet());
        assert!(!oid!(1, 3, 6, 1).is_internet());
        assert!(!oid!(1, 3, 6, 2, 1).is_internet());
    }

    #[test]
    fn test_ber_encoding() {
        assert_eq!(&oid!(1, 3, 6, 1).to_ber_smallvec()[..], &[0x2B, 0x06, 0x01]);
        assert_eq!(&oid!(1, 3, 6, 1, 4, 1, 200).to_ber_smallvec()[..], &[
            0x2B, 0x06, 0x01, 0x04, 0x01, 0x81, 0x48
        ]);
        assert!(Oid::empty().to_ber_smallvec().is_empty());
    }

    #[test]
    fn test_ber_content_len_matches_encoding() {
        for oid in [
            Oid::empty(),
            oid!(1),
            oid!(1, 3, 6, 1),
            oid!(1, 3, 6, 1, 4, 1, 4294967295),
            oid!(2, 999, 16384, 2097152),
        ] {
            assert_eq!(oid.ber_content_len(), oid.to_ber_smallvec().len(), "{}", oid);
        }
    }

    #[test]
    fn test_from_ber_rejects_65_arcs() {
        // 1.3 plus 63 more arcs = 65 arcs
        let mut data = vec![0x2B];
        data.extend(std::iter::repeat_n(0x01, 63));
        let err = Oid::from_ber(&data).unwrap_err();
        assert!(matches!(
            err,
            Error::Decode {
                kind: DecodeErrorKind::OidTooLong { .. },
                ..
            }
        ));

        // Exactly 64 arcs is fine
        data.pop();
        assert_eq!(Oid::from_ber(&data).unwrap().len(), MAX_OID_LEN);
    }

    #[test]
    fn test_from_ber_truncated_subidentifier() {
        assert!(Oid::from_ber(&[0x2B, 0x81]).is_err());
    }

    #[test]
    fn test_from_ber_roundtrip_large_arcs() {
        let oid = oid!(1, 3, 6, 1, 4, 1, 2021, 4294967295);
        assert_eq!(Oid::from_ber(&oid.to_ber_smallvec()).unwrap(), oid);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_ber_content_roundtrip(
                arc1 in 0u32..3,
                arc2 in 0u32..40,
                rest in prop::collection::vec(any::<u32>(), 0..62),
            ) {
                let mut oid = Oid::from_slice(&[arc1, arc2]);
                oid.extend_from_slice(&rest);
                let ber = oid.to_ber_smallvec();
                prop_assert_eq!(oid.ber_content_len(), ber.len());
                prop_assert_eq!(Oid::from_ber(&ber).unwrap(), oid);
            }
        }
    }
}
