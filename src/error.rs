//! Error types for smart-snmp.
//!
//! Framing failures surface as [`Error::Decode`] with a [`DecodeErrorKind`] naming
//! the grammar site that failed. Per-object failures are not errors at this level;
//! they travel inside responses as an [`ErrorStatus`] or an exception value.
//!
//! All errors are `#[non_exhaustive]` to allow adding new variants without breaking changes.

use std::net::SocketAddr;

use crate::oid::Oid;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Decode error kinds.
///
/// The first group describes primitive BER/AgentX failures. The second group
/// names the message field being decoded; message decoders report a failure
/// at a field with that field's kind so a dropped datagram can be diagnosed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Expected different tag.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Data truncated unexpectedly.
    TruncatedData,
    /// Invalid BER length encoding.
    InvalidLength,
    /// Indefinite length not supported.
    IndefiniteLength,
    /// Length field uses more than four octets.
    LengthTooLong { octets: usize },
    /// Length exceeds maximum.
    LengthExceedsMax { length: usize, max: usize },
    /// Integer value overflow.
    IntegerOverflow,
    /// Zero-length integer.
    ZeroLengthInteger,
    /// Integer64 too long.
    Integer64TooLong { length: usize },
    /// Invalid OID encoding.
    InvalidOidEncoding,
    /// OID has more sub-identifiers than allowed.
    OidTooLong { count: usize, max: usize },
    /// Octet string or opaque value longer than allowed.
    ValueTooLong { length: usize, max: usize },
    /// NULL with non-zero length.
    InvalidNull,
    /// Invalid IP address length.
    InvalidIpAddressLength { length: usize },
    /// Constructed OCTET STRING not supported.
    ConstructedOctetString,
    /// Value tag outside the supported set.
    UnknownValueTag(u16),
    /// Trailing bytes after the outer message.
    TrailingData { extra: usize },
    /// Insufficient data for read.
    InsufficientData { needed: usize, available: usize },

    /// Message version field.
    Version,
    /// v1/v2c community string.
    Community,
    /// v3 global data SEQUENCE.
    GlobalDataSeq,
    /// v3 msgID.
    GlobalId,
    /// v3 msgMaxSize.
    GlobalSize,
    /// v3 msgFlags.
    GlobalFlags,
    /// v3 msgSecurityModel.
    GlobalModel,
    /// v3 security parameters octet string.
    SecurityParams,
    /// v3 security parameters SEQUENCE.
    SecuritySeq,
    /// USM authoritative engine id.
    EngineId,
    /// USM engine boots.
    EngineBoots,
    /// USM engine time.
    EngineTime,
    /// USM user name.
    UserName,
    /// USM authentication parameters.
    AuthParams,
    /// USM privacy parameters.
    PrivParams,
    /// Scoped PDU SEQUENCE (also raised for encrypted scoped PDUs).
    ScopedPduSeq,
    /// Scoped PDU context engine id.
    ContextEngineId,
    /// Scoped PDU context name.
    ContextName,
    /// PDU type tag.
    PduType,
    /// PDU length.
    PduLength,
    /// PDU request-id.
    PduRequestId,
    /// PDU error-status (non-repeaters for GETBULK).
    PduErrorStatus,
    /// PDU error-index (max-repetitions for GETBULK).
    PduErrorIndex,
    /// Varbind list SEQUENCE.
    VarBindListSeq,
    /// Varbind SEQUENCE.
    VarBindSeq,
    /// Varbind name OBJECT IDENTIFIER.
    VarBindOidType,
    /// Varbind value.
    VarBindValue,

    /// Engine id longer than allowed.
    EngineIdLength,
    /// User name longer than allowed.
    UserNameLength,
    /// Authentication parameters longer than allowed.
    AuthParamsLength,
    /// Privacy parameters longer than allowed.
    PrivParamsLength,
    /// Context engine id longer than allowed.
    ContextIdLength,
    /// Context name or community longer than allowed.
    ContextNameLength,
    /// AgentX context longer than allowed.
    PduContextLength,
    /// Varbind OID longer than allowed.
    VarbindOidLength,
    /// Varbind value longer than allowed.
    VarbindValueLength,
    /// Search range OID longer than allowed.
    SearchRangeOidLength,
    /// AgentX header version or payload length.
    AgentxHeader,
    /// AgentX PDU type outside 1..=18.
    AgentxPduType(u8),
}

impl DecodeErrorKind {
    /// True for kinds that name a bound violation.
    pub fn is_length_bound(&self) -> bool {
        matches!(
            self,
            Self::OidTooLong { .. }
                | Self::ValueTooLong { .. }
                | Self::EngineIdLength
                | Self::UserNameLength
                | Self::AuthParamsLength
                | Self::PrivParamsLength
                | Self::ContextIdLength
                | Self::ContextNameLength
                | Self::PduContextLength
                | Self::VarbindOidLength
                | Self::VarbindValueLength
                | Self::SearchRangeOidLength
        )
    }
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::InvalidLength => write!(f, "invalid length encoding"),
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding too long ({} octets)", octets)
            }
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {} exceeds maximum {}", length, max)
            }
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::Integer64TooLong { length } => {
                write!(f, "integer64 too long: {} bytes", length)
            }
            Self::InvalidOidEncoding => write!(f, "invalid OID encoding"),
            Self::OidTooLong { count, max } => {
                write!(f, "OID has {} sub-identifiers, exceeds maximum {}", count, max)
            }
            Self::ValueTooLong { length, max } => {
                write!(f, "value length {} exceeds maximum {}", length, max)
            }
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IP address must be 4 bytes, got {}", length)
            }
            Self::ConstructedOctetString => {
                write!(f, "constructed OCTET STRING (0x24) not supported")
            }
            Self::UnknownValueTag(t) => write!(f, "unsupported value type 0x{:02X}", t),
            Self::TrailingData { extra } => write!(f, "{} bytes after end of message", extra),
            Self::InsufficientData { needed, available } => {
                write!(f, "need {} bytes but only {} remaining", needed, available)
            }
            Self::Version => write!(f, "bad message version"),
            Self::Community => write!(f, "bad community string"),
            Self::GlobalDataSeq => write!(f, "bad global data sequence"),
            Self::GlobalId => write!(f, "bad msgID"),
            Self::GlobalSize => write!(f, "bad msgMaxSize"),
            Self::GlobalFlags => write!(f, "bad msgFlags"),
            Self::GlobalModel => write!(f, "bad msgSecurityModel"),
            Self::SecurityParams => write!(f, "bad security parameters"),
            Self::SecuritySeq => write!(f, "bad security parameters sequence"),
            Self::EngineId => write!(f, "bad engine id"),
            Self::EngineBoots => write!(f, "bad engine boots"),
            Self::EngineTime => write!(f, "bad engine time"),
            Self::UserName => write!(f, "bad user name"),
            Self::AuthParams => write!(f, "bad authentication parameters"),
            Self::PrivParams => write!(f, "bad privacy parameters"),
            Self::ScopedPduSeq => write!(f, "bad scoped PDU (encrypted or malformed)"),
            Self::ContextEngineId => write!(f, "bad context engine id"),
            Self::ContextName => write!(f, "bad context name"),
            Self::PduType => write!(f, "bad PDU type"),
            Self::PduLength => write!(f, "bad PDU length"),
            Self::PduRequestId => write!(f, "bad request-id"),
            Self::PduErrorStatus => write!(f, "bad error-status"),
            Self::PduErrorIndex => write!(f, "bad error-index"),
            Self::VarBindListSeq => write!(f, "bad varbind list"),
            Self::VarBindSeq => write!(f, "bad varbind"),
            Self::VarBindOidType => write!(f, "bad varbind name"),
            Self::VarBindValue => write!(f, "bad varbind value"),
            Self::EngineIdLength => write!(f, "engine id too long"),
            Self::UserNameLength => write!(f, "user name too long"),
            Self::AuthParamsLength => write!(f, "authentication parameters too long"),
            Self::PrivParamsLength => write!(f, "privacy parameters too long"),
            Self::ContextIdLength => write!(f, "context engine id too long"),
            Self::ContextNameLength => write!(f, "context name too long"),
            Self::PduContextLength => write!(f, "PDU context too long"),
            Self::VarbindOidLength => write!(f, "varbind OID too long"),
            Self::VarbindValueLength => write!(f, "varbind value too long"),
            Self::SearchRangeOidLength => write!(f, "search range OID too long"),
            Self::AgentxHeader => write!(f, "bad AgentX header"),
            Self::AgentxPduType(t) => write!(f, "unknown AgentX PDU type {}", t),
        }
    }
}

/// OID validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// Empty OID.
    Empty,
    /// Invalid arc value.
    InvalidArc,
    /// OID has too many arcs (exceeds MAX_OID_LEN).
    TooManyArcs { count: usize, max: usize },
    /// OID does not start with 1.3.6.1.
    OutsideInternet,
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty OID"),
            Self::InvalidArc => write!(f, "invalid arc value"),
            Self::TooManyArcs { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
            Self::OutsideInternet => write!(f, "OID is not under 1.3.6.1"),
        }
    }
}

/// Why a MIB registration was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterErrorKind {
    /// A node already exists at the OID.
    AlreadyRegistered,
    /// An instance node sits on the path to the OID.
    PathThroughInstance,
    /// The resolver handle does not name a stored resolver.
    UnknownResolver,
}

impl std::fmt::Display for RegisterErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRegistered => write!(f, "OID already registered"),
            Self::PathThroughInstance => write!(f, "path crosses an instance node"),
            Self::UnknownResolver => write!(f, "unknown resolver handle"),
        }
    }
}

/// SNMP error status codes (RFC 3416).
///
/// AgentX uses the same codes for per-varbind errors in Response PDUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum ErrorStatus {
    #[default]
    NoError,
    TooBig,
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    NoAccess,
    WrongType,
    WrongLength,
    WrongEncoding,
    WrongValue,
    NoCreation,
    InconsistentValue,
    ResourceUnavailable,
    CommitFailed,
    UndoFailed,
    AuthorizationError,
    NotWritable,
    InconsistentName,
    /// Unknown/future error status code.
    Unknown(i32),
}

impl ErrorStatus {
    /// Create from raw status code.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::TooBig,
            2 => Self::NoSuchName,
            3 => Self::BadValue,
            4 => Self::ReadOnly,
            5 => Self::GenErr,
            6 => Self::NoAccess,
            7 => Self::WrongType,
            8 => Self::WrongLength,
            9 => Self::WrongEncoding,
            10 => Self::WrongValue,
            11 => Self::NoCreation,
            12 => Self::InconsistentValue,
            13 => Self::ResourceUnavailable,
            14 => Self::CommitFailed,
            15 => Self::UndoFailed,
            16 => Self::AuthorizationError,
            17 => Self::NotWritable,
            18 => Self::InconsistentName,
            other => Self::Unknown(other),
        }
    }

    /// Convert to raw status code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::NoError => 0,
            Self::TooBig => 1,
            Self::NoSuchName => 2,
            Self::BadValue => 3,
            Self::ReadOnly => 4,
            Self::GenErr => 5,
            Self::NoAccess => 6,
            Self::WrongType => 7,
            Self::WrongLength => 8,
            Self::WrongEncoding => 9,
            Self::WrongValue => 10,
            Self::NoCreation => 11,
            Self::InconsistentValue => 12,
            Self::ResourceUnavailable => 13,
            Self::CommitFailed => 14,
            Self::UndoFailed => 15,
            Self::AuthorizationError => 16,
            Self::NotWritable => 17,
            Self::InconsistentName => 18,
            Self::Unknown(code) => *code,
        }
    }

    /// True for anything other than `noError`.
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::NoError)
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoError => write!(f, "noError"),
            Self::TooBig => write!(f, "tooBig"),
            Self::NoSuchName => write!(f, "noSuchName"),
            Self::BadValue => write!(f, "badValue"),
            Self::ReadOnly => write!(f, "readOnly"),
            Self::GenErr => write!(f, "genErr"),
            Self::NoAccess => write!(f, "noAccess"),
            Self::WrongType => write!(f, "wrongType"),
            Self::WrongLength => write!(f, "wrongLength"),
            Self::WrongEncoding => write!(f, "wrongEncoding"),
            Self::WrongValue => write!(f, "wrongValue"),
            Self::NoCreation => write!(f, "noCreation"),
            Self::InconsistentValue => write!(f, "inconsistentValue"),
            Self::ResourceUnavailable => write!(f, "resourceUnavailable"),
            Self::CommitFailed => write!(f, "commitFailed"),
            Self::UndoFailed => write!(f, "undoFailed"),
            Self::AuthorizationError => write!(f, "authorizationError"),
            Self::NotWritable => write!(f, "notWritable"),
            Self::InconsistentName => write!(f, "inconsistentName"),
            Self::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

/// Library error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error on a transport.
    #[error("I/O error{}: {source}", target.map(|t| format!(" communicating with {}", t)).unwrap_or_default())]
    Io {
        target: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },

    /// Invalid OID format.
    #[error("invalid OID: {kind}")]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>, // Only allocated when parsing string input
    },

    /// Decoding error (BER or AgentX).
    #[error("decode error at offset {offset}: {kind}")]
    Decode {
        offset: usize,
        kind: DecodeErrorKind,
    },

    /// MIB registration refused.
    #[error("cannot register {oid}: {kind}")]
    Registration { oid: Oid, kind: RegisterErrorKind },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(Box<str>),

    /// AgentX session is not usable.
    #[error("AgentX session error: {0}")]
    Session(Box<str>),

    /// Message exceeds maximum size.
    #[error("message too large: {size} bytes exceeds maximum {max}")]
    MessageTooLarge { size: usize, max: usize },
}

impl Error {
    /// Create a decode error.
    pub fn decode(offset: usize, kind: DecodeErrorKind) -> Self {
        Self::Decode { offset, kind }
    }

    /// Create an invalid OID error from a kind (no input string).
    pub fn invalid_oid(kind: OidErrorKind) -> Self {
        Self::InvalidOid { kind, input: None }
    }

    /// Create an invalid OID error with the input string that failed.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// Create an I/O error.
    pub fn io(target: Option<SocketAddr>, source: std::io::Error) -> Self {
        Self::Io { target, source }
    }

    /// The decode kind, if this is a decode error.
    pub fn decode_kind(&self) -> Option<DecodeErrorKind> {
        match self {
            Self::Decode { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Re-label a decode error with the message field it occurred in.
    ///
    /// Bound violations keep their own kind unless `bound` is given, in which
    /// case they are reported as `bound`. Non-decode errors pass through.
    pub(crate) fn at_field(self, field: DecodeErrorKind, bound: Option<DecodeErrorKind>) -> Self {
        match self {
            Self::Decode { offset, kind } => {
                let relabeled = match (kind.is_length_bound(), bound) {
                    (true, Some(bound)) => bound,
                    (true, None) => kind,
                    (false, _) => field,
                };
                tracing::debug!(target: "smart_snmp::ber", { snmp.offset = offset, cause = %kind, field = %relabeled }, "decode failed");
                Self::Decode {
                    offset,
                    kind: relabeled,
                }
            }
            other => other,
        }
    }
}

/// Extension for labelling decode failures with their message field.
pub(crate) trait DecodeContext<T> {
    /// Report any decode failure as `field`.
    fn field(self, field: DecodeErrorKind) -> Result<T>;
    /// Report bound violations as `bound` and other failures as `field`.
    fn field_bounded(self, field: DecodeErrorKind, bound: DecodeErrorKind) -> Result<T>;
}

impl<T> DecodeContext<T> for Result<T> {
    fn field(self, field: DecodeErrorKind) -> Result<T> {
        self.map_err(|e| e.at_field(field, None))
    }

    fn field_bounded(self, field: DecodeErrorKind, bound: DecodeErrorKind) -> Result<T> {
        self.map_err(|e| e.at_field(field, Some(bound)))
    }
}
