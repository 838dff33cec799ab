//! Request context for access decisions.

use std::net::SocketAddr;

use bytes::Bytes;

use crate::pdu::PduType;
use crate::version::Version;

/// Who is asking, and for what.
///
/// Built by the agent for every decoded request and handed to the
/// [`AccessPolicy`](crate::agent::AccessPolicy).
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Source address of the request, when the transport knows it.
    pub source: Option<SocketAddr>,
    /// SNMP version.
    pub version: Version,
    /// Community string (v1/v2c) or user name (v3).
    pub security_name: Bytes,
    /// Context name (v3 only, empty for v1/v2c).
    pub context_name: Bytes,
    /// Request ID from the PDU.
    pub request_id: i32,
    /// PDU type (GetRequest, GetNextRequest, etc.).
    pub pdu_type: PduType,
}

impl RequestContext {
    /// True if the security name is a community string.
    pub fn is_community(&self) -> bool {
        self.version.is_community()
    }
}
