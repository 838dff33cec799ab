//! AgentX sub-agent protocol (RFC 2741).
//!
//! A sub-agent connects to a master agent, registers the subtrees it
//! serves and then answers the GET, GETNEXT, GETBULK and SET phases the
//! master forwards. [`SubAgent`] holds the session state and turns incoming
//! PDUs into replies; the TCP plumbing lives in
//! [`transport::AgentxClient`](crate::transport::AgentxClient).

pub mod codec;
pub mod header;
pub mod pdu;
mod session;

pub use codec::ByteOrder;
pub use header::{HEADER_LEN, Header, PduType};
pub use pdu::{AgentxPdu, CloseReason, Payload, SearchRange};
pub use session::{DEFAULT_PRIORITY, SessionState, SubAgent};
