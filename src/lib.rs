// Allow large error types - the Error enum carries an OID inline for diagnostics.
#![allow(clippy::result_large_err)]

//! # smart-snmp
//!
//! SNMP agent core: a BER codec, an OID trie of registered objects, and the
//! GET, GETNEXT, GETBULK and SET algorithms that answer requests from it. The
//! same MIB can be served to SNMP managers over UDP and to an AgentX master
//! as a sub-agent.
//!
//! ## Quick Start
//!
//! ```rust
//! use smart_snmp::{Agent, Mib, OidTable, Value, oid};
//! use smart_snmp::message::{CommunityMessage, Message};
//! use smart_snmp::pdu::{Pdu, PduType};
//! use smart_snmp::varbind::VarBind;
//! use smart_snmp::version::Version;
//!
//! let mut system = OidTable::new();
//! system.insert(oid!(1, 0), Value::from("smart-snmp demo"));
//! let mut mib = Mib::new();
//! mib.register(&oid!(1, 3, 6, 1, 2, 1, 1), system).unwrap();
//!
//! let mut agent = Agent::builder().mib(mib).build();
//!
//! let request = Message::Community(CommunityMessage::new(
//!     Version::V2c,
//!     "public",
//!     Pdu::request(
//!         PduType::GetRequest,
//!         1,
//!         vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0))],
//!     ),
//! ));
//! let response = agent.handle_datagram(&request.encode()).unwrap();
//! let response = Message::decode(response).unwrap();
//! assert_eq!(response.pdu().varbinds[0].value, Value::from("smart-snmp demo"));
//! ```

pub mod agent;
pub mod agentx;
pub mod ber;
pub mod error;
pub mod handler;
pub mod message;
pub mod mib;
pub mod oid;
pub mod pdu;
pub mod prelude;
pub mod transport;
pub mod value;
pub mod varbind;
pub mod version;

pub(crate) mod util;

pub use agent::{AccessPolicy, Agent, AgentBuilder, OpenAccess, ViewTable};
pub use agentx::SubAgent;
pub use error::{DecodeErrorKind, Error, ErrorStatus, OidErrorKind, RegisterErrorKind, Result};
pub use handler::{InstanceResolver, OidTable, RequestContext, RequestKind, Resolved, SetResult};
pub use mib::{Mib, SearchResult};
pub use oid::Oid;
pub use pdu::{Pdu, PduType};
pub use transport::{AgentxClient, UdpServer};
pub use value::Value;
pub use varbind::VarBind;
pub use version::Version;
