//! Common imports for building an agent.
//!
//! ```rust
//! use smart_snmp::prelude::*;
//!
//! let mut mib = Mib::new();
//! mib.register(&oid!(1, 3, 6, 1, 2, 1, 1, 5), OidTable::<Value>::new()).unwrap();
//! let agent = Agent::builder().mib(mib).build();
//! assert_eq!(agent.mib().len(), 1);
//! ```

pub use crate::agent::{AccessPolicy, Agent, AgentBuilder, OpenAccess, ViewTable};
pub use crate::error::{Error, ErrorStatus, Result};
pub use crate::handler::{InstanceResolver, OidTable, RequestKind, Resolved, SetResult};
pub use crate::mib::Mib;
pub use crate::oid::Oid;
pub use crate::value::Value;
pub use crate::varbind::VarBind;
pub use crate::version::Version;

#[doc(no_inline)]
pub use crate::oid;
