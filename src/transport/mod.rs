//! Network front ends.
//!
//! [`UdpServer`] feeds SNMP datagrams to an [`Agent`]; [`AgentxClient`]
//! connects the same agent's MIB to an AgentX master over TCP. Both share
//! the agent through one [`SharedAgent`] lock, so requests from either side
//! are served one at a time.

mod agentx;
mod udp;

pub use agentx::AgentxClient;
pub use udp::UdpServer;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::agent::Agent;

/// An agent shared between transports.
pub type SharedAgent = Arc<Mutex<Agent>>;

/// Wrap an agent for sharing.
pub fn share(agent: Agent) -> SharedAgent {
    Arc::new(Mutex::new(agent))
}

/// Lock the agent, recovering it if a previous holder panicked.
pub(crate) fn lock(agent: &Mutex<Agent>) -> MutexGuard<'_, Agent> {
    agent.lock().unwrap_or_else(PoisonError::into_inner)
}
