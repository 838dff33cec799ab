//! SNMP over UDP.

use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::util::bind_udp_socket;

use super::{SharedAgent, lock};

/// Largest datagram accepted.
const RECV_BUFFER_LEN: usize = 65535;

/// A bound UDP socket serving one agent.
///
/// # Example
///
/// ```rust,no_run
/// use smart_snmp::agent::Agent;
/// use smart_snmp::transport::{UdpServer, share};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> smart_snmp::Result<()> {
/// let server = UdpServer::bind("0.0.0.0:161".parse().unwrap(), None).await?;
/// let cancel = CancellationToken::new();
/// server.run(share(Agent::builder().build()), cancel).await
/// # }
/// ```
#[derive(Debug)]
pub struct UdpServer {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl UdpServer {
    /// Bind to `addr`, optionally requesting a kernel receive buffer size.
    pub async fn bind(addr: SocketAddr, recv_buffer_size: Option<usize>) -> Result<Self> {
        let socket = bind_udp_socket(addr, recv_buffer_size)
            .await
            .map_err(|e| Error::io(Some(addr), e))?;
        let local_addr = socket.local_addr().map_err(|e| Error::io(Some(addr), e))?;
        Ok(Self { socket, local_addr })
    }

    /// The bound address, useful after binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve requests until `cancel` fires.
    ///
    /// Datagrams are handled in arrival order. Receive errors end the loop;
    /// send errors are logged and the loop continues.
    pub async fn run(&self, agent: SharedAgent, cancel: CancellationToken) -> Result<()> {
        tracing::info!(target: "smart_snmp::transport", { snmp.local_addr = %self.local_addr }, "SNMP agent listening");
        let mut buf = vec![0u8; RECV_BUFFER_LEN];

        loop {
            let (len, source) = tokio::select! {
                result = self.socket.recv_from(&mut buf) => {
                    result.map_err(|e| Error::io(None, e))?
                }
                _ = cancel.cancelled() => {
                    tracing::info!(target: "smart_snmp::transport", { snmp.local_addr = %self.local_addr }, "SNMP agent shutdown requested");
                    return Ok(());
                }
            };
            tracing::trace!(target: "smart_snmp::transport", { snmp.source = %source, snmp.bytes = len }, "received datagram");

            let response = lock(&agent).handle_datagram_from(&buf[..len], Some(source));
            let Some(response) = response else {
                continue;
            };
            if let Err(e) = self.socket.send_to(&response, source).await {
                tracing::warn!(target: "smart_snmp::transport", { snmp.source = %source, error = %e }, "failed to send response");
            }
        }
    }
}
