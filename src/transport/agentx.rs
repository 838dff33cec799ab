//! AgentX sub-agent over TCP.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::agentx::{AgentxPdu, ByteOrder, CloseReason, HEADER_LEN, SubAgent};
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;

use super::{SharedAgent, lock};

/// Largest PDU payload accepted from the master.
const MAX_PAYLOAD_LEN: usize = 65535;

/// Connects an agent's MIB to an AgentX master.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use smart_snmp::agent::Agent;
/// use smart_snmp::oid;
/// use smart_snmp::transport::{AgentxClient, share};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> smart_snmp::Result<()> {
/// let client = AgentxClient::new("127.0.0.1:705".parse().unwrap())
///     .descr("demo sub-agent")
///     .subtree(oid!(1, 3, 6, 1, 4, 1, 8072, 9999))
///     .ping_interval(Duration::from_secs(30));
/// client.run(share(Agent::builder().build()), CancellationToken::new()).await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AgentxClient {
    master: SocketAddr,
    id: Oid,
    descr: String,
    subtrees: Vec<Oid>,
    ping_interval: Option<Duration>,
}

impl AgentxClient {
    pub fn new(master: SocketAddr) -> Self {
        Self {
            master,
            id: Oid::empty(),
            descr: String::from("smart-snmp sub-agent"),
            subtrees: Vec::new(),
            ping_interval: None,
        }
    }

    /// Object identifier sent in the Open PDU.
    pub fn id(mut self, id: Oid) -> Self {
        self.id = id;
        self
    }

    /// Description sent in the Open PDU.
    pub fn descr(mut self, descr: impl Into<String>) -> Self {
        self.descr = descr.into();
        self
    }

    /// Add a subtree to register once the session is open.
    pub fn subtree(mut self, oid: Oid) -> Self {
        self.subtrees.push(oid);
        self
    }

    /// Ping the master at this interval.
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = Some(interval);
        self
    }

    /// Run the session until `cancel` fires or the master closes it.
    ///
    /// Opens the session, registers every subtree and then answers the
    /// master's requests from the agent's MIB.
    pub async fn run(&self, agent: SharedAgent, cancel: CancellationToken) -> Result<()> {
        let io_err = |e: std::io::Error| Error::io(Some(self.master), e);
        let mut stream = TcpStream::connect(self.master).await.map_err(io_err)?;
        stream.set_nodelay(true).map_err(io_err)?;

        let mut session = SubAgent::new(self.id.clone(), Bytes::from(self.descr.clone()));
        stream.write_all(&session.open_pdu()).await.map_err(io_err)?;
        let reply = AgentxPdu::decode_bytes(read_pdu(&mut stream).await.map_err(io_err)?)?;
        session.accept_open_response(&reply)?;
        tracing::info!(target: "smart_snmp::transport", { agentx.master = %self.master, agentx.session_id = session.session_id() }, "AgentX session open");

        for subtree in &self.subtrees {
            stream
                .write_all(&session.register_pdu(subtree, None))
                .await
                .map_err(io_err)?;
            tracing::debug!(target: "smart_snmp::transport", { agentx.session_id = session.session_id(), %subtree }, "registration sent");
        }

        let (mut reader, mut writer) = stream.into_split();
        let (tx, mut rx) = mpsc::channel::<std::io::Result<Bytes>>(16);
        let reader_task = tokio::spawn(async move {
            loop {
                let frame = read_pdu(&mut reader).await;
                let failed = frame.is_err();
                if tx.send(frame).await.is_err() || failed {
                    break;
                }
            }
        });

        let period = self.ping_interval.unwrap_or(Duration::from_secs(3600));
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        let result = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(target: "smart_snmp::transport", { agentx.session_id = session.session_id() }, "AgentX shutdown requested");
                    let close = session.close_pdu(CloseReason::Shutdown);
                    break writer.write_all(&close).await.map_err(io_err);
                }
                _ = ticker.tick(), if self.ping_interval.is_some() => {
                    if let Err(e) = writer.write_all(&session.ping_pdu()).await {
                        break Err(io_err(e));
                    }
                }
                frame = rx.recv() => {
                    let frame = match frame {
                        Some(Ok(frame)) => frame,
                        Some(Err(e)) => break Err(io_err(e)),
                        None => break Ok(()),
                    };
                    let reply = {
                        let mut agent = lock(&agent);
                        session.handle_pdu(agent.mib_mut(), &frame)
                    };
                    if let Some(reply) = reply {
                        if let Err(e) = writer.write_all(&reply).await {
                            break Err(io_err(e));
                        }
                    }
                    if session.is_closed() {
                        break Ok(());
                    }
                }
            }
        };

        reader_task.abort();
        result
    }
}

/// Read one PDU: the fixed header, then exactly `payload_length` bytes.
///
/// Only the length field is interpreted here, so a PDU whose header fails to
/// decode (bad version, unknown type) is still framed and can be dropped on
/// its own.
async fn read_pdu<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<Bytes> {
    let mut frame = BytesMut::zeroed(HEADER_LEN);
    reader.read_exact(&mut frame).await?;
    let payload_len = payload_length(&frame) as usize;
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(invalid_data(Error::decode(
            HEADER_LEN - 4,
            DecodeErrorKind::LengthExceedsMax {
                length: payload_len,
                max: MAX_PAYLOAD_LEN,
            },
        )));
    }
    frame.resize(HEADER_LEN + payload_len, 0);
    reader.read_exact(&mut frame[HEADER_LEN..]).await?;
    Ok(frame.freeze())
}

/// The last header field, in the byte order the flags select.
fn payload_length(header: &[u8]) -> u32 {
    let mut field = &header[HEADER_LEN - 4..HEADER_LEN];
    match ByteOrder::from_flags(header[2]) {
        ByteOrder::Network => field.get_u32(),
        ByteOrder::Native => field.get_u32_le(),
    }
}

fn invalid_data(e: Error) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, e)
}
