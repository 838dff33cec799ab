//! UDP and AgentX transports against real sockets on the loopback interface.

mod common;

use std::time::Duration;

use bytes::BytesMut;
use common::*;
use smart_snmp::agentx::header::flags as agentx_flags;
use smart_snmp::agentx::pdu::admin_error;
use smart_snmp::agentx::{
    AgentxPdu, CloseReason, DEFAULT_PRIORITY, HEADER_LEN, Header, Payload, PduType as AgentxType,
    SearchRange,
};
use smart_snmp::message::Message;
use smart_snmp::transport::{AgentxClient, UdpServer, share};
use smart_snmp::{Error, Oid, Value, VarBind, Version};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

// =============================================================================
// UDP
// =============================================================================

#[tokio::test]
async fn test_udp_round_trip() {
    let server = UdpServer::bind("127.0.0.1:0".parse().unwrap(), None)
        .await
        .unwrap();
    let addr = server.local_addr();
    let agent = share(agent());
    let cancel = CancellationToken::new();
    let serving = tokio::spawn({
        let cancel = cancel.clone();
        async move { server.run(agent, cancel).await }
    });

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client
        .send_to(&get(Version::V2c, COMMUNITY_RO, &[sys_name()]), addr)
        .await
        .unwrap();

    let mut buf = vec![0u8; 65535];
    let (len, from) = timeout(WAIT, client.recv_from(&mut buf))
        .await
        .expect("response in time")
        .unwrap();
    assert_eq!(from, addr);

    let response = Message::decode(bytes::Bytes::copy_from_slice(&buf[..len])).unwrap();
    assert_eq!(
        response.pdu().varbinds,
        vec![VarBind::new(sys_name(), Value::from("test-host"))]
    );

    cancel.cancel();
    timeout(WAIT, serving).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn test_udp_garbage_is_ignored() {
    let server = UdpServer::bind("127.0.0.1:0".parse().unwrap(), None)
        .await
        .unwrap();
    let addr = server.local_addr();
    let cancel = CancellationToken::new();
    let serving = tokio::spawn({
        let cancel = cancel.clone();
        async move { server.run(share(agent()), cancel).await }
    });

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.send_to(b"\x01\x02\x03", addr).await.unwrap();
    client
        .send_to(&get(Version::V1, COMMUNITY_RO, &[sys_location()]), addr)
        .await
        .unwrap();

    // Only the well-formed request is answered.
    let mut buf = vec![0u8; 65535];
    let (len, _) = timeout(WAIT, client.recv_from(&mut buf))
        .await
        .expect("response in time")
        .unwrap();
    let response = Message::decode(bytes::Bytes::copy_from_slice(&buf[..len])).unwrap();
    assert_eq!(response.version(), Version::V1);
    assert_eq!(response.pdu().varbinds[0].value, Value::from("lab"));

    cancel.cancel();
    timeout(WAIT, serving).await.unwrap().unwrap().unwrap();
}

// =============================================================================
// AgentX over TCP
// =============================================================================

async fn read_frame(stream: &mut TcpStream) -> AgentxPdu {
    let mut frame = BytesMut::zeroed(HEADER_LEN);
    timeout(WAIT, stream.read_exact(&mut frame))
        .await
        .expect("frame in time")
        .unwrap();
    let header = Header::decode(&frame).unwrap();
    frame.resize(HEADER_LEN + header.payload_length as usize, 0);
    stream.read_exact(&mut frame[HEADER_LEN..]).await.unwrap();
    AgentxPdu::decode(&frame).unwrap()
}

async fn send(stream: &mut TcpStream, pdu: AgentxPdu) {
    stream.write_all(&pdu.encode()).await.unwrap();
}

fn master_response(request: &Header, session_id: u32, error: u16) -> AgentxPdu {
    AgentxPdu::new(
        Header::new(
            AgentxType::Response,
            session_id,
            request.transaction_id,
            request.packet_id,
        ),
        Payload::Response {
            sys_uptime: 0,
            error,
            index: 0,
            varbinds: Vec::new(),
        },
    )
}

/// Accept the sub-agent, open session 42 and acknowledge its registrations.
async fn open_session(listener: &TcpListener, registrations: usize) -> TcpStream {
    let (mut stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();

    let open = read_frame(&mut stream).await;
    assert_eq!(open.header.pdu_type, AgentxType::Open);
    match &open.payload {
        Payload::Open { descr, .. } => assert_eq!(&descr[..], b"test sub-agent"),
        other => panic!("expected Open, got {other:?}"),
    }
    send(&mut stream, master_response(&open.header, 42, 0)).await;

    for _ in 0..registrations {
        let register = read_frame(&mut stream).await;
        assert_eq!(register.header.session_id, 42);
        assert_ne!(register.header.flags & agentx_flags::INSTANCE_REGISTRATION, 0);
        match &register.payload {
            Payload::Register { priority, .. } => assert_eq!(*priority, DEFAULT_PRIORITY),
            other => panic!("expected Register, got {other:?}"),
        }
        send(&mut stream, master_response(&register.header, 42, 0)).await;
    }
    stream
}

fn client_for(listener: &TcpListener) -> AgentxClient {
    AgentxClient::new(listener.local_addr().unwrap())
        .descr("test sub-agent")
        .subtree(system_subtree())
        .subtree(interfaces_subtree())
}

#[tokio::test]
async fn test_agentx_session_lifecycle() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = client_for(&listener);
    let cancel = CancellationToken::new();
    let session = tokio::spawn({
        let cancel = cancel.clone();
        async move { client.run(share(agent()), cancel).await }
    });

    let mut stream = open_session(&listener, 2).await;

    let get = AgentxPdu::new(
        Header::new(AgentxType::Get, 42, 7, 100),
        Payload::Get(vec![
            SearchRange::new(sys_name(), false, Oid::empty()),
            SearchRange::new(nonexistent_oid(), false, Oid::empty()),
        ]),
    );
    send(&mut stream, get).await;

    let reply = read_frame(&mut stream).await;
    assert_eq!(reply.header.pdu_type, AgentxType::Response);
    assert_eq!(reply.header.session_id, 42);
    assert_eq!(reply.header.transaction_id, 7);
    assert_eq!(reply.header.packet_id, 100);
    match reply.payload {
        Payload::Response {
            error, varbinds, ..
        } => {
            assert_eq!(error, 0);
            assert_eq!(
                varbinds,
                vec![
                    VarBind::new(sys_name(), Value::from("test-host")),
                    VarBind::new(nonexistent_oid(), Value::NoSuchObject),
                ]
            );
        }
        other => panic!("expected Response, got {other:?}"),
    }

    cancel.cancel();
    let close = read_frame(&mut stream).await;
    assert_eq!(
        close.payload,
        Payload::Close {
            reason: CloseReason::Shutdown as u8
        }
    );
    timeout(WAIT, session).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn test_agentx_native_byte_order_get_next() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = client_for(&listener);
    let cancel = CancellationToken::new();
    let session = tokio::spawn({
        let cancel = cancel.clone();
        async move { client.run(share(agent()), cancel).await }
    });

    let mut stream = open_session(&listener, 2).await;

    let header = Header {
        flags: 0,
        ..Header::new(AgentxType::GetNext, 42, 8, 101)
    };
    let get_next = AgentxPdu::new(
        header,
        Payload::GetNext(vec![SearchRange::new(sys_location(), false, if_descr().child(3))]),
    );
    send(&mut stream, get_next).await;

    let reply = read_frame(&mut stream).await;
    assert_eq!(reply.header.flags & agentx_flags::NETWORK_BYTE_ORDER, 0);
    match reply.payload {
        Payload::Response { varbinds, .. } => {
            assert_eq!(
                varbinds,
                vec![VarBind::new(if_descr().child(1), Value::from("lo"))]
            );
        }
        other => panic!("expected Response, got {other:?}"),
    }

    // The master ending the session ends the run without a reply.
    send(
        &mut stream,
        AgentxPdu::new(
            Header::new(AgentxType::Close, 42, 0, 102),
            Payload::Close {
                reason: CloseReason::Shutdown as u8,
            },
        ),
    )
    .await;
    timeout(WAIT, session).await.unwrap().unwrap().unwrap();
    assert!(!cancel.is_cancelled());
}

#[tokio::test]
async fn test_agentx_unknown_pdu_type_skipped() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = client_for(&listener);
    let cancel = CancellationToken::new();
    let session = tokio::spawn({
        let cancel = cancel.clone();
        async move { client.run(share(agent()), cancel).await }
    });

    let mut stream = open_session(&listener, 2).await;

    // An unassigned type code and an unsupported version, each correctly framed.
    let mut unknown = AgentxPdu::new(Header::new(AgentxType::Ping, 42, 0, 103), Payload::Ping)
        .encode()
        .to_vec();
    unknown[1] = 42;
    stream.write_all(&unknown).await.unwrap();
    let mut bad_version = AgentxPdu::new(
        Header::new(AgentxType::Get, 42, 9, 104),
        Payload::Get(vec![SearchRange::new(sys_name(), false, Oid::empty())]),
    )
    .encode()
    .to_vec();
    bad_version[0] = 2;
    stream.write_all(&bad_version).await.unwrap();

    let get = AgentxPdu::new(
        Header::new(AgentxType::Get, 42, 9, 105),
        Payload::Get(vec![SearchRange::new(sys_location(), false, Oid::empty())]),
    );
    send(&mut stream, get).await;

    // Only the well-formed Get is answered.
    let reply = read_frame(&mut stream).await;
    assert_eq!(reply.header.packet_id, 105);
    match reply.payload {
        Payload::Response { error, varbinds, .. } => {
            assert_eq!(error, 0);
            assert_eq!(varbinds, vec![VarBind::new(sys_location(), Value::from("lab"))]);
        }
        other => panic!("expected Response, got {other:?}"),
    }
    assert!(!session.is_finished());

    cancel.cancel();
    let close = read_frame(&mut stream).await;
    assert_eq!(close.header.pdu_type, AgentxType::Close);
    timeout(WAIT, session).await.unwrap().unwrap().unwrap();
}

#[tokio::test]
async fn test_agentx_open_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = client_for(&listener);
    let session = tokio::spawn(async move {
        client
            .run(share(agent()), CancellationToken::new())
            .await
    });

    let (mut stream, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    let open = read_frame(&mut stream).await;
    send(
        &mut stream,
        master_response(&open.header, 0, admin_error::OPEN_FAILED),
    )
    .await;

    let result = timeout(WAIT, session).await.unwrap().unwrap();
    assert!(matches!(result, Err(Error::Session(_))));
}

#[tokio::test]
async fn test_agentx_master_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = client_for(&listener);
    drop(listener);

    let result = timeout(WAIT, client.run(share(agent()), CancellationToken::new()))
        .await
        .unwrap();
    assert!(matches!(result, Err(Error::Io { .. })));
}
