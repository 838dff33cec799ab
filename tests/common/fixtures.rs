//! Common test fixtures: well-known OIDs, a populated MIB and request builders.

use bytes::Bytes;
use smart_snmp::message::{
    CommunityMessage, HeaderData, Message, ScopedPdu, UsmSecurityParams, V3Message, flags,
};
use smart_snmp::{
    Agent, ErrorStatus, Mib, Oid, OidTable, Pdu, PduType, RequestKind, Resolved, Value, VarBind,
    Version, ViewTable, oid,
};

// =============================================================================
// Standard system MIB OIDs (1.3.6.1.2.1.1.*)
// =============================================================================

pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}
pub fn sys_object_id() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 2, 0)
}
pub fn sys_uptime() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
}
pub fn sys_contact() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 4, 0)
}
pub fn sys_name() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)
}
pub fn sys_location() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 6, 0)
}

/// ifDescr column: 1.3.6.1.2.1.2.2.1.2
pub fn if_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2)
}

/// System subtree root: 1.3.6.1.2.1.1
pub fn system_subtree() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1)
}

/// Interfaces subtree root: 1.3.6.1.2.1.2
pub fn interfaces_subtree() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2)
}

/// Nonexistent OID for testing NoSuchObject
pub fn nonexistent_oid() -> Oid {
    oid!(1, 3, 6, 1, 99, 99, 99, 0)
}

// =============================================================================
// Principals
// =============================================================================

/// Read-only community: read everything, write nothing
pub const COMMUNITY_RO: &[u8] = b"public";
/// Read-write community: write access to the system group only
pub const COMMUNITY_RW: &[u8] = b"private";
/// V3 user with read access to the system group
pub const USER: &[u8] = b"operator";

pub const ENGINE_ID: &[u8] = b"\x80\x00\x1f\x88\x04test-engine";

// =============================================================================
// MIB
// =============================================================================

/// System group scalars (sysUpTime fixed) plus a three-row ifDescr column.
///
/// sysDescr.0 is read-only; the rest of the system group accepts SETs of
/// the same type.
pub fn populated_mib() -> Mib {
    let mut mib = Mib::new();

    mib.register(
        &oid!(1, 3, 6, 1, 2, 1, 1, 1),
        |kind: RequestKind, suffix: &[u32], _: Option<&Value>| match (kind, suffix) {
            (RequestKind::Get, [0]) => Resolved::value("smart-snmp test agent"),
            (RequestKind::GetNext, []) => Resolved::next(oid!(0), "smart-snmp test agent"),
            (RequestKind::Set, [0]) => Resolved::error(ErrorStatus::NotWritable),
            (RequestKind::Get, _) | (RequestKind::Set, _) => Resolved::no_such_instance(),
            (RequestKind::GetNext, _) => Resolved::end_of_view(),
        },
    )
    .unwrap();

    for (arc, value) in [
        (2, Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 8072))),
        (3, Value::TimeTicks(123_456)),
        (4, Value::from("ops@example.com")),
        (5, Value::from("test-host")),
        (6, Value::from("lab")),
    ] {
        let mut scalar = OidTable::new();
        scalar.insert(oid!(0), value);
        mib.register(&system_subtree().child(arc), scalar).unwrap();
    }

    let mut column = OidTable::new();
    column.insert(oid!(1), Value::from("lo"));
    column.insert(oid!(2), Value::from("eth0"));
    column.insert(oid!(3), Value::from("eth1"));
    mib.register(&if_descr(), column).unwrap();

    mib
}

/// The OIDs of [`populated_mib`] in walk order.
pub fn populated_oids() -> Vec<Oid> {
    let mut oids: Vec<Oid> = (1..=6).map(|arc| system_subtree().child(arc).child(0)).collect();
    oids.extend((1..=3).map(|row| if_descr().child(row)));
    oids
}

/// Views used by [`agent`].
pub fn views() -> ViewTable {
    ViewTable::new()
        .community(COMMUNITY_RO, [oid!(1, 3, 6, 1)], Vec::<Oid>::new())
        .community(COMMUNITY_RW, [oid!(1, 3, 6, 1)], [system_subtree()])
        .user(USER, [system_subtree()], Vec::<Oid>::new())
}

/// An agent over [`populated_mib`] with [`views`].
pub fn agent() -> Agent {
    Agent::builder()
        .engine_id(ENGINE_ID)
        .views(views())
        .mib(populated_mib())
        .build()
}

// =============================================================================
// Requests
// =============================================================================

pub fn null_varbinds(oids: &[Oid]) -> Vec<VarBind> {
    oids.iter().cloned().map(VarBind::null).collect()
}

pub fn community_request(version: Version, community: &'static [u8], pdu: Pdu) -> Bytes {
    Message::Community(CommunityMessage::new(version, community, pdu)).encode()
}

pub fn get(version: Version, community: &'static [u8], oids: &[Oid]) -> Bytes {
    community_request(
        version,
        community,
        Pdu::request(PduType::GetRequest, 1, null_varbinds(oids)),
    )
}

pub fn get_next(version: Version, community: &'static [u8], oids: &[Oid]) -> Bytes {
    community_request(
        version,
        community,
        Pdu::request(PduType::GetNextRequest, 2, null_varbinds(oids)),
    )
}

pub fn set(version: Version, community: &'static [u8], varbinds: Vec<VarBind>) -> Bytes {
    community_request(
        version,
        community,
        Pdu::request(PduType::SetRequest, 3, varbinds),
    )
}

pub fn get_bulk(
    community: &'static [u8],
    non_repeaters: i32,
    max_repetitions: i32,
    oids: &[Oid],
) -> Bytes {
    community_request(
        Version::V2c,
        community,
        Pdu::get_bulk(4, non_repeaters, max_repetitions, null_varbinds(oids)),
    )
}

/// An unauthenticated v3 request from `user`.
pub fn v3_request(user: &'static [u8], msg_flags: u8, pdu: Pdu) -> Bytes {
    let security = UsmSecurityParams {
        user_name: Bytes::from_static(user),
        ..UsmSecurityParams::default()
    };
    Message::V3(V3Message::new(
        HeaderData::new(77, 65507, msg_flags),
        security,
        ScopedPdu::new(Bytes::new(), Bytes::new(), pdu),
    ))
    .encode()
}

pub fn reportable() -> u8 {
    flags::REPORTABLE
}

/// Send `request` and decode the reply, which must exist.
pub fn exchange(agent: &mut Agent, request: &[u8]) -> Message {
    let response = agent
        .handle_datagram(request)
        .expect("agent should answer");
    Message::decode(response).expect("response should decode")
}

pub fn response_oids(message: &Message) -> Vec<Oid> {
    message.pdu().varbinds.iter().map(|vb| vb.oid.clone()).collect()
}
