#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use smart_snmp::agentx::{AgentxPdu, Header};
use smart_snmp::{Mib, OidTable, SubAgent, Value, oid};

fuzz_target!(|data: &[u8]| {
    let _ = Header::decode(data);

    let Ok(pdu) = AgentxPdu::decode_bytes(Bytes::copy_from_slice(data)) else {
        return;
    };
    // A decoded PDU re-encodes to something that decodes to the same PDU.
    let again = AgentxPdu::decode(&pdu.encode()).expect("re-encoded PDU decodes");
    assert_eq!(again.payload, pdu.payload);

    let mut table = OidTable::new();
    table.insert(oid!(0), Value::from("fuzz"));
    let mut mib = Mib::new();
    let _ = mib.register(&oid!(1, 3, 6, 1, 2, 1, 1, 1), table);
    let mut session = SubAgent::new(oid!(1, 3, 6, 1, 4, 1, 8072), "fuzz");
    if let Some(reply) = session.handle_pdu(&mut mib, data) {
        assert!(AgentxPdu::decode(&reply).is_ok());
    }
});
