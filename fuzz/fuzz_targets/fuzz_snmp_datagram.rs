#![no_main]

use std::sync::{Mutex, OnceLock};

use libfuzzer_sys::fuzz_target;
use smart_snmp::{Agent, Mib, OidTable, Value, oid};

fn agent() -> &'static Mutex<Agent> {
    static AGENT: OnceLock<Mutex<Agent>> = OnceLock::new();
    AGENT.get_or_init(|| {
        let mut system = OidTable::new();
        system.insert(oid!(1, 0), Value::from("fuzz"));
        system.insert(oid!(3, 0), Value::TimeTicks(1));
        system.insert(oid!(5, 0), Value::from("fuzz-host"));
        let mut mib = Mib::new();
        let _ = mib.register(&oid!(1, 3, 6, 1, 2, 1, 1), system);
        Mutex::new(Agent::builder().mib(mib).build())
    })
}

fuzz_target!(|data: &[u8]| {
    let mut agent = agent().lock().unwrap_or_else(|e| e.into_inner());
    // Whatever the agent answers must itself decode.
    if let Some(response) = agent.handle_datagram(data) {
        assert!(smart_snmp::message::Message::decode(response).is_ok());
    }
});
