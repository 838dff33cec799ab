#![no_main]

use libfuzzer_sys::fuzz_target;
use smart_snmp::oid::{MAX_OID_LEN, Oid};

fuzz_target!(|data: &[u8]| {
    if let Ok(oid) = Oid::from_ber(data) {
        assert!(oid.len() <= MAX_OID_LEN);
        // Text form parses back to the same OID.
        if !oid.is_empty() {
            assert_eq!(Oid::parse(&oid.to_string()).ok(), Some(oid));
        }
    }
});
