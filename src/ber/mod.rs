//! BER (Basic Encoding Rules) codec for SNMP.
//!
//! Only the tag subset SNMP uses is supported. Encoding writes into a reverse
//! buffer; the `*_len` functions compute encoded sizes without writing, for
//! callers that must budget a message before building it.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use length::*;
