//! Reference transforms for inbound Kafka topics, plus the pieces of a host
//! needed to replay recorded messages against an in-memory store.

pub mod apply;
pub mod cas_cdt;
pub mod cdt;
pub mod extract;
pub mod logging;
pub mod record;
pub mod registry;
pub mod replay;
pub mod tombstone;
