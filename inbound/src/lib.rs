//! Plugin surface for inbound Aerospike connectors.
//!
//! A host runtime consumes messages from a streaming system, wraps each one
//! in an [`InboundMessage`](model::message::InboundMessage) and hands it to a
//! registered transform. The transform answers with
//! [`RecordOperation`](operation::record::RecordOperation)s which the host
//! executes against the database.

pub mod config;
pub mod error;
pub mod model;
pub mod operation;
pub mod reader;
pub mod registry;
pub mod transform;
