use aerospike_connect_inbound::model::message::InboundMessage;
use aerospike_connect_inbound::model::value::Value;
use serde::Deserialize;

/// A record as consumed from a Kafka topic partition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KafkaRecord {
    pub topic: String,
    #[serde(default)]
    pub partition: i32,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub key: Option<serde_json::Value>,
    /// `None` marks a tombstone.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

impl KafkaRecord {
    /// A tombstone has a key but no payload.
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

pub type KafkaMessage = InboundMessage<Value, KafkaRecord>;
