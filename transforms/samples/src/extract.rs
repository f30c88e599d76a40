//! Host-side field and key extraction, done before a transform runs.

use crate::record::{KafkaMessage, KafkaRecord};
use aerospike_connect_inbound::config::TopicConfig;
use aerospike_connect_inbound::model::key::Key;
use aerospike_connect_inbound::model::message::InboundMessage;
use aerospike_connect_inbound::model::value::Value;
use std::collections::HashMap;

pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (Value::String(k.clone()), json_to_value(v)))
                .collect(),
        ),
    }
}

/// Top-level payload entries. A non-object payload has no fields.
pub fn extract_fields(record: &KafkaRecord) -> HashMap<String, Value> {
    match &record.value {
        Some(serde_json::Value::Object(map)) => map
            .iter()
            .map(|(k, v)| (k.clone(), json_to_value(v)))
            .collect(),
        _ => HashMap::new(),
    }
}

/// Wraps a consumed record the way the host does before invoking a
/// transform. A configured key field that is missing or not a valid user
/// key leaves the message without a database key.
pub fn build_message(record: KafkaRecord, topic: &TopicConfig) -> KafkaMessage {
    let fields = extract_fields(&record);
    let key = topic.key_field.as_deref().and_then(|name| {
        let value = fields.get(name)?;
        match Key::from_value(topic.namespace.as_str(), topic.set.as_deref(), value) {
            Ok(key) => Some(key),
            Err(err) => {
                log::warn!("Cannot derive key from field [{name}]: {err}", name = name, err = err);
                None
            }
        }
    });
    let message_key = record.key.as_ref().map(json_to_value);

    InboundMessage::new(
        message_key,
        record,
        key,
        topic.write_policy.clone(),
        fields,
        topic.ignore_error_codes(),
    )
}
