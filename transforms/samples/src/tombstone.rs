//! Deletes the record when the message is a tombstone, otherwise writes the
//! message's `name` field. The record key is taken from the message key.

use crate::record::KafkaMessage;
use aerospike_connect_inbound::error::TransformError;
use aerospike_connect_inbound::model::key::Key;
use aerospike_connect_inbound::model::record::Bin;
use aerospike_connect_inbound::operation::record::{DeleteOperation, PutOperation, RecordOperation};
use aerospike_connect_inbound::registry::TransformContext;
use aerospike_connect_inbound::transform::{InboundMessageTransform, InboundMessageTransformer};

const NAME_FIELD: &str = "name";

struct Target {
    namespace: String,
    set: Option<String>,
}

impl Target {
    fn from_context(ctx: &TransformContext) -> Result<Self, TransformError> {
        Ok(Self {
            namespace: ctx.config().str_param_or("namespace", "test")?,
            set: ctx.config().str_param("set")?,
        })
    }
}

fn tombstone(target: &Target, input: &KafkaMessage) -> RecordOperation {
    let Some(message_key) = input.message_key() else {
        log::warn!(
            "Skipping message at offset [{offset}]: no message key",
            offset = input.message().offset
        );
        return RecordOperation::Skip;
    };
    let key = match Key::from_value(target.namespace.as_str(), target.set.as_deref(), message_key) {
        Ok(key) => key,
        Err(err) => {
            log::warn!("Skipping message with key [{key}]: {err}", key = message_key, err = err);
            return RecordOperation::Skip;
        }
    };

    if input.message().is_tombstone() {
        return DeleteOperation::new(key, input.write_policy().cloned()).into();
    }
    match input.field(NAME_FIELD) {
        Some(name) => PutOperation::new(
            key,
            input.write_policy().cloned(),
            vec![Bin::new(NAME_FIELD, name.clone())],
        )
        .with_ignorable_result_codes(input.ignore_error_codes().clone())
        .into(),
        None => {
            log::warn!("Skipping message with key [{key}]: missing [name]", key = key);
            RecordOperation::Skip
        }
    }
}

/// Built afresh for every message.
pub struct TombstoneTransform {
    target: Target,
}

impl TombstoneTransform {
    pub fn new(ctx: &TransformContext) -> Result<Self, TransformError> {
        Ok(Self {
            target: Target::from_context(ctx)?,
        })
    }
}

impl InboundMessageTransform<KafkaMessage> for TombstoneTransform {
    fn transform(&self, input: &KafkaMessage) -> Result<Vec<RecordOperation>, TransformError> {
        Ok(vec![tombstone(&self.target, input)])
    }
}

pub struct TombstoneTransformer {
    target: Target,
}

impl TombstoneTransformer {
    pub fn new(ctx: &TransformContext) -> Result<Self, TransformError> {
        Ok(Self {
            target: Target::from_context(ctx)?,
        })
    }
}

impl InboundMessageTransformer<KafkaMessage> for TombstoneTransformer {
    fn transform(&self, input: &KafkaMessage) -> Result<RecordOperation, TransformError> {
        Ok(tombstone(&self.target, input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KafkaRecord;
    use aerospike_connect_inbound::config::TransformConfig;
    use aerospike_connect_inbound::model::message::InboundMessage;
    use aerospike_connect_inbound::model::value::Value;
    use aerospike_connect_inbound::reader::memory::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn context() -> TransformContext {
        TransformContext::new(
            "jets",
            TransformConfig::new("tombstone").with_param("namespace", "jets"),
            Arc::new(MemoryStore::new()),
        )
    }

    fn message(key: Option<Value>, value: Option<serde_json::Value>) -> KafkaMessage {
        let record = KafkaRecord {
            topic: "jets".to_string(),
            partition: 1,
            offset: 9,
            key: None,
            value: value.clone(),
        };
        let mut builder = InboundMessage::builder(record);
        if let Some(key) = key {
            builder = builder.message_key(key);
        }
        if let Some(name) = value.as_ref().and_then(|v| v.get("name")).and_then(|v| v.as_str()) {
            builder = builder.field("name", name);
        }
        builder.build()
    }

    #[test]
    fn tombstone_deletes() {
        let transform = TombstoneTransform::new(&context()).unwrap();
        let ops = transform.transform(&message(Some("jet-1".into()), None)).unwrap();
        let RecordOperation::Delete(delete) = &ops[0] else {
            panic!("expected delete, got {:?}", ops[0]);
        };
        assert_eq!(delete.key(), &Key::new("jets", None, "jet-1").unwrap());
    }

    #[test]
    fn payload_puts_name() {
        let transformer = TombstoneTransformer::new(&context()).unwrap();
        let op = transformer
            .transform(&message(Some(Value::Int(7)), Some(json!({"name": "falcon"}))))
            .unwrap();
        let RecordOperation::Put(put) = op else {
            panic!("expected put");
        };
        assert_eq!(put.key(), &Key::new("jets", None, 7).unwrap());
        assert_eq!(put.bins(), &[Bin::new("name", "falcon")]);
    }

    #[test]
    fn skips_without_usable_key_or_name() {
        let transformer = TombstoneTransformer::new(&context()).unwrap();
        assert!(transformer.transform(&message(None, None)).unwrap().is_skip());
        assert!(
            transformer
                .transform(&message(Some(Value::Float(1.5)), None))
                .unwrap()
                .is_skip()
        );
        assert!(
            transformer
                .transform(&message(Some("jet-2".into()), Some(json!({"wings": 2}))))
                .unwrap()
                .is_skip()
        );
    }
}
