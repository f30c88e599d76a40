//! Keeps a bounded, most-recent-first list of call detail records (CDRs)
//! per subscriber.
//!
//! The existing record is read first. A new subscriber gets a full record
//! written with a one-element list; an existing one gets the new CDR
//! inserted at the head, after trimming the list if it is at capacity.

use crate::record::KafkaMessage;
use aerospike_connect_inbound::error::TransformError;
use aerospike_connect_inbound::model::key::Key;
use aerospike_connect_inbound::model::record::Bin;
use aerospike_connect_inbound::model::value::Value;
use aerospike_connect_inbound::operation::cdt::ListOperation;
use aerospike_connect_inbound::operation::record::{
    check_bin_name, OperateOperation, PutOperation, RecordOperation,
};
use aerospike_connect_inbound::reader::AerospikeReader;
use aerospike_connect_inbound::registry::TransformContext;
use aerospike_connect_inbound::transform::{InboundMessageTransform, InboundMessageTransformer};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const TOPIC_NAME_BIN: &str = "topicName";

/// What to do when the pre-read fails for a reason other than a missing
/// record.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReadErrorPolicy {
    TreatAsAbsent,
    Fail,
}

#[derive(Debug, Clone)]
pub struct CasCdtSettings {
    pub namespace: String,
    pub set: Option<String>,
    pub key_field: String,
    pub list_bin: String,
    pub capacity: i64,
    pub read_error: ReadErrorPolicy,
    pub topic: String,
    /// Copied into every new record as bins.
    pub params: Vec<(String, Value)>,
}

impl CasCdtSettings {
    pub fn from_context(ctx: &TransformContext) -> Result<Self, TransformError> {
        let config = ctx.config();
        let capacity = config.int_param_or("capacity", 2)?;
        if capacity < 1 {
            return Err(TransformError::invalid_param(
                "capacity",
                "must be at least 1",
            ));
        }
        let read_error = match config.str_param_or("read-error", "treat-as-absent")?.as_str() {
            "treat-as-absent" => ReadErrorPolicy::TreatAsAbsent,
            "fail" => ReadErrorPolicy::Fail,
            other => {
                return Err(TransformError::invalid_param(
                    "read-error",
                    format!("unknown policy [{}]", other),
                ));
            }
        };
        let list_bin = config.str_param_or("list-bin", "cdrs")?;
        check_bin_name(&list_bin)?;
        Ok(Self {
            namespace: config.str_param_or("namespace", "test")?,
            set: config.str_param("set")?,
            key_field: config.str_param_or("key-field", "name")?,
            list_bin,
            capacity,
            read_error,
            topic: ctx.topic().to_string(),
            params: config.params(),
        })
    }
}

fn new_cdr(input: &KafkaMessage) -> Value {
    if let Some(cdr) = input.field("cdr") {
        return cdr.clone();
    }
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    Value::String(format!("cdr_{}", millis))
}

fn cas_cdt(
    settings: &CasCdtSettings,
    reader: &dyn AerospikeReader,
    input: &KafkaMessage,
) -> Result<RecordOperation, TransformError> {
    let Some(user_key) = input.field(&settings.key_field) else {
        log::error!("Invalid message, missing field [{field}]", field = settings.key_field);
        return Ok(RecordOperation::Skip);
    };
    let key = match Key::from_value(
        settings.namespace.as_str(),
        settings.set.as_deref(),
        user_key,
    ) {
        Ok(key) => key,
        Err(err) => {
            log::error!("Invalid message key [{value}]: {err}", value = user_key, err = err);
            return Ok(RecordOperation::Skip);
        }
    };
    let cdr = new_cdr(input);

    let existing = match reader.find(None, &key) {
        Ok(record) => record,
        Err(err) => match settings.read_error {
            ReadErrorPolicy::TreatAsAbsent => {
                log::error!("Error while getting the record [{key}]: {err}", key = key, err = err);
                None
            }
            ReadErrorPolicy::Fail => return Err(err.into()),
        },
    };

    let write_policy = input.write_policy().cloned();
    match existing {
        None => {
            let mut fields: Vec<(&String, &Value)> = input.fields().iter().collect();
            fields.sort_by(|a, b| a.0.cmp(b.0));
            let extra = settings
                .params
                .iter()
                .map(|(name, value)| (name, value))
                .chain(fields)
                .filter(|(name, _)| **name != settings.list_bin)
                .filter(|(name, _)| match check_bin_name(name) {
                    Ok(()) => true,
                    Err(err) => {
                        log::warn!("Not copying [{name}] into [{key}]: {err}", name = name, key = key, err = err);
                        false
                    }
                })
                .map(|(name, value)| Bin::new(name.as_str(), value.clone()))
                .collect::<Vec<_>>();

            let put = PutOperation::builder()
                .key(key)
                .write_policy(write_policy)
                .bin(Bin::new(settings.list_bin.as_str(), Value::List(vec![cdr])))
                .bin(Bin::new(TOPIC_NAME_BIN, settings.topic.as_str()))
                .bins(extra)
                .ignorable_result_codes(input.ignore_error_codes().clone())
                .build()?;
            Ok(put.into())
        }
        Some(record) => {
            let len = record
                .get_list(&settings.list_bin)
                .map(|list| list.len())
                .unwrap_or(0);
            let mut builder = OperateOperation::builder()
                .key(key)
                .write_policy(write_policy)
                .ignore_error_codes(input.ignore_error_codes().clone());
            if len as i64 >= settings.capacity {
                // drop the oldest entry to make room
                builder = builder.operation(ListOperation::remove_range(
                    settings.list_bin.as_str(),
                    settings.capacity - 1,
                    1,
                ));
            }
            builder = builder.operation(ListOperation::insert(settings.list_bin.as_str(), 0, cdr));
            Ok(builder.build()?.into())
        }
    }
}

/// List-returning variant, shared by all workers.
pub struct CasCdtTransform {
    reader: Arc<dyn AerospikeReader>,
    settings: CasCdtSettings,
}

impl CasCdtTransform {
    pub fn new(ctx: &TransformContext) -> Result<Self, TransformError> {
        Ok(Self {
            reader: ctx.reader().clone(),
            settings: CasCdtSettings::from_context(ctx)?,
        })
    }
}

impl InboundMessageTransform<KafkaMessage> for CasCdtTransform {
    fn transform(&self, input: &KafkaMessage) -> Result<Vec<RecordOperation>, TransformError> {
        Ok(vec![cas_cdt(&self.settings, self.reader.as_ref(), input)?])
    }
}

/// Single-result variant, shared by all workers.
pub struct CasCdtTransformer {
    reader: Arc<dyn AerospikeReader>,
    settings: CasCdtSettings,
}

impl CasCdtTransformer {
    pub fn new(ctx: &TransformContext) -> Result<Self, TransformError> {
        Ok(Self {
            reader: ctx.reader().clone(),
            settings: CasCdtSettings::from_context(ctx)?,
        })
    }
}

impl InboundMessageTransformer<KafkaMessage> for CasCdtTransformer {
    fn transform(&self, input: &KafkaMessage) -> Result<RecordOperation, TransformError> {
        cas_cdt(&self.settings, self.reader.as_ref(), input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KafkaRecord;
    use aerospike_connect_inbound::config::TransformConfig;
    use aerospike_connect_inbound::error::OperationError;
    use aerospike_connect_inbound::model::message::InboundMessage;
    use aerospike_connect_inbound::model::result_code::ResultCode;
    use aerospike_connect_inbound::operation::cdt::ListOp;
    use aerospike_connect_inbound::operation::op::Operation;
    use aerospike_connect_inbound::reader::memory::MemoryStore;
    use serde_json::json;

    fn context(store: Arc<MemoryStore>, config: TransformConfig) -> TransformContext {
        TransformContext::new("calls", config, store)
    }

    fn message(name: &str) -> KafkaMessage {
        let record = KafkaRecord {
            topic: "calls".to_string(),
            partition: 0,
            offset: 0,
            key: None,
            value: Some(json!({ "name": name })),
        };
        InboundMessage::builder(record)
            .field("name", name)
            .field("cdr", "cdr_new")
            .build()
    }

    fn key(name: &str) -> Key {
        Key::new("test", None, name).unwrap()
    }

    fn seed(store: &MemoryStore, name: &str, cdrs: &[&str]) {
        let list = cdrs.iter().map(|c| Value::from(*c)).collect::<Vec<_>>();
        store.put_record(key(name), [Bin::new("cdrs", list)].into_iter().collect());
    }

    fn list_ops(op: &RecordOperation) -> Vec<ListOp> {
        match op {
            RecordOperation::Operate(op) => op
                .operations()
                .iter()
                .map(|o| match o {
                    Operation::List(l) => l.op.clone(),
                    other => panic!("unexpected operation {:?}", other),
                })
                .collect(),
            other => panic!("expected operate, got {:?}", other),
        }
    }

    #[test]
    fn trims_before_insert_at_capacity() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "alice", &["cdr_2", "cdr_1"]);
        let transformer =
            CasCdtTransformer::new(&context(store, TransformConfig::new("cas-cdt"))).unwrap();

        let op = transformer.transform(&message("alice")).unwrap();
        assert_eq!(
            list_ops(&op),
            vec![
                ListOp::RemoveRange { index: 1, count: 1 },
                ListOp::Insert {
                    index: 0,
                    value: Value::from("cdr_new")
                },
            ]
        );
    }

    #[test]
    fn inserts_only_below_capacity() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "alice", &["cdr_1"]);
        let transformer =
            CasCdtTransformer::new(&context(store, TransformConfig::new("cas-cdt"))).unwrap();

        let op = transformer.transform(&message("alice")).unwrap();
        assert_eq!(
            list_ops(&op),
            vec![ListOp::Insert {
                index: 0,
                value: Value::from("cdr_new")
            }]
        );
    }

    #[test]
    fn respects_configured_capacity() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "alice", &["c", "b", "a"]);
        let config = TransformConfig::new("cas-cdt").with_param("capacity", 3);
        let transform = CasCdtTransform::new(&context(store, config)).unwrap();

        let ops = transform.transform(&message("alice")).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(
            list_ops(&ops[0])[0],
            ListOp::RemoveRange { index: 2, count: 1 }
        );
    }

    #[test]
    fn puts_new_record_when_absent() {
        let store = Arc::new(MemoryStore::new());
        let config = TransformConfig::new("cas-cdt").with_param("region", "eu");
        let transform = CasCdtTransform::new(&context(store, config)).unwrap();

        let ops = transform.transform(&message("bob")).unwrap();
        let RecordOperation::Put(put) = &ops[0] else {
            panic!("expected put, got {:?}", ops[0]);
        };
        assert_eq!(put.key(), &key("bob"));
        assert!(
            put.bins()
                .contains(&Bin::new("cdrs", Value::List(vec!["cdr_new".into()])))
        );
        assert!(put.bins().contains(&Bin::new("topicName", "calls")));
        assert!(put.bins().contains(&Bin::new("region", "eu")));
        assert!(put.bins().contains(&Bin::new("name", "bob")));
    }

    #[test]
    fn not_found_error_is_absent() {
        let store = Arc::new(MemoryStore::new().with_missing_as_error());
        let config = TransformConfig::new("cas-cdt").with_param("read-error", "fail");
        let transform = CasCdtTransform::new(&context(store, config)).unwrap();

        let ops = transform.transform(&message("bob")).unwrap();
        assert!(matches!(ops[0], RecordOperation::Put(_)));
    }

    #[test]
    fn other_read_errors_follow_policy() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "alice", &["cdr_1"]);
        store.set_failure(Some(ResultCode::TIMEOUT));

        let lenient =
            CasCdtTransform::new(&context(store.clone(), TransformConfig::new("cas-cdt"))).unwrap();
        let ops = lenient.transform(&message("alice")).unwrap();
        assert!(matches!(ops[0], RecordOperation::Put(_)));

        let strict = CasCdtTransform::new(&context(
            store,
            TransformConfig::new("cas-cdt").with_param("read-error", "fail"),
        ))
        .unwrap();
        assert!(matches!(
            strict.transform(&message("alice")),
            Err(TransformError::Reader(e)) if e.code == ResultCode::TIMEOUT
        ));
    }

    #[test]
    fn rejects_long_list_bin() {
        let store = Arc::new(MemoryStore::new());
        let config = TransformConfig::new("cas-cdt").with_param("list-bin", "call-detail-records");
        assert!(matches!(
            CasCdtTransform::new(&context(store.clone(), config.clone())),
            Err(TransformError::Operation(OperationError::BinNameTooLong(name))) if name == "call-detail-records"
        ));
        assert!(CasCdtTransformer::new(&context(store, config)).is_err());
    }

    #[test]
    fn drops_fields_with_long_names_from_new_record() {
        let store = Arc::new(MemoryStore::new());
        let config = TransformConfig::new("cas-cdt").with_param("subscriber-identity", "x");
        let transform = CasCdtTransform::new(&context(store, config)).unwrap();
        let record = KafkaRecord {
            topic: "calls".to_string(),
            partition: 0,
            offset: 0,
            key: None,
            value: None,
        };
        let msg: KafkaMessage = InboundMessage::builder(record)
            .field("name", "bob")
            .field("subscriber-msisdn", "4470")
            .build();

        let ops = transform.transform(&msg).unwrap();
        let RecordOperation::Put(put) = &ops[0] else {
            panic!("expected put, got {:?}", ops[0]);
        };
        let names: Vec<&str> = put.bins().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["cdrs", "topicName", "name"]);
    }

    #[test]
    fn missing_key_field_skips() {
        let store = Arc::new(MemoryStore::new());
        let transform =
            CasCdtTransform::new(&context(store, TransformConfig::new("cas-cdt"))).unwrap();
        let record = KafkaRecord {
            topic: "calls".to_string(),
            partition: 0,
            offset: 0,
            key: None,
            value: Some(json!({})),
        };
        let msg: KafkaMessage = InboundMessage::builder(record).build();
        assert_eq!(transform.transform(&msg).unwrap(), vec![RecordOperation::Skip]);
    }

    #[test]
    fn rejects_bad_params() {
        let store = Arc::new(MemoryStore::new());
        let config = TransformConfig::new("cas-cdt").with_param("capacity", 0);
        assert!(CasCdtTransform::new(&context(store.clone(), config)).is_err());
        let config = TransformConfig::new("cas-cdt").with_param("read-error", "ignore");
        assert!(CasCdtTransform::new(&context(store, config)).is_err());
    }
}
