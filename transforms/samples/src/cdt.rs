//! Records the sale of a rocket with a single atomic operate.
//!
//! Record layout:
//!
//! ```text
//! inventory:        List<Rocket>
//! sales-record:     { list-of-sold: List<Rocket>, num-rockets-sold: Int, gross-profit: Float }
//! top-salesperson:  { first-name: String, last-name: String }
//! ```

use crate::record::KafkaMessage;
use aerospike_connect_inbound::error::TransformError;
use aerospike_connect_inbound::model::key::Key;
use aerospike_connect_inbound::model::value::Value;
use aerospike_connect_inbound::operation::cdt::{
    Ctx, ListOperation, ListReturnType, MapOperation, MapPolicy,
};
use aerospike_connect_inbound::operation::record::{OperateOperation, RecordOperation};
use aerospike_connect_inbound::registry::TransformContext;
use aerospike_connect_inbound::transform::InboundMessageTransformer;

pub const INVENTORY_BIN: &str = "inventory";
pub const SALES_RECORD_BIN: &str = "sales-record";
pub const TOP_SALES_PERSON_BIN: &str = "top-salesperson";

pub struct CdtMessageTransformer {
    namespace: String,
}

impl CdtMessageTransformer {
    pub fn new(ctx: &TransformContext) -> Result<Self, TransformError> {
        Ok(Self {
            namespace: ctx
                .config()
                .str_param_or("namespace", "used-rocket-dealership")?,
        })
    }
}

impl InboundMessageTransformer<KafkaMessage> for CdtMessageTransformer {
    fn transform(&self, input: &KafkaMessage) -> Result<RecordOperation, TransformError> {
        let Some(key) = input.field("key").and_then(|k| k.as_str()) else {
            log::warn!("Invalid missing key");
            return Ok(RecordOperation::Skip);
        };
        let Some(rocket) = input.field("rocket").filter(|r| r.as_map().is_some()) else {
            log::warn!("Invalid rocket for key [{key}]", key = key);
            return Ok(RecordOperation::Skip);
        };
        let profit = rocket.get("profit").cloned().unwrap_or(Value::Int(0));

        let mut builder = OperateOperation::builder()
            .key(Key::new(self.namespace.as_str(), None, key)?)
            .write_policy(input.write_policy().cloned())
            .ignore_error_codes(input.ignore_error_codes().clone())
            .operation(ListOperation::remove_by_value(
                INVENTORY_BIN,
                rocket.clone(),
                ListReturnType::None,
            ))
            .operation(
                ListOperation::append(SALES_RECORD_BIN, rocket.clone())
                    .ctx(Ctx::map_key("list-of-sold")),
            )
            .operation(MapOperation::increment(
                MapPolicy::default(),
                SALES_RECORD_BIN,
                "num-rockets-sold",
                1,
            ))
            .operation(MapOperation::increment(
                MapPolicy::default(),
                SALES_RECORD_BIN,
                "gross-profit",
                profit,
            ));
        if let Some(person) = input.field("salesperson").and_then(|p| p.as_map()) {
            builder = builder.operation(MapOperation::put_items(
                MapPolicy::default(),
                TOP_SALES_PERSON_BIN,
                person.to_vec(),
            ));
        }
        Ok(builder.build()?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KafkaRecord;
    use aerospike_connect_inbound::config::TransformConfig;
    use aerospike_connect_inbound::model::message::InboundMessage;
    use aerospike_connect_inbound::model::result_code::ResultCode;
    use aerospike_connect_inbound::operation::op::Operation;
    use aerospike_connect_inbound::reader::memory::MemoryStore;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn transformer() -> CdtMessageTransformer {
        CdtMessageTransformer::new(&TransformContext::new(
            "sales",
            TransformConfig::new("cdt"),
            Arc::new(MemoryStore::new()),
        ))
        .unwrap()
    }

    fn rocket() -> Value {
        Value::Map(vec![
            ("model".into(), "falcon".into()),
            ("profit".into(), Value::Float(12.5)),
        ])
    }

    fn record() -> KafkaRecord {
        KafkaRecord {
            topic: "sales".to_string(),
            partition: 0,
            offset: 0,
            key: None,
            value: None,
        }
    }

    #[test]
    fn builds_sale_operations_in_order() {
        let msg: KafkaMessage = InboundMessage::builder(record())
            .field("key", "dealer-1")
            .field("rocket", rocket())
            .build();
        let RecordOperation::Operate(op) = transformer().transform(&msg).unwrap() else {
            panic!("expected operate");
        };

        assert_eq!(
            op.key(),
            &Key::new("used-rocket-dealership", None, "dealer-1").unwrap()
        );
        let bins: Vec<Option<&str>> = op.operations().iter().map(|o| o.bin_name()).collect();
        assert_eq!(
            bins,
            vec![
                Some(INVENTORY_BIN),
                Some(SALES_RECORD_BIN),
                Some(SALES_RECORD_BIN),
                Some(SALES_RECORD_BIN),
            ]
        );
        let Operation::Map(gross) = &op.operations()[3] else {
            panic!("expected map increment");
        };
        assert_eq!(
            gross.op,
            aerospike_connect_inbound::operation::cdt::MapOp::Increment {
                key: "gross-profit".into(),
                incr: Value::Float(12.5),
            }
        );
    }

    #[test]
    fn adds_top_sales_person_when_present() {
        let msg: KafkaMessage = InboundMessage::builder(record())
            .field("key", "dealer-1")
            .field("rocket", rocket())
            .field(
                "salesperson",
                Value::Map(vec![("first-name".into(), "Ada".into())]),
            )
            .build();
        let op = transformer().transform(&msg).unwrap();
        let RecordOperation::Operate(op) = op else {
            panic!("expected operate");
        };
        assert_eq!(op.operations().len(), 5);
        assert_eq!(op.operations()[4].bin_name(), Some(TOP_SALES_PERSON_BIN));
    }

    #[test]
    fn carries_ignore_error_codes() {
        let msg: KafkaMessage = InboundMessage::builder(record())
            .field("key", "dealer-1")
            .field("rocket", rocket())
            .ignore_error_code(ResultCode::ELEMENT_NOT_FOUND)
            .build();
        let RecordOperation::Operate(op) = transformer().transform(&msg).unwrap() else {
            panic!("expected operate");
        };
        assert_eq!(
            op.ignore_error_codes(),
            &HashSet::from([ResultCode::ELEMENT_NOT_FOUND])
        );
    }

    #[test]
    fn skips_invalid_input() {
        let no_key: KafkaMessage = InboundMessage::builder(record())
            .field("rocket", rocket())
            .build();
        assert!(transformer().transform(&no_key).unwrap().is_skip());

        let int_key: KafkaMessage = InboundMessage::builder(record())
            .field("key", 5)
            .field("rocket", rocket())
            .build();
        assert!(transformer().transform(&int_key).unwrap().is_skip());

        let bad_rocket: KafkaMessage = InboundMessage::builder(record())
            .field("key", "dealer-1")
            .field("rocket", "falcon")
            .build();
        assert!(transformer().transform(&bad_rocket).unwrap().is_skip());
    }
}
