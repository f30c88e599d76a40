//! Results of transforming one inbound message.

use crate::error::OperationError;
use crate::model::key::Key;
use crate::model::policy::WritePolicy;
use crate::model::record::Bin;
use crate::model::result_code::ResultCode;
use crate::operation::op::Operation;
use std::collections::HashSet;

/// Longest bin name the database accepts, in bytes.
pub const MAX_BIN_NAME_LEN: usize = 15;

/// What the host executes for one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOperation {
    Put(PutOperation),
    Operate(OperateOperation),
    Delete(DeleteOperation),
    /// Independent single-record operations. They are not applied
    /// atomically: a failure part way leaves earlier ones in place.
    Composite(CompositeOperation),
    /// The message has no database effect.
    Skip,
}

impl RecordOperation {
    pub fn is_skip(&self) -> bool {
        matches!(self, RecordOperation::Skip)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, RecordOperation::Composite(_))
    }

    /// Key targeted by a single-record operation.
    pub fn key(&self) -> Option<&Key> {
        match self {
            RecordOperation::Put(op) => Some(op.key()),
            RecordOperation::Operate(op) => Some(op.key()),
            RecordOperation::Delete(op) => Some(op.key()),
            RecordOperation::Composite(_) | RecordOperation::Skip => None,
        }
    }

    /// Every single-record operation in execution order, flattening a
    /// composite.
    pub fn single_record_operations(&self) -> Vec<SingleRecordOperation> {
        match self {
            RecordOperation::Put(op) => vec![SingleRecordOperation::Put(op.clone())],
            RecordOperation::Operate(op) => vec![SingleRecordOperation::Operate(op.clone())],
            RecordOperation::Delete(op) => vec![SingleRecordOperation::Delete(op.clone())],
            RecordOperation::Composite(op) => op.operations().to_vec(),
            RecordOperation::Skip => vec![],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RecordOperation::Put(_) => "put",
            RecordOperation::Operate(_) => "operate",
            RecordOperation::Delete(_) => "delete",
            RecordOperation::Composite(_) => "composite",
            RecordOperation::Skip => "skip",
        }
    }
}

/// An operation against exactly one record.
#[derive(Debug, Clone, PartialEq)]
pub enum SingleRecordOperation {
    Put(PutOperation),
    Operate(OperateOperation),
    Delete(DeleteOperation),
}

impl SingleRecordOperation {
    pub fn key(&self) -> &Key {
        match self {
            SingleRecordOperation::Put(op) => op.key(),
            SingleRecordOperation::Operate(op) => op.key(),
            SingleRecordOperation::Delete(op) => op.key(),
        }
    }

    pub fn write_policy(&self) -> Option<&WritePolicy> {
        match self {
            SingleRecordOperation::Put(op) => op.write_policy(),
            SingleRecordOperation::Operate(op) => op.write_policy(),
            SingleRecordOperation::Delete(op) => op.write_policy(),
        }
    }

    /// Whether the executor should count `code` as success.
    pub fn is_ignorable(&self, code: ResultCode) -> bool {
        if code.is_ok() {
            return true;
        }
        match self {
            SingleRecordOperation::Put(op) => op.ignorable_result_codes().contains(&code),
            SingleRecordOperation::Operate(op) => op.ignore_error_codes().contains(&code),
            SingleRecordOperation::Delete(_) => false,
        }
    }
}

impl From<SingleRecordOperation> for RecordOperation {
    fn from(value: SingleRecordOperation) -> Self {
        match value {
            SingleRecordOperation::Put(op) => RecordOperation::Put(op),
            SingleRecordOperation::Operate(op) => RecordOperation::Operate(op),
            SingleRecordOperation::Delete(op) => RecordOperation::Delete(op),
        }
    }
}

/// Writes the given bins, creating or updating the record.
#[derive(Debug, Clone, PartialEq)]
pub struct PutOperation {
    key: Key,
    write_policy: Option<WritePolicy>,
    bins: Vec<Bin>,
    ignorable_result_codes: HashSet<ResultCode>,
}

impl PutOperation {
    /// Does not check bin names; [`PutOperation::builder`] does.
    pub fn new(key: Key, write_policy: Option<WritePolicy>, bins: Vec<Bin>) -> Self {
        Self {
            key,
            write_policy,
            bins,
            ignorable_result_codes: HashSet::new(),
        }
    }

    pub fn builder() -> PutOperationBuilder {
        PutOperationBuilder::default()
    }

    pub fn with_ignorable_result_codes(mut self, codes: HashSet<ResultCode>) -> Self {
        self.ignorable_result_codes = codes;
        self
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn write_policy(&self) -> Option<&WritePolicy> {
        self.write_policy.as_ref()
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn ignorable_result_codes(&self) -> &HashSet<ResultCode> {
        &self.ignorable_result_codes
    }
}

impl From<PutOperation> for RecordOperation {
    fn from(value: PutOperation) -> Self {
        RecordOperation::Put(value)
    }
}

#[derive(Debug, Default)]
pub struct PutOperationBuilder {
    key: Option<Key>,
    write_policy: Option<WritePolicy>,
    bins: Vec<Bin>,
    ignorable_result_codes: HashSet<ResultCode>,
}

impl PutOperationBuilder {
    pub fn key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    pub fn write_policy(mut self, write_policy: Option<WritePolicy>) -> Self {
        self.write_policy = write_policy;
        self
    }

    pub fn bin(mut self, bin: Bin) -> Self {
        self.bins.push(bin);
        self
    }

    pub fn bins(mut self, bins: impl IntoIterator<Item = Bin>) -> Self {
        self.bins.extend(bins);
        self
    }

    pub fn ignorable_result_codes(mut self, codes: HashSet<ResultCode>) -> Self {
        self.ignorable_result_codes = codes;
        self
    }

    pub fn build(self) -> Result<PutOperation, OperationError> {
        let key = self.key.ok_or(OperationError::MissingKey("put operation"))?;
        check_bin_names(self.bins.iter().map(|b| b.name.as_str()))?;
        Ok(PutOperation::new(key, self.write_policy, self.bins)
            .with_ignorable_result_codes(self.ignorable_result_codes))
    }
}

/// Applies several operations atomically to one record.
#[derive(Debug, Clone, PartialEq)]
pub struct OperateOperation {
    key: Key,
    write_policy: Option<WritePolicy>,
    operations: Vec<Operation>,
    ignore_error_codes: HashSet<ResultCode>,
}

impl OperateOperation {
    /// Does not check operations or bin names; [`OperateOperation::builder`]
    /// does.
    pub fn new(key: Key, write_policy: Option<WritePolicy>, operations: Vec<Operation>) -> Self {
        Self {
            key,
            write_policy,
            operations,
            ignore_error_codes: HashSet::new(),
        }
    }

    pub fn builder() -> OperateOperationBuilder {
        OperateOperationBuilder::default()
    }

    pub fn with_ignore_error_codes(mut self, codes: HashSet<ResultCode>) -> Self {
        self.ignore_error_codes = codes;
        self
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn write_policy(&self) -> Option<&WritePolicy> {
        self.write_policy.as_ref()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn ignore_error_codes(&self) -> &HashSet<ResultCode> {
        &self.ignore_error_codes
    }
}

impl From<OperateOperation> for RecordOperation {
    fn from(value: OperateOperation) -> Self {
        RecordOperation::Operate(value)
    }
}

#[derive(Debug, Default)]
pub struct OperateOperationBuilder {
    key: Option<Key>,
    write_policy: Option<WritePolicy>,
    operations: Vec<Operation>,
    ignore_error_codes: HashSet<ResultCode>,
}

impl OperateOperationBuilder {
    pub fn key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    pub fn write_policy(mut self, write_policy: Option<WritePolicy>) -> Self {
        self.write_policy = write_policy;
        self
    }

    pub fn operation(mut self, operation: impl Into<Operation>) -> Self {
        self.operations.push(operation.into());
        self
    }

    pub fn ignore_error_codes(mut self, codes: HashSet<ResultCode>) -> Self {
        self.ignore_error_codes = codes;
        self
    }

    pub fn build(self) -> Result<OperateOperation, OperationError> {
        let key = self
            .key
            .ok_or(OperationError::MissingKey("operate operation"))?;
        if self.operations.is_empty() {
            return Err(OperationError::NoOperations);
        }
        check_bin_names(self.operations.iter().filter_map(|op| op.bin_name()))?;
        Ok(OperateOperation::new(key, self.write_policy, self.operations)
            .with_ignore_error_codes(self.ignore_error_codes))
    }
}

/// Removes the record.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteOperation {
    key: Key,
    write_policy: Option<WritePolicy>,
}

impl DeleteOperation {
    pub fn new(key: Key, write_policy: Option<WritePolicy>) -> Self {
        Self { key, write_policy }
    }

    pub fn builder() -> DeleteOperationBuilder {
        DeleteOperationBuilder::default()
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn write_policy(&self) -> Option<&WritePolicy> {
        self.write_policy.as_ref()
    }
}

impl From<DeleteOperation> for RecordOperation {
    fn from(value: DeleteOperation) -> Self {
        RecordOperation::Delete(value)
    }
}

#[derive(Debug, Default)]
pub struct DeleteOperationBuilder {
    key: Option<Key>,
    write_policy: Option<WritePolicy>,
}

impl DeleteOperationBuilder {
    pub fn key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    pub fn write_policy(mut self, write_policy: Option<WritePolicy>) -> Self {
        self.write_policy = write_policy;
        self
    }

    pub fn build(self) -> Result<DeleteOperation, OperationError> {
        let key = self
            .key
            .ok_or(OperationError::MissingKey("delete operation"))?;
        Ok(DeleteOperation::new(key, self.write_policy))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompositeOperation {
    operations: Vec<SingleRecordOperation>,
}

impl CompositeOperation {
    pub fn new(operations: Vec<SingleRecordOperation>) -> Self {
        Self { operations }
    }

    pub fn operations(&self) -> &[SingleRecordOperation] {
        &self.operations
    }
}

impl From<CompositeOperation> for RecordOperation {
    fn from(value: CompositeOperation) -> Self {
        RecordOperation::Composite(value)
    }
}

pub fn check_bin_name(name: &str) -> Result<(), OperationError> {
    if name.len() > MAX_BIN_NAME_LEN {
        return Err(OperationError::BinNameTooLong(name.to_string()));
    }
    Ok(())
}

fn check_bin_names<'a>(mut names: impl Iterator<Item = &'a str>) -> Result<(), OperationError> {
    names.try_for_each(check_bin_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::policy::RecordExistsAction;
    use crate::model::value::Value;
    use crate::operation::cdt::ListOperation;
    use proptest::prelude::*;

    fn key() -> Key {
        Key::new("test", Some("demo"), "kevin").unwrap()
    }

    #[test]
    fn builders_require_a_key() {
        let err = PutOperation::builder()
            .bin(Bin::new("name", "kevin"))
            .build()
            .unwrap_err();
        assert_eq!(err, OperationError::MissingKey("put operation"));

        let err = OperateOperation::builder()
            .operation(ListOperation::insert("cdrs", 0, "cdr_1"))
            .build()
            .unwrap_err();
        assert_eq!(err, OperationError::MissingKey("operate operation"));

        let err = DeleteOperation::builder().build().unwrap_err();
        assert_eq!(err, OperationError::MissingKey("delete operation"));
    }

    #[test]
    fn operate_builder_rejects_empty_operations() {
        let err = OperateOperation::builder().key(key()).build().unwrap_err();
        assert_eq!(err, OperationError::NoOperations);
    }

    #[test]
    fn builders_reject_long_bin_names() {
        let err = PutOperation::builder()
            .key(key())
            .bin(Bin::new("a-very-long-bin-name", 1))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            OperationError::BinNameTooLong("a-very-long-bin-name".to_string())
        );
    }

    #[test]
    fn composite_flattens_in_order() {
        let put = PutOperation::new(key(), None, vec![Bin::new("a", 1)]);
        let delete = DeleteOperation::new(Key::new("test", None, "other").unwrap(), None);
        let op: RecordOperation = CompositeOperation::new(vec![
            SingleRecordOperation::Put(put.clone()),
            SingleRecordOperation::Delete(delete.clone()),
        ])
        .into();

        assert!(op.is_composite());
        assert!(op.key().is_none());
        assert_eq!(
            op.single_record_operations(),
            vec![
                SingleRecordOperation::Put(put),
                SingleRecordOperation::Delete(delete)
            ]
        );
        assert!(RecordOperation::Skip.single_record_operations().is_empty());
    }

    #[test]
    fn ignorable_codes_are_advisory_per_operation() {
        let codes: HashSet<ResultCode> = [ResultCode::KEY_EXISTS_ERROR].into_iter().collect();
        let put = SingleRecordOperation::Put(
            PutOperation::new(key(), None, vec![]).with_ignorable_result_codes(codes),
        );
        assert!(put.is_ignorable(ResultCode::OK));
        assert!(put.is_ignorable(ResultCode::KEY_EXISTS_ERROR));
        assert!(!put.is_ignorable(ResultCode::TIMEOUT));

        let delete = SingleRecordOperation::Delete(DeleteOperation::new(key(), None));
        assert!(!delete.is_ignorable(ResultCode::KEY_NOT_FOUND_ERROR));
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Nil),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            "[a-z0-9_]{0,12}".prop_map(Value::String),
        ]
    }

    fn arb_key() -> impl Strategy<Value = Key> {
        (
            "[a-z]{1,8}",
            proptest::option::of("[a-z]{1,8}"),
            prop_oneof![
                "[a-z0-9]{0,10}".prop_map(|s| Value::String(s)),
                any::<i64>().prop_map(Value::Int),
            ],
        )
            .prop_map(|(ns, set, user_key)| {
                Key::from_value(ns, set.as_deref(), &user_key).unwrap()
            })
    }

    fn arb_write_policy() -> impl Strategy<Value = Option<WritePolicy>> {
        proptest::option::of((any::<u32>(), any::<bool>()).prop_map(|(generation, send_key)| {
            WritePolicy {
                generation,
                send_key,
                record_exists_action: RecordExistsAction::Replace,
                ..WritePolicy::default()
            }
        }))
    }

    fn arb_codes() -> impl Strategy<Value = HashSet<ResultCode>> {
        proptest::collection::hash_set((-20i32..30).prop_map(ResultCode), 0..4)
    }

    fn arb_single() -> impl Strategy<Value = SingleRecordOperation> {
        prop_oneof![
            (arb_key(), arb_write_policy(), proptest::collection::vec(("[a-z]{1,15}", arb_value()), 0..4))
                .prop_map(|(key, write_policy, bins)| {
                    let bins = bins.into_iter().map(|(n, v)| Bin::new(n, v)).collect();
                    SingleRecordOperation::Put(PutOperation::new(key, write_policy, bins))
                }),
            (arb_key(), arb_value()).prop_map(|(key, value)| {
                SingleRecordOperation::Operate(OperateOperation::new(
                    key,
                    None,
                    vec![ListOperation::append("list", value).into()],
                ))
            }),
            (arb_key(), arb_write_policy()).prop_map(|(key, write_policy)| {
                SingleRecordOperation::Delete(DeleteOperation::new(key, write_policy))
            }),
        ]
    }

    proptest! {
        #[test]
        fn composite_keeps_operations_in_order(
            operations in proptest::collection::vec(arb_single(), 0..6),
        ) {
            let op = RecordOperation::from(CompositeOperation::new(operations.clone()));

            prop_assert!(op.is_composite());
            prop_assert_eq!(op.key(), None);
            prop_assert_eq!(op.single_record_operations(), operations);
        }

        #[test]
        fn put_reads_back_what_was_built(
            key in arb_key(),
            write_policy in arb_write_policy(),
            bins in proptest::collection::vec(("[a-z]{1,15}", arb_value()), 0..6),
            codes in arb_codes(),
        ) {
            let bins: Vec<Bin> = bins.into_iter().map(|(n, v)| Bin::new(n, v)).collect();
            let op = PutOperation::builder()
                .key(key.clone())
                .write_policy(write_policy.clone())
                .bins(bins.clone())
                .ignorable_result_codes(codes.clone())
                .build()
                .unwrap();

            prop_assert_eq!(op.key(), &key);
            prop_assert_eq!(op.write_policy(), write_policy.as_ref());
            prop_assert_eq!(op.bins(), bins.as_slice());
            prop_assert_eq!(op.ignorable_result_codes(), &codes);
        }

        #[test]
        fn operate_reads_back_what_was_built(
            key in arb_key(),
            write_policy in arb_write_policy(),
            values in proptest::collection::vec(arb_value(), 1..6),
            codes in arb_codes(),
        ) {
            let operations: Vec<Operation> = values
                .iter()
                .enumerate()
                .map(|(idx, v)| ListOperation::insert("list", idx as i64, v.clone()).into())
                .collect();
            let op = OperateOperation::new(key.clone(), write_policy.clone(), operations.clone())
                .with_ignore_error_codes(codes.clone());
            let record_op = RecordOperation::from(op.clone());

            prop_assert_eq!(record_op.key(), Some(&key));
            prop_assert_eq!(op.write_policy(), write_policy.as_ref());
            prop_assert_eq!(op.operations(), operations.as_slice());
            prop_assert_eq!(op.ignore_error_codes(), &codes);
        }

        #[test]
        fn delete_reads_back_what_was_built(key in arb_key(), write_policy in arb_write_policy()) {
            let op = DeleteOperation::builder()
                .key(key.clone())
                .write_policy(write_policy.clone())
                .build()
                .unwrap();

            prop_assert_eq!(op.key(), &key);
            prop_assert_eq!(op.write_policy(), write_policy.as_ref());
        }
    }
}
