//! Executes record operations against a [`MemoryStore`] the way the host
//! would against the database, so transforms can be exercised end to end.
//!
//! Each single-record operation is applied on its own. An operate works on a
//! copy of the record and only replaces the stored one if every
//! sub-operation succeeds.

use aerospike_connect_inbound::model::key::Key;
use aerospike_connect_inbound::model::policy::{
    GenerationPolicy, RecordExistsAction, WritePolicy,
};
use aerospike_connect_inbound::model::record::{Bin, Record};
use aerospike_connect_inbound::model::result_code::ResultCode;
use aerospike_connect_inbound::model::value::Value;
use aerospike_connect_inbound::operation::cdt::{
    Ctx, ListOp, ListOperation, ListOrder, MapOp, MapOperation, MapOrder, MapPolicy,
    MapWriteMode,
};
use aerospike_connect_inbound::operation::op::Operation;
use aerospike_connect_inbound::operation::record::{
    DeleteOperation, OperateOperation, PutOperation, RecordOperation, SingleRecordOperation,
};
use aerospike_connect_inbound::reader::memory::MemoryStore;
use std::cmp::Ordering;

/// How far past the end of a list an insert may pad with nils.
const MAX_INSERT_PADDING: usize = 1024;

/// Result of one single-record operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub operation: &'static str,
    pub key: Key,
    pub code: ResultCode,
    /// The code was a failure listed as ignorable by the operation.
    pub ignored: bool,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.code.is_ok() || self.ignored
    }
}

/// Applies every single-record operation in `op`, in order. A failure does
/// not stop the remaining operations of a composite.
pub fn apply(store: &MemoryStore, op: &RecordOperation) -> Vec<Outcome> {
    op.single_record_operations()
        .iter()
        .map(|single| apply_single(store, single))
        .collect()
}

pub fn apply_single(store: &MemoryStore, op: &SingleRecordOperation) -> Outcome {
    let (operation, code) = match op {
        SingleRecordOperation::Put(put_op) => ("put", put(store, put_op)),
        SingleRecordOperation::Operate(operate_op) => ("operate", operate(store, operate_op)),
        SingleRecordOperation::Delete(delete_op) => ("delete", delete(store, delete_op)),
    };
    let ignored = !code.is_ok() && op.is_ignorable(code);
    if ignored {
        log::debug!(
            "Ignoring {operation} result [{code}] for [{key}]",
            operation = operation,
            code = code,
            key = op.key()
        );
    } else if !code.is_ok() {
        log::warn!(
            "Failed {operation} on [{key}]: {code}",
            operation = operation,
            key = op.key(),
            code = code
        );
    }
    Outcome {
        operation,
        key: op.key().clone(),
        code,
        ignored,
    }
}

fn check_exists_action(
    policy: Option<&WritePolicy>,
    existing: Option<&Record>,
) -> Result<(), ResultCode> {
    let action = policy.map(|p| p.record_exists_action).unwrap_or_default();
    match (action, existing) {
        (RecordExistsAction::UpdateOnly | RecordExistsAction::ReplaceOnly, None) => {
            Err(ResultCode::KEY_NOT_FOUND_ERROR)
        }
        (RecordExistsAction::CreateOnly, Some(_)) => Err(ResultCode::KEY_EXISTS_ERROR),
        _ => Ok(()),
    }
}

fn check_generation(
    policy: Option<&WritePolicy>,
    existing: Option<&Record>,
) -> Result<(), ResultCode> {
    let (Some(policy), Some(record)) = (policy, existing) else {
        return Ok(());
    };
    let matches = match policy.generation_policy {
        GenerationPolicy::None => true,
        GenerationPolicy::ExpectGenEqual => record.generation == policy.generation,
        GenerationPolicy::ExpectGenGt => policy.generation > record.generation,
    };
    if matches {
        Ok(())
    } else {
        Err(ResultCode::GENERATION_ERROR)
    }
}

fn expiration(policy: Option<&WritePolicy>, current: u32) -> u32 {
    match policy.map(|p| p.expiration).unwrap_or(0) {
        -2 => current,
        -1 => u32::MAX,
        ttl if ttl > 0 => ttl as u32,
        _ => 0,
    }
}

/// Stores `record`, or removes it when no bins are left.
fn commit(slot: &mut Option<Record>, mut record: Record, policy: Option<&WritePolicy>) {
    if record.bins.is_empty() {
        *slot = None;
        return;
    }
    record.generation = record.generation.wrapping_add(1);
    record.expiration = expiration(policy, record.expiration);
    *slot = Some(record);
}

fn write_bin(record: &mut Record, bin: &Bin) {
    if bin.value.is_nil() {
        record.bins.remove(&bin.name);
    } else {
        record.bins.insert(bin.name.clone(), bin.value.clone());
    }
}

fn put(store: &MemoryStore, op: &PutOperation) -> ResultCode {
    let policy = op.write_policy();
    store.update(op.key(), |slot| {
        if let Err(code) = check_exists_action(policy, slot.as_ref())
            .and_then(|_| check_generation(policy, slot.as_ref()))
        {
            return code;
        }
        let replace = matches!(
            policy.map(|p| p.record_exists_action),
            Some(RecordExistsAction::Replace | RecordExistsAction::ReplaceOnly)
        );
        let mut record = match slot.take() {
            Some(mut record) => {
                if replace {
                    record.bins.clear();
                }
                record
            }
            None => Record::default(),
        };
        for bin in op.bins() {
            write_bin(&mut record, bin);
        }
        commit(slot, record, policy);
        ResultCode::OK
    })
}

fn delete(store: &MemoryStore, op: &DeleteOperation) -> ResultCode {
    store.update(op.key(), |slot| {
        if slot.is_none() {
            return ResultCode::KEY_NOT_FOUND_ERROR;
        }
        if let Err(code) = check_generation(op.write_policy(), slot.as_ref()) {
            return code;
        }
        *slot = None;
        ResultCode::OK
    })
}

fn is_write(op: &Operation) -> bool {
    match op {
        Operation::Read { .. } | Operation::ReadHeader => false,
        Operation::List(list) => !matches!(list.op, ListOp::GetRange { .. } | ListOp::Size),
        Operation::Map(map) => !matches!(map.op, MapOp::Size),
        _ => true,
    }
}

fn operate(store: &MemoryStore, op: &OperateOperation) -> ResultCode {
    let policy = op.write_policy();
    store.update(op.key(), |slot| {
        if let Err(code) = check_exists_action(policy, slot.as_ref())
            .and_then(|_| check_generation(policy, slot.as_ref()))
        {
            return code;
        }
        let writes = op.operations().iter().any(is_write);
        if slot.is_none() && !writes {
            return ResultCode::KEY_NOT_FOUND_ERROR;
        }
        let exists = slot.is_some();
        let mut record = slot.clone().unwrap_or_default();
        for sub in op.operations() {
            if let Err(code) = apply_operation(&mut record, sub, exists) {
                return code;
            }
        }
        if writes {
            commit(slot, record, policy);
        }
        ResultCode::OK
    })
}

fn apply_operation(record: &mut Record, op: &Operation, exists: bool) -> Result<(), ResultCode> {
    match op {
        Operation::Read { .. } | Operation::ReadHeader => Ok(()),
        Operation::Write(bin) => {
            write_bin(record, bin);
            Ok(())
        }
        Operation::Add(bin) => {
            let value = match record.bins.get(&bin.name) {
                Some(current) => add_values(current, &bin.value)?,
                None => numeric(&bin.value)?.clone(),
            };
            record.bins.insert(bin.name.clone(), value);
            Ok(())
        }
        Operation::Append(bin) => concat(record, bin, false),
        Operation::Prepend(bin) => concat(record, bin, true),
        Operation::Touch => {
            if exists {
                Ok(())
            } else {
                Err(ResultCode::KEY_NOT_FOUND_ERROR)
            }
        }
        Operation::Delete => {
            record.bins.clear();
            Ok(())
        }
        Operation::List(list) => apply_list(record, list),
        Operation::Map(map) => apply_map(record, map),
    }
}

fn numeric(value: &Value) -> Result<&Value, ResultCode> {
    match value {
        Value::Int(_) | Value::Float(_) => Ok(value),
        _ => Err(ResultCode::PARAMETER_ERROR),
    }
}

/// Integer plus integer stays integer; any float operand gives a float.
fn add_values(current: &Value, incr: &Value) -> Result<Value, ResultCode> {
    numeric(incr)?;
    match (current, incr) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),
        (Value::Int(_) | Value::Float(_), _) => match (current.as_f64(), incr.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Float(a + b)),
            _ => Err(ResultCode::PARAMETER_ERROR),
        },
        _ => Err(ResultCode::BIN_TYPE_ERROR),
    }
}

fn concat(record: &mut Record, bin: &Bin, prepend: bool) -> Result<(), ResultCode> {
    let Value::String(suffix) = &bin.value else {
        return Err(ResultCode::PARAMETER_ERROR);
    };
    let value = match record.bins.get(&bin.name) {
        None => suffix.clone(),
        Some(Value::String(current)) if prepend => format!("{}{}", suffix, current),
        Some(Value::String(current)) => format!("{}{}", current, suffix),
        Some(_) => return Err(ResultCode::BIN_TYPE_ERROR),
    };
    record.bins.insert(bin.name.clone(), Value::String(value));
    Ok(())
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Nil => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::String(_) => 3,
        Value::Bytes(_) => 4,
        Value::List(_) => 5,
        Value::Map(_) => 6,
    }
}

/// Total order used for ranks and ordered collections: by type first, then
/// by value.
fn value_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => Ordering::Equal,
            }
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bytes(x), Value::Bytes(y)) => x.cmp(y),
        (Value::List(x), Value::List(y)) => x
            .iter()
            .zip(y)
            .map(|(l, r)| value_cmp(l, r))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Map(x), Value::Map(y)) => x.len().cmp(&y.len()).then_with(|| {
            x.iter()
                .zip(y)
                .map(|(l, r)| value_cmp(&l.0, &r.0).then_with(|| value_cmp(&l.1, &r.1)))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        }),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Position for `index` in a collection of `len` items; negative indexes
/// count from the end.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let idx = if index >= 0 {
        usize::try_from(index).ok()?
    } else {
        len.checked_sub(usize::try_from(index.unsigned_abs()).ok()?)?
    };
    (idx < len).then_some(idx)
}

fn rank_position<'a>(values: impl Iterator<Item = &'a Value>, rank: i64) -> Option<usize> {
    let mut order: Vec<(usize, &Value)> = values.enumerate().collect();
    order.sort_by(|a, b| value_cmp(a.1, b.1));
    let pos = resolve_index(rank, order.len())?;
    Some(order[pos].0)
}

/// Half-open range of `count` items from `index`, clamped to the collection.
fn clamp_range(index: i64, count: Option<u64>, len: usize) -> (usize, usize) {
    let start = if index >= 0 {
        usize::try_from(index).unwrap_or(usize::MAX).min(len)
    } else {
        len.saturating_sub(usize::try_from(index.unsigned_abs()).unwrap_or(usize::MAX))
    };
    let end = match count {
        Some(count) => start
            .saturating_add(usize::try_from(count).unwrap_or(usize::MAX))
            .min(len),
        None => len,
    };
    (start, end)
}

fn list_mut(value: &mut Value, create: bool) -> Result<&mut Vec<Value>, ResultCode> {
    if create && value.is_nil() {
        *value = Value::List(Vec::new());
    }
    match value {
        Value::List(items) => Ok(items),
        Value::Nil => Err(ResultCode::OP_NOT_APPLICABLE),
        _ => Err(ResultCode::BIN_TYPE_ERROR),
    }
}

fn map_mut(value: &mut Value, create: bool) -> Result<&mut Vec<(Value, Value)>, ResultCode> {
    if create && value.is_nil() {
        *value = Value::Map(Vec::new());
    }
    match value {
        Value::Map(entries) => Ok(entries),
        Value::Nil => Err(ResultCode::OP_NOT_APPLICABLE),
        _ => Err(ResultCode::BIN_TYPE_ERROR),
    }
}

fn step_into<'a>(value: &'a mut Value, step: &Ctx, create: bool) -> Result<&'a mut Value, ResultCode> {
    let missing = ResultCode::OP_NOT_APPLICABLE;
    match step {
        Ctx::ListIndex(index) => {
            let items = list_mut(value, create)?;
            let idx = resolve_index(*index, items.len()).ok_or(missing)?;
            Ok(&mut items[idx])
        }
        Ctx::ListRank(rank) => {
            let items = list_mut(value, create)?;
            let idx = rank_position(items.iter(), *rank).ok_or(missing)?;
            Ok(&mut items[idx])
        }
        Ctx::ListValue(wanted) => {
            let items = list_mut(value, create)?;
            let idx = items.iter().position(|v| v == wanted).ok_or(missing)?;
            Ok(&mut items[idx])
        }
        Ctx::MapIndex(index) => {
            let entries = map_mut(value, create)?;
            let idx = resolve_index(*index, entries.len()).ok_or(missing)?;
            Ok(&mut entries[idx].1)
        }
        Ctx::MapRank(rank) => {
            let entries = map_mut(value, create)?;
            let idx = rank_position(entries.iter().map(|(_, v)| v), *rank).ok_or(missing)?;
            Ok(&mut entries[idx].1)
        }
        Ctx::MapKey(key) => {
            let entries = map_mut(value, create)?;
            let idx = match entries.iter().position(|(k, _)| k == key) {
                Some(idx) => idx,
                None if create => {
                    entries.push((key.clone(), Value::Nil));
                    entries.len() - 1
                }
                None => return Err(missing),
            };
            Ok(&mut entries[idx].1)
        }
        Ctx::MapValue(wanted) => {
            let entries = map_mut(value, create)?;
            let idx = entries.iter().position(|(_, v)| v == wanted).ok_or(missing)?;
            Ok(&mut entries[idx].1)
        }
    }
}

/// Resolves the bin and context path of a CDT operation. `Ok(None)` means
/// the bin is absent and the operation has nothing to act on.
fn cdt_target<'a>(
    record: &'a mut Record,
    bin: &str,
    ctx: &[Ctx],
    create: bool,
) -> Result<Option<&'a mut Value>, ResultCode> {
    let mut value = if create {
        record.bins.entry(bin.to_string()).or_insert(Value::Nil)
    } else {
        match record.bins.get_mut(bin) {
            Some(value) => value,
            None => return Ok(None),
        }
    };
    for step in ctx {
        value = step_into(value, step, create)?;
    }
    Ok(Some(value))
}

fn ordered_insert(items: &mut Vec<Value>, value: Value) {
    let pos = items.partition_point(|v| value_cmp(v, &value).is_le());
    items.insert(pos, value);
}

fn list_add(items: &mut Vec<Value>, order: ListOrder, unique: bool, value: &Value) -> Result<(), ResultCode> {
    if unique && items.contains(value) {
        return Err(ResultCode::ELEMENT_EXISTS);
    }
    match order {
        ListOrder::Ordered => ordered_insert(items, value.clone()),
        ListOrder::Unordered => items.push(value.clone()),
    }
    Ok(())
}

fn apply_list(record: &mut Record, op: &ListOperation) -> Result<(), ResultCode> {
    let create = matches!(
        op.op,
        ListOp::Append { .. } | ListOp::AppendItems { .. } | ListOp::Insert { .. }
    );
    let Some(target) = cdt_target(record, &op.bin, &op.ctx, create)? else {
        return Ok(());
    };
    let items = list_mut(target, create)?;
    match &op.op {
        ListOp::Append { policy, value } => {
            list_add(items, policy.order, policy.add_unique, value)?;
        }
        ListOp::AppendItems { policy, values } => {
            for value in values {
                list_add(items, policy.order, policy.add_unique, value)?;
            }
        }
        ListOp::Insert { index, value } => {
            let len = items.len();
            let pos = if *index >= 0 {
                usize::try_from(*index).map_err(|_| ResultCode::PARAMETER_ERROR)?
            } else {
                resolve_index(*index, len).ok_or(ResultCode::OP_NOT_APPLICABLE)?
            };
            if pos > len.saturating_add(MAX_INSERT_PADDING) {
                return Err(ResultCode::OP_NOT_APPLICABLE);
            }
            if pos > len {
                items.resize(pos, Value::Nil);
            }
            items.insert(pos, value.clone());
        }
        ListOp::RemoveRange { index, count } => {
            let (start, end) = clamp_range(*index, Some(*count), items.len());
            items.drain(start..end);
        }
        ListOp::RemoveByValue { value, .. } => items.retain(|v| v != value),
        ListOp::Trim { index, count } => {
            let (start, end) = clamp_range(*index, Some(*count), items.len());
            let kept: Vec<Value> = items.drain(start..end).collect();
            *items = kept;
        }
        ListOp::GetRange { .. } | ListOp::Size => {}
        ListOp::Clear => items.clear(),
    }
    Ok(())
}

fn map_insert(entries: &mut Vec<(Value, Value)>, order: MapOrder, key: Value, value: Value) {
    match order {
        MapOrder::Unordered => entries.push((key, value)),
        MapOrder::KeyOrdered | MapOrder::KeyValueOrdered => {
            let pos = entries.partition_point(|(k, _)| value_cmp(k, &key).is_lt());
            entries.insert(pos, (key, value));
        }
    }
}

fn map_put(
    entries: &mut Vec<(Value, Value)>,
    policy: MapPolicy,
    key: &Value,
    value: &Value,
) -> Result<(), ResultCode> {
    match entries.iter_mut().find(|(k, _)| k == key) {
        Some(_) if policy.write_mode == MapWriteMode::CreateOnly => Err(ResultCode::ELEMENT_EXISTS),
        Some((_, current)) => {
            *current = value.clone();
            Ok(())
        }
        None if policy.write_mode == MapWriteMode::UpdateOnly => {
            Err(ResultCode::ELEMENT_NOT_FOUND)
        }
        None => {
            map_insert(entries, policy.order, key.clone(), value.clone());
            Ok(())
        }
    }
}

fn apply_map(record: &mut Record, op: &MapOperation) -> Result<(), ResultCode> {
    let create = matches!(
        op.op,
        MapOp::Put { .. } | MapOp::PutItems { .. } | MapOp::Increment { .. }
    );
    let Some(target) = cdt_target(record, &op.bin, &op.ctx, create)? else {
        return Ok(());
    };
    let entries = map_mut(target, create)?;
    match &op.op {
        MapOp::Put { key, value } => map_put(entries, op.policy, key, value)?,
        MapOp::PutItems { items } => {
            for (key, value) in items {
                map_put(entries, op.policy, key, value)?;
            }
        }
        MapOp::Increment { key, incr } => match entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, current)) => *current = add_values(current, incr)?,
            None if op.policy.write_mode == MapWriteMode::UpdateOnly => {
                return Err(ResultCode::ELEMENT_NOT_FOUND);
            }
            None => {
                let value = numeric(incr)?.clone();
                map_insert(entries, op.policy.order, key.clone(), value);
            }
        },
        MapOp::RemoveByKey { key, .. } => entries.retain(|(k, _)| k != key),
        MapOp::Size => {}
        MapOp::Clear => entries.clear(),
    }
    Ok(())
}
